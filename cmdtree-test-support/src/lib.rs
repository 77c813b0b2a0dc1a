//! Shared test utilities used across cmdtree crates.

pub mod tracing {
    //! Recording layer for asserting spans and events in tests.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::registry::LookupSpan;

    /// Layer capturing closed spans and emitted events with their fields.
    ///
    /// Clones share storage, so a test keeps one handle and installs another.
    ///
    /// # Examples
    /// ```
    /// use cmdtree_test_support::tracing::RecordingLayer;
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let layer = RecordingLayer::default();
    /// let subscriber = tracing_subscriber::registry().with(layer.clone());
    /// tracing::subscriber::with_default(subscriber, || {
    ///     tracing::info!(path = "log/get.md", "created file");
    /// });
    /// let event = layer.events().pop().expect("event recorded");
    /// assert_eq!(event.message(), Some("created file"));
    /// assert_eq!(event.field("path"), Some("log/get.md"));
    /// ```
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        recorded: Arc<Mutex<Recorded>>,
    }

    #[derive(Default)]
    struct Recorded {
        spans: Vec<SpanRecord>,
        events: Vec<EventRecord>,
    }

    impl RecordingLayer {
        fn lock(&self) -> MutexGuard<'_, Recorded> {
            self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Returns the closed spans in completion order.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            self.lock().spans.clone()
        }

        /// Returns the first closed span called `name`.
        #[must_use]
        pub fn span(&self, name: &str) -> Option<SpanRecord> {
            self.lock()
                .spans
                .iter()
                .find(|span| span.name == name)
                .cloned()
        }

        /// Returns the emitted events in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            self.lock().events.clone()
        }

        /// Returns the events emitted at `level`.
        #[must_use]
        pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
            self.lock()
                .events
                .iter()
                .filter(|event| event.level == level)
                .cloned()
                .collect()
        }
    }

    /// A closed span and the fields recorded on it, including late `record` calls.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name from the metadata.
        pub name: String,
        /// Recorded fields, values rendered as strings.
        pub fields: HashMap<String, String>,
    }

    impl SpanRecord {
        /// Returns the value of `name`, if recorded.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }
    }

    /// An emitted event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Event level.
        pub level: Level,
        /// Event target.
        pub target: String,
        /// Structured fields, the message under `message`.
        pub fields: HashMap<String, String>,
    }

    impl EventRecord {
        /// Returns the value of `name`, if recorded.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }

        /// Returns the formatted message.
        #[must_use]
        pub fn message(&self) -> Option<&str> {
            self.field("message")
        }
    }

    struct PendingSpan {
        name: &'static str,
        fields: HashMap<String, String>,
    }

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut pending = PendingSpan {
                name: attrs.metadata().name(),
                fields: HashMap::new(),
            };
            attrs.record(&mut FieldCollector(&mut pending.fields));
            span.extensions_mut().insert(pending);
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            if let Some(pending) = span.extensions_mut().get_mut::<PendingSpan>() {
                values.record(&mut FieldCollector(&mut pending.fields));
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            let Some(pending) = span.extensions_mut().remove::<PendingSpan>() else {
                return;
            };
            self.lock().spans.push(SpanRecord {
                name: pending.name.to_owned(),
                fields: pending.fields,
            });
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldCollector(&mut fields));
            let metadata = event.metadata();
            self.lock().events.push(EventRecord {
                level: *metadata.level(),
                target: metadata.target().to_owned(),
                fields,
            });
        }
    }

    struct FieldCollector<'a>(&'a mut HashMap<String, String>);

    impl FieldCollector<'_> {
        fn put(&mut self, field: &Field, value: String) {
            self.0.insert(field.name().to_owned(), value);
        }
    }

    impl Visit for FieldCollector<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.put(field, format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.put(field, value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.put(field, value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.put(field, value.to_string());
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.put(field, value.to_string());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.put(field, value.to_string());
        }
    }
}

pub mod docs {
    //! Temporary documentation roots and snapshots of their contents.
    use std::collections::BTreeMap;
    use std::io;

    use camino::{Utf8Path, Utf8PathBuf};
    use cap_std::ambient_authority;
    use cap_std::fs_utf8::Dir;
    use tempfile::TempDir;

    /// One entry of a [`DocsRoot::snapshot`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Entry {
        /// A directory.
        Dir,
        /// A file and its contents.
        File(String),
    }

    /// A documentation root inside a temporary directory.
    ///
    /// The root itself is not created up front, so tests can check that a
    /// run creates it.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use cmdtree_test_support::docs::{DocsRoot, Entry};
    ///
    /// let docs = DocsRoot::new().expect("temp dir");
    /// docs.write("log/get.md", "authored").expect("write");
    /// let snapshot = docs.snapshot().expect("snapshot");
    /// assert_eq!(snapshot.get(Utf8Path::new("log")), Some(&Entry::Dir));
    /// assert_eq!(
    ///     snapshot.get(Utf8Path::new("log/get.md")),
    ///     Some(&Entry::File("authored".into()))
    /// );
    /// ```
    #[derive(Debug)]
    pub struct DocsRoot {
        _temp: TempDir,
        root: Utf8PathBuf,
    }

    impl DocsRoot {
        /// Creates a fresh temporary directory and picks `docs` inside it.
        ///
        /// # Errors
        /// Returns an I/O error when the temporary directory cannot be made
        /// or its path is not UTF-8.
        pub fn new() -> io::Result<Self> {
            let temp = TempDir::new()?;
            let base = Utf8Path::from_path(temp.path()).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "temporary path is not UTF-8")
            })?;
            let root = base.join("docs");
            Ok(Self { _temp: temp, root })
        }

        /// Returns the documentation root path.
        #[must_use]
        pub fn path(&self) -> &Utf8Path {
            &self.root
        }

        fn open(&self) -> io::Result<Dir> {
            Dir::create_ambient_dir_all(&self.root, ambient_authority())?;
            Dir::open_ambient_dir(&self.root, ambient_authority())
        }

        /// Creates `rel` and its parents below the root.
        ///
        /// # Errors
        /// Returns the underlying I/O error.
        pub fn create_dir(&self, rel: impl AsRef<Utf8Path>) -> io::Result<()> {
            self.open()?.create_dir_all(rel)
        }

        /// Writes `contents` to `rel`, creating parent directories.
        ///
        /// # Errors
        /// Returns the underlying I/O error.
        pub fn write(&self, rel: impl AsRef<Utf8Path>, contents: &str) -> io::Result<()> {
            let rel = rel.as_ref();
            let dir = self.open()?;
            if let Some(parent) = rel.parent().filter(|parent| !parent.as_str().is_empty()) {
                dir.create_dir_all(parent)?;
            }
            dir.write(rel, contents)
        }

        /// Reads the file at `rel`.
        ///
        /// # Errors
        /// Returns the underlying I/O error.
        pub fn read(&self, rel: impl AsRef<Utf8Path>) -> io::Result<String> {
            Dir::open_ambient_dir(&self.root, ambient_authority())?.read_to_string(rel)
        }

        /// Lists every path under the root with file contents.
        ///
        /// A root that does not exist yet yields an empty snapshot.
        ///
        /// # Errors
        /// Returns the underlying I/O error.
        pub fn snapshot(&self) -> io::Result<BTreeMap<Utf8PathBuf, Entry>> {
            let mut out = BTreeMap::new();
            match Dir::open_ambient_dir(&self.root, ambient_authority()) {
                Ok(dir) => walk(&dir, Utf8Path::new(""), &mut out)?,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
            Ok(out)
        }
    }

    fn walk(
        dir: &Dir,
        rel: &Utf8Path,
        out: &mut BTreeMap<Utf8PathBuf, Entry>,
    ) -> io::Result<()> {
        for entry in dir.entries()? {
            let entry = entry?;
            let name = entry.file_name()?;
            let path = rel.join(&name);
            if entry.file_type()?.is_dir() {
                out.insert(path.clone(), Entry::Dir);
                walk(&dir.open_dir(&name)?, &path, out)?;
            } else {
                out.insert(path, Entry::File(dir.read_to_string(&name)?));
            }
        }
        Ok(())
    }
}
