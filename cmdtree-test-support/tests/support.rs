//! Behavioural tests for the shared test utilities.

use anyhow::Result;
use camino::Utf8Path;
use cmdtree_test_support::docs::{DocsRoot, Entry};
use cmdtree_test_support::tracing::RecordingLayer;
use rstest::{fixture, rstest};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

#[fixture]
fn docs() -> DocsRoot {
    DocsRoot::new().expect("temp dir must be available")
}

#[rstest]
fn snapshot_of_missing_root_is_empty(docs: DocsRoot) -> Result<()> {
    assert!(docs.snapshot()?.is_empty());
    assert!(!docs.path().exists());
    Ok(())
}

#[rstest]
fn snapshot_lists_nested_entries(docs: DocsRoot) -> Result<()> {
    docs.create_dir("network/nic")?;
    docs.write("network/_category_.json", "{}")?;
    docs.write("system/config.md", "# config")?;

    let snapshot = docs.snapshot()?;

    let paths: Vec<&str> = snapshot.keys().map(|path| path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "network",
            "network/_category_.json",
            "network/nic",
            "system",
            "system/config.md",
        ]
    );
    assert_eq!(
        snapshot.get(Utf8Path::new("system/config.md")),
        Some(&Entry::File("# config".to_owned()))
    );
    assert_eq!(docs.read("network/_category_.json")?, "{}");
    Ok(())
}

#[rstest]
fn recording_layer_captures_late_span_fields() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("core.run", created = tracing::field::Empty);
        let _entered = span.enter();
        tracing::warn!(code = "CMDTREE_MALFORMED_COMMAND", "rejected command");
        span.record("created", 3_u64);
    });

    let span = layer.span("core.run").expect("span recorded");
    assert_eq!(span.field("created"), Some("3"));
    let warnings = layer.events_at(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field("code"), Some("CMDTREE_MALFORMED_COMMAND"));
    assert_eq!(warnings[0].message(), Some("rejected command"));
}
