//! Leaf-naming conventions.

/// Chooses which command segment names the generated document.
///
/// # Examples
/// ```
/// use cmdtree_core::LeafLayout;
///
/// let segments: Vec<String> = ["system", "config", "change"]
///     .into_iter()
///     .map(String::from)
///     .collect();
///
/// let (dirs, doc) = LeafLayout::ActionDocument.split(&segments).expect("two or more segments");
/// assert_eq!((dirs, doc), (&segments[..2], "change"));
///
/// let (dirs, doc) = LeafLayout::ObjectDocument.split(&segments).expect("two or more segments");
/// assert_eq!((dirs, doc), (&segments[..1], "config"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LeafLayout {
    /// Every segment but the last is a directory and the final action is the
    /// document: `network/nic/config/get.md`.
    #[default]
    ActionDocument,
    /// The final action is folded into the document of the object it acts on:
    /// `system/config.md` documents `acli system config change`.
    ObjectDocument,
}

impl LeafLayout {
    /// Splits `segments` into directory segments and the document segment.
    ///
    /// Returns `None` when there are too few segments for the layout; parsed
    /// commands always carry at least two.
    #[must_use]
    pub fn split<'a>(self, segments: &'a [String]) -> Option<(&'a [String], &'a str)> {
        let (action, rest) = segments.split_last()?;
        match self {
            Self::ActionDocument => Some((rest, action.as_str())),
            Self::ObjectDocument => {
                let (object, dirs) = rest.split_last()?;
                Some((dirs, object.as_str()))
            }
        }
    }

    /// Returns a short lowercase label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActionDocument => "action",
            Self::ObjectDocument => "object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn owned(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn default_layout_keeps_every_segment_but_the_last_as_directory() {
        let segments = owned(&["network", "nic", "config", "get"]);
        let (dirs, doc) = LeafLayout::default()
            .split(&segments)
            .expect("split must succeed");
        assert_eq!(dirs.len(), 3);
        assert_eq!(doc, "get");
    }

    #[rstest]
    #[case(LeafLayout::ActionDocument, &["log", "get"], &["log"], "get")]
    #[case(LeafLayout::ObjectDocument, &["log", "get"], &[], "log")]
    #[case(LeafLayout::ObjectDocument, &["log", "level", "set"], &["log"], "level")]
    #[case(
        LeafLayout::ActionDocument,
        &["network", "nic", "config", "get"],
        &["network", "nic", "config"],
        "get"
    )]
    fn split_selects_document_segment(
        #[case] layout: LeafLayout,
        #[case] segments: &[&str],
        #[case] dirs: &[&str],
        #[case] doc: &str,
    ) {
        let segments = owned(segments);
        let (actual_dirs, actual_doc) = layout.split(&segments).expect("split must succeed");
        assert_eq!(actual_dirs, owned(dirs).as_slice());
        assert_eq!(actual_doc, doc);
    }

    #[test]
    fn object_layout_needs_two_segments() {
        assert!(LeafLayout::ObjectDocument.split(&owned(&["log"])).is_none());
        assert!(LeafLayout::ActionDocument.split(&[]).is_none());
    }
}
