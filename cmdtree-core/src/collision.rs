//! Leaf/directory collision handling.
//!
//! A collision happens when one command needs a segment to be a document
//! while another needs the same segment to be a directory. The tree asks a
//! [`CollisionStrategy`] what to do and applies the returned [`Resolution`].

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    command::is_path_safe,
    error::{CmdtreeError, Result},
};

/// Suffix appended by [`CollisionPolicy::RenameWithSuffix`] unless overridden.
pub const DEFAULT_RENAME_SUFFIX: &str = "-command";

/// Document name used by [`CollisionPolicy::MergeAsDefault`] unless overridden.
pub const DEFAULT_ENTRY: &str = "index";

/// Which side of the conflict was already in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    /// A document was requested where a directory already exists.
    LeafBlockedByDirectory,
    /// A directory was requested where a document already exists.
    DirectoryBlockedByLeaf,
}

impl CollisionKind {
    /// Returns a short label for reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeafBlockedByDirectory => "leaf-blocked-by-directory",
            Self::DirectoryBlockedByLeaf => "directory-blocked-by-leaf",
        }
    }
}

/// Details handed to a [`CollisionStrategy`].
#[derive(Debug, Clone, Copy)]
pub struct Collision<'a> {
    /// Which side of the conflict was already present.
    pub kind: CollisionKind,
    /// Tree path of the contested node.
    pub path: &'a Utf8Path,
    /// Canonical form of the command being inserted.
    pub incoming: &'a str,
    /// Commands that already touched the contested node.
    pub existing: &'a [String],
}

/// What to do about a collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Drop the incoming command and report the collision as unresolved.
    Skip,
    /// Give the document the sibling name `<name><suffix>`, adding a counter
    /// when that name is held by a directory.
    RenameLeaf {
        /// Suffix appended to the contested name.
        suffix: String,
    },
    /// Keep the document inside the directory under the name `entry`.
    NestLeaf {
        /// Base name of the document inside the directory.
        entry: String,
    },
}

/// Decides how leaf/directory collisions are resolved.
///
/// # Examples
/// ```
/// use cmdtree_core::{Collision, CollisionKind, CollisionStrategy, Resolution};
///
/// /// Nest documents under directories but never demote an existing document.
/// #[derive(Debug)]
/// struct KeepDocuments;
///
/// impl CollisionStrategy for KeepDocuments {
///     fn resolve(&self, collision: &Collision<'_>) -> Resolution {
///         match collision.kind {
///             CollisionKind::LeafBlockedByDirectory => Resolution::NestLeaf {
///                 entry: "overview".into(),
///             },
///             CollisionKind::DirectoryBlockedByLeaf => Resolution::Skip,
///         }
///     }
/// }
/// ```
pub trait CollisionStrategy: fmt::Debug + Send + Sync {
    /// Returns the resolution for `collision`.
    fn resolve(&self, collision: &Collision<'_>) -> Resolution;
}

/// The built-in collision strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Drop the command that caused the collision and warn.
    Skip,
    /// Rename the document to a sibling carrying `suffix`.
    RenameWithSuffix {
        /// Suffix appended to the contested name.
        suffix: String,
    },
    /// Keep the document inside the directory as its default entry.
    MergeAsDefault {
        /// Base name of the default entry.
        entry: String,
    },
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        Self::MergeAsDefault {
            entry: DEFAULT_ENTRY.to_owned(),
        }
    }
}

impl CollisionPolicy {
    /// Checks that the names the policy would generate are path-safe.
    ///
    /// # Errors
    /// Returns [`CmdtreeError::InvalidEntryName`] for an empty or unsafe suffix
    /// or entry name.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Skip => Ok(()),
            Self::RenameWithSuffix { suffix } => check_name("rename suffix", suffix),
            Self::MergeAsDefault { entry } => check_name("default entry name", entry),
        }
    }

    /// Returns a short label for diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::RenameWithSuffix { .. } => "rename",
            Self::MergeAsDefault { .. } => "merge",
        }
    }
}

fn check_name(role: &'static str, value: &str) -> Result<()> {
    if is_path_safe(value) {
        Ok(())
    } else {
        Err(CmdtreeError::InvalidEntryName {
            role,
            got: value.to_owned(),
        })
    }
}

impl CollisionStrategy for CollisionPolicy {
    fn resolve(&self, _collision: &Collision<'_>) -> Resolution {
        match self {
            Self::Skip => Resolution::Skip,
            Self::RenameWithSuffix { suffix } => Resolution::RenameLeaf {
                suffix: suffix.clone(),
            },
            Self::MergeAsDefault { entry } => Resolution::NestLeaf {
                entry: entry.clone(),
            },
        }
    }
}

/// How a recorded collision ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedResolution {
    /// The incoming command was dropped.
    Skipped,
    /// The document was moved to a sibling path.
    Renamed {
        /// Tree path the document now lives at.
        to: Utf8PathBuf,
    },
    /// The document was placed inside the directory.
    Nested {
        /// Tree path the document now lives at.
        to: Utf8PathBuf,
    },
    /// The blocking document was already on disk; it is left in place and the
    /// directory is created next to it.
    KeptBeside {
        /// Path of the untouched document, relative to the root.
        document: Utf8PathBuf,
    },
}

impl fmt::Display for AppliedResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped"),
            Self::Renamed { to } => write!(f, "renamed to {to}"),
            Self::Nested { to } => write!(f, "nested as {to}"),
            Self::KeptBeside { document } => write!(f, "kept beside {document}"),
        }
    }
}

/// A collision found while folding commands into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionRecord {
    /// Tree path of the contested node.
    pub path: Utf8PathBuf,
    /// Which side of the conflict was already present.
    pub kind: CollisionKind,
    /// Conflicting commands: those already present followed by the incoming one.
    pub commands: Vec<String>,
    /// Outcome of the strategy.
    pub resolution: AppliedResolution,
}
