//! Outcome of one run.

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    collision::CollisionRecord,
    error::{CmdtreeError, CommandError},
};

/// What a reported path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// A directory for an internal node.
    Directory,
    /// A `_category_.json` descriptor.
    Descriptor,
    /// A command document.
    Document,
    /// A `category.md` index written for a linked descriptor.
    CategoryIndex,
}

impl ArtifactKind {
    /// Returns a short label for reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Descriptor => "descriptor",
            Self::Document => "document",
            Self::CategoryIndex => "category-index",
        }
    }
}

/// A path under the documentation root touched by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the documentation root.
    pub path: Utf8PathBuf,
    /// What the path is.
    pub kind: ArtifactKind,
}

impl Artifact {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// A command identical to one placed earlier in the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    /// Raw command string as supplied.
    pub command: String,
    /// Document that already covers the command.
    pub document: Utf8PathBuf,
}

/// A new directory whose label was already used by another category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelConflict {
    /// The shared label.
    pub label: String,
    /// Directory that received the linked descriptor.
    pub path: Utf8PathBuf,
    /// Directory that declared the label first.
    pub first: Utf8PathBuf,
}

/// Everything a run did, in the order it happened.
///
/// A report is returned even when the run stopped early; [`RunReport::failure`]
/// then holds the error and the other fields describe the work completed
/// before it.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub(crate) created: Vec<Artifact>,
    pub(crate) existing: Vec<Artifact>,
    pub(crate) duplicates: Vec<DuplicateRecord>,
    pub(crate) collisions: Vec<CollisionRecord>,
    pub(crate) label_conflicts: Vec<LabelConflict>,
    pub(crate) issues: Vec<CommandError>,
    pub(crate) failure: Option<CmdtreeError>,
}

impl RunReport {
    /// Returns the artifacts written by this run.
    #[must_use]
    pub fn created(&self) -> &[Artifact] {
        &self.created
    }

    /// Returns the artifacts that were already present and left untouched.
    #[must_use]
    pub fn existing(&self) -> &[Artifact] {
        &self.existing
    }

    /// Returns the commands that repeated an earlier one.
    #[must_use]
    pub fn duplicates(&self) -> &[DuplicateRecord] {
        &self.duplicates
    }

    /// Returns every collision met while folding, resolved or not.
    #[must_use]
    pub fn collisions(&self) -> &[CollisionRecord] {
        &self.collisions
    }

    /// Returns directories that were given a linked descriptor.
    #[must_use]
    pub fn label_conflicts(&self) -> &[LabelConflict] {
        &self.label_conflicts
    }

    /// Returns the commands that were rejected or dropped.
    #[must_use]
    pub fn issues(&self) -> &[CommandError] {
        &self.issues
    }

    /// Returns the error that stopped the run, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&CmdtreeError> {
        self.failure.as_ref()
    }

    /// Returns `true` unless the run stopped on a fatal error.
    ///
    /// Rejected commands do not make a run unsuccessful.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Returns the created artifact at `path`, if this run wrote it.
    #[must_use]
    pub fn created_at(&self, path: &Utf8Path) -> Option<&Artifact> {
        self.created.iter().find(|artifact| artifact.path.as_path() == path)
    }

    pub(crate) fn record_created(&mut self, path: impl Into<Utf8PathBuf>, kind: ArtifactKind) {
        self.created.push(Artifact::new(path, kind));
    }

    pub(crate) fn record_existing(&mut self, path: impl Into<Utf8PathBuf>, kind: ArtifactKind) {
        self.existing.push(Artifact::new(path, kind));
    }
}
