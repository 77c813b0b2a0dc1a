//! cmdtree core library.
//!
//! Turns hierarchical command strings such as `acli network nic config get`
//! into a Docusaurus directory tree: one `_category_.json` per directory and
//! one Markdown scaffold per command document.

mod builder;
mod collision;
mod command;
mod disk;
mod emit;
mod error;
mod layout;
mod report;
mod scaffolder;
mod template;
mod tree;

pub use crate::{
    builder::ScaffolderBuilder,
    collision::{
        AppliedResolution, Collision, CollisionKind, CollisionPolicy, CollisionRecord,
        CollisionStrategy, DEFAULT_ENTRY, DEFAULT_RENAME_SUFFIX, Resolution,
    },
    command::{CommandParser, DEFAULT_INVOCATION, ParsedCommand},
    disk::{CATEGORY_FILE, DOCUMENT_EXTENSION},
    error::{
        CmdtreeError, CmdtreeErrorCode, CommandError, CommandErrorCode, FsOperation,
        MalformedReason, Result,
    },
    layout::LeafLayout,
    report::{Artifact, ArtifactKind, DuplicateRecord, LabelConflict, RunReport},
    scaffolder::{Plan, Scaffolder},
    template::{
        CATEGORY_INDEX_STEM, CATEGORY_INDEX_TEMPLATE, CATEGORY_TEMPLATE,
        CONFLICTING_CATEGORY_TEMPLATE, DOCUMENT_TEMPLATE, Templates,
    },
    tree::{CommandTree, InsertOutcome, Insertion, NodeKind, NodeOrigin, TreeNode, document_path},
};
