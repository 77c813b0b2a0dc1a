//! One-shot scan of an existing documentation root.
//!
//! The scan seeds the command tree with what a previous run (or a human)
//! already put on disk and collects the category labels already in use.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::{CmdtreeError, FsOperation, Result},
    tree::{NodeOrigin, TreeNode},
};

/// File name of the category descriptor inside every generated directory.
pub const CATEGORY_FILE: &str = "_category_.json";

/// Extension of generated documents.
pub const DOCUMENT_EXTENSION: &str = "md";

/// What the documentation root looked like before the run.
#[derive(Debug, Clone)]
pub(crate) struct DiskSnapshot {
    pub(crate) root: TreeNode,
    /// Category labels mapped to the first directory declaring them.
    pub(crate) labels: BTreeMap<String, Utf8PathBuf>,
}

#[derive(Deserialize)]
struct DeclaredLabel {
    label: Option<String>,
}

/// Reads the directory tree under `dir`.
///
/// Directories become internal nodes and `*.md` files become leaves; other
/// files and hidden entries are ignored. A document sharing its stem with a
/// sibling directory is left out of the tree, the directory wins.
#[instrument(name = "core.scan", err, skip(dir))]
pub(crate) fn scan(dir: &Dir) -> Result<DiskSnapshot> {
    let mut snapshot = DiskSnapshot {
        root: TreeNode::root(),
        labels: BTreeMap::new(),
    };
    scan_into(dir, Utf8Path::new(""), &mut snapshot.root, &mut snapshot.labels)?;
    debug!(labels = snapshot.labels.len(), "scanned documentation root");
    Ok(snapshot)
}

fn scan_into(
    dir: &Dir,
    rel: &Utf8Path,
    node: &mut TreeNode,
    labels: &mut BTreeMap<String, Utf8PathBuf>,
) -> Result<()> {
    let scan_error = |source| CmdtreeError::filesystem(FsOperation::Scan, rel, source);

    let mut directories = Vec::new();
    let mut documents = Vec::new();
    let mut has_descriptor = false;
    for entry in dir.entries().map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        let name = entry.file_name().map_err(scan_error)?;
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(scan_error)?;
        if file_type.is_dir() {
            directories.push(name);
        } else if name == CATEGORY_FILE {
            has_descriptor = true;
        } else if let Some(stem) = document_stem(&name) {
            documents.push(stem.to_owned());
        }
    }
    directories.sort();
    documents.sort();

    if has_descriptor && !rel.as_str().is_empty() {
        if let Some(label) = read_label(dir) {
            labels.entry(label).or_insert_with(|| rel.to_owned());
        }
    }

    for name in &directories {
        let child_rel = rel.join(name);
        let child_dir = dir
            .open_dir(name)
            .map_err(|source| CmdtreeError::filesystem(FsOperation::OpenDir, &child_rel, source))?;
        let mut child = TreeNode::internal(name.as_str(), NodeOrigin::OnDisk);
        scan_into(&child_dir, &child_rel, &mut child, labels)?;
        node.push_child(child);
    }
    for stem in documents {
        if directories.contains(&stem) {
            continue;
        }
        node.push_child(TreeNode::leaf(stem, NodeOrigin::OnDisk));
    }
    Ok(())
}

fn document_stem(name: &str) -> Option<&str> {
    name.strip_suffix(DOCUMENT_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|stem| !stem.is_empty())
}

/// Returns the label of the descriptor in `dir`, if it can be read.
///
/// Hand-edited descriptors may be invalid; those are skipped rather than
/// failing the run.
fn read_label(dir: &Dir) -> Option<String> {
    let raw = match dir.read_to_string(CATEGORY_FILE) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(error = %err, "unreadable category descriptor");
            return None;
        }
    };
    match serde_json::from_str::<DeclaredLabel>(&raw) {
        Ok(declared) => declared.label,
        Err(err) => {
            debug!(error = %err, "category descriptor is not valid JSON");
            None
        }
    }
}
