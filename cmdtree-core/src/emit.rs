//! Depth-first emission of a folded tree onto the documentation root.
//!
//! Nothing is ever overwritten: directories are created when missing,
//! files are created with `create_new`, and whatever already exists is
//! recorded as existing. The first filesystem error stops the walk.

use std::{
    collections::BTreeMap,
    io::{self, Write},
};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::{Dir, OpenOptions};
use tracing::{debug, info, instrument, warn};

use crate::{
    disk::CATEGORY_FILE,
    error::{CmdtreeError, FsOperation, Result},
    report::{ArtifactKind, LabelConflict, RunReport},
    template::{CATEGORY_INDEX_STEM, Templates},
    tree::{CommandTree, NodeKind, TreeNode, document_path},
};

/// Writes the artifacts of one run.
pub(crate) struct Emitter<'a> {
    templates: &'a Templates,
    /// Category labels mapped to the first directory declaring them.
    labels: BTreeMap<String, Utf8PathBuf>,
    report: &'a mut RunReport,
}

impl<'a> Emitter<'a> {
    pub(crate) const fn new(
        templates: &'a Templates,
        labels: BTreeMap<String, Utf8PathBuf>,
        report: &'a mut RunReport,
    ) -> Self {
        Self {
            templates,
            labels,
            report,
        }
    }

    /// Emits every node of `tree` that a command of this run touched.
    #[instrument(name = "core.emit", err, skip_all, fields(layout = tree.layout().as_str()))]
    pub(crate) fn emit(&mut self, root: &Dir, tree: &CommandTree) -> Result<()> {
        self.emit_children(root, Utf8Path::new(""), tree.root())
    }

    fn emit_children(&mut self, dir: &Dir, rel: &Utf8Path, node: &TreeNode) -> Result<()> {
        for (index, child) in node.children().iter().enumerate() {
            // Untouched entries were only seeded from disk.
            if child.source_commands().is_empty() {
                continue;
            }
            let position = index + 1;
            match child.kind() {
                NodeKind::Internal => self.emit_directory(dir, rel, child, position)?,
                NodeKind::Leaf => self.emit_document(dir, rel, child, position)?,
            }
        }
        Ok(())
    }

    fn emit_directory(
        &mut self,
        parent: &Dir,
        rel: &Utf8Path,
        node: &TreeNode,
        position: usize,
    ) -> Result<()> {
        let name = node.name();
        let path = rel.join(name);
        let created = match parent.create_dir(name) {
            Ok(()) => {
                info!(path = %path, "created directory");
                self.report.record_created(path.as_path(), ArtifactKind::Directory);
                true
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path, "directory exists");
                self.report.record_existing(path.as_path(), ArtifactKind::Directory);
                false
            }
            Err(err) => return Err(CmdtreeError::filesystem(FsOperation::CreateDir, path, err)),
        };

        let dir = parent
            .open_dir(name)
            .map_err(|source| CmdtreeError::filesystem(FsOperation::OpenDir, &path, source))?;
        if created {
            self.describe(&dir, &path, node, position)?;
        }
        self.emit_children(&dir, &path, node)
    }

    /// Writes the descriptor of a directory created by this run.
    fn describe(
        &mut self,
        dir: &Dir,
        path: &Utf8Path,
        node: &TreeNode,
        position: usize,
    ) -> Result<()> {
        let label = node.name();
        let descriptor_path = path.join(CATEGORY_FILE);
        let Some(first) = self.labels.get(label).cloned() else {
            self.labels.insert(label.to_owned(), path.to_owned());
            let body = self.templates.category(label, position);
            return self.write(dir, &descriptor_path, &body, ArtifactKind::Descriptor);
        };

        warn!(label, path = %path, first = %first, "category label already in use");
        let index_id = path.join(index_stem(node));
        let body = self.templates.conflicting_category(label, position, &index_id);
        self.write(dir, &descriptor_path, &body, ArtifactKind::Descriptor)?;
        let index_path = document_path(&index_id);
        let index = self.templates.category_index(path, 1);
        self.write(dir, &index_path, &index, ArtifactKind::CategoryIndex)?;
        self.report.label_conflicts.push(LabelConflict {
            label: label.to_owned(),
            path: path.to_owned(),
            first,
        });
        Ok(())
    }

    fn emit_document(
        &mut self,
        dir: &Dir,
        rel: &Utf8Path,
        node: &TreeNode,
        position: usize,
    ) -> Result<()> {
        let node_path = rel.join(node.name());
        let body = self
            .templates
            .document(&node_path, position, node.source_commands());
        self.write(dir, &document_path(&node_path), &body, ArtifactKind::Document)
    }

    /// Creates the file at `path` unless something already occupies it.
    fn write(&mut self, dir: &Dir, path: &Utf8Path, body: &str, kind: ArtifactKind) -> Result<()> {
        let Some(name) = path.file_name() else {
            return Ok(());
        };
        let opened = dir.open_with(name, OpenOptions::new().write(true).create_new(true));
        let mut file = match opened {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path, kind = kind.as_str(), "file exists");
                self.report.record_existing(path, kind);
                return Ok(());
            }
            Err(err) => return Err(CmdtreeError::filesystem(FsOperation::WriteFile, path, err)),
        };
        file.write_all(body.as_bytes())
            .map_err(|source| CmdtreeError::filesystem(FsOperation::WriteFile, path, source))?;
        info!(path = %path, kind = kind.as_str(), "created file");
        self.report.record_created(path, kind);
        Ok(())
    }
}

/// Picks `category`, then `category-2`, ... until no child of `node` holds it.
fn index_stem(node: &TreeNode) -> String {
    let mut stem = CATEGORY_INDEX_STEM.to_owned();
    let mut counter = 2_usize;
    while node.child(&stem).is_some() {
        stem = format!("{CATEGORY_INDEX_STEM}-{counter}");
        counter += 1;
    }
    stem
}
