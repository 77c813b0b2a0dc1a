//! Entry points tying parsing, folding and emission together.

use std::{io, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use tracing::{Span, field, info, instrument, warn};

use crate::{
    collision::{CollisionRecord, CollisionStrategy},
    command::CommandParser,
    disk::{self, DiskSnapshot},
    emit::Emitter,
    error::{CmdtreeError, CommandError, FsOperation, Result},
    layout::LeafLayout,
    report::{DuplicateRecord, RunReport},
    template::Templates,
    tree::{CommandTree, InsertOutcome, NodeOrigin, TreeNode},
};

/// Scaffolds a documentation tree from command strings.
///
/// Construct one with [`crate::ScaffolderBuilder`].
///
/// # Examples
/// ```
/// use camino::Utf8Path;
/// use cmdtree_core::ScaffolderBuilder;
///
/// let scaffolder = ScaffolderBuilder::new().build().expect("defaults are valid");
/// let temp = tempfile::tempdir().expect("temp dir");
/// let root = Utf8Path::from_path(temp.path()).expect("UTF-8 path");
///
/// let report = scaffolder.run(root, &["acli network nic config get", "getlog"]);
/// assert!(report.is_success());
/// assert!(root.join("network/nic/config/get.md").is_file());
/// assert_eq!(report.issues().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Scaffolder {
    parser: CommandParser,
    layout: LeafLayout,
    strategy: Arc<dyn CollisionStrategy>,
    templates: Templates,
}

impl Scaffolder {
    pub(crate) fn new(
        parser: CommandParser,
        layout: LeafLayout,
        strategy: Arc<dyn CollisionStrategy>,
        templates: Templates,
    ) -> Self {
        Self {
            parser,
            layout,
            strategy,
            templates,
        }
    }

    /// Returns the command parser.
    #[must_use]
    pub const fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Returns the leaf layout.
    #[must_use]
    pub const fn layout(&self) -> LeafLayout {
        self.layout
    }

    /// Returns the templates used for generated files.
    #[must_use]
    pub const fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Folds `commands` into a fresh tree without touching the filesystem.
    #[must_use]
    pub fn plan<S: AsRef<str>>(&self, commands: &[S]) -> Plan {
        self.fold(CommandTree::new(self.layout), commands)
    }

    /// Folds `commands` on top of what already exists under `root`.
    ///
    /// A missing root plans against an empty tree.
    ///
    /// # Errors
    /// Returns [`CmdtreeError::Filesystem`] when `root` exists but cannot be
    /// opened or scanned.
    pub fn plan_against<S: AsRef<str>>(&self, root: &Utf8Path, commands: &[S]) -> Result<Plan> {
        let tree = match Dir::open_ambient_dir(root, ambient_authority()) {
            Ok(dir) => CommandTree::seeded(disk::scan(&dir)?.root, self.layout),
            Err(err) if err.kind() == io::ErrorKind::NotFound => CommandTree::new(self.layout),
            Err(err) => return Err(CmdtreeError::filesystem(FsOperation::OpenRoot, root, err)),
        };
        Ok(self.fold(tree, commands))
    }

    /// Scaffolds `commands` under `root`, creating it when missing.
    ///
    /// Per-command problems are collected in the report and never stop the
    /// run. The first filesystem failure does; the report then describes the
    /// work done before it and carries the error in [`RunReport::failure`].
    #[instrument(
        name = "core.run",
        skip_all,
        fields(
            root = %root,
            commands = commands.len(),
            layout = self.layout.as_str(),
            created = field::Empty,
            issues = field::Empty,
        ),
    )]
    pub fn run<S: AsRef<str>>(&self, root: &Utf8Path, commands: &[S]) -> RunReport {
        let mut report = RunReport::default();
        if let Err(err) = self.run_into(root, commands, &mut report) {
            warn!(error = %err, code = %err.code(), "run stopped");
            report.failure = Some(err);
        }
        let span = Span::current();
        span.record("created", report.created.len());
        span.record("issues", report.issues.len());
        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            duplicates = report.duplicates.len(),
            "run finished"
        );
        report
    }

    fn run_into<S: AsRef<str>>(
        &self,
        root: &Utf8Path,
        commands: &[S],
        report: &mut RunReport,
    ) -> Result<()> {
        let dir = open_root(root)?;
        let DiskSnapshot { root: seed, labels } = disk::scan(&dir)?;
        let plan = self.fold(CommandTree::seeded(seed, self.layout), commands);

        report.duplicates.clone_from(&plan.duplicates);
        report.collisions.clone_from(&plan.collisions);
        report.issues.clone_from(&plan.issues);
        Emitter::new(&self.templates, labels, report).emit(&dir, &plan.tree)
    }

    #[instrument(name = "core.fold", skip_all, fields(commands = commands.len()))]
    fn fold<S: AsRef<str>>(&self, mut tree: CommandTree, commands: &[S]) -> Plan {
        let mut duplicates = Vec::new();
        let mut collisions = Vec::new();
        let mut issues = Vec::new();
        for raw in commands {
            let raw = raw.as_ref();
            let command = match self.parser.parse(raw) {
                Ok(command) => command,
                Err(err) => {
                    warn!(command = raw, code = %err.code(), "rejected command: {err}");
                    issues.push(err);
                    continue;
                }
            };
            let insertion = tree.insert(&command, self.strategy.as_ref());
            collisions.extend(insertion.collisions);
            match insertion.outcome {
                InsertOutcome::Placed { .. } => {}
                InsertOutcome::Duplicate { document } => duplicates.push(DuplicateRecord {
                    command: raw.to_owned(),
                    document,
                }),
                InsertOutcome::Dropped(err) => issues.push(err),
            }
        }
        Plan {
            tree,
            duplicates,
            collisions,
            issues,
        }
    }
}

fn open_root(root: &Utf8Path) -> Result<Dir> {
    let open_error = |source| CmdtreeError::filesystem(FsOperation::OpenRoot, root, source);
    Dir::create_ambient_dir_all(root, ambient_authority()).map_err(open_error)?;
    Dir::open_ambient_dir(root, ambient_authority()).map_err(open_error)
}

/// A folded tree that has not been written.
#[derive(Debug, Clone)]
pub struct Plan {
    tree: CommandTree,
    duplicates: Vec<DuplicateRecord>,
    collisions: Vec<CollisionRecord>,
    issues: Vec<CommandError>,
}

impl Plan {
    /// Returns the folded tree.
    #[must_use]
    pub const fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Returns the commands that repeated an earlier one.
    #[must_use]
    pub fn duplicates(&self) -> &[DuplicateRecord] {
        &self.duplicates
    }

    /// Returns every collision met while folding.
    #[must_use]
    pub fn collisions(&self) -> &[CollisionRecord] {
        &self.collisions
    }

    /// Returns the commands that were rejected or dropped.
    #[must_use]
    pub fn issues(&self) -> &[CommandError] {
        &self.issues
    }

    /// Lists the paths a run would materialize, directories first in
    /// insertion order, relative to the documentation root.
    #[must_use]
    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        let mut out = Vec::new();
        collect_paths(self.tree.root(), Utf8Path::new(""), &mut out);
        out
    }

    /// Renders the touched part of the tree as an indented outline.
    ///
    /// Directories end in `/`; entries already on disk are marked.
    ///
    /// # Examples
    /// ```
    /// use cmdtree_core::ScaffolderBuilder;
    ///
    /// let scaffolder = ScaffolderBuilder::new().build().expect("defaults are valid");
    /// let plan = scaffolder.plan(&["acli log get", "acli log level set"]);
    /// assert_eq!(plan.outline(), "log/\n  get.md\n  level/\n    set.md\n");
    /// ```
    #[must_use]
    pub fn outline(&self) -> String {
        let mut out = String::new();
        write_outline(self.tree.root(), 0, &mut out);
        out
    }
}

fn touched(node: &TreeNode) -> impl Iterator<Item = &TreeNode> {
    node.children()
        .iter()
        .filter(|child| !child.source_commands().is_empty())
}

fn collect_paths(node: &TreeNode, rel: &Utf8Path, out: &mut Vec<Utf8PathBuf>) {
    for child in touched(node) {
        let path = rel.join(child.name());
        if child.is_leaf() {
            out.push(crate::tree::document_path(&path));
        } else {
            out.push(path.clone());
            collect_paths(child, &path, out);
        }
    }
}

fn write_outline(node: &TreeNode, depth: usize, out: &mut String) {
    for child in touched(node) {
        let indent = "  ".repeat(depth);
        let marker = if child.origin() == NodeOrigin::OnDisk {
            "  (exists)"
        } else {
            ""
        };
        let suffix = if child.is_leaf() { ".md" } else { "/" };
        out.push_str(&format!("{indent}{}{suffix}{marker}\n", child.name()));
        if !child.is_leaf() {
            write_outline(child, depth + 1, out);
        }
    }
}
