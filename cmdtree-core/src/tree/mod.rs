//! The command tree and the fold that merges parsed commands into it.
//!
//! Children keep insertion order so generated navigation follows the order
//! commands were supplied in. Each insertion runs against a staged copy of
//! the tree and is committed only when every collision along the path was
//! resolved, so a dropped command leaves no trace behind.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::{
    collision::{
        AppliedResolution, Collision, CollisionKind, CollisionRecord, CollisionStrategy,
        Resolution,
    },
    command::{ParsedCommand, is_path_safe},
    error::{CommandError, MalformedReason},
    layout::LeafLayout,
};

/// Whether a node becomes a directory or a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// Materialized as a directory with a category descriptor.
    Internal,
    /// Materialized as a document file.
    Leaf,
}

/// Where a node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOrigin {
    /// Implied by an input command in this run.
    Planned,
    /// Found under the documentation root when the run started.
    OnDisk,
}

/// One path segment of the command tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    name: String,
    kind: NodeKind,
    origin: NodeOrigin,
    children: Vec<TreeNode>,
    source_commands: Vec<String>,
}

impl TreeNode {
    pub(crate) fn root() -> Self {
        Self::internal("", NodeOrigin::Planned)
    }

    pub(crate) fn internal(name: impl Into<String>, origin: NodeOrigin) -> Self {
        Self::new(name.into(), NodeKind::Internal, origin)
    }

    pub(crate) fn leaf(name: impl Into<String>, origin: NodeOrigin) -> Self {
        Self::new(name.into(), NodeKind::Leaf, origin)
    }

    const fn new(name: String, kind: NodeKind, origin: NodeOrigin) -> Self {
        Self {
            name,
            kind,
            origin,
            children: Vec::new(),
            source_commands: Vec::new(),
        }
    }

    /// Returns the segment text; empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the node is a directory or a document.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns whether the node is a document.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// Returns where the node came from.
    #[must_use]
    pub const fn origin(&self) -> NodeOrigin {
        self.origin
    }

    /// Returns the children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns the canonical commands that touched this node, first-seen order.
    #[must_use]
    pub fn source_commands(&self) -> &[String] {
        &self.source_commands
    }

    /// Returns the direct child called `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Follows `path` from this node, one segment per component.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use cmdtree_core::{CommandTree, CollisionPolicy, CommandParser, LeafLayout};
    ///
    /// let mut tree = CommandTree::new(LeafLayout::ActionDocument);
    /// let command = CommandParser::default().parse("acli network nic get").expect("valid");
    /// tree.insert(&command, &CollisionPolicy::default());
    /// let nic = tree.root().find(Utf8Path::new("network/nic")).expect("nic exists");
    /// assert!(!nic.is_leaf());
    /// ```
    #[must_use]
    pub fn find(&self, path: &Utf8Path) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    pub(crate) fn push_child(&mut self, child: Self) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|child| child.name == name)
    }

    fn child_kind(&self, name: &str) -> Option<NodeKind> {
        self.child(name).map(Self::kind)
    }

    fn touch(&mut self, command: &str) {
        if !self.source_commands.iter().any(|known| known == command) {
            self.source_commands.push(command.to_owned());
        }
    }

    fn with_command(mut self, command: &str) -> Self {
        self.touch(command);
        self
    }

    fn absorb(&mut self, other: Self) {
        for command in other.source_commands {
            self.touch(&command);
        }
    }
}

/// Returns the document file path for a leaf at `node_path`.
///
/// Segments may themselves contain dots, so the extension is appended rather
/// than substituted.
#[must_use]
pub fn document_path(node_path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{node_path}.md"))
}

/// Result of folding one command into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The command is documented at `document`.
    Placed {
        /// Document path relative to the tree root.
        document: Utf8PathBuf,
    },
    /// An identical command was already placed; nothing changed.
    Duplicate {
        /// Document that already covers the command.
        document: Utf8PathBuf,
    },
    /// The command could not be placed and the tree is unchanged.
    Dropped(CommandError),
}

/// Outcome of [`CommandTree::insert`] together with any collisions met on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// What happened to the command.
    pub outcome: InsertOutcome,
    /// Collisions encountered, in path order.
    pub collisions: Vec<CollisionRecord>,
}

impl Insertion {
    const fn without_collisions(outcome: InsertOutcome) -> Self {
        Self {
            outcome,
            collisions: Vec::new(),
        }
    }
}

/// Ordered tree built from parsed commands.
///
/// # Examples
/// ```
/// use cmdtree_core::{CollisionPolicy, CommandParser, CommandTree, InsertOutcome, LeafLayout};
///
/// let parser = CommandParser::default();
/// let policy = CollisionPolicy::default();
/// let mut tree = CommandTree::new(LeafLayout::ActionDocument);
///
/// let first = parser.parse("acli network nic config get").expect("valid");
/// let again = parser.parse("acli network  nic config get").expect("valid");
/// assert!(matches!(tree.insert(&first, &policy).outcome, InsertOutcome::Placed { .. }));
/// assert!(matches!(tree.insert(&again, &policy).outcome, InsertOutcome::Duplicate { .. }));
/// assert_eq!(tree.root().children().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CommandTree {
    root: TreeNode,
    layout: LeafLayout,
    accepted: HashMap<Vec<String>, Utf8PathBuf>,
}

impl CommandTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new(layout: LeafLayout) -> Self {
        Self::seeded(TreeNode::root(), layout)
    }

    pub(crate) fn seeded(root: TreeNode, layout: LeafLayout) -> Self {
        Self {
            root,
            layout,
            accepted: HashMap::new(),
        }
    }

    /// Returns the root node; its children are the top-level entries.
    #[must_use]
    pub const fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Returns the leaf layout used when placing commands.
    #[must_use]
    pub const fn layout(&self) -> LeafLayout {
        self.layout
    }

    /// Folds `command` into the tree, consulting `strategy` on collisions.
    pub fn insert(&mut self, command: &ParsedCommand, strategy: &dyn CollisionStrategy) -> Insertion {
        if let Some(document) = self.accepted.get(command.segments()) {
            debug!(command = %command, document = %document, "duplicate command");
            return Insertion::without_collisions(InsertOutcome::Duplicate {
                document: document.clone(),
            });
        }

        let Some((dirs, doc)) = self.layout.split(command.segments()) else {
            return Insertion::without_collisions(InsertOutcome::Dropped(
                CommandError::MalformedCommand {
                    command: command.raw().to_owned(),
                    reason: MalformedReason::TooFewSegments {
                        found: command.segments().len(),
                    },
                },
            ));
        };

        let mut staged = self.root.clone();
        let mut placement = Placement {
            command,
            strategy,
            collisions: Vec::new(),
        };
        let placed = placement.place(&mut staged, dirs, doc);
        let collisions = placement.collisions;

        match placed {
            Ok(node_path) => {
                let document = document_path(&node_path);
                self.root = staged;
                self.accepted
                    .insert(command.segments().to_vec(), document.clone());
                Insertion {
                    outcome: InsertOutcome::Placed { document },
                    collisions,
                }
            }
            Err(path) => Insertion {
                outcome: InsertOutcome::Dropped(CommandError::CollisionUnresolved {
                    path,
                    command: command.canonical().to_owned(),
                }),
                collisions,
            },
        }
    }
}

/// Walks one command into a staged tree. Errors carry the contested path.
struct Placement<'a> {
    command: &'a ParsedCommand,
    strategy: &'a dyn CollisionStrategy,
    collisions: Vec<CollisionRecord>,
}

type Placed<T> = Result<T, Utf8PathBuf>;

impl Placement<'_> {
    fn place(&mut self, root: &mut TreeNode, dirs: &[String], doc: &str) -> Placed<Utf8PathBuf> {
        let mut node = root;
        let mut path = Utf8PathBuf::new();
        for segment in dirs {
            path.push(segment);
            node = self.descend(node, segment, &path)?;
        }
        self.attach(node, doc, &path)
    }

    fn descend<'n>(
        &mut self,
        parent: &'n mut TreeNode,
        name: &str,
        path: &Utf8Path,
    ) -> Placed<&'n mut TreeNode> {
        let index = match parent.position_of(name) {
            None => parent.push_child(TreeNode::internal(name, NodeOrigin::Planned)),
            Some(index) => {
                if parent.children[index].is_leaf() {
                    self.demote(parent, index, path)?;
                }
                index
            }
        };
        let child = &mut parent.children[index];
        child.touch(self.command.canonical());
        Ok(child)
    }

    /// Turns the leaf at `index` into a directory so the walk can continue.
    fn demote(&mut self, parent: &mut TreeNode, index: usize, path: &Utf8Path) -> Placed<()> {
        let kind = CollisionKind::DirectoryBlockedByLeaf;
        let existing = parent.children[index].source_commands.clone();
        let resolution = self.resolve(kind, path, &existing);
        let name = parent.children[index].name.clone();
        let on_disk = parent.children[index].origin == NodeOrigin::OnDisk;

        let applied = match resolution {
            Resolution::Skip => None,
            // Files already on disk stay where they are.
            _ if on_disk => {
                parent.children[index] = TreeNode::internal(name.as_str(), NodeOrigin::Planned);
                Some(AppliedResolution::KeptBeside {
                    document: document_path(path),
                })
            }
            Resolution::RenameLeaf { suffix } => {
                let leaf = std::mem::replace(
                    &mut parent.children[index],
                    TreeNode::internal(name.as_str(), NodeOrigin::Planned),
                );
                unique_sibling(parent, &name, &suffix).map(|renamed| {
                    let to = path.with_file_name(&renamed);
                    insert_leaf(parent, leaf, &renamed, index + 1);
                    AppliedResolution::Renamed { to }
                })
            }
            Resolution::NestLeaf { entry } if is_path_safe(&entry) => {
                let mut leaf = std::mem::replace(
                    &mut parent.children[index],
                    TreeNode::internal(name.as_str(), NodeOrigin::Planned),
                );
                leaf.name.clone_from(&entry);
                leaf.origin = NodeOrigin::Planned;
                let directory = &mut parent.children[index];
                directory.absorb(leaf.clone());
                directory.push_child(leaf);
                Some(AppliedResolution::Nested {
                    to: path.join(&entry),
                })
            }
            Resolution::NestLeaf { .. } => None,
        };

        self.finish(kind, path, existing, applied)
    }

    /// Places the document segment under `parent`.
    fn attach(&mut self, parent: &mut TreeNode, name: &str, dir: &Utf8Path) -> Placed<Utf8PathBuf> {
        let node_path = dir.join(name);
        let command = self.command;
        let canonical = command.canonical();
        let Some(index) = parent.position_of(name) else {
            parent.push_child(TreeNode::leaf(name, NodeOrigin::Planned).with_command(canonical));
            return Ok(node_path);
        };
        if parent.children[index].is_leaf() {
            parent.children[index].touch(canonical);
            return Ok(node_path);
        }

        let kind = CollisionKind::LeafBlockedByDirectory;
        let existing = parent.children[index].source_commands.clone();
        let applied = match self.resolve(kind, &node_path, &existing) {
            Resolution::Skip => None,
            Resolution::RenameLeaf { suffix } => {
                unique_sibling(parent, name, &suffix).map(|renamed| {
                    let leaf = TreeNode::leaf(renamed.as_str(), NodeOrigin::Planned)
                        .with_command(canonical);
                    insert_leaf(parent, leaf, &renamed, index + 1);
                    AppliedResolution::Renamed {
                        to: dir.join(&renamed),
                    }
                })
            }
            Resolution::NestLeaf { entry } => {
                let directory = &mut parent.children[index];
                match directory.child_kind(&entry) {
                    Some(NodeKind::Internal) => None,
                    _ if !is_path_safe(&entry) => None,
                    _ => {
                        let leaf = TreeNode::leaf(entry.as_str(), NodeOrigin::Planned)
                            .with_command(canonical);
                        let at = directory.children.len();
                        insert_leaf(directory, leaf, &entry, at);
                        directory.touch(canonical);
                        Some(AppliedResolution::Nested {
                            to: node_path.join(&entry),
                        })
                    }
                }
            }
        };

        let to = match &applied {
            Some(AppliedResolution::Renamed { to } | AppliedResolution::Nested { to }) => {
                Some(to.clone())
            }
            _ => None,
        };
        self.finish(kind, &node_path, existing, applied)?;
        to.ok_or(node_path)
    }

    fn resolve(&self, kind: CollisionKind, path: &Utf8Path, existing: &[String]) -> Resolution {
        self.strategy.resolve(&Collision {
            kind,
            path,
            incoming: self.command.canonical(),
            existing,
        })
    }

    /// Records the collision and converts an unresolved one into an error.
    fn finish(
        &mut self,
        kind: CollisionKind,
        path: &Utf8Path,
        mut commands: Vec<String>,
        applied: Option<AppliedResolution>,
    ) -> Placed<()> {
        commands.push(self.command.canonical().to_owned());
        let resolution = applied.unwrap_or(AppliedResolution::Skipped);
        let resolved = resolution != AppliedResolution::Skipped;
        if resolved {
            info!(path = %path, kind = kind.as_str(), resolution = %resolution, "collision resolved");
        } else {
            warn!(
                path = %path,
                kind = kind.as_str(),
                command = %self.command,
                "collision unresolved; command dropped"
            );
        }
        self.collisions.push(CollisionRecord {
            path: path.to_owned(),
            kind,
            commands,
            resolution,
        });
        if resolved { Ok(()) } else { Err(path.to_owned()) }
    }
}

/// Picks `<base><suffix>`, then `<base><suffix>-2`, ... until the name is free
/// or held by a document that can absorb another command.
fn unique_sibling(parent: &TreeNode, base: &str, suffix: &str) -> Option<String> {
    let stem = format!("{base}{suffix}");
    if stem == base || !is_path_safe(&stem) {
        return None;
    }
    let mut candidate = stem.clone();
    let mut counter = 2_usize;
    while parent.child_kind(&candidate) == Some(NodeKind::Internal) {
        candidate = format!("{stem}-{counter}");
        counter += 1;
    }
    Some(candidate)
}

/// Adds `leaf` as `name`, merging into an existing leaf of that name.
fn insert_leaf(parent: &mut TreeNode, mut leaf: TreeNode, name: &str, at: usize) {
    match parent.position_of(name) {
        Some(index) => parent.children[index].absorb(leaf),
        None => {
            leaf.name = name.to_owned();
            leaf.origin = NodeOrigin::Planned;
            let at = at.min(parent.children.len());
            parent.children.insert(at, leaf);
        }
    }
}

#[cfg(test)]
mod tests;
