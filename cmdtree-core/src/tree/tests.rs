//! Unit tests for the command tree fold and collision handling.

use super::*;

use camino::Utf8Path;
use rstest::rstest;

use crate::collision::{CollisionPolicy, DEFAULT_ENTRY, DEFAULT_RENAME_SUFFIX};
use crate::command::CommandParser;

fn parse(raw: &str) -> ParsedCommand {
    CommandParser::default()
        .parse(raw)
        .expect("test command must parse")
}

fn fold(layout: LeafLayout, policy: &CollisionPolicy, commands: &[&str]) -> (CommandTree, Vec<Insertion>) {
    let mut tree = CommandTree::new(layout);
    let insertions = commands
        .iter()
        .map(|raw| tree.insert(&parse(raw), policy))
        .collect();
    (tree, insertions)
}

fn rename() -> CollisionPolicy {
    CollisionPolicy::RenameWithSuffix {
        suffix: DEFAULT_RENAME_SUFFIX.to_owned(),
    }
}

/// Lists `(path, kind)` for every node below the root in depth-first order.
fn outline(tree: &CommandTree) -> Vec<(String, NodeKind)> {
    fn walk(node: &TreeNode, prefix: &Utf8Path, out: &mut Vec<(String, NodeKind)>) {
        for child in node.children() {
            let path = prefix.join(child.name());
            out.push((path.to_string(), child.kind()));
            walk(child, &path, out);
        }
    }
    let mut out = Vec::new();
    walk(tree.root(), Utf8Path::new(""), &mut out);
    out
}

fn node<'t>(tree: &'t CommandTree, path: &str) -> &'t TreeNode {
    tree.root()
        .find(Utf8Path::new(path))
        .unwrap_or_else(|| panic!("node `{path}` must exist"))
}

#[rstest]
fn shared_prefix_forms_one_chain() {
    let (tree, _) = fold(
        LeafLayout::ActionDocument,
        &CollisionPolicy::default(),
        &[
            "acli network nic config get",
            "acli network nic config set",
            "acli network route list",
        ],
    );
    assert_eq!(
        outline(&tree),
        vec![
            ("network".to_owned(), NodeKind::Internal),
            ("network/nic".to_owned(), NodeKind::Internal),
            ("network/nic/config".to_owned(), NodeKind::Internal),
            ("network/nic/config/get".to_owned(), NodeKind::Leaf),
            ("network/nic/config/set".to_owned(), NodeKind::Leaf),
            ("network/route".to_owned(), NodeKind::Internal),
            ("network/route/list".to_owned(), NodeKind::Leaf),
        ]
    );
    assert_eq!(node(&tree, "network").source_commands().len(), 3);
}

#[rstest]
fn identical_command_is_a_duplicate() {
    let (tree, insertions) = fold(
        LeafLayout::ActionDocument,
        &CollisionPolicy::default(),
        &["acli log get", "acli  log get"],
    );
    assert_eq!(
        insertions[1].outcome,
        InsertOutcome::Duplicate {
            document: "log/get.md".into()
        }
    );
    assert!(insertions[1].collisions.is_empty());
    assert_eq!(node(&tree, "log/get").source_commands(), ["acli log get"]);
}

#[rstest]
fn action_layout_places_each_action_in_its_own_document() {
    let (tree, insertions) = fold(
        LeafLayout::ActionDocument,
        &CollisionPolicy::default(),
        &["acli network nic config get", "acli system config change"],
    );
    assert_eq!(
        insertions[0].outcome,
        InsertOutcome::Placed {
            document: "network/nic/config/get.md".into()
        }
    );
    assert_eq!(
        insertions[1].outcome,
        InsertOutcome::Placed {
            document: "system/config/change.md".into()
        }
    );
    let names: Vec<&str> = tree.root().children().iter().map(TreeNode::name).collect();
    assert_eq!(names, ["network", "system"]);
}

#[rstest]
fn object_layout_folds_actions_into_the_object_document() {
    let (tree, insertions) = fold(
        LeafLayout::ObjectDocument,
        &CollisionPolicy::default(),
        &[
            "acli network nic config get",
            "acli system config change",
            "acli system config show",
        ],
    );
    assert_eq!(
        insertions[1].outcome,
        InsertOutcome::Placed {
            document: "system/config.md".into()
        }
    );
    let config = node(&tree, "system/config");
    assert!(config.is_leaf());
    assert_eq!(
        config.source_commands(),
        ["acli system config change", "acli system config show"]
    );
    assert!(node(&tree, "network/nic/config").is_leaf());
}

#[rstest]
#[case::leaf_first(&["acli log get", "acli log level set"], CollisionKind::DirectoryBlockedByLeaf)]
#[case::directory_first(&["acli log level set", "acli log get"], CollisionKind::LeafBlockedByDirectory)]
fn object_layout_detects_collision_at_log(#[case] commands: &[&str], #[case] kind: CollisionKind) {
    let (tree, insertions) = fold(
        LeafLayout::ObjectDocument,
        &CollisionPolicy::default(),
        commands,
    );
    let collision = insertions
        .iter()
        .flat_map(|insertion| insertion.collisions.iter())
        .next()
        .expect("a collision must be recorded");
    assert_eq!(collision.path, "log");
    assert_eq!(collision.kind, kind);
    assert_eq!(collision.commands.len(), 2);
    assert_eq!(
        collision.resolution,
        AppliedResolution::Nested {
            to: format!("log/{DEFAULT_ENTRY}").into()
        }
    );

    let log = node(&tree, "log");
    assert!(!log.is_leaf());
    assert_eq!(node(&tree, "log/index").source_commands(), ["acli log get"]);
    assert_eq!(node(&tree, "log/level").source_commands(), ["acli log level set"]);
}

#[rstest]
fn merge_as_default_is_order_independent() {
    let forward = fold(
        LeafLayout::ObjectDocument,
        &CollisionPolicy::default(),
        &["acli log get", "acli log level set"],
    )
    .0;
    let backward = fold(
        LeafLayout::ObjectDocument,
        &CollisionPolicy::default(),
        &["acli log level set", "acli log get"],
    )
    .0;
    let mut forward = outline(&forward);
    let mut backward = outline(&backward);
    forward.sort();
    backward.sort();
    assert_eq!(forward, backward);
}

#[rstest]
#[case::leaf_first(&["acli log get", "acli log level set"], 1)]
#[case::directory_first(&["acli log level set", "acli log get"], 1)]
fn skip_drops_the_later_command(#[case] commands: &[&str], #[case] dropped: usize) {
    let (tree, insertions) = fold(LeafLayout::ObjectDocument, &CollisionPolicy::Skip, commands);
    let InsertOutcome::Dropped(err) = &insertions[dropped].outcome else {
        panic!("command must be dropped: {:?}", insertions[dropped]);
    };
    assert_eq!(
        *err,
        CommandError::CollisionUnresolved {
            path: "log".into(),
            command: commands[dropped].to_owned(),
        }
    );
    assert_eq!(insertions[dropped].collisions[0].resolution, AppliedResolution::Skipped);
    assert_eq!(tree.root().children().len(), 1);
}

#[rstest]
fn skipped_command_leaves_no_partial_directories() {
    let (tree, insertions) = fold(
        LeafLayout::ActionDocument,
        &CollisionPolicy::Skip,
        &["acli log get", "acli log get detail verbose"],
    );
    assert!(matches!(insertions[1].outcome, InsertOutcome::Dropped(_)));
    assert_eq!(
        outline(&tree),
        vec![
            ("log".to_owned(), NodeKind::Internal),
            ("log/get".to_owned(), NodeKind::Leaf),
        ]
    );
}

#[rstest]
fn rename_moves_blocking_leaf_to_suffixed_sibling() {
    let (tree, insertions) = fold(
        LeafLayout::ObjectDocument,
        &rename(),
        &["acli log get", "acli log level set", "acli log set"],
    );
    assert_eq!(
        insertions[1].collisions[0].resolution,
        AppliedResolution::Renamed {
            to: "log-command".into()
        }
    );
    assert_eq!(
        insertions[2].outcome,
        InsertOutcome::Placed {
            document: "log-command.md".into()
        }
    );
    assert_eq!(
        outline(&tree),
        vec![
            ("log".to_owned(), NodeKind::Internal),
            ("log/level".to_owned(), NodeKind::Leaf),
            ("log-command".to_owned(), NodeKind::Leaf),
        ]
    );
    assert_eq!(
        node(&tree, "log-command").source_commands(),
        ["acli log get", "acli log set"]
    );
}

#[rstest]
fn rename_counts_past_directories_holding_the_suffixed_name() {
    let (tree, insertions) = fold(
        LeafLayout::ActionDocument,
        &rename(),
        &["acli log get detail", "acli log get-command x", "acli log get"],
    );
    assert_eq!(
        insertions[2].outcome,
        InsertOutcome::Placed {
            document: "log/get-command-2.md".into()
        }
    );
    assert!(node(&tree, "log/get-command-2").is_leaf());
}

#[rstest]
fn merge_reports_unresolved_when_entry_is_a_directory() {
    let (_, insertions) = fold(
        LeafLayout::ActionDocument,
        &CollisionPolicy::default(),
        &["acli log get index now", "acli log get"],
    );
    assert!(matches!(
        insertions[1].outcome,
        InsertOutcome::Dropped(CommandError::CollisionUnresolved { .. })
    ));
    assert_eq!(insertions[1].collisions[0].resolution, AppliedResolution::Skipped);
}

#[rstest]
fn sibling_order_follows_input_order() {
    let (tree, _) = fold(
        LeafLayout::ActionDocument,
        &CollisionPolicy::default(),
        &["acli zeta a", "acli alpha b", "acli mid c", "acli alpha a"],
    );
    let names: Vec<&str> = tree.root().children().iter().map(TreeNode::name).collect();
    assert_eq!(names, ["zeta", "alpha", "mid"]);
    let alpha: Vec<&str> = node(&tree, "alpha").children().iter().map(TreeNode::name).collect();
    assert_eq!(alpha, ["b", "a"]);
}

#[derive(Debug)]
struct NestOnly;

impl CollisionStrategy for NestOnly {
    fn resolve(&self, collision: &Collision<'_>) -> Resolution {
        match collision.kind {
            CollisionKind::LeafBlockedByDirectory => Resolution::NestLeaf {
                entry: "overview".to_owned(),
            },
            CollisionKind::DirectoryBlockedByLeaf => Resolution::Skip,
        }
    }
}

#[rstest]
fn custom_strategy_is_consulted_per_kind() {
    let mut tree = CommandTree::new(LeafLayout::ObjectDocument);
    let nested = tree.insert(&parse("acli log level set"), &NestOnly);
    assert!(nested.collisions.is_empty());
    let nested = tree.insert(&parse("acli log get"), &NestOnly);
    assert_eq!(
        nested.outcome,
        InsertOutcome::Placed {
            document: "log/overview.md".into()
        }
    );

    let mut tree = CommandTree::new(LeafLayout::ObjectDocument);
    tree.insert(&parse("acli log get"), &NestOnly);
    let skipped = tree.insert(&parse("acli log level set"), &NestOnly);
    assert!(matches!(skipped.outcome, InsertOutcome::Dropped(_)));
}

#[rstest]
fn unsafe_names_from_custom_strategies_are_unresolved() {
    #[derive(Debug)]
    struct Escape;
    impl CollisionStrategy for Escape {
        fn resolve(&self, _collision: &Collision<'_>) -> Resolution {
            Resolution::NestLeaf {
                entry: "../escape".to_owned(),
            }
        }
    }

    let mut tree = CommandTree::new(LeafLayout::ObjectDocument);
    tree.insert(&parse("acli log level set"), &Escape);
    let insertion = tree.insert(&parse("acli log get"), &Escape);
    assert!(matches!(insertion.outcome, InsertOutcome::Dropped(_)));
}

#[rstest]
#[case("log", "log.md")]
#[case("tools/v1.2", "tools/v1.2.md")]
fn document_path_appends_extension(#[case] node: &str, #[case] expected: &str) {
    assert_eq!(document_path(Utf8Path::new(node)), expected);
}
