//! Property tests for folding and emission.

mod common;

use std::collections::BTreeSet;

use cmdtree_core::{CollisionPolicy, DEFAULT_RENAME_SUFFIX, LeafLayout};
use cmdtree_test_support::docs::DocsRoot;
use proptest::prelude::*;

use common::{node_set, scaffolder};

/// Commands over a small vocabulary so prefixes and collisions are common.
fn command() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(
        prop::sample::select(vec!["net", "nic", "log", "get", "set"]),
        2..=4,
    )
}

fn commands() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(command(), 1..10).prop_map(|commands| {
        commands
            .into_iter()
            .map(|segments| format!("acli {}", segments.join(" ")))
            .collect()
    })
}

fn commands_and_shuffle() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    commands().prop_flat_map(|commands| {
        let shuffled = Just(commands.clone()).prop_shuffle();
        (Just(commands), shuffled)
    })
}

/// Every proper prefix of every command, which must be exactly the directories.
fn prefixes(commands: &[String]) -> BTreeSet<String> {
    commands
        .iter()
        .flat_map(|raw| {
            let segments: Vec<&str> = raw.split_whitespace().skip(1).collect();
            (1..segments.len())
                .map(move |len| segments.iter().take(len).copied().collect::<Vec<_>>().join("/"))
                .collect::<Vec<_>>()
        })
        .collect()
}

proptest! {
    #[test]
    fn merge_fold_is_order_independent((commands, shuffled) in commands_and_shuffle()) {
        let scaffolder = scaffolder(LeafLayout::ActionDocument, CollisionPolicy::default());
        let forward = scaffolder.plan(&commands);
        let backward = scaffolder.plan(&shuffled);

        prop_assert!(forward.issues().is_empty());
        prop_assert_eq!(node_set(forward.tree().root()), node_set(backward.tree().root()));
    }

    #[test]
    fn shared_prefixes_form_one_directory_chain(commands in commands()) {
        let plan = scaffolder(LeafLayout::ActionDocument, CollisionPolicy::default()).plan(&commands);
        let directories: BTreeSet<String> = node_set(plan.tree().root())
            .into_iter()
            .filter(|(_, is_leaf)| !is_leaf)
            .map(|(path, _)| path)
            .collect();
        prop_assert_eq!(directories, prefixes(&commands));
    }
}

/// Runs `commands` twice and checks the second run neither creates nor changes anything.
fn rerun_is_stable(
    layout: LeafLayout,
    policy: CollisionPolicy,
    commands: &[String],
) -> Result<(), TestCaseError> {
    let docs = DocsRoot::new().expect("temp dir must be available");
    let scaffolder = scaffolder(layout, policy);

    let first = scaffolder.run(docs.path(), commands);
    prop_assert!(first.is_success());
    let before = docs.snapshot().expect("snapshot");

    let second = scaffolder.run(docs.path(), commands);
    prop_assert!(second.is_success());
    prop_assert!(second.created().is_empty());
    prop_assert_eq!(docs.snapshot().expect("snapshot"), before);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn second_run_changes_nothing(commands in commands()) {
        rerun_is_stable(LeafLayout::ActionDocument, CollisionPolicy::default(), &commands)?;
    }

    #[test]
    fn second_run_after_renamed_collisions_changes_nothing(commands in commands()) {
        let policy = CollisionPolicy::RenameWithSuffix { suffix: DEFAULT_RENAME_SUFFIX.into() };
        rerun_is_stable(LeafLayout::ObjectDocument, policy, &commands)?;
    }
}
