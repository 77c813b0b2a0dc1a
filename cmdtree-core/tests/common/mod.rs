use std::collections::BTreeSet;

use camino::Utf8Path;
use cmdtree_core::{CollisionPolicy, LeafLayout, RunReport, Scaffolder, ScaffolderBuilder, TreeNode};

#[must_use]
pub fn scaffolder(layout: LeafLayout, policy: CollisionPolicy) -> Scaffolder {
    ScaffolderBuilder::new()
        .with_leaf_layout(layout)
        .with_collision_policy(policy)
        .build()
        .expect("test configuration must be valid")
}

#[must_use]
pub fn created_paths(report: &RunReport) -> Vec<&str> {
    report
        .created()
        .iter()
        .map(|artifact| artifact.path.as_str())
        .collect()
}

/// Collects `(path, is_leaf)` for every node below `root`.
#[must_use]
pub fn node_set(root: &TreeNode) -> BTreeSet<(String, bool)> {
    fn walk(node: &TreeNode, prefix: &Utf8Path, out: &mut BTreeSet<(String, bool)>) {
        for child in node.children() {
            let path = prefix.join(child.name());
            out.insert((path.to_string(), child.is_leaf()));
            walk(child, &path, out);
        }
    }
    let mut out = BTreeSet::new();
    walk(root, Utf8Path::new(""), &mut out);
    out
}
