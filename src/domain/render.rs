//! Tree display for store contents via `termtree`.

use std::collections::HashSet;

use termtree::Tree;
use tracing::instrument;

use crate::domain::node::{Node, NodeId};
use crate::domain::store::HierarchicalStore;

pub trait TreeRender {
    /// Render `id` and its descendants. `None` if no node carries `id`.
    fn render_subtree(&self, id: &NodeId) -> Option<Tree<String>>;

    /// Render every top-level node (root or dangling parent) with its subtree.
    fn render_forest(&self) -> Vec<Tree<String>>;
}

impl TreeRender for HierarchicalStore {
    #[instrument(level = "debug", skip(self))]
    fn render_subtree(&self, id: &NodeId) -> Option<Tree<String>> {
        let node = self.get_item(id)?;
        let mut seen = HashSet::new();
        Some(build_tree(self, node, &mut seen))
    }

    #[instrument(level = "debug", skip(self))]
    fn render_forest(&self) -> Vec<Tree<String>> {
        let mut seen = HashSet::new();
        self.get_all()
            .iter()
            .filter(|node| is_top_level(self, node))
            .map(|node| build_tree(self, node, &mut seen))
            .collect()
    }
}

fn is_top_level(store: &HierarchicalStore, node: &Node) -> bool {
    match &node.parent {
        None => true,
        Some(parent) => store.get_item(parent).is_none(),
    }
}

// `seen` keeps a node id from being expanded twice, which also breaks cycles.
fn build_tree(store: &HierarchicalStore, node: &Node, seen: &mut HashSet<NodeId>) -> Tree<String> {
    let mut tree = Tree::new(node.to_string());
    if !seen.insert(node.id.clone()) {
        return tree;
    }
    for child in store.get_children(&node.id) {
        if child.id == node.id {
            continue;
        }
        tree.push(build_tree(store, child, seen));
    }
    tree
}
