//! In-memory hierarchical store with undo/redo.
//!
//! Nodes live in one insertion-ordered `Vec`; parent/child relations are resolved
//! by linear scans over it. Every recorded mutation pushes a [`Command`] onto the
//! history stack, and `undo`/`redo` shuttle those records between history and future.
//!
//! No operation fails: unknown ids yield empty results or no-ops.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, instrument, trace};

use crate::domain::command::{Command, RemoveRedo, StoreOptions};
use crate::domain::node::{Node, NodeId, NodePatch};

#[derive(Debug, Clone, Default)]
pub struct HierarchicalStore {
    items: Vec<Node>,
    history: Vec<Command>,
    future: Vec<Command>,
    options: StoreOptions,
}

impl HierarchicalStore {
    pub fn new(items: Vec<Node>) -> Self {
        Self::with_options(items, StoreOptions::default())
    }

    pub fn with_options(items: Vec<Node>, options: StoreOptions) -> Self {
        debug!("new store: {} nodes, options={:?}", items.len(), options);
        Self {
            items,
            history: Vec::new(),
            future: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn history(&self) -> &[Command] {
        &self.history
    }

    pub fn future(&self) -> &[Command] {
        &self.future
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.items
    }

    // ============================================================
    // Queries
    // ============================================================

    /// All nodes in insertion order.
    pub fn get_all(&self) -> &[Node] {
        &self.items
    }

    /// First node with the given id.
    #[instrument(level = "trace", skip(self))]
    pub fn get_item(&self, id: &NodeId) -> Option<&Node> {
        self.position(id).map(|pos| &self.items[pos])
    }

    /// Direct children of `id`, in insertion order.
    #[instrument(level = "trace", skip(self))]
    pub fn get_children(&self, id: &NodeId) -> Vec<&Node> {
        self.child_positions(id).map(|pos| &self.items[pos]).collect()
    }

    /// All descendants of `id` in level order (BFS).
    #[instrument(level = "trace", skip(self))]
    pub fn get_all_children(&self, id: &NodeId) -> Vec<&Node> {
        self.descendant_positions(id)
            .into_iter()
            .map(|pos| &self.items[pos])
            .collect()
    }

    /// Ancestors of `id`, root-most first and direct parent last.
    ///
    /// The walk stops at a root, at a parent id with no matching node, or when it
    /// would revisit a node it has already collected.
    #[instrument(level = "trace", skip(self))]
    pub fn get_all_parents(&self, id: &NodeId) -> Vec<&Node> {
        let mut parents = Vec::new();
        let Some(mut pos) = self.position(id) else {
            return parents;
        };
        let mut visited = HashSet::from([pos]);

        while let Some(parent_id) = &self.items[pos].parent {
            match self.position(parent_id) {
                Some(parent_pos) if visited.insert(parent_pos) => {
                    parents.push(&self.items[parent_pos]);
                    pos = parent_pos;
                }
                _ => break,
            }
        }

        parents.reverse();
        parents
    }

    fn position(&self, id: &NodeId) -> Option<usize> {
        self.items.iter().position(|node| &node.id == id)
    }

    fn child_positions<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = usize> + 'a {
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.parent.as_ref() == Some(id))
            .map(|(pos, _)| pos)
    }

    /// BFS over parent->child edges. Each position is queued at most once, and
    /// nodes carrying `id` itself are never part of the result.
    fn descendant_positions(&self, id: &NodeId) -> Vec<usize> {
        let mut visited: HashSet<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, node)| &node.id == id)
            .map(|(pos, _)| pos)
            .collect();
        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut result = Vec::new();

        for pos in self.child_positions(id) {
            if visited.insert(pos) {
                queue.push_back(pos);
            }
        }

        while let Some(pos) = queue.pop_front() {
            result.push(pos);
            for child in self.child_positions(&self.items[pos].id) {
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        trace!("descendants of {}: {} nodes", id, result.len());
        result
    }

    // ============================================================
    // Mutations
    // ============================================================

    /// Append a node. Duplicate ids are accepted.
    #[instrument(level = "debug", skip(self))]
    pub fn add_item(&mut self, node: Node) {
        self.items.push(node.clone());
        self.record(Command::Add { node });
    }

    /// Remove `id` and its whole subtree.
    ///
    /// An unknown id removes nothing but is still recorded.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_item(&mut self, id: &NodeId) {
        let removed = self.detach_subtree(id);
        debug!("removed {} nodes under {}", removed.len(), id);
        self.record(Command::Remove {
            id: id.clone(),
            removed,
        });
    }

    /// Merge `patch` into the first node with `patch.id`.
    ///
    /// Silent no-op when no node matches: nothing recorded, future kept.
    #[instrument(level = "debug", skip(self))]
    pub fn update_item(&mut self, patch: NodePatch) {
        match self.apply_patch(&patch) {
            Some(previous) => self.record(Command::Update { patch, previous }),
            None => debug!("update target {} not found", patch.id),
        }
    }

    /// Revert the most recent history entry. Returns false when history is empty.
    #[instrument(level = "debug", skip(self))]
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.history.pop() else {
            return false;
        };
        debug!("undo {} {}", command.kind(), command.target());

        match &command {
            Command::Add { node } => {
                // inverse of push: drop the latest node carrying that id
                if let Some(pos) = self.items.iter().rposition(|n| n.id == node.id) {
                    self.items.remove(pos);
                }
            }
            Command::Remove { removed, .. } => {
                self.items.extend(removed.iter().cloned());
            }
            Command::Update { previous, .. } => {
                if let Some(pos) = self.position(&previous.id) {
                    self.items[pos] = previous.clone();
                }
            }
        }

        self.future.push(command);
        true
    }

    /// Re-apply the most recently undone entry. Returns false when future is empty.
    #[instrument(level = "debug", skip(self))]
    pub fn redo(&mut self) -> bool {
        let Some(mut command) = self.future.pop() else {
            return false;
        };
        debug!("redo {} {}", command.kind(), command.target());

        match &mut command {
            Command::Add { node } => self.items.push(node.clone()),
            Command::Remove { id, removed } => match self.options.remove_redo {
                RemoveRedo::Replay => *removed = self.detach_subtree(id),
                RemoveRedo::Skip => debug!("remove redo skipped for {}", id),
            },
            Command::Update { patch, previous } => {
                if let Some(prior) = self.apply_patch(patch) {
                    *previous = prior;
                }
            }
        }

        self.push_history(command);
        true
    }

    fn detach_subtree(&mut self, id: &NodeId) -> Vec<Node> {
        let mut doomed: HashSet<NodeId> = self
            .descendant_positions(id)
            .into_iter()
            .map(|pos| self.items[pos].id.clone())
            .collect();
        doomed.insert(id.clone());

        let (removed, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|node| doomed.contains(&node.id));
        self.items = kept;
        removed
    }

    /// Returns the node as it was before the merge, or None if `patch.id` is unknown.
    fn apply_patch(&mut self, patch: &NodePatch) -> Option<Node> {
        let pos = self.position(&patch.id)?;
        let merged = self.items[pos].merged(patch);
        Some(std::mem::replace(&mut self.items[pos], merged))
    }

    fn record(&mut self, command: Command) {
        self.push_history(command);
        self.future.clear();
    }

    fn push_history(&mut self, command: Command) {
        self.history.push(command);
        if let Some(limit) = self.options.history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
                trace!("history trimmed by {}", excess);
            }
        }
    }
}

impl FromIterator<Node> for HierarchicalStore {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
