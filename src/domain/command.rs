//! Command records kept on the history/future stacks.

use serde::{Deserialize, Serialize};

use crate::domain::node::{Node, NodeId, NodePatch};

/// One applied mutation, as recorded for undo/redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// The node as inserted.
    Add { node: Node },
    /// Target id plus every node removed with it, in pre-removal order.
    Remove { id: NodeId, removed: Vec<Node> },
    /// Patch applied and the full node as it was before.
    Update { patch: NodePatch, previous: Node },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Remove { .. } => "remove",
            Command::Update { .. } => "update",
        }
    }

    /// Id of the node the command was aimed at.
    pub fn target(&self) -> &NodeId {
        match self {
            Command::Add { node } => &node.id,
            Command::Remove { id, .. } => id,
            Command::Update { patch, .. } => &patch.id,
        }
    }
}

/// How `redo` treats a recorded removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveRedo {
    /// Run the forward removal again for the recorded target.
    #[default]
    Replay,
    /// Leave the nodes in place; only the record moves back to history.
    Skip,
}

/// Tunables for a [`HierarchicalStore`](crate::domain::HierarchicalStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOptions {
    pub remove_redo: RemoveRedo,
    /// Oldest history entries are dropped beyond this many. `None` keeps everything.
    pub history_limit: Option<usize>,
}
