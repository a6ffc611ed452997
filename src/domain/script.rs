//! Operation scripts: JSON Lines of store operations.
//!
//! ```text
//! # comment lines and blank lines are skipped
//! {"op": "add", "node": {"id": 4, "parent": 1, "label": "new"}}
//! {"op": "update", "patch": {"id": 4, "label": "renamed"}}
//! {"op": "remove", "id": 2}
//! {"op": "undo"}
//! {"op": "descendants", "id": 1}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::node::{Node, NodeId, NodePatch};
use crate::domain::store::HierarchicalStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Add { node: Node },
    Remove { id: NodeId },
    Update { patch: NodePatch },
    Undo,
    Redo,
    Get { id: NodeId },
    Children { id: NodeId },
    Descendants { id: NodeId },
    Ancestors { id: NodeId },
    All,
}

/// Result of applying one [`Operation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Mutation performed
    Done,
    /// Undo/redo: whether a record was popped
    Applied(bool),
    Node(Option<Node>),
    Nodes(Vec<Node>),
}

impl Operation {
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Operation::Get { .. }
                | Operation::Children { .. }
                | Operation::Descendants { .. }
                | Operation::Ancestors { .. }
                | Operation::All
        )
    }

    #[instrument(level = "debug", skip(store))]
    pub fn apply(&self, store: &mut HierarchicalStore) -> Outcome {
        match self {
            Operation::Add { node } => {
                store.add_item(node.clone());
                Outcome::Done
            }
            Operation::Remove { id } => {
                store.remove_item(id);
                Outcome::Done
            }
            Operation::Update { patch } => {
                store.update_item(patch.clone());
                Outcome::Done
            }
            Operation::Undo => Outcome::Applied(store.undo()),
            Operation::Redo => Outcome::Applied(store.redo()),
            Operation::Get { id } => Outcome::Node(store.get_item(id).cloned()),
            Operation::Children { id } => Outcome::Nodes(cloned(store.get_children(id))),
            Operation::Descendants { id } => {
                Outcome::Nodes(cloned(store.get_all_children(id)))
            }
            Operation::Ancestors { id } => Outcome::Nodes(cloned(store.get_all_parents(id))),
            Operation::All => Outcome::Nodes(store.get_all().to_vec()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add { node } => write!(f, "add {}", node.id),
            Operation::Remove { id } => write!(f, "remove {}", id),
            Operation::Update { patch } => write!(f, "update {}", patch.id),
            Operation::Undo => write!(f, "undo"),
            Operation::Redo => write!(f, "redo"),
            Operation::Get { id } => write!(f, "get {}", id),
            Operation::Children { id } => write!(f, "children {}", id),
            Operation::Descendants { id } => write!(f, "descendants {}", id),
            Operation::Ancestors { id } => write!(f, "ancestors {}", id),
            Operation::All => write!(f, "all"),
        }
    }
}

fn cloned(nodes: Vec<&Node>) -> Vec<Node> {
    nodes.into_iter().cloned().collect()
}

/// Parse a script into operations. Line numbers in errors are 1-based.
pub fn parse_script(content: &str) -> Result<Vec<Operation>, DomainError> {
    let mut operations = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let operation: Operation =
            serde_json::from_str(trimmed).map_err(|e| DomainError::InvalidOperation {
                line: idx + 1,
                message: e.to_string(),
            })?;
        operations.push(operation);
    }

    debug!("parsed {} operations", operations.len());
    Ok(operations)
}

/// Parse a JSON array of nodes.
pub fn parse_nodes(content: &str) -> Result<Vec<Node>, DomainError> {
    serde_json::from_str(content).map_err(|e| DomainError::InvalidNodes(e.to_string()))
}
