//! Domain layer: the hierarchical store and the operations fed into it
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod command;
pub mod error;
pub mod node;
pub mod render;
pub mod script;
pub mod store;

pub use command::{Command, RemoveRedo, StoreOptions};
pub use error::DomainError;
pub use node::{Node, NodeId, NodePatch};
pub use render::TreeRender;
pub use script::{parse_nodes, parse_script, Operation, Outcome};
pub use store::HierarchicalStore;
