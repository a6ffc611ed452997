//! treestore: an in-memory hierarchical record store.
//!
//! Nodes form a tree through parent references held in a flat, insertion-ordered
//! list. The store answers children/descendant/ancestor queries and records every
//! add, remove and update so each can be undone and redone.
//!
//! ```
//! use treestore::domain::{HierarchicalStore, Node, NodeId};
//!
//! let mut store = HierarchicalStore::new(vec![
//!     Node::root(1, "root"),
//!     Node::child(2, 1, "a"),
//!     Node::child(3, 2, "b"),
//! ]);
//!
//! store.remove_item(&NodeId::from(2));
//! assert_eq!(store.len(), 1);
//!
//! store.undo();
//! assert_eq!(store.get_all_children(&NodeId::from(1)).len(), 2);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
