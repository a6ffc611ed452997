//! Session service
//!
//! Loads nodes from a JSON file into a store, replays operation scripts against it,
//! and writes the resulting nodes back out.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{parse_nodes, parse_script, HierarchicalStore, Operation, Outcome, StoreOptions};
use crate::infrastructure::traits::FileSystem;

/// One executed script line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub operation: Operation,
    pub outcome: Outcome,
}

/// Service for driving a store from files.
pub struct SessionService {
    fs: Arc<dyn FileSystem>,
    options: StoreOptions,
}

impl SessionService {
    /// Create a new session service.
    pub fn new(fs: Arc<dyn FileSystem>, options: StoreOptions) -> Self {
        Self { fs, options }
    }

    /// Build a store from a JSON array of nodes.
    pub fn load(&self, path: &Path) -> ApplicationResult<HierarchicalStore> {
        debug!("load: path={}", path.display());
        if !self.fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("nodes file not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }

        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read nodes", path)?;
        let nodes = parse_nodes(&content)?;
        info!("loaded {} nodes from {}", nodes.len(), path.display());

        Ok(HierarchicalStore::with_options(nodes, self.options))
    }

    /// Read and parse an operation script.
    pub fn load_script(&self, path: &Path) -> ApplicationResult<Vec<Operation>> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read script", path)?;
        Ok(parse_script(&content)?)
    }

    /// Apply operations in order, collecting each outcome.
    pub fn run(&self, store: &mut HierarchicalStore, operations: Vec<Operation>) -> Vec<ScriptStep> {
        operations
            .into_iter()
            .map(|operation| {
                let outcome = operation.apply(store);
                debug!("{} -> {:?}", operation, outcome);
                ScriptStep { operation, outcome }
            })
            .collect()
    }

    /// Load a script from `path` and run it against `store`.
    pub fn run_script(
        &self,
        store: &mut HierarchicalStore,
        path: &Path,
    ) -> ApplicationResult<Vec<ScriptStep>> {
        let operations = self.load_script(path)?;
        Ok(self.run(store, operations))
    }

    /// Write the store's nodes as a pretty-printed JSON array.
    pub fn save(&self, store: &HierarchicalStore, path: &Path) -> ApplicationResult<()> {
        let content = serde_json::to_string_pretty(store.get_all()).map_err(|e| {
            ApplicationError::OperationFailed {
                context: format!("serialize nodes for {}", path.display()),
                source: Box::new(e),
            }
        })?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write nodes", path)?;
        info!("saved {} nodes to {}", store.len(), path.display());
        Ok(())
    }
}
