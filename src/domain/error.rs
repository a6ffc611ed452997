//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors cover malformed caller input.
/// The store itself never fails; these come from parsing what is fed into it.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid operation at line {line}: {message}")]
    InvalidOperation { line: usize, message: String },

    #[error("invalid node list: {0}")]
    InvalidNodes(String),
}
