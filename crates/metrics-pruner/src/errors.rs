//! Error types for the metrics pruner.

use thiserror::Error;

/// Errors raised while loading inventories or querying the workspace.
#[derive(Error, Debug, Clone)]
pub enum PrunerError {
    // Input errors
    #[error("Error reading {path}: {reason}")]
    InventoryRead { path: String, reason: String },

    #[error("Error reading snapshot {path}: {reason}")]
    SnapshotRead { path: String, reason: String },

    #[error("Error writing {path}: {reason}")]
    SnapshotWrite { path: String, reason: String },

    #[error("Error: Invalid region or workspace ID format.")]
    InvalidTarget { region: String, workspace_id: String },

    // Backend errors
    #[error("HTTP client error: {reason}")]
    Http { reason: String },

    #[error("Query '{query}' failed: {reason}")]
    Query { query: String, reason: String },
}

/// Result type alias for pruner operations
pub type PrunerResult<T> = Result<T, PrunerError>;
