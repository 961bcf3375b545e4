//! Query builder errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Request body does not match the list request shape
    #[error("invalid list request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
}
