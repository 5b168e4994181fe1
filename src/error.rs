//! Error types for geometric hashing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashingError {
    /// Unknown scheme identifier, or a parameter outside its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, HashingError>;
