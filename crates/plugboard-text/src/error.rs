//! Error types for plugboard-text

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, TextError>;

/// Textual (de)serialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// A declared size disagrees with the actual element count
    #[error("declared size {expected} does not match element count {actual}")]
    FormatSizeMismatch { expected: usize, actual: usize },

    /// Text does not follow the canonical grammar
    #[error("malformed value text: {0}")]
    Malformed(String),
}
