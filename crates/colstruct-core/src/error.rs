//! Error types for column structures.

use crate::types::{DeclaredType, DialectKind};

/// Errors raised while building or retyping a column structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    /// An argument was rejected, e.g. an empty column name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The declared type has no mapping for the dialect and no fallback is configured.
    #[error("No runtime type for '{declared}' in dialect '{dialect}'")]
    UnresolvedType {
        /// The declared type that failed to resolve.
        declared: DeclaredType,
        /// The dialect it was resolved against.
        dialect: DialectKind,
    },
}

/// Result type for column-structure operations.
pub type Result<T> = std::result::Result<T, ColumnError>;
