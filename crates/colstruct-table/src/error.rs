//! Error types for the tabular container.

use colstruct_core::ColumnError;

/// Errors raised by [`DataTable`](crate::DataTable) operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A column with the same name (ignoring case) already exists.
    #[error("Column '{column}' already exists in table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// No column with this name exists.
    #[error("Column '{column}' does not exist in table '{table}'")]
    ColumnNotFound {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A row had the wrong number of values.
    #[error("Row has {actual} values but table '{table}' has {expected} columns")]
    RowArity {
        /// Table name.
        table: String,
        /// Number of columns.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// A column-structure operation failed.
    #[error(transparent)]
    Column(#[from] ColumnError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
