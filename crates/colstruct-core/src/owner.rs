//! Seams between a column structure and the components around it.
//!
//! A container owns its columns and hands each one a `Weak` handle to itself
//! as a [`ColumnOwner`]. Rendering of predicate fragments is delegated to an
//! [`InClauseRenderer`].

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::column::ColumnStruct;
use crate::typemap::TypeResolver;
use crate::types::DialectKind;
use crate::value::SqlValue;

/// Change state of a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Value has not been touched since it was loaded.
    #[default]
    Unchanged,
    /// Value was set on a new row.
    Added,
    /// Value differs from what was loaded.
    Modified,
}

/// The tabular container that owns a set of column structures.
///
/// The container is authoritative for the dialect of every column attached
/// to it. Row access is positional; `index` is the column position returned
/// by [`ColumnOwner::resolve_index`].
pub trait ColumnOwner: Send + Sync {
    /// The dialect of the container.
    fn dialect(&self) -> DialectKind;

    /// The resolver columns attached to this container must use.
    fn resolver(&self) -> Arc<dyn TypeResolver>;

    /// Marks the name-to-index cache stale. Rebuilding must be lazy.
    fn invalidate_name_index(&self);

    /// Resolves a column name to its position.
    fn resolve_index(&self, name: &str) -> Option<usize>;

    /// Number of materialized rows.
    fn row_count(&self) -> usize;

    /// Reads the cell at `(row, index)`.
    fn cell(&self, row: usize, index: usize) -> Option<SqlValue>;

    /// Writes the cell at `(row, index)`.
    ///
    /// `state` of `None` leaves the choice of state to the container.
    fn set_cell(&self, row: usize, index: usize, value: SqlValue, state: Option<CellState>);
}

/// Renders `column IN (...)` fragments.
///
/// Implementations own quoting and escaping of both the identifier and the
/// values.
pub trait InClauseRenderer {
    /// Renders a predicate restricting `column` to `values`.
    ///
    /// `values` is never empty.
    fn render_in_clause(
        &self,
        column: &ColumnStruct,
        values: &BTreeSet<String>,
        dialect: DialectKind,
    ) -> String;
}
