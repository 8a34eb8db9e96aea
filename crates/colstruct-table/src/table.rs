//! In-memory tabular container owning column structures and rows.
//!
//! A [`DataTable`] is always shared as `Arc<DataTable>`. Every column it
//! owns holds a `Weak` handle back to it, through which the column reads the
//! table's dialect and rows and reports renames. All state sits behind
//! `RwLock`s or atomics, so the handle can be used from `&self`.
//!
//! No column lock is held while user code runs: [`DataTable::update_column`]
//! hands its closure a copy and commits it afterwards, so bulk helpers such
//! as `set_all_rows` may be called from inside it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use colstruct_core::{
    standard_resolver, AlterOp, CellState, ColumnOwner, ColumnStruct, DialectKind, SqlValue,
    TypeResolver,
};
use tracing::{debug, trace};

use crate::error::{Result, TableError};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Position of `name` in `columns`, ignoring case. Scans instead of using
/// the name index, so it is safe under the column lock.
fn position_of(columns: &[ColumnStruct], name: &str) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    columns
        .iter()
        .position(|c| c.column_name().to_lowercase() == wanted)
}

/// A single cell: value plus change state.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Current value.
    pub value: SqlValue,
    /// Change state.
    pub state: CellState,
}

impl Cell {
    fn assign(&mut self, value: SqlValue, state: Option<CellState>) {
        match state {
            Some(state) => self.state = state,
            None if self.value != value && self.state == CellState::Unchanged => {
                self.state = CellState::Modified;
            }
            None => {}
        }
        self.value = value;
    }
}

/// Builder for [`DataTable`].
pub struct DataTableBuilder {
    name: String,
    dialect: DialectKind,
    resolver: Arc<dyn TypeResolver>,
}

impl DataTableBuilder {
    /// Sets the dialect.
    #[must_use]
    pub const fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the type resolver used by every attached column.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Builds the table.
    #[must_use]
    pub fn build(self) -> Arc<DataTable> {
        Arc::new_cyclic(|this| DataTable {
            name: self.name,
            dialect: RwLock::new(self.dialect),
            resolver: self.resolver,
            columns: RwLock::new(Vec::new()),
            name_index: RwLock::new(HashMap::new()),
            index_dirty: AtomicBool::new(false),
            index_rebuilds: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
            rows: RwLock::new(Vec::new()),
            this: this.clone(),
        })
    }
}

/// Ordered column collection plus materialized rows.
pub struct DataTable {
    name: String,
    dialect: RwLock<DialectKind>,
    resolver: Arc<dyn TypeResolver>,
    columns: RwLock<Vec<ColumnStruct>>,
    /// Lower-cased column name to position. Rebuilt lazily when dirty.
    name_index: RwLock<HashMap<String, usize>>,
    index_dirty: AtomicBool,
    index_rebuilds: AtomicUsize,
    invalidations: AtomicUsize,
    rows: RwLock<Vec<Vec<Cell>>>,
    this: Weak<DataTable>,
}

impl DataTable {
    /// Creates an empty table using the standard type map.
    #[must_use]
    pub fn new(name: impl Into<String>, dialect: DialectKind) -> Arc<Self> {
        Self::builder(name).dialect(dialect).build()
    }

    /// Starts building a table.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DataTableBuilder {
        DataTableBuilder {
            name: name.into(),
            dialect: DialectKind::None,
            resolver: standard_resolver(),
        }
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn owner_handle(&self) -> Weak<dyn ColumnOwner> {
        self.this.clone() as Weak<dyn ColumnOwner>
    }

    fn not_found(&self, column: &str) -> TableError {
        TableError::ColumnNotFound {
            table: self.name.clone(),
            column: column.to_string(),
        }
    }

    /// Changes the dialect and re-resolves every column's runtime type.
    ///
    /// All columns are resolved before anything is committed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Column`] if a strict resolver cannot map a column
    /// under the new dialect. The table then keeps its previous dialect and
    /// column types.
    pub fn set_dialect(&self, dialect: DialectKind) -> Result<()> {
        let mut columns = write(&self.columns);
        let previous = std::mem::replace(&mut *write(&self.dialect), dialect);
        let mut refreshed = columns.clone();
        if let Err(err) = refreshed
            .iter_mut()
            .try_for_each(ColumnStruct::refresh_runtime_type)
        {
            *write(&self.dialect) = previous;
            debug!(table = %self.name, %dialect, %previous, "Dialect change rejected: {err}");
            return Err(err.into());
        }
        *columns = refreshed;
        debug!(table = %self.name, %dialect, "Dialect changed, re-resolved column types");
        Ok(())
    }

    /// Appends a column, attaching it to this table.
    ///
    /// Existing rows get a NULL cell for the new column.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateColumn`] if the name is taken (ignoring
    /// case), or [`TableError::Column`] if the type cannot be resolved.
    pub fn add_column(&self, mut column: ColumnStruct) -> Result<usize> {
        if self.resolve_index(column.column_name()).is_some() {
            return Err(TableError::DuplicateColumn {
                table: self.name.clone(),
                column: column.column_name().to_string(),
            });
        }
        column.attach(self.owner_handle())?;
        column.table_name.clone_from(&self.name);

        let mut columns = write(&self.columns);
        columns.push(column);
        let position = columns.len() - 1;
        drop(columns);

        for row in write(&self.rows).iter_mut() {
            row.push(Cell {
                value: SqlValue::Null,
                state: CellState::Unchanged,
            });
        }
        self.invalidate_name_index();
        Ok(position)
    }

    /// Removes a column and its cells, returning it detached.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnNotFound`] if no column has this name.
    pub fn remove_column(&self, name: &str) -> Result<ColumnStruct> {
        let index = self.resolve_index(name).ok_or_else(|| self.not_found(name))?;
        let mut column = write(&self.columns).remove(index);
        for row in write(&self.rows).iter_mut() {
            row.remove(index);
        }
        self.invalidate_name_index();
        column.detach()?;
        Ok(column)
    }

    /// Returns a copy of the named column. The copy stays attached.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<ColumnStruct> {
        let index = self.resolve_index(name)?;
        read(&self.columns).get(index).cloned()
    }

    /// Returns a copy of the column at `index`.
    #[must_use]
    pub fn column_at(&self, index: usize) -> Option<ColumnStruct> {
        read(&self.columns).get(index).cloned()
    }

    /// Copies of all columns, in order.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnStruct> {
        read(&self.columns).clone()
    }

    /// Column names, in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        read(&self.columns)
            .iter()
            .map(|c| c.column_name().to_string())
            .collect()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        read(&self.columns).len()
    }

    /// Position of the named column, ignoring case.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.resolve_index(name)
    }

    /// Mutates the named column.
    ///
    /// `f` runs on a copy with no table lock held, so it may call back into
    /// this table. The copy replaces the stored column afterwards. A rename
    /// that collides with another column, ignoring case, is not committed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnNotFound`] if no column has this name, or
    /// if it was removed while `f` ran. Returns [`TableError::DuplicateColumn`]
    /// if `f` renamed the column to a name already in use.
    pub fn update_column<R>(&self, name: &str, f: impl FnOnce(&mut ColumnStruct) -> R) -> Result<R> {
        let mut column = self.column(name).ok_or_else(|| self.not_found(name))?;
        let original = column.column_name().to_string();
        let result = f(&mut column);
        let handle = self.owner_handle();
        if !column.is_owned_by(&handle) {
            column.attach(handle)?;
        }

        let mut columns = write(&self.columns);
        let index = position_of(&columns, &original).ok_or_else(|| self.not_found(name))?;
        let renamed = column.column_name() != original;
        if renamed {
            let taken = position_of(&columns, column.column_name()).is_some_and(|i| i != index);
            if taken {
                debug!(
                    table = %self.name,
                    from = %original,
                    to = %column.column_name(),
                    "Rename collides with an existing column"
                );
                return Err(TableError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.column_name().to_string(),
                });
            }
        }
        column.table_name.clone_from(&self.name);
        columns[index] = column;
        drop(columns);
        if renamed {
            self.index_dirty.store(true, Ordering::Release);
        }
        Ok(result)
    }

    /// Columns whose alter intent shares a flag with `op`.
    #[must_use]
    pub fn columns_with_alter_op(&self, op: AlterOp) -> Vec<ColumnStruct> {
        read(&self.columns)
            .iter()
            .filter(|c| c.alter_op.intersects(op))
            .cloned()
            .collect()
    }

    /// Overlays introspected column metadata onto this table's columns.
    ///
    /// Columns are matched by name, ignoring case, and merged with
    /// [`ColumnStruct::load_from`]. Introspected columns with no local
    /// counterpart are appended.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Column`] if a type cannot be resolved.
    pub fn merge_schema(&self, introspected: &[ColumnStruct]) -> Result<()> {
        for source in introspected {
            match self.resolve_index(source.column_name()) {
                Some(index) => {
                    let mut columns = write(&self.columns);
                    if let Some(local) = columns.get_mut(index) {
                        local.load_from(source)?;
                    }
                }
                None => {
                    let mut column = source.clone();
                    column.detach()?;
                    self.add_column(column)?;
                }
            }
        }
        Ok(())
    }

    /// Appends a row. Cells are marked [`CellState::Added`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowArity`] if `values` does not match the
    /// column count.
    pub fn add_row(&self, values: Vec<SqlValue>) -> Result<usize> {
        let expected = self.column_count();
        if values.len() != expected {
            return Err(TableError::RowArity {
                table: self.name.clone(),
                expected,
                actual: values.len(),
            });
        }
        let mut rows = write(&self.rows);
        rows.push(
            values
                .into_iter()
                .map(|value| Cell {
                    value,
                    state: CellState::Added,
                })
                .collect(),
        );
        Ok(rows.len() - 1)
    }

    /// Reads the cell at `(row, index)` including its state.
    #[must_use]
    pub fn cell_at(&self, row: usize, index: usize) -> Option<Cell> {
        read(&self.rows).get(row)?.get(index).cloned()
    }

    /// Reads a value by row and column name.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<SqlValue> {
        let index = self.resolve_index(column)?;
        self.cell(row, index)
    }

    /// Marks every cell [`CellState::Unchanged`].
    pub fn accept_changes(&self) {
        for cell in write(&self.rows).iter_mut().flatten() {
            cell.state = CellState::Unchanged;
        }
    }

    /// Number of times the name index has been rebuilt.
    #[must_use]
    pub fn name_index_rebuilds(&self) -> usize {
        self.index_rebuilds.load(Ordering::Acquire)
    }

    /// Number of invalidation signals received.
    #[must_use]
    pub fn name_index_invalidations(&self) -> usize {
        self.invalidations.load(Ordering::Acquire)
    }

    fn rebuild_name_index(&self) {
        let columns = read(&self.columns);
        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            index
                .entry(column.column_name().to_lowercase())
                .or_insert(position);
        }
        drop(columns);
        *write(&self.name_index) = index;
        self.index_rebuilds.fetch_add(1, Ordering::AcqRel);
        trace!(table = %self.name, "Rebuilt column name index");
    }
}

impl ColumnOwner for DataTable {
    fn dialect(&self) -> DialectKind {
        *read(&self.dialect)
    }

    fn resolver(&self) -> Arc<dyn TypeResolver> {
        Arc::clone(&self.resolver)
    }

    fn invalidate_name_index(&self) {
        self.invalidations.fetch_add(1, Ordering::AcqRel);
        self.index_dirty.store(true, Ordering::Release);
    }

    fn resolve_index(&self, name: &str) -> Option<usize> {
        if self.index_dirty.swap(false, Ordering::AcqRel) {
            self.rebuild_name_index();
        }
        read(&self.name_index).get(&name.trim().to_lowercase()).copied()
    }

    fn row_count(&self) -> usize {
        read(&self.rows).len()
    }

    fn cell(&self, row: usize, index: usize) -> Option<SqlValue> {
        read(&self.rows).get(row)?.get(index).map(|c| c.value.clone())
    }

    fn set_cell(&self, row: usize, index: usize, value: SqlValue, state: Option<CellState>) {
        if let Some(cell) = write(&self.rows).get_mut(row).and_then(|r| r.get_mut(index)) {
            cell.assign(value, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstruct_core::{DeclaredType, RuntimeType, TypeMap};

    fn users() -> Arc<DataTable> {
        let table = DataTable::new("Users", DialectKind::MsSql);
        table
            .add_column(ColumnStruct::new("Id", DeclaredType::Int).unwrap())
            .unwrap();
        table
            .add_column(ColumnStruct::new("Name", DeclaredType::NVarChar).unwrap())
            .unwrap();
        table
    }

    #[test]
    fn test_add_column_attaches_and_sets_table_name() {
        let table = users();
        let col = table.column("name").unwrap();
        assert!(col.is_attached());
        assert_eq!(col.table_name, "Users");
        assert_eq!(col.dialect(), DialectKind::MsSql);
        assert_eq!(table.column_names(), vec!["Id", "Name"]);
    }

    #[test]
    fn test_add_column_rejects_duplicates() {
        let table = users();
        let err = table
            .add_column(ColumnStruct::new("NAME", DeclaredType::VarChar).unwrap())
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_name_index_rebuilds_lazily() {
        let table = users();
        assert_eq!(table.column_index("Id"), Some(0));
        let rebuilds = table.name_index_rebuilds();

        table
            .update_column("Id", |c| c.set_column_name("UserId"))
            .unwrap();
        table
            .update_column("Name", |c| c.set_column_name("UserName"))
            .unwrap();
        let after_updates = table.name_index_rebuilds();

        assert_eq!(table.column_index("userid"), Some(0));
        assert_eq!(table.column_index("UserName"), Some(1));
        assert_eq!(table.column_index("Id"), None);
        // One rebuild for the lookup inside the second update, one for the reads.
        assert_eq!(after_updates, rebuilds + 1);
        assert_eq!(table.name_index_rebuilds(), after_updates + 1);
    }

    #[test]
    fn test_set_dialect_reresolves_columns() {
        let table = users();
        assert_eq!(table.column("Id").unwrap().runtime_type(), RuntimeType::Int32);
        table.set_dialect(DialectKind::Sqlite).unwrap();
        assert_eq!(table.column("Id").unwrap().runtime_type(), RuntimeType::Int64);
    }

    #[test]
    fn test_failed_dialect_change_keeps_previous_state() {
        let resolver = TypeMap::builder()
            .map(DeclaredType::Variant, DialectKind::MsSql, RuntimeType::Opaque)
            .without_fallback()
            .build();
        let table = DataTable::builder("T")
            .dialect(DialectKind::MsSql)
            .resolver(Arc::new(resolver))
            .build();
        table
            .add_column(ColumnStruct::new("Id", DeclaredType::Int).unwrap())
            .unwrap();
        table
            .add_column(ColumnStruct::new("Extra", DeclaredType::Variant).unwrap())
            .unwrap();

        let err = table.set_dialect(DialectKind::Sqlite).unwrap_err();
        assert!(matches!(err, TableError::Column(_)));
        assert_eq!(table.dialect(), DialectKind::MsSql);
        assert_eq!(table.column("Id").unwrap().runtime_type(), RuntimeType::Int32);
        assert_eq!(table.column("Extra").unwrap().runtime_type(), RuntimeType::Opaque);
    }

    #[test]
    fn test_update_column_allows_callbacks_into_table() {
        let table = users();
        table
            .add_row(vec![SqlValue::Int(1), SqlValue::from("a")])
            .unwrap();

        let values = table
            .update_column("Name", |c| {
                c.set_all_rows("b");
                c.set_column_name("Login");
                c.distinct_values()
            })
            .unwrap();

        // The rename is not visible to the table until the closure returns.
        assert!(values.is_empty());
        assert_eq!(table.value(0, "Login"), Some(SqlValue::from("b")));
        assert_eq!(table.column_names(), vec!["Id", "Login"]);
    }

    #[test]
    fn test_update_column_reattaches_detached_copy() {
        let table = users();
        table.update_column("Id", |c| c.detach().unwrap()).unwrap();
        let id = table.column("Id").unwrap();
        assert!(id.is_attached());
        assert_eq!(id.dialect(), DialectKind::MsSql);
    }

    #[test]
    fn test_table_resolver_is_adopted() {
        let resolver = TypeMap::builder()
            .map(DeclaredType::Int, DialectKind::MsSql, RuntimeType::Int64)
            .build();
        let table = DataTable::builder("T")
            .dialect(DialectKind::MsSql)
            .resolver(Arc::new(resolver))
            .build();
        table
            .add_column(ColumnStruct::new("Id", DeclaredType::Int).unwrap())
            .unwrap();
        assert_eq!(table.column("Id").unwrap().runtime_type(), RuntimeType::Int64);
    }

    #[test]
    fn test_add_row_checks_arity() {
        let table = users();
        let err = table.add_row(vec![SqlValue::Int(1)]).unwrap_err();
        assert!(matches!(err, TableError::RowArity { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_add_column_pads_existing_rows() {
        let table = users();
        table
            .add_row(vec![SqlValue::Int(1), SqlValue::from("a")])
            .unwrap();
        table
            .add_column(ColumnStruct::new("Age", DeclaredType::Int).unwrap())
            .unwrap();
        assert_eq!(table.value(0, "Age"), Some(SqlValue::Null));
    }

    #[test]
    fn test_remove_column() {
        let table = users();
        table
            .add_row(vec![SqlValue::Int(1), SqlValue::from("a")])
            .unwrap();
        let removed = table.remove_column("id").unwrap();
        assert!(!removed.is_attached());
        assert_eq!(table.column_index("Name"), Some(0));
        assert_eq!(table.value(0, "Name"), Some(SqlValue::from("a")));
        assert!(matches!(
            table.remove_column("Id"),
            Err(TableError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_cell_state_tracking() {
        let table = users();
        table
            .add_row(vec![SqlValue::Int(1), SqlValue::from("a")])
            .unwrap();
        table.accept_changes();

        table.set_cell(0, 1, SqlValue::from("a"), None);
        assert_eq!(table.cell_at(0, 1).unwrap().state, CellState::Unchanged);

        table.set_cell(0, 1, SqlValue::from("b"), None);
        assert_eq!(table.cell_at(0, 1).unwrap().state, CellState::Modified);

        table.set_cell(0, 0, SqlValue::Int(2), Some(CellState::Unchanged));
        assert_eq!(table.cell_at(0, 0).unwrap().state, CellState::Unchanged);
    }

    #[test]
    fn test_columns_with_alter_op() {
        let table = users();
        table
            .update_column("Name", |c| c.rename("FullName"))
            .unwrap();
        let renamed = table.columns_with_alter_op(AlterOp::RENAME | AlterOp::DROP);
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].column_name(), "FullName");
        assert_eq!(renamed[0].old_name.as_deref(), Some("Name"));
    }

    #[test]
    fn test_merge_schema() {
        let table = users();
        table
            .update_column("Name", |c| c.description = Some("display name".into()))
            .unwrap();

        let mut name = ColumnStruct::with_options("name", DeclaredType::NVarChar, false, false, 100).unwrap();
        name.raw_type_name = "nvarchar".into();
        let email = ColumnStruct::new("Email", DeclaredType::VarChar).unwrap();
        table.merge_schema(&[name, email]).unwrap();

        let merged = table.column("Name").unwrap();
        assert_eq!(merged.column_name(), "name");
        assert_eq!(merged.max_size, 100);
        assert_eq!(merged.description.as_deref(), Some("display name"));
        assert_eq!(table.column_index("Email"), Some(2));
    }
}
