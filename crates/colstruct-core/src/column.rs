//! The column structure: dialect-neutral metadata for one column.

use core::fmt;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::alter::AlterOp;
use crate::error::{ColumnError, Result};
use crate::owner::{CellState, ColumnOwner, InClauseRenderer};
use crate::typemap::{standard_resolver, TypeResolver};
use crate::types::{DeclaredType, DialectKind, RuntimeType};
use crate::value::SqlValue;

/// Metadata describing a single column, independent of the database dialect.
///
/// Side-effecting fields are only reachable through methods:
/// - [`ColumnStruct::set_column_name`] notifies the owning container,
/// - [`ColumnStruct::set_declared_type`] recomputes the runtime type.
///
/// The remaining metadata is plain data. A column may be attached to a
/// [`ColumnOwner`] through a non-owning handle; once attached, the owner's
/// dialect and resolver apply.
#[derive(Clone)]
pub struct ColumnStruct {
    column_name: String,
    /// Table the column belongs to. Informational only.
    pub table_name: String,
    declared_type: DeclaredType,
    runtime_type: RuntimeType,
    /// Type name as reported by the source database, e.g. `nvarchar`.
    pub raw_type_name: String,
    /// Maximum size in bytes or characters. `-1` means no maximum.
    pub max_size: i32,
    /// Digits after the decimal point.
    pub scale: i16,
    /// Part of the primary key.
    pub is_primary_key: bool,
    /// Covered by a unique index.
    pub is_unique_key: bool,
    /// References another table.
    pub is_foreign_key: bool,
    /// Referenced table. Kept even while `is_foreign_key` is false.
    pub foreign_key_table: Option<String>,
    /// Accepts NULL.
    pub is_nullable: bool,
    /// Generated by the database on insert.
    pub is_auto_increment: bool,
    /// Default value, if any.
    pub default_value: Option<SqlValue>,
    /// Human documentation.
    pub description: Option<String>,
    /// Previous name while `alter_op` contains [`AlterOp::RENAME`].
    pub old_name: Option<String>,
    /// Pending structural change.
    pub alter_op: AlterOp,
    dialect: DialectKind,
    owner: Option<Weak<dyn ColumnOwner>>,
    resolver: Arc<dyn TypeResolver>,
    reader_index: Option<usize>,
}

impl ColumnStruct {
    /// Creates a nullable column with no size limit.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidArgument`] if `name` is blank.
    pub fn new(name: impl AsRef<str>, declared_type: DeclaredType) -> Result<Self> {
        Self::with_options(name, declared_type, false, true, -1)
    }

    /// Creates a column with explicit auto-increment, nullability and size.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidArgument`] if `name` is blank.
    pub fn with_options(
        name: impl AsRef<str>,
        declared_type: DeclaredType,
        is_auto_increment: bool,
        is_nullable: bool,
        max_size: i32,
    ) -> Result<Self> {
        let mut column = Self::with_resolver(name, declared_type, standard_resolver())?;
        column.is_auto_increment = is_auto_increment;
        column.is_nullable = is_nullable;
        column.max_size = max_size;
        Ok(column)
    }

    /// Creates a nullable column that resolves types through `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidArgument`] if `name` is blank, or
    /// [`ColumnError::UnresolvedType`] if `resolver` cannot map the type.
    pub fn with_resolver(
        name: impl AsRef<str>,
        declared_type: DeclaredType,
        resolver: Arc<dyn TypeResolver>,
    ) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(ColumnError::InvalidArgument(
                "column name must not be empty".to_string(),
            ));
        }
        let dialect = DialectKind::None;
        let runtime_type = resolver.resolve(declared_type, dialect)?;
        Ok(Self {
            column_name: name.to_string(),
            table_name: String::new(),
            declared_type,
            runtime_type,
            raw_type_name: String::new(),
            max_size: -1,
            scale: 0,
            is_primary_key: false,
            is_unique_key: false,
            is_foreign_key: false,
            foreign_key_table: None,
            is_nullable: true,
            is_auto_increment: false,
            default_value: None,
            description: None,
            old_name: None,
            alter_op: AlterOp::NONE,
            dialect,
            owner: None,
            resolver,
            reader_index: None,
        })
    }

    /// Sets the dialect used while the column is detached and re-resolves the
    /// runtime type.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] with a strict resolver.
    pub fn with_dialect(mut self, dialect: DialectKind) -> Result<Self> {
        self.set_dialect(dialect)?;
        Ok(self)
    }

    /// Current column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Sets the column name, trimmed.
    ///
    /// When attached and the name actually changes, the owner's name index is
    /// invalidated once. Setting the current name again does nothing.
    pub fn set_column_name(&mut self, name: impl AsRef<str>) {
        let name = name.as_ref().trim();
        if name == self.column_name {
            return;
        }
        self.column_name = name.to_string();
        if let Some(owner) = self.owner() {
            trace!(column = %self.column_name, "Column renamed, invalidating name index");
            owner.invalidate_name_index();
        }
    }

    /// Renames the column and records the intent.
    ///
    /// The current name moves to `old_name` and [`AlterOp::RENAME`] is added.
    /// Renaming to the current name does nothing.
    pub fn rename(&mut self, new_name: impl AsRef<str>) {
        let new_name = new_name.as_ref().trim();
        if new_name == self.column_name {
            return;
        }
        self.old_name = Some(self.column_name.clone());
        self.alter_op |= AlterOp::RENAME;
        self.set_column_name(new_name);
    }

    /// Dialect-neutral declared type.
    #[must_use]
    pub const fn declared_type(&self) -> DeclaredType {
        self.declared_type
    }

    /// Sets the declared type and re-resolves the runtime type against the
    /// current dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] with a strict resolver; the
    /// column is left unchanged.
    pub fn set_declared_type(&mut self, declared_type: DeclaredType) -> Result<()> {
        let runtime_type = self.resolver.resolve(declared_type, self.dialect())?;
        self.declared_type = declared_type;
        self.runtime_type = runtime_type;
        Ok(())
    }

    /// Runtime type resolved when the declared type or dialect last changed.
    #[must_use]
    pub const fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// Re-resolves the runtime type against the current dialect.
    ///
    /// Must run whenever the effective dialect changes.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] with a strict resolver.
    pub fn refresh_runtime_type(&mut self) -> Result<()> {
        self.set_declared_type(self.declared_type)
    }

    /// Effective dialect: the owner's when attached, otherwise the column's own.
    #[must_use]
    pub fn dialect(&self) -> DialectKind {
        self.owner().map_or(self.dialect, |owner| owner.dialect())
    }

    /// Sets the column's own dialect.
    ///
    /// Has no effect on the effective dialect while attached.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] with a strict resolver.
    pub fn set_dialect(&mut self, dialect: DialectKind) -> Result<()> {
        self.dialect = dialect;
        if self.is_attached() {
            Ok(())
        } else {
            self.refresh_runtime_type()
        }
    }

    /// The owning container, if attached and still alive.
    #[must_use]
    pub fn owner(&self) -> Option<Arc<dyn ColumnOwner>> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    /// Returns `true` while the owning container is alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.owner().is_some()
    }

    /// Returns `true` when both columns point at the same owner, or neither has one.
    #[must_use]
    pub fn same_owner(&self, other: &Self) -> bool {
        match (&self.owner, &other.owner) {
            (None, None) => true,
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns `true` when the column is attached to exactly `owner`.
    #[must_use]
    pub fn is_owned_by(&self, owner: &Weak<dyn ColumnOwner>) -> bool {
        self.owner.as_ref().is_some_and(|own| Weak::ptr_eq(own, owner))
    }

    /// Attaches the column to `owner`.
    ///
    /// Adopts the owner's resolver and re-resolves the runtime type with the
    /// owner's dialect. Does not insert the column into the owner; that is
    /// the container's job.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] with a strict resolver.
    pub fn attach(&mut self, owner: Weak<dyn ColumnOwner>) -> Result<()> {
        if let Some(strong) = owner.upgrade() {
            self.resolver = strong.resolver();
        }
        self.owner = Some(owner);
        self.refresh_runtime_type()
    }

    /// Detaches the column; the column's own dialect applies again.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] with a strict resolver.
    pub fn detach(&mut self) -> Result<()> {
        self.owner = None;
        self.reader_index = None;
        self.refresh_runtime_type()
    }

    /// Positional index used when the column has no name.
    #[must_use]
    pub const fn reader_index(&self) -> Option<usize> {
        self.reader_index
    }

    /// Sets the positional index used when the column has no name.
    pub fn set_reader_index(&mut self, index: Option<usize>) {
        self.reader_index = index;
    }

    /// Overlays metadata from `other`.
    ///
    /// Name, type, size, scale, flags, foreign-key table, raw type name and
    /// alter op are copied unconditionally. The default value is copied only
    /// when `other` has one, and the description only when `other`'s is
    /// non-empty, so local annotations survive a merge with introspected
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] with a strict resolver.
    pub fn load_from(&mut self, other: &Self) -> Result<()> {
        self.set_column_name(&other.column_name);
        self.set_declared_type(other.declared_type)?;
        self.is_auto_increment = other.is_auto_increment;
        self.is_nullable = other.is_nullable;
        self.max_size = other.max_size;
        self.scale = other.scale;
        self.is_primary_key = other.is_primary_key;
        self.is_unique_key = other.is_unique_key;
        self.is_foreign_key = other.is_foreign_key;
        self.foreign_key_table.clone_from(&other.foreign_key_table);
        self.raw_type_name.clone_from(&other.raw_type_name);
        self.alter_op = other.alter_op;

        if other.default_value.is_some() {
            self.default_value.clone_from(&other.default_value);
        }
        if other.description.as_deref().is_some_and(|d| !d.is_empty()) {
            self.description.clone_from(&other.description);
        }
        Ok(())
    }

    fn position(&self, owner: &dyn ColumnOwner) -> Option<usize> {
        if self.column_name.is_empty() {
            self.reader_index
        } else {
            owner.resolve_index(&self.column_name)
        }
    }

    /// Assigns `value` to this column in every row of the owner.
    ///
    /// Silently does nothing when detached, when the owner has no rows, or
    /// when the column cannot be located in the owner.
    pub fn set_all_rows(&self, value: impl Into<SqlValue>) -> &Self {
        self.set_all_rows_with_state(value, None)
    }

    /// Like [`ColumnStruct::set_all_rows`], with an explicit cell state.
    pub fn set_all_rows_with_state(
        &self,
        value: impl Into<SqlValue>,
        state: Option<CellState>,
    ) -> &Self {
        let Some(owner) = self.owner() else {
            trace!(column = %self.column_name, "Detached column, skipping bulk assignment");
            return self;
        };
        let rows = owner.row_count();
        if rows == 0 {
            return self;
        }
        let Some(index) = self.position(owner.as_ref()) else {
            debug!(column = %self.column_name, "Column not found in owner, skipping bulk assignment");
            return self;
        };
        let value = value.into();
        for row in 0..rows {
            owner.set_cell(row, index, value.clone(), state);
        }
        self
    }

    /// Distinct values of this column across the owner's rows.
    ///
    /// NULLs and empty strings are excluded. Empty when detached or
    /// unresolvable.
    #[must_use]
    pub fn distinct_values(&self) -> BTreeSet<String> {
        let Some(owner) = self.owner() else {
            return BTreeSet::new();
        };
        let rows = owner.row_count();
        if rows == 0 {
            return BTreeSet::new();
        }
        let Some(index) = self.position(owner.as_ref()) else {
            return BTreeSet::new();
        };
        (0..rows)
            .filter_map(|row| owner.cell(row, index))
            .filter(|value| !value.is_null_or_empty())
            .filter_map(|value| value.to_text())
            .collect()
    }

    /// Builds a `column IN (...)` predicate from this column's distinct values.
    ///
    /// Returns an empty string, meaning "no constraint", when there are no
    /// values. Quoting is left entirely to `renderer`.
    #[must_use]
    pub fn build_in_clause(&self, renderer: &dyn InClauseRenderer) -> String {
        let values = self.distinct_values();
        if values.is_empty() {
            return String::new();
        }
        renderer.render_in_clause(self, &values, self.dialect())
    }
}

impl PartialEq for ColumnStruct {
    fn eq(&self, other: &Self) -> bool {
        self.column_name == other.column_name
            && self.table_name == other.table_name
            && self.declared_type == other.declared_type
            && self.runtime_type == other.runtime_type
            && self.raw_type_name == other.raw_type_name
            && self.max_size == other.max_size
            && self.scale == other.scale
            && self.is_primary_key == other.is_primary_key
            && self.is_unique_key == other.is_unique_key
            && self.is_foreign_key == other.is_foreign_key
            && self.foreign_key_table == other.foreign_key_table
            && self.is_nullable == other.is_nullable
            && self.is_auto_increment == other.is_auto_increment
            && self.default_value == other.default_value
            && self.description == other.description
            && self.old_name == other.old_name
            && self.alter_op == other.alter_op
            && self.dialect == other.dialect
            && self.reader_index == other.reader_index
            && self.same_owner(other)
    }
}

impl fmt::Debug for ColumnStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnStruct")
            .field("column_name", &self.column_name)
            .field("table_name", &self.table_name)
            .field("declared_type", &self.declared_type)
            .field("runtime_type", &self.runtime_type)
            .field("max_size", &self.max_size)
            .field("scale", &self.scale)
            .field("is_primary_key", &self.is_primary_key)
            .field("is_nullable", &self.is_nullable)
            .field("default_value", &self.default_value)
            .field("alter_op", &self.alter_op)
            .field("dialect", &self.dialect())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}
