//! Serializable schema snapshots.
//!
//! A snapshot captures the persistent metadata of a table's columns so a
//! schema can be stored as JSON and reloaded later. Rows, owner handles and
//! resolved runtime types are not stored; runtime types are re-resolved on
//! load.

use std::sync::Arc;

use colstruct_core::{
    standard_resolver, AlterOp, ColumnOwner, ColumnStruct, DeclaredType, DialectKind, SqlValue,
    TypeResolver,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::DataTable;

/// Persistent metadata of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub declared_type: DeclaredType,
    /// Raw type name from the source database.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_type_name: String,
    /// Maximum size, `-1` for none.
    pub max_size: i32,
    /// Scale.
    pub scale: i16,
    /// Primary key flag.
    pub is_primary_key: bool,
    /// Unique key flag.
    pub is_unique_key: bool,
    /// Foreign key flag.
    pub is_foreign_key: bool,
    /// Referenced table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key_table: Option<String>,
    /// Nullability.
    pub is_nullable: bool,
    /// Auto-increment flag.
    pub is_auto_increment: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SqlValue>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Previous name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    /// Pending alter intent.
    #[serde(default, skip_serializing_if = "no_alter")]
    pub alter_op: AlterOp,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_alter(op: &AlterOp) -> bool {
    op.is_none()
}

impl From<&ColumnStruct> for ColumnSnapshot {
    fn from(column: &ColumnStruct) -> Self {
        Self {
            name: column.column_name().to_string(),
            declared_type: column.declared_type(),
            raw_type_name: column.raw_type_name.clone(),
            max_size: column.max_size,
            scale: column.scale,
            is_primary_key: column.is_primary_key,
            is_unique_key: column.is_unique_key,
            is_foreign_key: column.is_foreign_key,
            foreign_key_table: column.foreign_key_table.clone(),
            is_nullable: column.is_nullable,
            is_auto_increment: column.is_auto_increment,
            default_value: column.default_value.clone(),
            description: column.description.clone(),
            old_name: column.old_name.clone(),
            alter_op: column.alter_op,
        }
    }
}

impl ColumnSnapshot {
    /// Rebuilds a detached column from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the type cannot be resolved.
    pub fn to_column(&self, resolver: Arc<dyn TypeResolver>) -> Result<ColumnStruct> {
        let mut column = ColumnStruct::with_resolver(&self.name, self.declared_type, resolver)?;
        column.raw_type_name.clone_from(&self.raw_type_name);
        column.max_size = self.max_size;
        column.scale = self.scale;
        column.is_primary_key = self.is_primary_key;
        column.is_unique_key = self.is_unique_key;
        column.is_foreign_key = self.is_foreign_key;
        column.foreign_key_table.clone_from(&self.foreign_key_table);
        column.is_nullable = self.is_nullable;
        column.is_auto_increment = self.is_auto_increment;
        column.default_value.clone_from(&self.default_value);
        column.description.clone_from(&self.description);
        column.old_name.clone_from(&self.old_name);
        column.alter_op = self.alter_op;
        Ok(column)
    }
}

/// Persistent metadata of a table's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name.
    pub name: String,
    /// Dialect the schema was captured in.
    pub dialect: DialectKind,
    /// Columns in order.
    pub columns: Vec<ColumnSnapshot>,
}

impl DataTable {
    /// Captures the column schema.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            name: self.name().to_string(),
            dialect: self.dialect(),
            columns: self.columns().iter().map(ColumnSnapshot::from).collect(),
        }
    }

    /// Serializes the column schema as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Serialization`](crate::TableError::Serialization)
    /// if serialization fails.
    pub fn schema_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Builds an empty table from a snapshot, using the standard type map.
    ///
    /// # Errors
    ///
    /// Returns an error if a column cannot be rebuilt or names collide.
    pub fn from_snapshot(snapshot: &TableSnapshot) -> Result<Arc<Self>> {
        let table = Self::new(snapshot.name.clone(), snapshot.dialect);
        let resolver = standard_resolver();
        for column in &snapshot.columns {
            table.add_column(column.to_column(Arc::clone(&resolver))?)?;
        }
        Ok(table)
    }

    /// Builds an empty table from JSON produced by [`DataTable::schema_json`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Serialization`](crate::TableError::Serialization)
    /// for malformed JSON, or any error from [`DataTable::from_snapshot`].
    pub fn from_schema_json(json: &str) -> Result<Arc<Self>> {
        let snapshot: TableSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }
}
