//! In-memory tabular container for `colstruct-core` column structures.
//!
//! [`DataTable`] owns an ordered set of [`ColumnStruct`](colstruct_core::ColumnStruct)s
//! and the rows typed by them, and acts as their
//! [`ColumnOwner`](colstruct_core::ColumnOwner). [`SqlFragments`] renders the
//! `IN` predicates columns build from those rows.
//!
//! # Example
//!
//! ```rust
//! use colstruct_core::{ColumnStruct, DeclaredType, DialectKind, SqlValue};
//! use colstruct_table::{DataTable, SqlFragments};
//!
//! let table = DataTable::new("Customers", DialectKind::MsSql);
//! table.add_column(ColumnStruct::new("City", DeclaredType::NVarChar)?)?;
//! for city in ["NY", "LA", "NY"] {
//!     table.add_row(vec![SqlValue::from(city)])?;
//! }
//!
//! let city = table.column("City").expect("column exists");
//! assert_eq!(city.build_in_clause(&SqlFragments), "[City] IN ('LA','NY')");
//! # Ok::<(), colstruct_table::TableError>(())
//! ```

pub mod error;
pub mod snapshot;
pub mod sql;
pub mod table;

pub use error::{Result, TableError};
pub use snapshot::{ColumnSnapshot, TableSnapshot};
pub use sql::SqlFragments;
pub use table::{Cell, DataTable, DataTableBuilder};
