//! # colstruct-core
//!
//! Dialect-neutral column structures for a data-access layer.
//!
//! This crate provides:
//! - [`ColumnStruct`], a column's full metadata (type, size, keys, default,
//!   nullability) in a dialect-neutral form
//! - [`AlterOp`], the pending add/drop/rename intent used by schema diffing
//! - [`TypeResolver`] and the standard [`TypeMap`], resolving a declared type
//!   to the runtime value type of a specific dialect
//! - the [`ColumnOwner`] and [`InClauseRenderer`] seams to the container
//!   that owns the columns and to SQL generation
//!
//! ## Example
//!
//! ```rust
//! use colstruct_core::{AlterOp, ColumnStruct, DeclaredType, DialectKind, RuntimeType};
//!
//! let mut col = ColumnStruct::new("is_active", DeclaredType::Bit)?
//!     .with_dialect(DialectKind::Oracle)?;
//! assert_eq!(col.runtime_type(), RuntimeType::Int16);
//!
//! col.rename("active");
//! col.alter_op |= AlterOp::ADD_OR_MODIFY;
//! assert_eq!(col.old_name.as_deref(), Some("is_active"));
//! assert!(col.alter_op.contains(AlterOp::RENAME));
//! # Ok::<(), colstruct_core::ColumnError>(())
//! ```

pub mod alter;
pub mod column;
pub mod error;
pub mod owner;
pub mod typemap;
pub mod types;
pub mod value;

pub use alter::AlterOp;
pub use column::ColumnStruct;
pub use error::{ColumnError, Result};
pub use owner::{CellState, ColumnOwner, InClauseRenderer};
pub use typemap::{standard_mapping, standard_resolver, TypeMap, TypeMapBuilder, TypeResolver};
pub use types::{DeclaredType, DialectKind, RuntimeType};
pub use value::SqlValue;
