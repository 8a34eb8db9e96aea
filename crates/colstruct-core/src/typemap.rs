//! Resolution of declared types to runtime value types.
//!
//! A [`TypeResolver`] maps `(DeclaredType, DialectKind)` to a [`RuntimeType`].
//! Resolvers are immutable and shared behind an `Arc`, so several dialects can
//! be exercised side by side without any process-wide mutable table.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::{ColumnError, Result};
use crate::types::{DeclaredType, DialectKind, RuntimeType};

/// Maps a declared type to the runtime type used for a dialect.
pub trait TypeResolver: Send + Sync {
    /// Resolves `declared` for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::UnresolvedType`] when the combination has no
    /// mapping and the resolver has no fallback.
    fn resolve(&self, declared: DeclaredType, dialect: DialectKind) -> Result<RuntimeType>;
}

/// Built-in mapping shared by every [`TypeMap`].
///
/// Returns `None` for types with no portable runtime representation.
#[must_use]
pub const fn standard_mapping(declared: DeclaredType, dialect: DialectKind) -> Option<RuntimeType> {
    use DeclaredType as D;
    use DialectKind as K;

    let ty = match declared {
        // SQLite stores every integer affinity as a 64-bit value.
        D::TinyInt | D::SmallInt | D::Int | D::BigInt if matches!(dialect, K::Sqlite) => {
            RuntimeType::Int64
        }
        D::TinyInt => match dialect {
            K::MsSql | K::Sybase | K::Access | K::None => RuntimeType::UInt8,
            _ => RuntimeType::Int16,
        },
        D::SmallInt => RuntimeType::Int16,
        D::Int => match dialect {
            // Oracle INTEGER is NUMBER(38).
            K::Oracle => RuntimeType::Decimal,
            _ => RuntimeType::Int32,
        },
        D::BigInt => RuntimeType::Int64,
        D::Bit => match dialect {
            // NUMBER(1)
            K::Oracle => RuntimeType::Int16,
            _ => RuntimeType::Bool,
        },
        D::Decimal | D::Money | D::SmallMoney => RuntimeType::Decimal,
        D::Real => RuntimeType::Float32,
        D::Float => RuntimeType::Float64,
        D::Char | D::VarChar | D::Text | D::NChar | D::NVarChar | D::NText | D::Xml => {
            RuntimeType::String
        }
        D::Binary | D::VarBinary | D::Image => RuntimeType::Bytes,
        D::Timestamp => match dialect {
            K::MsSql | K::Sybase => RuntimeType::Bytes,
            _ => RuntimeType::DateTime,
        },
        D::Date => match dialect {
            K::Oracle | K::Access => RuntimeType::DateTime,
            _ => RuntimeType::Date,
        },
        D::Time => match dialect {
            K::Oracle | K::Access => RuntimeType::DateTime,
            _ => RuntimeType::Time,
        },
        D::DateTime | D::SmallDateTime | D::DateTime2 => RuntimeType::DateTime,
        D::DateTimeOffset => match dialect {
            K::MsSql | K::PostgreSql | K::Oracle | K::None => RuntimeType::DateTimeOffset,
            _ => RuntimeType::DateTime,
        },
        D::UniqueIdentifier => match dialect {
            K::MsSql | K::PostgreSql | K::Access | K::None => RuntimeType::Guid,
            _ => RuntimeType::String,
        },
        D::Variant | D::Udt | D::Structured => return None,
    };
    Some(ty)
}

/// Immutable lookup table from `(DeclaredType, DialectKind)` to [`RuntimeType`].
///
/// Overrides take precedence over [`standard_mapping`]. Combinations neither
/// covers resolve to the fallback, or fail when the map is strict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    overrides: HashMap<(DeclaredType, DialectKind), RuntimeType>,
    fallback: Option<RuntimeType>,
}

impl TypeMap {
    /// The standard map: built-in mappings with an [`RuntimeType::Opaque`] fallback.
    #[must_use]
    pub fn standard() -> Self {
        Self::builder().build()
    }

    /// Built-in mappings without a fallback.
    #[must_use]
    pub fn strict() -> Self {
        Self::builder().without_fallback().build()
    }

    /// Starts building a customised map.
    #[must_use]
    pub fn builder() -> TypeMapBuilder {
        TypeMapBuilder::default()
    }

    /// Looks up a mapping without applying the fallback.
    #[must_use]
    pub fn lookup(&self, declared: DeclaredType, dialect: DialectKind) -> Option<RuntimeType> {
        self.overrides
            .get(&(declared, dialect))
            .copied()
            .or_else(|| standard_mapping(declared, dialect))
    }

    /// Returns the configured fallback.
    #[must_use]
    pub const fn fallback(&self) -> Option<RuntimeType> {
        self.fallback
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeResolver for TypeMap {
    fn resolve(&self, declared: DeclaredType, dialect: DialectKind) -> Result<RuntimeType> {
        if let Some(ty) = self.lookup(declared, dialect) {
            return Ok(ty);
        }
        match self.fallback {
            Some(fallback) => {
                debug!(%declared, %dialect, %fallback, "No type mapping, using fallback");
                Ok(fallback)
            }
            None => Err(ColumnError::UnresolvedType { declared, dialect }),
        }
    }
}

/// Builder for [`TypeMap`].
#[derive(Debug, Clone)]
pub struct TypeMapBuilder {
    overrides: HashMap<(DeclaredType, DialectKind), RuntimeType>,
    fallback: Option<RuntimeType>,
}

impl Default for TypeMapBuilder {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            fallback: Some(RuntimeType::Opaque),
        }
    }
}

impl TypeMapBuilder {
    /// Overrides the mapping for one declared type in one dialect.
    #[must_use]
    pub fn map(mut self, declared: DeclaredType, dialect: DialectKind, ty: RuntimeType) -> Self {
        self.overrides.insert((declared, dialect), ty);
        self
    }

    /// Sets the type used when no mapping exists.
    #[must_use]
    pub const fn fallback(mut self, ty: RuntimeType) -> Self {
        self.fallback = Some(ty);
        self
    }

    /// Makes unmapped combinations an error.
    #[must_use]
    pub const fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Builds the map.
    #[must_use]
    pub fn build(self) -> TypeMap {
        TypeMap {
            overrides: self.overrides,
            fallback: self.fallback,
        }
    }
}

/// Returns the shared standard resolver.
#[must_use]
pub fn standard_resolver() -> Arc<dyn TypeResolver> {
    static STANDARD: OnceLock<Arc<TypeMap>> = OnceLock::new();
    let map = STANDARD.get_or_init(|| Arc::new(TypeMap::standard()));
    Arc::clone(map) as Arc<dyn TypeResolver>
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIALECTS: [DialectKind; 8] = [
        DialectKind::None,
        DialectKind::MsSql,
        DialectKind::MySql,
        DialectKind::PostgreSql,
        DialectKind::Sqlite,
        DialectKind::Oracle,
        DialectKind::Sybase,
        DialectKind::Access,
    ];

    #[test]
    fn test_integer_types() {
        let map = TypeMap::standard();
        assert_eq!(
            map.resolve(DeclaredType::Int, DialectKind::MsSql),
            Ok(RuntimeType::Int32)
        );
        assert_eq!(
            map.resolve(DeclaredType::Int, DialectKind::Sqlite),
            Ok(RuntimeType::Int64)
        );
        assert_eq!(
            map.resolve(DeclaredType::TinyInt, DialectKind::MsSql),
            Ok(RuntimeType::UInt8)
        );
        assert_eq!(
            map.resolve(DeclaredType::TinyInt, DialectKind::PostgreSql),
            Ok(RuntimeType::Int16)
        );
    }

    #[test]
    fn test_dialect_specific_types() {
        let map = TypeMap::standard();
        assert_eq!(
            map.resolve(DeclaredType::Bit, DialectKind::Oracle),
            Ok(RuntimeType::Int16)
        );
        assert_eq!(
            map.resolve(DeclaredType::Timestamp, DialectKind::MsSql),
            Ok(RuntimeType::Bytes)
        );
        assert_eq!(
            map.resolve(DeclaredType::Timestamp, DialectKind::MySql),
            Ok(RuntimeType::DateTime)
        );
        assert_eq!(
            map.resolve(DeclaredType::UniqueIdentifier, DialectKind::PostgreSql),
            Ok(RuntimeType::Guid)
        );
        assert_eq!(
            map.resolve(DeclaredType::UniqueIdentifier, DialectKind::MySql),
            Ok(RuntimeType::String)
        );
    }

    #[test]
    fn test_standard_map_is_total() {
        let map = TypeMap::standard();
        for dialect in DIALECTS {
            assert_eq!(
                map.resolve(DeclaredType::Variant, dialect),
                Ok(RuntimeType::Opaque)
            );
            assert!(map.resolve(DeclaredType::NVarChar, dialect).is_ok());
        }
    }

    #[test]
    fn test_strict_map_reports_unresolved() {
        let map = TypeMap::strict();
        assert_eq!(
            map.resolve(DeclaredType::Udt, DialectKind::MsSql),
            Err(ColumnError::UnresolvedType {
                declared: DeclaredType::Udt,
                dialect: DialectKind::MsSql,
            })
        );
        assert_eq!(
            map.resolve(DeclaredType::Int, DialectKind::MsSql),
            Ok(RuntimeType::Int32)
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let map = TypeMap::builder()
            .map(DeclaredType::Bit, DialectKind::MySql, RuntimeType::UInt8)
            .fallback(RuntimeType::String)
            .build();
        assert_eq!(
            map.resolve(DeclaredType::Bit, DialectKind::MySql),
            Ok(RuntimeType::UInt8)
        );
        assert_eq!(
            map.resolve(DeclaredType::Bit, DialectKind::MsSql),
            Ok(RuntimeType::Bool)
        );
        assert_eq!(
            map.resolve(DeclaredType::Structured, DialectKind::MsSql),
            Ok(RuntimeType::String)
        );
    }

    #[test]
    fn test_standard_resolver_is_shared() {
        let a = standard_resolver();
        let b = standard_resolver();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
