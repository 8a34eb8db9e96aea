//! Declared column types, dialects, and resolved runtime value types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Dialect-neutral declared type of a column.
///
/// The vocabulary follows SQL Server's type names because that is the
/// superset most introspection sources can be normalized into. The raw,
/// dialect-specific spelling is kept separately on the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    // Integer types
    /// 1-byte integer.
    TinyInt,
    /// 2-byte integer.
    SmallInt,
    /// 4-byte integer.
    Int,
    /// 8-byte integer.
    BigInt,
    /// Single bit / boolean.
    Bit,

    // Exact and approximate numerics
    /// Fixed precision and scale.
    Decimal,
    /// Currency, 8 bytes.
    Money,
    /// Currency, 4 bytes.
    SmallMoney,
    /// 4-byte float.
    Real,
    /// 8-byte float.
    Float,

    // Character types
    /// Fixed-length non-Unicode string.
    Char,
    /// Variable-length non-Unicode string.
    VarChar,
    /// Unbounded non-Unicode text.
    Text,
    /// Fixed-length Unicode string.
    NChar,
    /// Variable-length Unicode string.
    NVarChar,
    /// Unbounded Unicode text.
    NText,
    /// XML document.
    Xml,

    // Binary types
    /// Fixed-length binary.
    Binary,
    /// Variable-length binary.
    VarBinary,
    /// Unbounded binary.
    Image,
    /// Row version / timestamp column. Binary on SQL Server, a point in time elsewhere.
    Timestamp,

    // Temporal types
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Date and time.
    DateTime,
    /// Date and time, minute precision.
    SmallDateTime,
    /// Date and time, extended precision.
    DateTime2,
    /// Date and time with offset.
    DateTimeOffset,

    // Other
    /// GUID / UUID.
    UniqueIdentifier,
    /// Any value.
    Variant,
    /// User-defined type.
    Udt,
    /// Table-valued structure.
    Structured,
}

impl DeclaredType {
    /// Returns the canonical upper-case name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Int => "INT",
            Self::BigInt => "BIGINT",
            Self::Bit => "BIT",
            Self::Decimal => "DECIMAL",
            Self::Money => "MONEY",
            Self::SmallMoney => "SMALLMONEY",
            Self::Real => "REAL",
            Self::Float => "FLOAT",
            Self::Char => "CHAR",
            Self::VarChar => "VARCHAR",
            Self::Text => "TEXT",
            Self::NChar => "NCHAR",
            Self::NVarChar => "NVARCHAR",
            Self::NText => "NTEXT",
            Self::Xml => "XML",
            Self::Binary => "BINARY",
            Self::VarBinary => "VARBINARY",
            Self::Image => "IMAGE",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::SmallDateTime => "SMALLDATETIME",
            Self::DateTime2 => "DATETIME2",
            Self::DateTimeOffset => "DATETIMEOFFSET",
            Self::UniqueIdentifier => "UNIQUEIDENTIFIER",
            Self::Variant => "SQL_VARIANT",
            Self::Udt => "UDT",
            Self::Structured => "STRUCTURED",
        }
    }

    /// Returns `true` for character and text types.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::VarChar
                | Self::Text
                | Self::NChar
                | Self::NVarChar
                | Self::NText
                | Self::Xml
        )
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database engine whose type system and SQL syntax apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectKind {
    /// Not yet resolved; used by detached, locally declared columns.
    #[default]
    None,
    /// Microsoft SQL Server.
    MsSql,
    /// MySQL / MariaDB.
    MySql,
    /// PostgreSQL.
    PostgreSql,
    /// SQLite.
    Sqlite,
    /// Oracle.
    Oracle,
    /// Sybase ASE.
    Sybase,
    /// Microsoft Access.
    Access,
}

impl DialectKind {
    /// Returns the dialect name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MsSql => "mssql",
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
            Self::Sybase => "sybase",
            Self::Access => "access",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete type used to hold a column's values once resolved for a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeType {
    /// Boolean.
    Bool,
    /// Unsigned byte.
    UInt8,
    /// 16-bit integer.
    Int16,
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Exact decimal.
    Decimal,
    /// String.
    String,
    /// Byte array.
    Bytes,
    /// Date and time.
    DateTime,
    /// Date and time with offset.
    DateTimeOffset,
    /// Date only.
    Date,
    /// Time of day.
    Time,
    /// GUID / UUID.
    Guid,
    /// Any value; used when no better mapping exists.
    Opaque,
}

impl RuntimeType {
    /// Returns `true` for integer, float and decimal types.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::UInt8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Float32
                | Self::Float64
                | Self::Decimal
        )
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
