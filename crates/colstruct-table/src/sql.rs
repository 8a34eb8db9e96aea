//! Dialect-aware SQL fragments.

use std::collections::BTreeSet;

use colstruct_core::{ColumnStruct, DialectKind, InClauseRenderer, RuntimeType};

/// Renders predicate fragments with dialect-correct quoting.
///
/// Values of numeric columns are emitted bare when they parse as numbers,
/// boolean columns use the dialect's literal, and everything else is a
/// single-quoted string with embedded quotes doubled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlFragments;

impl SqlFragments {
    /// Creates a new renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Quotes an identifier for `dialect`.
    #[must_use]
    pub fn quote_identifier(name: &str, dialect: DialectKind) -> String {
        match dialect {
            DialectKind::MsSql | DialectKind::Sybase | DialectKind::Access => {
                format!("[{}]", name.replace(']', "]]"))
            }
            DialectKind::MySql => format!("`{}`", name.replace('`', "``")),
            _ => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Renders one value as a literal for a column of type `runtime_type`.
    #[must_use]
    pub fn literal(value: &str, runtime_type: RuntimeType, dialect: DialectKind) -> String {
        if runtime_type.is_numeric() && value.parse::<f64>().is_ok_and(f64::is_finite) {
            return value.to_string();
        }
        if runtime_type == RuntimeType::Bool {
            let truthy = match value.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            };
            if let Some(b) = truthy {
                return match (dialect, b) {
                    (DialectKind::PostgreSql, true) => "TRUE".to_string(),
                    (DialectKind::PostgreSql, false) => "FALSE".to_string(),
                    (_, true) => "1".to_string(),
                    (_, false) => "0".to_string(),
                };
            }
        }
        format!("'{}'", value.replace('\'', "''"))
    }
}

impl InClauseRenderer for SqlFragments {
    fn render_in_clause(
        &self,
        column: &ColumnStruct,
        values: &BTreeSet<String>,
        dialect: DialectKind,
    ) -> String {
        let name = Self::quote_identifier(column.column_name(), dialect);
        let literals: Vec<String> = values
            .iter()
            .map(|v| Self::literal(v, column.runtime_type(), dialect))
            .collect();
        if let [single] = literals.as_slice() {
            format!("{name} = {single}")
        } else {
            format!("{name} IN ({})", literals.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstruct_core::DeclaredType;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(SqlFragments::quote_identifier("City", DialectKind::MsSql), "[City]");
        assert_eq!(SqlFragments::quote_identifier("City", DialectKind::MySql), "`City`");
        assert_eq!(SqlFragments::quote_identifier("City", DialectKind::PostgreSql), "\"City\"");
        assert_eq!(SqlFragments::quote_identifier("a]b", DialectKind::MsSql), "[a]]b]");
    }

    #[test]
    fn test_literal_escaping() {
        assert_eq!(
            SqlFragments::literal("O'Brien", RuntimeType::String, DialectKind::MsSql),
            "'O''Brien'"
        );
        assert_eq!(
            SqlFragments::literal("'; DROP TABLE users; --", RuntimeType::String, DialectKind::Sqlite),
            "'''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn test_numeric_literal_must_parse() {
        assert_eq!(SqlFragments::literal("42", RuntimeType::Int32, DialectKind::MsSql), "42");
        assert_eq!(SqlFragments::literal("4.5", RuntimeType::Decimal, DialectKind::MsSql), "4.5");
        assert_eq!(
            SqlFragments::literal("1 OR 1=1", RuntimeType::Int32, DialectKind::MsSql),
            "'1 OR 1=1'"
        );
        assert_eq!(SqlFragments::literal("NaN", RuntimeType::Float64, DialectKind::MsSql), "'NaN'");
    }

    #[test]
    fn test_bool_literal() {
        assert_eq!(SqlFragments::literal("true", RuntimeType::Bool, DialectKind::PostgreSql), "TRUE");
        assert_eq!(SqlFragments::literal("false", RuntimeType::Bool, DialectKind::MsSql), "0");
    }

    #[test]
    fn test_render_in_clause() {
        let col = ColumnStruct::new("City", DeclaredType::NVarChar).unwrap();
        let sql = SqlFragments.render_in_clause(&col, &set(&["NY", "LA"]), DialectKind::MsSql);
        assert_eq!(sql, "[City] IN ('LA','NY')");

        let single = SqlFragments.render_in_clause(&col, &set(&["NY"]), DialectKind::PostgreSql);
        assert_eq!(single, "\"City\" = 'NY'");
    }

    #[test]
    fn test_render_in_clause_numeric() {
        let col = ColumnStruct::new("Id", DeclaredType::BigInt).unwrap();
        let sql = SqlFragments::new().render_in_clause(&col, &set(&["1", "2", "3"]), DialectKind::MySql);
        assert_eq!(sql, "`Id` IN (1,2,3)");
    }
}
