//! Cell and default values.

use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A value held by a cell or used as a column default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Bytes(Vec<u8>),
    /// Date and time value.
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for NULL and for empty text.
    #[must_use]
    pub fn is_null_or_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the value as display text, or `None` for NULL.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u8> for SqlValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_null_or_empty() {
        assert!(SqlValue::Null.is_null_or_empty());
        assert!(SqlValue::from("").is_null_or_empty());
        assert!(!SqlValue::from(" ").is_null_or_empty());
        assert!(!SqlValue::Int(0).is_null_or_empty());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(SqlValue::Null.to_text(), None);
        assert_eq!(SqlValue::Int(-7).to_text().as_deref(), Some("-7"));
        assert_eq!(SqlValue::Bool(true).to_text().as_deref(), Some("true"));
        assert_eq!(
            SqlValue::Bytes(vec![0xAB, 0x01]).to_text().as_deref(),
            Some("0xAB01")
        );
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(8, 5, 0))
            .map(SqlValue::from);
        assert_eq!(
            ts.and_then(|v| v.to_text()).as_deref(),
            Some("2024-03-09 08:05:00")
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(SqlValue::from(42_i32), SqlValue::Int(42));
        assert_eq!(SqlValue::from(None::<i32>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".into()));
        assert_eq!(SqlValue::from(2.5_f64), SqlValue::Float(2.5));
    }
}
