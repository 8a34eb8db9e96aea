//! Pending structural-change flags for a column.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of structural changes recorded against a column.
///
/// Flags combine with `|` and are queried with [`AlterOp::contains`] or `&`.
/// A column can carry several at once, e.g. renamed and modified in the same
/// diff pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct AlterOp(u8);

impl AlterOp {
    /// No pending change.
    pub const NONE: Self = Self(0);
    /// Column is added, or its definition is modified.
    pub const ADD_OR_MODIFY: Self = Self(1);
    /// Column is dropped.
    pub const DROP: Self = Self(2);
    /// Column is renamed; the previous name lives in `old_name`.
    pub const RENAME: Self = Self(4);

    const ALL: [(Self, &'static str); 3] = [
        (Self::ADD_OR_MODIFY, "ADD_OR_MODIFY"),
        (Self::DROP, "DROP"),
        (Self::RENAME, "RENAME"),
    ];

    /// Builds a flag set from raw bits, discarding unknown bits.
    #[must_use]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` when no flag is set.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` when every flag in `other` is also set in `self`.
    ///
    /// `NONE` is contained in every set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when `self` and `other` share at least one flag.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Adds the flags in `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the flags in `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Iterates over the individual flags that are set, lowest bit first.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .map(|(flag, _)| flag)
            .filter(move |flag| self.contains(*flag))
    }
}

impl From<u8> for AlterOp {
    fn from(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl From<AlterOp> for u8 {
    fn from(op: AlterOp) -> Self {
        op.0
    }
}

impl BitOr for AlterOp {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AlterOp {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for AlterOp {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for AlterOp {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl fmt::Display for AlterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = Self::ALL
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}
