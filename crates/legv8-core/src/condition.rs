//! Branch condition codes for `B.cond`.
//!
//! The subset never computes carry or overflow (both read as 0), so the
//! signed comparisons collapse onto the zero and negative flags:
//!
//! | code | suffix | taken when          |
//! |------|--------|---------------------|
//! | 0x0  | EQ     | Z                   |
//! | 0x1  | NE     | !Z                  |
//! | 0xA  | GE     | !N                  |
//! | 0xB  | LT     | N                   |
//! | 0xC  | GT     | !Z && !N            |
//! | 0xD  | LE     | Z \|\| N            |
//!
//! Every other code is rejected at decode time.

use std::fmt;

use crate::state::ArchitecturalState;

/// Supported `B.cond` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Condition {
    /// Equal.
    Eq = 0x0,
    /// Not equal.
    Ne = 0x1,
    /// Signed greater than or equal.
    Ge = 0xA,
    /// Signed less than.
    Lt = 0xB,
    /// Signed greater than.
    Gt = 0xC,
    /// Signed less than or equal.
    Le = 0xD,
}

impl Condition {
    /// Resolves a 4-bit condition field. Unsupported codes yield `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x0 => Some(Self::Eq),
            0x1 => Some(Self::Ne),
            0xA => Some(Self::Ge),
            0xB => Some(Self::Lt),
            0xC => Some(Self::Gt),
            0xD => Some(Self::Le),
            _ => None,
        }
    }

    /// Returns the raw 4-bit condition field.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Evaluates the predicate against raw flag values.
    #[must_use]
    pub const fn holds(self, zero: bool, negative: bool) -> bool {
        match self {
            Self::Eq => zero,
            Self::Ne => !zero,
            Self::Ge => !negative,
            Self::Lt => negative,
            Self::Gt => !zero && !negative,
            Self::Le => zero || negative,
        }
    }

    /// Evaluates the predicate against an architectural state's flags.
    #[must_use]
    pub const fn holds_for(self, state: &ArchitecturalState) -> bool {
        self.holds(state.zero(), state.negative())
    }

    /// Assembly suffix (`EQ`, `NE`, ...).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Le => "LE",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}
