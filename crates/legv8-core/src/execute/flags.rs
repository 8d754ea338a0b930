//! FLAGS update behaviors for different instruction classes.

use crate::state::{FLAGS_N, FLAGS_Z};

/// Describes how FLAGS should be updated after an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// No change to FLAGS.
    #[default]
    None,
    /// Replace the zero and negative flags. Carry and overflow stay clear.
    UpdateNZ {
        /// Zero flag.
        zero: bool,
        /// Negative flag.
        negative: bool,
    },
}

impl FlagsUpdate {
    /// Derives `Z`/`N` from a signed 64-bit result.
    #[must_use]
    pub const fn from_result(result: i64) -> Self {
        Self::UpdateNZ {
            zero: result == 0,
            negative: result < 0,
        }
    }

    /// Applies this update to a raw FLAGS value.
    #[must_use]
    pub const fn apply(self, flags: u8) -> u8 {
        match self {
            Self::None => flags,
            Self::UpdateNZ { zero, negative } => {
                let mut updated = 0;
                if zero {
                    updated |= FLAGS_Z;
                }
                if negative {
                    updated |= FLAGS_N;
                }
                updated
            }
        }
    }
}
