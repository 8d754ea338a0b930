//! Decode faults and configuration errors.

use thiserror::Error;

/// Reason a fetched word could not be turned into an executable operation.
///
/// Decode never aborts a run: a faulting word retires as a no-op with the
/// default program-counter advance, and this value is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodeFault {
    /// No entry of the pattern table matches the word.
    #[error("no instruction pattern matches")]
    NoMatchingPattern,
    /// `B.cond` carried a condition code outside the supported set.
    #[error("unsupported branch condition code {code:#x}")]
    UnsupportedCondition {
        /// Raw 4-bit condition field.
        code: u8,
    },
}

/// A [`crate::CoreConfig`] value the core cannot start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ConfigError {
    /// The entry program counter is not word aligned.
    #[error("entry pc {entry_pc:#x} is not a multiple of 4")]
    UnalignedEntry {
        /// Requested entry address.
        entry_pc: u64,
    },
}
