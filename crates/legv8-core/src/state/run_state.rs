/// Externally visible execution state of the core.
///
/// The only transition is `Running -> Halted`, taken when `HLT` retires.
/// `Halted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// `HLT` retired; no further steps are executed.
    Halted,
}

impl RunState {
    /// Returns `true` once the core has halted.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::Halted)
    }
}
