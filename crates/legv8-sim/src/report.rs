//! Serializable summary of a completed run.

use legv8_core::{MachineState, RunBoundary, RunOutcome, GENERAL_REGISTER_COUNT};
use serde::{Deserialize, Serialize};

/// Final machine state plus run statistics, emitted by `run --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Instructions retired, including `HLT`.
    pub steps: u64,
    /// Retired words that did not decode.
    pub unrecognized: u64,
    /// Why the run stopped.
    pub boundary: RunBoundary,
    /// Final program counter.
    pub pc: u64,
    /// Final zero flag.
    pub zero: bool,
    /// Final negative flag.
    pub negative: bool,
    /// Whether the machine halted.
    pub halted: bool,
    /// `X0..=X31` in index order.
    pub registers: [i64; GENERAL_REGISTER_COUNT],
}

impl RunReport {
    /// Captures `state` after a run that produced `outcome`.
    #[must_use]
    pub const fn new(outcome: &RunOutcome, state: &MachineState) -> Self {
        Self {
            steps: outcome.steps,
            unrecognized: outcome.unrecognized,
            boundary: outcome.boundary,
            pc: state.arch.pc(),
            zero: state.arch.zero(),
            negative: state.arch.negative(),
            halted: state.is_halted(),
            registers: *state.arch.registers(),
        }
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures from `serde_json`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use legv8_core::{MachineState, Register, RunBoundary, RunOutcome, RunState};

    use super::RunReport;

    #[test]
    fn report_serializes_registers_and_boundary() {
        let mut state = MachineState::default();
        state.arch.set_gpr(Register::from_u5(0), 15);
        state.arch.set_flag(legv8_core::FLAGS_Z, true);
        state.run_state = RunState::Halted;
        let outcome = RunOutcome {
            steps: 17,
            unrecognized: 0,
            boundary: RunBoundary::Halted,
        };

        let report = RunReport::new(&outcome, &state);
        let json = report.to_json().expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["steps"], 17);
        assert_eq!(value["boundary"], "Halted");
        assert_eq!(value["zero"], true);
        assert_eq!(value["halted"], true);
        assert_eq!(value["registers"][0], 15);
        assert_eq!(value["registers"].as_array().map(Vec::len), Some(32));

        let back: RunReport = serde_json::from_str(&json).expect("round trip");
        assert_eq!(back, report);
    }
}
