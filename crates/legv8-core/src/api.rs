//! Public host-facing API contracts for embedding the emulator core.

use crate::decoder::INSTRUCTION_BYTES;
use crate::fault::{ConfigError, DecodeFault};
use crate::memory::TEXT_START;
use crate::{ArchitecturalState, RunState};

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Program counter seeded into a fresh machine state.
    pub entry_pc: u64,
    /// Maximum number of steps a single [`crate::run`] call may take.
    /// `None` runs until halt.
    pub max_steps: Option<u64>,
}

impl CoreConfig {
    /// Checks that the configuration describes a reachable start state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnalignedEntry`] when `entry_pc` is not a
    /// multiple of 4.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_pc % INSTRUCTION_BYTES != 0 {
            return Err(ConfigError::UnalignedEntry {
                entry_pc: self.entry_pc,
            });
        }
        Ok(())
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            entry_pc: TEXT_START,
            max_steps: None,
        }
    }
}

/// Complete machine state threaded through the step driver by value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineState {
    /// Register file, program counter and flags.
    pub arch: ArchitecturalState,
    /// Current execution state.
    pub run_state: RunState,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::with_config(&CoreConfig::default())
    }
}

impl MachineState {
    /// Creates a running machine with zeroed registers and `PC = entry_pc`.
    ///
    /// An unaligned `entry_pc` is rounded down to a word boundary; use
    /// [`CoreConfig::validate`] to reject it instead.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        let mut arch = ArchitecturalState::default();
        arch.set_pc(config.entry_pc & !(INSTRUCTION_BYTES - 1));

        Self {
            arch,
            run_state: RunState::Running,
        }
    }

    /// Returns `true` once `HLT` has retired.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.run_state.is_halted()
    }
}

/// Word-granular memory contract consumed by step execution.
///
/// Both operations are infallible from the core's point of view. Addresses
/// are passed as computed; implementations decide how to treat bytes they
/// do not back.
pub trait MemoryBus {
    /// Reads the little-endian 32-bit word at `addr`.
    fn read_word(&self, addr: u64) -> u32;

    /// Writes a little-endian 32-bit word at `addr`.
    fn write_word(&mut self, addr: u64, value: u32);
}

/// Output status from one step request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// A supported instruction retired.
    Retired {
        /// Address the word was fetched from.
        pc: u64,
        /// Raw fetched word.
        word: u32,
    },
    /// The fetched word was not a supported instruction and retired as a no-op.
    Unrecognized {
        /// Address the word was fetched from.
        pc: u64,
        /// Raw fetched word.
        word: u32,
        /// Why decoding failed.
        fault: DecodeFault,
    },
    /// `HLT` retired; the returned state is halted.
    Halted {
        /// Address of the `HLT` word.
        pc: u64,
    },
    /// The machine was already halted; nothing was fetched.
    AlreadyHalted,
}

/// Reason a [`crate::run`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunBoundary {
    /// The machine is halted.
    Halted,
    /// The configured step limit was reached before halting.
    StepLimit,
}

/// Aggregated outcome from running multiple steps until a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Number of instructions retired during this call (including `HLT`).
    pub steps: u64,
    /// Number of retired words that were unrecognized.
    pub unrecognized: u64,
    /// Why the run stopped.
    pub boundary: RunBoundary,
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, MachineState};
    use crate::fault::ConfigError;
    use crate::memory::TEXT_START;
    use crate::{Register, RunState};

    #[test]
    fn default_config_starts_at_text_segment_without_limit() {
        let config = CoreConfig::default();

        assert_eq!(config.entry_pc, TEXT_START);
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn machine_state_seeds_entry_pc_and_zeroed_registers() {
        let config = CoreConfig {
            entry_pc: 0x1000,
            max_steps: Some(8),
        };
        let state = MachineState::with_config(&config);

        assert_eq!(state.arch.pc(), 0x1000);
        assert_eq!(state.arch.flags(), 0);
        assert!(state.arch.registers().iter().all(|value| *value == 0));
        assert_eq!(state.run_state, RunState::Running);
        assert!(!state.is_halted());
    }

    #[test]
    fn validate_rejects_unaligned_entry() {
        assert_eq!(CoreConfig::default().validate(), Ok(()));

        let config = CoreConfig {
            entry_pc: 0x0040_0002,
            max_steps: None,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnalignedEntry {
                entry_pc: 0x0040_0002
            })
        );
    }

    #[test]
    fn unaligned_entry_is_rounded_down_to_a_word() {
        let config = CoreConfig {
            entry_pc: 0x0040_0007,
            max_steps: None,
        };
        let state = MachineState::with_config(&config);

        assert_eq!(state.arch.pc(), 0x0040_0004);
        assert_eq!(state.arch.pc() % 4, 0);
    }

    #[test]
    fn default_machine_state_matches_default_config() {
        let state = MachineState::default();
        assert_eq!(state.arch.pc(), TEXT_START);
        assert_eq!(state.arch.gpr(Register::ZERO), 0);
    }
}
