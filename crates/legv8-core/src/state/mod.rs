//! Architectural CPU state model primitives.

/// Architectural register file types and storage model.
pub mod registers;
/// Running/halted execution state.
pub mod run_state;

pub use registers::{
    ArchitecturalState, Register, FLAGS_ACTIVE_MASK, FLAGS_C, FLAGS_N, FLAGS_V, FLAGS_Z,
    GENERAL_REGISTER_COUNT, ZERO_REGISTER_INDEX,
};
pub use run_state::RunState;
