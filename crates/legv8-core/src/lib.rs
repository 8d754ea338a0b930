//! Decode-execute core for a LEGv8 instruction-set emulator.

/// Memory model primitives and fixed region map.
pub mod memory;
pub use memory::{
    decode_memory_region, MemoryRegion, RegionDescriptor, RegionMemory, DATA_END, DATA_START,
    FIXED_MEMORY_REGIONS, REGION_BYTES, TEXT_END, TEXT_START, WORD_ACCESS_BYTES,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreConfig, MachineState, MemoryBus, RunBoundary, RunOutcome, StepOutcome,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{
    ArchitecturalState, Register, RunState, FLAGS_N, FLAGS_Z, GENERAL_REGISTER_COUNT,
    ZERO_REGISTER_INDEX,
};

/// Instruction pattern table and order-independent classification.
pub mod encoding;
pub use encoding::{classify_by_priority, classify_opcode, OpcodeEncoding, OPCODE_PRIORITY_ORDER};

/// Branch condition codes and predicates.
pub mod condition;
pub use condition::Condition;

/// Instruction decode pipeline with per-family field extraction.
pub mod decoder;
pub use decoder::{
    CompareBranchOperands, DecodedInstruction, Decoder, ImmediateOperands, MemoryOperands,
    RegisterOperands, ShiftOperands, WideImmediateOperands, INSTRUCTION_BYTES,
};

/// Decode fault and configuration error taxonomy.
pub mod fault;
pub use fault::{ConfigError, DecodeFault};

/// Instruction execution pipeline and step driver.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, run, stage_instruction, step_one, ExecuteState,
    FlagsUpdate,
};

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble_one, disassemble_range, DisassemblyRow};

/// Program image parsing and loading.
pub mod loader;
pub use loader::{load_program, load_program_file, parse_program, LoadError, MAX_PROGRAM_WORDS};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
