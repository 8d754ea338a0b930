//! Instruction execution pipeline.
//!
//! Every step follows the same commit sequence:
//! 1. Read source operands from the current state
//! 2. Compute the result, effective address or branch target
//! 3. Perform memory reads and writes through the bus
//! 4. Write the destination register
//! 5. Update FLAGS
//! 6. Set the next PC (pre-advanced by 4 unless a branch is taken)
//!
//! Steps 1-3 only stage effects in an [`ExecuteState`]; the current state is
//! never mutated. [`commit_execution`] builds the next state from a copy of
//! the current one, and the run loop owns the swap.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

mod flags;
mod helpers;

pub use flags::FlagsUpdate;
pub use helpers::{
    branch_target, compute_effective_address, sequential_pc, shift_left, shift_right_logical,
};

use crate::decoder::{
    CompareBranchOperands, DecodedInstruction, ImmediateOperands, MemoryOperands,
    RegisterOperands, ShiftOperands, WideImmediateOperands,
};
use crate::memory::{
    read_byte, read_doubleword, read_halfword, write_byte, write_doubleword, write_halfword,
};
use crate::state::Register;
use crate::{
    CoreConfig, Decoder, MachineState, MemoryBus, RunBoundary, RunOutcome, RunState, StepOutcome,
};

/// Side effects staged by one instruction, applied by [`commit_execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteState {
    /// Destination register and value to write.
    pub dest: Option<(Register, i64)>,
    /// FLAGS update to apply.
    pub flags_update: FlagsUpdate,
    /// PC value to set after commit.
    pub next_pc: u64,
    /// Whether the machine halts after this instruction.
    pub halt: bool,
}

impl ExecuteState {
    /// Creates a staged state that only performs the default PC advance.
    #[must_use]
    pub const fn sequential(pc: u64) -> Self {
        Self {
            dest: None,
            flags_update: FlagsUpdate::None,
            next_pc: sequential_pc(pc),
            halt: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AluOp {
    Add,
    Sub,
    And,
    Eor,
    Orr,
    Mul,
}

impl AluOp {
    const fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            Self::And => lhs & rhs,
            Self::Eor => lhs ^ rhs,
            Self::Orr => lhs | rhs,
            Self::Mul => lhs.wrapping_mul(rhs),
        }
    }
}

/// What an ALU instruction does with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultPolicy {
    Write,
    WriteAndSetFlags,
    FlagsOnly,
}

/// Stages the effects of `instr` against `current` without mutating it.
///
/// Stores are performed on `memory` immediately; loads read from it. No
/// register, flag or PC change happens until [`commit_execution`].
pub fn stage_instruction(
    instr: &DecodedInstruction,
    current: &MachineState,
    memory: &mut dyn MemoryBus,
) -> ExecuteState {
    let pc = current.arch.pc();
    let mut exec = ExecuteState::sequential(pc);

    match *instr {
        DecodedInstruction::Halt => exec.halt = true,
        DecodedInstruction::AddImmediate(ops) => {
            execute_alu_immediate(&ops, current, &mut exec, AluOp::Add, ResultPolicy::Write);
        }
        DecodedInstruction::AddsImmediate(ops) => execute_alu_immediate(
            &ops,
            current,
            &mut exec,
            AluOp::Add,
            ResultPolicy::WriteAndSetFlags,
        ),
        DecodedInstruction::SubsImmediate(ops) => execute_alu_immediate(
            &ops,
            current,
            &mut exec,
            AluOp::Sub,
            ResultPolicy::WriteAndSetFlags,
        ),
        DecodedInstruction::CmpImmediate(ops) => {
            execute_alu_immediate(&ops, current, &mut exec, AluOp::Sub, ResultPolicy::FlagsOnly);
        }
        DecodedInstruction::AddRegister(ops) => {
            execute_alu_register(&ops, current, &mut exec, AluOp::Add, ResultPolicy::Write);
        }
        DecodedInstruction::AddsRegister(ops) => execute_alu_register(
            &ops,
            current,
            &mut exec,
            AluOp::Add,
            ResultPolicy::WriteAndSetFlags,
        ),
        DecodedInstruction::SubsRegister(ops) => execute_alu_register(
            &ops,
            current,
            &mut exec,
            AluOp::Sub,
            ResultPolicy::WriteAndSetFlags,
        ),
        DecodedInstruction::CmpRegister(ops) => {
            execute_alu_register(&ops, current, &mut exec, AluOp::Sub, ResultPolicy::FlagsOnly);
        }
        DecodedInstruction::AndsRegister(ops) => execute_alu_register(
            &ops,
            current,
            &mut exec,
            AluOp::And,
            ResultPolicy::WriteAndSetFlags,
        ),
        DecodedInstruction::EorRegister(ops) => {
            execute_alu_register(&ops, current, &mut exec, AluOp::Eor, ResultPolicy::Write);
        }
        DecodedInstruction::OrrRegister(ops) => {
            execute_alu_register(&ops, current, &mut exec, AluOp::Orr, ResultPolicy::Write);
        }
        DecodedInstruction::Mul(ops) => {
            execute_alu_register(&ops, current, &mut exec, AluOp::Mul, ResultPolicy::Write);
        }
        DecodedInstruction::Movz(ops) => execute_movz(&ops, &mut exec),
        DecodedInstruction::LslImmediate(ops) => {
            execute_shift(&ops, current, &mut exec, shift_left);
        }
        DecodedInstruction::LsrImmediate(ops) => {
            execute_shift(&ops, current, &mut exec, shift_right_logical);
        }
        DecodedInstruction::Stur(ops) => execute_store(&ops, current, memory, StoreWidth::Double),
        DecodedInstruction::Sturb(ops) => execute_store(&ops, current, memory, StoreWidth::Byte),
        DecodedInstruction::Sturh(ops) => execute_store(&ops, current, memory, StoreWidth::Half),
        DecodedInstruction::Ldur(ops) => {
            execute_load(&ops, current, memory, &mut exec, StoreWidth::Double);
        }
        DecodedInstruction::Ldurb(ops) => {
            execute_load(&ops, current, memory, &mut exec, StoreWidth::Byte);
        }
        DecodedInstruction::Ldurh(ops) => {
            execute_load(&ops, current, memory, &mut exec, StoreWidth::Half);
        }
        DecodedInstruction::Branch { offset } => exec.next_pc = branch_target(pc, offset),
        DecodedInstruction::BranchRegister { target } => {
            exec.next_pc = current.arch.gpr(target) as u64;
        }
        DecodedInstruction::Cbz(ops) => execute_compare_branch(&ops, current, &mut exec, true),
        DecodedInstruction::Cbnz(ops) => execute_compare_branch(&ops, current, &mut exec, false),
        DecodedInstruction::BranchConditional { condition, offset } => {
            if condition.holds_for(&current.arch) {
                exec.next_pc = branch_target(pc, offset);
            }
        }
        DecodedInstruction::Unrecognized { .. } => {}
    }

    exec
}

/// Builds the next state by applying staged effects to a copy of `current`.
#[must_use]
pub fn commit_execution(current: &MachineState, exec: &ExecuteState) -> MachineState {
    let mut next = current.clone();

    if let Some((reg, value)) = exec.dest {
        next.arch.set_gpr(reg, value);
    }
    next.arch
        .set_flags(exec.flags_update.apply(current.arch.flags()));
    next.arch.set_pc(exec.next_pc);
    if exec.halt {
        next.run_state = RunState::Halted;
    }

    next
}

/// Executes one decoded instruction, returning the next machine state.
///
/// `current` is only read. Unrecognized instructions yield a state that
/// differs from `current` only by the default PC advance.
#[must_use]
pub fn execute_instruction(
    instr: &DecodedInstruction,
    current: &MachineState,
    memory: &mut dyn MemoryBus,
) -> MachineState {
    let exec = stage_instruction(instr, current, memory);
    commit_execution(current, &exec)
}

fn execute_alu_immediate(
    ops: &ImmediateOperands,
    current: &MachineState,
    exec: &mut ExecuteState,
    op: AluOp,
    policy: ResultPolicy,
) {
    let lhs = current.arch.gpr(ops.rn);
    stage_alu_result(exec, ops.rd, op.apply(lhs, ops.imm), policy);
}

fn execute_alu_register(
    ops: &RegisterOperands,
    current: &MachineState,
    exec: &mut ExecuteState,
    op: AluOp,
    policy: ResultPolicy,
) {
    let lhs = current.arch.gpr(ops.rn);
    let rhs = current.arch.gpr(ops.rm);
    stage_alu_result(exec, ops.rd, op.apply(lhs, rhs), policy);
}

fn stage_alu_result(exec: &mut ExecuteState, rd: Register, result: i64, policy: ResultPolicy) {
    match policy {
        ResultPolicy::Write => exec.dest = Some((rd, result)),
        ResultPolicy::WriteAndSetFlags => {
            exec.dest = Some((rd, result));
            exec.flags_update = FlagsUpdate::from_result(result);
        }
        ResultPolicy::FlagsOnly => exec.flags_update = FlagsUpdate::from_result(result),
    }
}

fn execute_movz(ops: &WideImmediateOperands, exec: &mut ExecuteState) {
    exec.dest = Some((ops.rd, i64::from(ops.imm)));
}

fn execute_shift(
    ops: &ShiftOperands,
    current: &MachineState,
    exec: &mut ExecuteState,
    shift: fn(i64, u32) -> i64,
) {
    let value = current.arch.gpr(ops.rn);
    exec.dest = Some((ops.rd, shift(value, ops.amount)));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreWidth {
    Byte,
    Half,
    Double,
}

fn execute_store(
    ops: &MemoryOperands,
    current: &MachineState,
    memory: &mut dyn MemoryBus,
    width: StoreWidth,
) {
    let addr = compute_effective_address(ops, &current.arch);
    let value = current.arch.gpr(ops.rt);

    // Narrow stores take the low bits of the data register.
    match width {
        StoreWidth::Byte => write_byte(memory, addr, value as u8),
        StoreWidth::Half => write_halfword(memory, addr, value as u16),
        StoreWidth::Double => write_doubleword(memory, addr, value as u64),
    }
}

fn execute_load(
    ops: &MemoryOperands,
    current: &MachineState,
    memory: &dyn MemoryBus,
    exec: &mut ExecuteState,
    width: StoreWidth,
) {
    let addr = compute_effective_address(ops, &current.arch);

    let value = match width {
        StoreWidth::Byte => i64::from(read_byte(memory, addr)),
        StoreWidth::Half => i64::from(read_halfword(memory, addr)),
        StoreWidth::Double => read_doubleword(memory, addr) as i64,
    };

    exec.dest = Some((ops.rt, value));
}

fn execute_compare_branch(
    ops: &CompareBranchOperands,
    current: &MachineState,
    exec: &mut ExecuteState,
    branch_if_zero: bool,
) {
    let is_zero = current.arch.gpr(ops.tested) == 0;
    if is_zero == branch_if_zero {
        exec.next_pc = branch_target(current.arch.pc(), ops.offset);
    }
}

/// Fetches, decodes and executes the instruction at `PC`.
///
/// Returns the outcome together with the next state; `current` is left
/// untouched and the caller commits. A halted machine is not stepped.
pub fn step_one(current: &MachineState, memory: &mut dyn MemoryBus) -> (StepOutcome, MachineState) {
    if current.is_halted() {
        return (StepOutcome::AlreadyHalted, current.clone());
    }

    let pc = current.arch.pc();
    let word = memory.read_word(pc);
    let instruction = Decoder::decode(word);
    tracing::debug!(pc, word, instruction = %instruction, "step");

    let next = execute_instruction(&instruction, current, memory);

    let outcome = match instruction {
        DecodedInstruction::Halt => {
            tracing::info!(pc, "halted");
            StepOutcome::Halted { pc }
        }
        DecodedInstruction::Unrecognized { fault, .. } => {
            tracing::warn!(pc, word, %fault, "unrecognized instruction retired as no-op");
            StepOutcome::Unrecognized { pc, word, fault }
        }
        _ => StepOutcome::Retired { pc, word },
    };

    (outcome, next)
}

/// Runs steps until the machine halts or `config.max_steps` is reached.
///
/// Each step's next state is committed into `state` before the next fetch.
pub fn run(state: &mut MachineState, memory: &mut dyn MemoryBus, config: &CoreConfig) -> RunOutcome {
    let mut steps = 0_u64;
    let mut unrecognized = 0_u64;

    loop {
        if state.is_halted() {
            return RunOutcome {
                steps,
                unrecognized,
                boundary: RunBoundary::Halted,
            };
        }
        if config.max_steps.is_some_and(|limit| steps >= limit) {
            tracing::debug!(steps, "step limit reached");
            return RunOutcome {
                steps,
                unrecognized,
                boundary: RunBoundary::StepLimit,
            };
        }

        let (outcome, next) = step_one(state, memory);
        *state = next;
        steps += 1;
        if matches!(outcome, StepOutcome::Unrecognized { .. }) {
            unrecognized += 1;
        }
    }
}
