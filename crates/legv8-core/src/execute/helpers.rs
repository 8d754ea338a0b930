//! Helper functions for instruction execution.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::decoder::{MemoryOperands, INSTRUCTION_BYTES};
use crate::state::ArchitecturalState;

/// Computes `X[rn] + offset` with unsigned 64-bit wrap-around.
#[must_use]
pub const fn compute_effective_address(
    operands: &MemoryOperands,
    state: &ArchitecturalState,
) -> u64 {
    (state.gpr(operands.rn) as u64).wrapping_add(operands.offset as u64)
}

/// Computes a PC-relative branch target with wrap-around.
#[must_use]
pub const fn branch_target(pc: u64, offset: i64) -> u64 {
    pc.wrapping_add_signed(offset)
}

/// Address of the sequentially next instruction.
#[must_use]
pub const fn sequential_pc(pc: u64) -> u64 {
    pc.wrapping_add(INSTRUCTION_BYTES)
}

/// Logical left shift of the 64-bit pattern.
#[must_use]
pub const fn shift_left(value: i64, amount: u32) -> i64 {
    ((value as u64) << (amount % 64)) as i64
}

/// Zero-filling right shift of the 64-bit pattern, reinterpreted as signed.
#[must_use]
pub const fn shift_right_logical(value: i64, amount: u32) -> i64 {
    ((value as u64) >> (amount % 64)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Register;

    #[test]
    fn effective_address_wraps_on_negative_offset() {
        let mut state = ArchitecturalState::default();
        let rn = Register::from_u5(2);
        state.set_gpr(rn, 0);

        let operands = MemoryOperands {
            rt: Register::from_u5(3),
            rn,
            offset: -8,
        };
        assert_eq!(compute_effective_address(&operands, &state), u64::MAX - 7);
    }

    #[test]
    fn branch_target_handles_both_directions() {
        assert_eq!(branch_target(0x1000, 16), 0x1010);
        assert_eq!(branch_target(0x1000, -4), 0x0FFC);
        assert_eq!(branch_target(0, -4), u64::MAX - 3);
        assert_eq!(sequential_pc(0x1000), 0x1004);
    }

    #[test]
    fn logical_right_shift_zero_fills() {
        assert_eq!(shift_right_logical(-1, 60), 0xF);
        assert_eq!(shift_right_logical(-1, 0), -1);
        assert_eq!(shift_left(1, 63), i64::MIN);
        assert_eq!(shift_left(3, 0), 3);
    }
}
