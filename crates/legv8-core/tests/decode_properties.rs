//! Property coverage for decode totality, dispatch equivalence and the
//! zero-register invariant.

#![allow(clippy::pedantic, clippy::nursery, clippy::cast_possible_wrap)]

use legv8_core::{
    classify_by_priority, classify_opcode, execute_instruction, DecodeFault, DecodedInstruction,
    Decoder, MachineState, Register, RegionMemory, OPCODE_PRIORITY_ORDER, TEXT_START,
};
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;
use tracing as _;

/// Words biased towards table entries: a pattern value with random bits in
/// every position its mask leaves free.
fn pattern_biased_word() -> impl Strategy<Value = u32> {
    (0..OPCODE_PRIORITY_ORDER.len(), any::<u32>()).prop_map(|(index, noise)| {
        let (mask, value) = OPCODE_PRIORITY_ORDER[index].pattern();
        value | (noise & !mask)
    })
}

fn any_word() -> impl Strategy<Value = u32> {
    prop_oneof![any::<u32>(), pattern_biased_word()]
}

fn populated_state(values: &[i64; 31], flags: u8) -> MachineState {
    let mut state = MachineState::default();
    for (index, value) in (0_u8..).zip(values.iter()) {
        state
            .arch
            .set_gpr(Register::new(index).expect("valid register"), *value);
    }
    state.arch.set_flags(flags);
    state
}

proptest! {
    #[test]
    fn decode_is_deterministic(word in any_word()) {
        prop_assert_eq!(Decoder::decode(word), Decoder::decode(word));
    }

    #[test]
    fn dispatcher_agrees_with_ordered_scan(word in any_word()) {
        prop_assert_eq!(classify_opcode(word), classify_by_priority(word));
    }

    #[test]
    fn decoded_encoding_matches_classification(word in any_word()) {
        let decoded = Decoder::decode(word);
        match decoded {
            DecodedInstruction::Unrecognized { word: raw, fault } => {
                prop_assert_eq!(raw, word);
                match fault {
                    DecodeFault::NoMatchingPattern => prop_assert_eq!(classify_opcode(word), None),
                    DecodeFault::UnsupportedCondition { code } => {
                        prop_assert_eq!(u32::from(code), word & 0xF);
                        prop_assert!(classify_opcode(word).is_some());
                    }
                }
            }
            other => prop_assert_eq!(other.encoding(), classify_opcode(word)),
        }
    }

    #[test]
    fn unrecognized_words_only_advance_pc(
        word in any::<u32>(),
        values in prop::array::uniform31(any::<i64>()),
        flags in 0_u8..4,
    ) {
        let decoded = Decoder::decode(word);
        prop_assume!(decoded.is_unrecognized());

        let current = populated_state(&values, flags);
        let mut memory = RegionMemory::new();
        let next = execute_instruction(&decoded, &current, &mut memory);

        let mut expected = current.clone();
        expected.arch.set_pc(current.arch.pc() + 4);
        prop_assert_eq!(next, expected);
        prop_assert_eq!(memory, RegionMemory::new());
    }

    #[test]
    fn zero_register_reads_zero_after_any_instruction(
        word in any_word(),
        values in prop::array::uniform31(any::<i64>()),
        flags in 0_u8..4,
    ) {
        let current = populated_state(&values, flags);
        let mut memory = RegionMemory::new();
        let next = execute_instruction(&Decoder::decode(word), &current, &mut memory);

        prop_assert_eq!(next.arch.gpr(Register::ZERO), 0);
        prop_assert_eq!(next.arch.registers()[31], 0);
    }
}

#[test]
fn halt_word_decodes_and_stops_machine() {
    let decoded = Decoder::decode(0xD440_0000);
    assert_eq!(decoded, DecodedInstruction::Halt);

    let current = MachineState::default();
    let mut memory = RegionMemory::new();
    let next = execute_instruction(&decoded, &current, &mut memory);

    assert!(next.is_halted());
    assert_eq!(next.arch.registers(), current.arch.registers());
    assert_eq!(next.arch.pc(), TEXT_START + 4);
}
