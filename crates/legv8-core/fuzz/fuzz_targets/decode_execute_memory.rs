#![no_main]

use legv8_core::{
    classify_by_priority, classify_opcode, disassemble_one, load_program, step_one, Decoder,
    MachineState, MemoryBus, Register, RegionMemory, DATA_START, TEXT_START,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 12 {
        return;
    }

    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let seed = i64::from_le_bytes([
        data[4], data[5], data[6], data[7], data[8], data[9], data[10], data[11],
    ]);

    assert_eq!(classify_opcode(word), classify_by_priority(word));
    let decoded = Decoder::decode(word);
    let _ = decoded.to_string();

    let mut memory = RegionMemory::new();
    load_program(&mut memory, &[word], TEXT_START);
    let _ = disassemble_one(&memory, TEXT_START);

    let mut state = MachineState::default();
    for index in 0_u8..31 {
        if let Some(reg) = Register::new(index) {
            state.arch.set_gpr(reg, seed.rotate_left(u32::from(index)));
        }
    }
    // Keep one base register pointing into backed data memory.
    if let Some(base) = Register::new(2) {
        state.arch.set_gpr(base, i64::try_from(DATA_START).unwrap_or_default() + 0x100);
    }

    let (_, next) = step_one(&state, &mut memory);
    assert_eq!(next.arch.gpr(Register::ZERO), 0);
    let _ = memory.read_word(DATA_START);
});
