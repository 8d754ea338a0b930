//! Text dumps of machine state and memory.

use std::fmt::Write as _;

use legv8_core::memory::aligned_word_address;
use legv8_core::{MachineState, MemoryBus, Register, WORD_ACCESS_BYTES, ZERO_REGISTER_INDEX};

/// Renders `PC`, flags, run state and every general-purpose register, one
/// per line. Values are shown in hex and signed decimal.
#[must_use]
pub fn format_registers(state: &MachineState) -> String {
    let arch = &state.arch;
    let mut out = String::new();

    let _ = writeln!(out, "{:<6} : {:#018x}", "PC", arch.pc());
    let _ = writeln!(
        out,
        "{:<6} : Z={} N={}",
        "Flags",
        u8::from(arch.zero()),
        u8::from(arch.negative())
    );
    let _ = writeln!(
        out,
        "{:<6} : {}",
        "Halted",
        if state.is_halted() { "yes" } else { "no" }
    );

    for index in 0..=ZERO_REGISTER_INDEX {
        let reg = Register::from_u5(u32::from(index));
        let value = arch.gpr(reg);
        let _ = writeln!(out, "{:<6} : {value:#018x} ({value})", reg.to_string());
    }

    out
}

/// Renders the words covering `lo..=hi`, one aligned word per line.
///
/// `lo` is rounded down to a word boundary. An inverted range renders
/// nothing.
#[must_use]
pub fn format_memory(memory: &dyn MemoryBus, lo: u64, hi: u64) -> String {
    let mut out = String::new();
    let mut addr = aligned_word_address(lo);

    while addr <= hi {
        let _ = writeln!(out, "{addr:#010x}: {:#010x}", memory.read_word(addr));
        match addr.checked_add(WORD_ACCESS_BYTES) {
            Some(next) => addr = next,
            None => break,
        }
    }
    out
}
