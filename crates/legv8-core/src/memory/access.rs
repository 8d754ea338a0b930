//! Sub-word lane and doubleword helpers layered on the word bus.
//!
//! The bus only moves 32-bit little-endian words. Byte and halfword stores
//! are read-modify-write of the containing aligned word; doublewords are two
//! consecutive words, low half first.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::api::MemoryBus;

/// Byte width of one bus word.
pub const WORD_ACCESS_BYTES: u64 = 4;

/// Rounds `addr` down to the containing 4-byte-aligned word.
#[must_use]
pub const fn aligned_word_address(addr: u64) -> u64 {
    addr & !(WORD_ACCESS_BYTES - 1)
}

/// Byte lane (`0..4`) of `addr` within its word.
#[must_use]
pub const fn byte_lane(addr: u64) -> u32 {
    (addr % WORD_ACCESS_BYTES) as u32
}

/// Halfword lane (`0..2`) of `addr` within its word.
#[must_use]
pub const fn halfword_lane(addr: u64) -> u32 {
    byte_lane(addr) / 2
}

/// Extracts byte `lane` of `word`.
#[must_use]
pub const fn extract_byte(word: u32, lane: u32) -> u8 {
    (word >> (lane * 8)) as u8
}

/// Replaces byte `lane` of `word` with `value`.
#[must_use]
pub const fn insert_byte(word: u32, lane: u32, value: u8) -> u32 {
    let shift = lane * 8;
    (word & !(0xFF << shift)) | ((value as u32) << shift)
}

/// Extracts halfword `lane` of `word`.
#[must_use]
pub const fn extract_halfword(word: u32, lane: u32) -> u16 {
    (word >> (lane * 16)) as u16
}

/// Replaces halfword `lane` of `word` with `value`.
#[must_use]
pub const fn insert_halfword(word: u32, lane: u32, value: u16) -> u32 {
    let shift = lane * 16;
    (word & !(0xFFFF << shift)) | ((value as u32) << shift)
}

/// Reads the byte at `addr` through its containing word.
pub fn read_byte(bus: &dyn MemoryBus, addr: u64) -> u8 {
    extract_byte(bus.read_word(aligned_word_address(addr)), byte_lane(addr))
}

/// Stores one byte at `addr`, preserving the other lanes of its word.
pub fn write_byte(bus: &mut dyn MemoryBus, addr: u64, value: u8) {
    let word_addr = aligned_word_address(addr);
    let merged = insert_byte(bus.read_word(word_addr), byte_lane(addr), value);
    bus.write_word(word_addr, merged);
}

/// Reads the halfword at `addr` through its containing word.
pub fn read_halfword(bus: &dyn MemoryBus, addr: u64) -> u16 {
    extract_halfword(bus.read_word(aligned_word_address(addr)), halfword_lane(addr))
}

/// Stores one halfword at `addr`, preserving the other lane of its word.
pub fn write_halfword(bus: &mut dyn MemoryBus, addr: u64, value: u16) {
    let word_addr = aligned_word_address(addr);
    let merged = insert_halfword(bus.read_word(word_addr), halfword_lane(addr), value);
    bus.write_word(word_addr, merged);
}

/// Reads a doubleword as low word at `addr`, high word at `addr + 4`.
pub fn read_doubleword(bus: &dyn MemoryBus, addr: u64) -> u64 {
    let low = u64::from(bus.read_word(addr));
    let high = u64::from(bus.read_word(addr.wrapping_add(WORD_ACCESS_BYTES)));
    (high << 32) | low
}

/// Writes a doubleword as low word at `addr`, high word at `addr + 4`.
pub fn write_doubleword(bus: &mut dyn MemoryBus, addr: u64, value: u64) {
    bus.write_word(addr, value as u32);
    bus.write_word(addr.wrapping_add(WORD_ACCESS_BYTES), (value >> 32) as u32);
}
