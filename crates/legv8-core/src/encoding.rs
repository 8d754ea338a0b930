//! Instruction pattern table and opcode classification.
//!
//! Every supported instruction is identified by a `(mask, value)` pair: a word
//! belongs to an encoding when `word & mask == value`. The only overlapping
//! pairs are the compare aliases (`CMP` is `SUBS` with `Rd = XZR`), which are
//! resolved by an explicit guard. Everything else is dispatched on the fixed
//! high byte, where at most one entry of each bucket can match, so the result
//! does not depend on table order.

/// Canonical supported encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum OpcodeEncoding {
    Hlt,
    Br,
    CmpRegister,
    SubsRegister,
    AddsRegister,
    AddRegister,
    AndsRegister,
    EorRegister,
    OrrRegister,
    Mul,
    CmpImmediate,
    Stur,
    Sturb,
    Sturh,
    Ldur,
    Ldurb,
    Ldurh,
    LslImmediate,
    LsrImmediate,
    SubsImmediate,
    AddsImmediate,
    AddImmediate,
    Movz,
    BCond,
    Cbz,
    Cbnz,
    B,
}

/// Mask covering the `Rd` field (bits 4..0).
pub const RD_FIELD_MASK: u32 = 0x0000_001F;

/// All encodings ordered from most to least constrained mask.
///
/// Scanning this list and taking the first match is the reference
/// classification; [`classify_opcode`] must agree with it for every word.
pub const OPCODE_PRIORITY_ORDER: [OpcodeEncoding; 27] = [
    OpcodeEncoding::Hlt,
    OpcodeEncoding::Br,
    OpcodeEncoding::CmpRegister,
    OpcodeEncoding::SubsRegister,
    OpcodeEncoding::AddsRegister,
    OpcodeEncoding::AddRegister,
    OpcodeEncoding::AndsRegister,
    OpcodeEncoding::EorRegister,
    OpcodeEncoding::OrrRegister,
    OpcodeEncoding::Mul,
    OpcodeEncoding::CmpImmediate,
    OpcodeEncoding::Stur,
    OpcodeEncoding::Sturb,
    OpcodeEncoding::Sturh,
    OpcodeEncoding::Ldur,
    OpcodeEncoding::Ldurb,
    OpcodeEncoding::Ldurh,
    OpcodeEncoding::LslImmediate,
    OpcodeEncoding::LsrImmediate,
    OpcodeEncoding::SubsImmediate,
    OpcodeEncoding::AddsImmediate,
    OpcodeEncoding::AddImmediate,
    OpcodeEncoding::Movz,
    OpcodeEncoding::BCond,
    OpcodeEncoding::Cbz,
    OpcodeEncoding::Cbnz,
    OpcodeEncoding::B,
];

impl OpcodeEncoding {
    /// Returns the `(mask, value)` identification pair.
    #[must_use]
    pub const fn pattern(self) -> (u32, u32) {
        match self {
            Self::Hlt => (0xFFFF_FC1F, 0xD440_0000),
            Self::Br => (0xFFFF_FC1F, 0xD61F_0000),
            Self::CmpRegister => (0xFFE0_FC1F, 0xEB00_001F),
            Self::SubsRegister => (0xFFE0_FC00, 0xEB00_0000),
            Self::AddsRegister => (0xFFE0_FC00, 0xAB00_0000),
            Self::AddRegister => (0xFFE0_FC00, 0x8B00_0000),
            Self::AndsRegister => (0xFFE0_FC00, 0xEA00_0000),
            Self::EorRegister => (0xFFE0_FC00, 0xCA00_0000),
            Self::OrrRegister => (0xFFE0_FC00, 0xAA00_0000),
            Self::Mul => (0xFFE0_FC00, 0x9B00_0000),
            Self::CmpImmediate => (0xFF80_001F, 0xF100_001F),
            Self::Stur => (0xFFC0_0000, 0xF800_0000),
            Self::Sturb => (0xFFC0_0000, 0x3800_0000),
            Self::Sturh => (0xFFC0_0000, 0x7800_0000),
            Self::Ldur => (0xFFC0_0000, 0xF840_0000),
            Self::Ldurb => (0xFFC0_0000, 0x3840_0000),
            Self::Ldurh => (0xFFC0_0000, 0x7840_0000),
            Self::LslImmediate => (0xFFC0_0000, 0xD340_0000),
            Self::LsrImmediate => (0xFFC0_0000, 0xD380_0000),
            Self::SubsImmediate => (0xFF80_0000, 0xF100_0000),
            Self::AddsImmediate => (0xFF80_0000, 0xB100_0000),
            Self::AddImmediate => (0xFF80_0000, 0x9100_0000),
            Self::Movz => (0xFF80_0000, 0xD280_0000),
            Self::BCond => (0xFF00_0010, 0x5400_0000),
            Self::Cbz => (0x7F00_0000, 0x3400_0000),
            Self::Cbnz => (0x7F00_0000, 0x3500_0000),
            Self::B => (0xFC00_0000, 0x1400_0000),
        }
    }

    /// Returns `true` when `word` carries this encoding's fixed bits.
    #[must_use]
    pub const fn matches(self, word: u32) -> bool {
        let (mask, value) = self.pattern();
        word & mask == value
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Hlt => "HLT",
            Self::Br => "BR",
            Self::CmpRegister | Self::CmpImmediate => "CMP",
            Self::SubsRegister | Self::SubsImmediate => "SUBS",
            Self::AddsRegister | Self::AddsImmediate => "ADDS",
            Self::AddRegister | Self::AddImmediate => "ADD",
            Self::AndsRegister => "ANDS",
            Self::EorRegister => "EOR",
            Self::OrrRegister => "ORR",
            Self::Mul => "MUL",
            Self::Stur => "STUR",
            Self::Sturb => "STURB",
            Self::Sturh => "STURH",
            Self::Ldur => "LDUR",
            Self::Ldurb => "LDURB",
            Self::Ldurh => "LDURH",
            Self::LslImmediate => "LSL",
            Self::LsrImmediate => "LSR",
            Self::Movz => "MOVZ",
            Self::BCond => "B.cond",
            Self::Cbz => "CBZ",
            Self::Cbnz => "CBNZ",
            Self::B => "B",
        }
    }

    /// Returns the general encoding an alias is carved out of, if any.
    #[must_use]
    pub const fn alias_of(self) -> Option<Self> {
        match self {
            Self::CmpRegister => Some(Self::SubsRegister),
            Self::CmpImmediate => Some(Self::SubsImmediate),
            _ => None,
        }
    }
}

/// Reference classification: first match over [`OPCODE_PRIORITY_ORDER`].
#[must_use]
pub fn classify_by_priority(word: u32) -> Option<OpcodeEncoding> {
    OPCODE_PRIORITY_ORDER
        .iter()
        .copied()
        .find(|encoding| encoding.matches(word))
}

/// Classifies a word into its encoding.
///
/// `None` means the word is not a supported instruction.
#[must_use]
pub fn classify_opcode(word: u32) -> Option<OpcodeEncoding> {
    if let Some(alias) = resolve_compare_alias(word) {
        return Some(alias);
    }

    candidates_for_high_byte(high_byte(word))
        .iter()
        .copied()
        .find(|encoding| encoding.matches(word))
}

/// Resolves the `CMP` aliases, which share every fixed bit with `SUBS`
/// except a destination field pinned to `XZR`.
#[must_use]
pub const fn resolve_compare_alias(word: u32) -> Option<OpcodeEncoding> {
    if word & RD_FIELD_MASK != RD_FIELD_MASK {
        return None;
    }

    if OpcodeEncoding::CmpRegister.matches(word) {
        Some(OpcodeEncoding::CmpRegister)
    } else if OpcodeEncoding::CmpImmediate.matches(word) {
        Some(OpcodeEncoding::CmpImmediate)
    } else {
        None
    }
}

/// Extracts bits 31..24 of an instruction word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn high_byte(word: u32) -> u8 {
    (word >> 24) as u8
}

/// Encodings whose fixed bits are compatible with a given high byte.
///
/// Entries inside one bucket are pairwise disjoint, so their order is
/// irrelevant. Aliases never appear here.
#[must_use]
pub const fn candidates_for_high_byte(byte: u8) -> &'static [OpcodeEncoding] {
    use OpcodeEncoding as E;

    match byte {
        0x14..=0x17 => &[E::B],
        0x34 | 0xB4 => &[E::Cbz],
        0x35 | 0xB5 => &[E::Cbnz],
        0x38 => &[E::Sturb, E::Ldurb],
        0x54 => &[E::BCond],
        0x78 => &[E::Sturh, E::Ldurh],
        0x8B => &[E::AddRegister],
        0x91 => &[E::AddImmediate],
        0x9B => &[E::Mul],
        0xAA => &[E::OrrRegister],
        0xAB => &[E::AddsRegister],
        0xB1 => &[E::AddsImmediate],
        0xCA => &[E::EorRegister],
        0xD2 => &[E::Movz],
        0xD3 => &[E::LslImmediate, E::LsrImmediate],
        0xD4 => &[E::Hlt],
        0xD6 => &[E::Br],
        0xEA => &[E::AndsRegister],
        0xEB => &[E::SubsRegister],
        0xF1 => &[E::SubsImmediate],
        0xF8 => &[E::Stur, E::Ldur],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        candidates_for_high_byte, classify_by_priority, classify_opcode, high_byte,
        resolve_compare_alias, OpcodeEncoding, OPCODE_PRIORITY_ORDER,
    };

    const fn overlaps(a: OpcodeEncoding, b: OpcodeEncoding) -> bool {
        let (mask_a, value_a) = a.pattern();
        let (mask_b, value_b) = b.pattern();
        (value_a ^ value_b) & mask_a & mask_b == 0
    }

    #[test]
    fn priority_order_lists_every_encoding_once() {
        let unique: HashSet<_> = OPCODE_PRIORITY_ORDER.iter().collect();
        assert_eq!(unique.len(), OPCODE_PRIORITY_ORDER.len());
    }

    #[test]
    fn priority_order_runs_from_most_to_least_constrained() {
        let fixed_bits: Vec<u32> = OPCODE_PRIORITY_ORDER
            .iter()
            .map(|encoding| encoding.pattern().0.count_ones())
            .collect();
        assert!(fixed_bits.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn pattern_values_only_set_masked_bits() {
        for encoding in OPCODE_PRIORITY_ORDER {
            let (mask, value) = encoding.pattern();
            assert_eq!(value & !mask, 0, "{encoding:?}");
        }
    }

    #[test]
    fn only_compare_aliases_overlap() {
        for (i, a) in OPCODE_PRIORITY_ORDER.iter().enumerate() {
            for b in &OPCODE_PRIORITY_ORDER[i + 1..] {
                let is_alias_pair = a.alias_of() == Some(*b) || b.alias_of() == Some(*a);
                assert_eq!(
                    overlaps(*a, *b),
                    is_alias_pair,
                    "{a:?} / {b:?} overlap mismatch"
                );
            }
        }
    }

    #[test]
    fn every_non_alias_encoding_is_reachable_from_its_high_byte() {
        for encoding in OPCODE_PRIORITY_ORDER {
            if encoding.alias_of().is_some() {
                continue;
            }
            let (_, value) = encoding.pattern();
            assert!(
                candidates_for_high_byte(high_byte(value)).contains(&encoding),
                "{encoding:?} missing from bucket {:#04x}",
                high_byte(value)
            );
        }
    }

    #[test]
    fn compare_alias_wins_only_with_zero_register_destination() {
        assert_eq!(
            classify_opcode(0xEB02_003F),
            Some(OpcodeEncoding::CmpRegister)
        );
        assert_eq!(
            classify_opcode(0xEB02_0020),
            Some(OpcodeEncoding::SubsRegister)
        );
        assert_eq!(
            classify_opcode(0xF100_283F),
            Some(OpcodeEncoding::CmpImmediate)
        );
        assert_eq!(
            classify_opcode(0xF100_2820),
            Some(OpcodeEncoding::SubsImmediate)
        );
        assert_eq!(resolve_compare_alias(0xAB00_001F), None);
    }

    #[test]
    fn known_words_classify() {
        assert_eq!(classify_opcode(0xD440_0000), Some(OpcodeEncoding::Hlt));
        assert_eq!(classify_opcode(0xD61F_0020), Some(OpcodeEncoding::Br));
        assert_eq!(classify_opcode(0x1400_0002), Some(OpcodeEncoding::B));
        assert_eq!(classify_opcode(0x17FF_FFFF), Some(OpcodeEncoding::B));
        assert_eq!(classify_opcode(0xB400_0042), Some(OpcodeEncoding::Cbz));
        assert_eq!(classify_opcode(0x5400_004C), Some(OpcodeEncoding::BCond));
        assert_eq!(classify_opcode(0x5400_001C), None);
        assert_eq!(classify_opcode(0x0000_0000), None);
        assert_eq!(classify_opcode(0xFFFF_FFFF), None);
    }

    #[test]
    fn dispatcher_agrees_with_priority_scan_on_pattern_values() {
        for encoding in OPCODE_PRIORITY_ORDER {
            let (mask, value) = encoding.pattern();
            for noise in [0, u32::MAX, 0xA5A5_A5A5, 0x5A5A_5A5A, 0x0000_FFFF, 0xFFFF_0000] {
                let word = value | (noise & !mask);
                assert_eq!(
                    classify_opcode(word),
                    classify_by_priority(word),
                    "word {word:#010x}"
                );
            }
        }
    }
}
