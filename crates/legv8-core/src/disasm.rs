//! Instruction disassembly for the LEGv8 subset.
//!
//! Rendering goes through [`fmt::Display`] on [`DecodedInstruction`], so the
//! step tracer and the listing tools share one text form.

use std::fmt;

use crate::decoder::{DecodedInstruction, Decoder, INSTRUCTION_BYTES};
use crate::encoding::OpcodeEncoding;
use crate::MemoryBus;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address the word was read from.
    pub address: u64,
    /// Raw instruction word.
    pub word: u32,
    /// Rendered assembly text.
    pub text: String,
    /// Whether the word decoded as unrecognized.
    pub is_unrecognized: bool,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}:  {:08x}  {}", self.address, self.word, self.text)
    }
}

/// Disassembles the word at `address`.
#[must_use]
pub fn disassemble_one(memory: &dyn MemoryBus, address: u64) -> DisassemblyRow {
    let word = memory.read_word(address);
    let instruction = Decoder::decode(word);

    DisassemblyRow {
        address,
        word,
        text: instruction.to_string(),
        is_unrecognized: instruction.is_unrecognized(),
    }
}

/// Disassembles `count` consecutive words starting at `start`.
#[must_use]
pub fn disassemble_range(memory: &dyn MemoryBus, start: u64, count: usize) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut address = start;

    for _ in 0..count {
        rows.push(disassemble_one(memory, address));
        address = address.wrapping_add(INSTRUCTION_BYTES);
    }

    rows
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.encoding().map_or("", OpcodeEncoding::mnemonic);

        match self {
            Self::Halt => f.write_str(mnemonic),
            Self::AddImmediate(ops) | Self::AddsImmediate(ops) | Self::SubsImmediate(ops) => {
                write!(f, "{mnemonic} {}, {}, #{}", ops.rd, ops.rn, ops.imm)
            }
            Self::CmpImmediate(ops) => write!(f, "{mnemonic} {}, #{}", ops.rn, ops.imm),
            Self::AddRegister(ops)
            | Self::AddsRegister(ops)
            | Self::SubsRegister(ops)
            | Self::AndsRegister(ops)
            | Self::EorRegister(ops)
            | Self::OrrRegister(ops)
            | Self::Mul(ops) => write!(f, "{mnemonic} {}, {}, {}", ops.rd, ops.rn, ops.rm),
            Self::CmpRegister(ops) => write!(f, "{mnemonic} {}, {}", ops.rn, ops.rm),
            Self::Movz(ops) => {
                write!(f, "{mnemonic} {}, #{:#x}", ops.rd, ops.imm)?;
                if ops.hw != 0 {
                    write!(f, ", LSL #{}", u32::from(ops.hw) * 16)?;
                }
                Ok(())
            }
            Self::LslImmediate(ops) | Self::LsrImmediate(ops) => {
                write!(f, "{mnemonic} {}, {}, #{}", ops.rd, ops.rn, ops.amount)
            }
            Self::Stur(ops)
            | Self::Sturb(ops)
            | Self::Sturh(ops)
            | Self::Ldur(ops)
            | Self::Ldurb(ops)
            | Self::Ldurh(ops) => {
                write!(f, "{mnemonic} {}, [{}, #{}]", ops.rt, ops.rn, ops.offset)
            }
            Self::Branch { offset } => write!(f, "{mnemonic} #{offset:+}"),
            Self::BranchRegister { target } => write!(f, "{mnemonic} {target}"),
            Self::Cbz(ops) | Self::Cbnz(ops) => {
                write!(f, "{mnemonic} {}, #{:+}", ops.tested, ops.offset)
            }
            Self::BranchConditional { condition, offset } => {
                write!(f, "B.{condition} #{offset:+}")
            }
            Self::Unrecognized { word, .. } => write!(f, ".word {word:#010x} ; unrecognized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{disassemble_range, DisassemblyRow};
    use crate::memory::{RegionMemory, TEXT_START};
    use crate::{Decoder, MemoryBus};

    #[rstest]
    #[case(0xD440_0000, "HLT")]
    #[case(0xB100_2820, "ADDS X0, X1, #10")]
    #[case(0x9140_0462, "ADD X2, X3, #4096")]
    #[case(0xF100_283F, "CMP X1, #10")]
    #[case(0xEB05_0083, "SUBS X3, X4, X5")]
    #[case(0xEB05_009F, "CMP X4, X5")]
    #[case(0x9B02_0020, "MUL X0, X1, X2")]
    #[case(0xD29F_FDE7, "MOVZ X7, #0xffef")]
    #[case(0xD2A2_4681, "MOVZ X1, #0x1234, LSL #16")]
    #[case(0xD37C_EC41, "LSL X1, X2, #4")]
    #[case(0xD384_FC41, "LSR X1, X2, #4")]
    #[case(0xF85F_8043, "LDUR X3, [X2, #-8]")]
    #[case(0x3800_2041, "STURB X1, [X2, #2]")]
    #[case(0x1400_0004, "B #+16")]
    #[case(0x17FF_FFFF, "B #-4")]
    #[case(0xD61F_03C0, "BR X30")]
    #[case(0xB400_0042, "CBZ X2, #+8")]
    #[case(0x5400_008C, "B.GT #+16")]
    #[case(0x0000_0000, ".word 0x00000000 ; unrecognized")]
    #[case(0x5400_004E, ".word 0x5400004e ; unrecognized")]
    fn renders_assembly_text(#[case] word: u32, #[case] expected: &str) {
        assert_eq!(Decoder::decode(word).to_string(), expected);
    }

    #[test]
    fn range_listing_walks_consecutive_words() {
        let mut memory = RegionMemory::new();
        memory.write_word(TEXT_START, 0xB100_2820);
        memory.write_word(TEXT_START + 4, 0xFFFF_FFFF);
        memory.write_word(TEXT_START + 8, 0xD440_0000);

        let rows = disassemble_range(&memory, TEXT_START, 3);

        assert_eq!(
            rows[0],
            DisassemblyRow {
                address: TEXT_START,
                word: 0xB100_2820,
                text: "ADDS X0, X1, #10".to_string(),
                is_unrecognized: false,
            }
        );
        assert!(rows[1].is_unrecognized);
        assert_eq!(rows[2].text, "HLT");
        assert_eq!(
            rows[2].to_string(),
            "0x00400008:  d4400000  HLT"
        );
    }
}
