//! Instruction decoder for the LEGv8 subset.
//!
//! Decoding is total: every 32-bit word yields a [`DecodedInstruction`], with
//! unsupported words mapped to [`DecodedInstruction::Unrecognized`]. Each
//! encoding family has its own extractor producing a differently shaped
//! operand payload, so the executor can match exhaustively over variants.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::condition::Condition;
use crate::encoding::{classify_opcode, OpcodeEncoding};
use crate::fault::DecodeFault;
use crate::state::Register;

/// Width in bytes of one instruction word.
pub const INSTRUCTION_BYTES: u64 = 4;

/// Operands of the immediate arithmetic family (`ADD`/`ADDS`/`SUBS`/`CMP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImmediateOperands {
    /// Destination register (`XZR` for `CMP`).
    pub rd: Register,
    /// Source register.
    pub rn: Register,
    /// Unsigned 12-bit immediate, already scaled by the shift code.
    pub imm: i64,
    /// Raw 2-bit shift code (bits 23..22).
    pub shift: u8,
}

/// Operands of the three-register family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterOperands {
    /// Destination register (`XZR` for `CMP`).
    pub rd: Register,
    /// First source register.
    pub rn: Register,
    /// Second source register.
    pub rm: Register,
}

/// Operands of `MOVZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WideImmediateOperands {
    /// Destination register.
    pub rd: Register,
    /// 16-bit payload placed in the low half-word.
    pub imm: u16,
    /// Raw half-word selector (bits 22..21). Only 0 is fully supported.
    pub hw: u8,
}

/// Operands of the explicit shift-immediate family (`LSL`/`LSR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftOperands {
    /// Destination register.
    pub rd: Register,
    /// Source register.
    pub rn: Register,
    /// Effective shift count in `0..64`.
    pub amount: u32,
}

/// Operands of the unscaled load/store family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryOperands {
    /// Register holding (store) or receiving (load) the data.
    pub rt: Register,
    /// Base address register.
    pub rn: Register,
    /// Sign-extended 9-bit byte offset.
    pub offset: i64,
}

/// Operands of `CBZ`/`CBNZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompareBranchOperands {
    /// Register compared against zero.
    pub tested: Register,
    /// Scaled, sign-extended byte offset from the branch.
    pub offset: i64,
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DecodedInstruction {
    Halt,
    AddImmediate(ImmediateOperands),
    AddsImmediate(ImmediateOperands),
    SubsImmediate(ImmediateOperands),
    CmpImmediate(ImmediateOperands),
    AddRegister(RegisterOperands),
    AddsRegister(RegisterOperands),
    SubsRegister(RegisterOperands),
    CmpRegister(RegisterOperands),
    AndsRegister(RegisterOperands),
    EorRegister(RegisterOperands),
    OrrRegister(RegisterOperands),
    Mul(RegisterOperands),
    Movz(WideImmediateOperands),
    LslImmediate(ShiftOperands),
    LsrImmediate(ShiftOperands),
    Stur(MemoryOperands),
    Sturb(MemoryOperands),
    Sturh(MemoryOperands),
    Ldur(MemoryOperands),
    Ldurb(MemoryOperands),
    Ldurh(MemoryOperands),
    /// Unconditional PC-relative branch.
    Branch {
        /// Scaled, sign-extended byte offset.
        offset: i64,
    },
    /// Branch to the address held in a register.
    ///
    /// The target comes from `Rn` (bits 9:5), not from the `Rd` position
    /// (bits 4:0), which the `BR` pattern fixes to zero.
    BranchRegister {
        /// Register holding the target address (`Rn`, bits 9:5).
        target: Register,
    },
    Cbz(CompareBranchOperands),
    Cbnz(CompareBranchOperands),
    /// `B.cond` with a resolved condition.
    BranchConditional {
        /// Resolved condition.
        condition: Condition,
        /// Scaled, sign-extended byte offset.
        offset: i64,
    },
    /// The word is not a supported instruction; executes as a no-op.
    Unrecognized {
        /// Raw fetched word.
        word: u32,
        /// Why decoding failed.
        fault: DecodeFault,
    },
}

impl DecodedInstruction {
    /// Returns the matched encoding, or `None` for unrecognized words.
    #[must_use]
    pub const fn encoding(&self) -> Option<OpcodeEncoding> {
        Some(match self {
            Self::Halt => OpcodeEncoding::Hlt,
            Self::AddImmediate(_) => OpcodeEncoding::AddImmediate,
            Self::AddsImmediate(_) => OpcodeEncoding::AddsImmediate,
            Self::SubsImmediate(_) => OpcodeEncoding::SubsImmediate,
            Self::CmpImmediate(_) => OpcodeEncoding::CmpImmediate,
            Self::AddRegister(_) => OpcodeEncoding::AddRegister,
            Self::AddsRegister(_) => OpcodeEncoding::AddsRegister,
            Self::SubsRegister(_) => OpcodeEncoding::SubsRegister,
            Self::CmpRegister(_) => OpcodeEncoding::CmpRegister,
            Self::AndsRegister(_) => OpcodeEncoding::AndsRegister,
            Self::EorRegister(_) => OpcodeEncoding::EorRegister,
            Self::OrrRegister(_) => OpcodeEncoding::OrrRegister,
            Self::Mul(_) => OpcodeEncoding::Mul,
            Self::Movz(_) => OpcodeEncoding::Movz,
            Self::LslImmediate(_) => OpcodeEncoding::LslImmediate,
            Self::LsrImmediate(_) => OpcodeEncoding::LsrImmediate,
            Self::Stur(_) => OpcodeEncoding::Stur,
            Self::Sturb(_) => OpcodeEncoding::Sturb,
            Self::Sturh(_) => OpcodeEncoding::Sturh,
            Self::Ldur(_) => OpcodeEncoding::Ldur,
            Self::Ldurb(_) => OpcodeEncoding::Ldurb,
            Self::Ldurh(_) => OpcodeEncoding::Ldurh,
            Self::Branch { .. } => OpcodeEncoding::B,
            Self::BranchRegister { .. } => OpcodeEncoding::Br,
            Self::Cbz(_) => OpcodeEncoding::Cbz,
            Self::Cbnz(_) => OpcodeEncoding::Cbnz,
            Self::BranchConditional { .. } => OpcodeEncoding::BCond,
            Self::Unrecognized { .. } => return None,
        })
    }

    /// Returns the decode fault for unrecognized words.
    #[must_use]
    pub const fn fault(&self) -> Option<DecodeFault> {
        match self {
            Self::Unrecognized { fault, .. } => Some(*fault),
            _ => None,
        }
    }

    /// Returns `true` for [`DecodedInstruction::Unrecognized`].
    #[must_use]
    pub const fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized { .. })
    }
}

/// Instruction decoder for the LEGv8 subset.
pub struct Decoder;

impl Decoder {
    /// Decodes a 32-bit instruction word.
    #[must_use]
    pub fn decode(word: u32) -> DecodedInstruction {
        let Some(encoding) = classify_opcode(word) else {
            return DecodedInstruction::Unrecognized {
                word,
                fault: DecodeFault::NoMatchingPattern,
            };
        };

        match encoding {
            OpcodeEncoding::Hlt => DecodedInstruction::Halt,
            OpcodeEncoding::AddImmediate => {
                DecodedInstruction::AddImmediate(extract_immediate(word))
            }
            OpcodeEncoding::AddsImmediate => {
                DecodedInstruction::AddsImmediate(extract_immediate(word))
            }
            OpcodeEncoding::SubsImmediate => {
                DecodedInstruction::SubsImmediate(extract_immediate(word))
            }
            OpcodeEncoding::CmpImmediate => {
                DecodedInstruction::CmpImmediate(extract_immediate(word))
            }
            OpcodeEncoding::AddRegister => DecodedInstruction::AddRegister(extract_registers(word)),
            OpcodeEncoding::AddsRegister => {
                DecodedInstruction::AddsRegister(extract_registers(word))
            }
            OpcodeEncoding::SubsRegister => {
                DecodedInstruction::SubsRegister(extract_registers(word))
            }
            OpcodeEncoding::CmpRegister => DecodedInstruction::CmpRegister(extract_registers(word)),
            OpcodeEncoding::AndsRegister => {
                DecodedInstruction::AndsRegister(extract_registers(word))
            }
            OpcodeEncoding::EorRegister => DecodedInstruction::EorRegister(extract_registers(word)),
            OpcodeEncoding::OrrRegister => DecodedInstruction::OrrRegister(extract_registers(word)),
            OpcodeEncoding::Mul => DecodedInstruction::Mul(extract_registers(word)),
            OpcodeEncoding::Movz => DecodedInstruction::Movz(extract_wide_immediate(word)),
            OpcodeEncoding::LslImmediate => {
                DecodedInstruction::LslImmediate(extract_shift(word, ShiftKind::Left))
            }
            OpcodeEncoding::LsrImmediate => {
                DecodedInstruction::LsrImmediate(extract_shift(word, ShiftKind::Right))
            }
            OpcodeEncoding::Stur => DecodedInstruction::Stur(extract_memory(word)),
            OpcodeEncoding::Sturb => DecodedInstruction::Sturb(extract_memory(word)),
            OpcodeEncoding::Sturh => DecodedInstruction::Sturh(extract_memory(word)),
            OpcodeEncoding::Ldur => DecodedInstruction::Ldur(extract_memory(word)),
            OpcodeEncoding::Ldurb => DecodedInstruction::Ldurb(extract_memory(word)),
            OpcodeEncoding::Ldurh => DecodedInstruction::Ldurh(extract_memory(word)),
            OpcodeEncoding::B => DecodedInstruction::Branch {
                offset: branch_offset(word, 0, 26),
            },
            OpcodeEncoding::Br => DecodedInstruction::BranchRegister {
                target: Register::from_u5(word >> 5),
            },
            OpcodeEncoding::Cbz => DecodedInstruction::Cbz(extract_compare_branch(word)),
            OpcodeEncoding::Cbnz => DecodedInstruction::Cbnz(extract_compare_branch(word)),
            OpcodeEncoding::BCond => extract_conditional_branch(word),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Left,
    Right,
}

/// Extracts an unsigned bit field of `width` bits starting at `lsb`.
const fn field(word: u32, lsb: u32, width: u32) -> u32 {
    (word >> lsb) & ((1 << width) - 1)
}

/// Sign-extends the low `width` bits of `value` to 64 bits.
const fn sign_extend(value: u32, width: u32) -> i64 {
    let unused = 64 - width;
    ((value as i64) << unused) >> unused
}

/// Sign-extended branch displacement scaled to bytes.
const fn branch_offset(word: u32, lsb: u32, width: u32) -> i64 {
    sign_extend(field(word, lsb, width), width) * INSTRUCTION_BYTES as i64
}

const fn extract_immediate(word: u32) -> ImmediateOperands {
    let imm12 = field(word, 10, 12) as i64;
    let shift = field(word, 22, 2) as u8;
    // Shift codes other than 1 (`LSL #12`) are treated as no shift.
    let imm = if shift == 1 { imm12 << 12 } else { imm12 };

    ImmediateOperands {
        rd: Register::from_u5(word),
        rn: Register::from_u5(word >> 5),
        imm,
        shift,
    }
}

const fn extract_registers(word: u32) -> RegisterOperands {
    RegisterOperands {
        rd: Register::from_u5(word),
        rn: Register::from_u5(word >> 5),
        rm: Register::from_u5(word >> 16),
    }
}

fn extract_wide_immediate(word: u32) -> WideImmediateOperands {
    let hw = field(word, 21, 2) as u8;
    if hw != 0 {
        tracing::warn!(
            word,
            hw,
            "MOVZ half-word selector {hw} is not supported; placing immediate in bits 15..0"
        );
    }

    WideImmediateOperands {
        rd: Register::from_u5(word),
        imm: field(word, 5, 16) as u16,
        hw,
    }
}

const fn extract_shift(word: u32, kind: ShiftKind) -> ShiftOperands {
    let immr = field(word, 16, 6);
    let amount = match kind {
        ShiftKind::Left => (64 - immr) % 64,
        ShiftKind::Right => immr,
    };

    ShiftOperands {
        rd: Register::from_u5(word),
        rn: Register::from_u5(word >> 5),
        amount,
    }
}

const fn extract_memory(word: u32) -> MemoryOperands {
    MemoryOperands {
        rt: Register::from_u5(word),
        rn: Register::from_u5(word >> 5),
        offset: sign_extend(field(word, 12, 9), 9),
    }
}

const fn extract_compare_branch(word: u32) -> CompareBranchOperands {
    CompareBranchOperands {
        tested: Register::from_u5(word),
        offset: branch_offset(word, 5, 19),
    }
}

const fn extract_conditional_branch(word: u32) -> DecodedInstruction {
    let code = field(word, 0, 4) as u8;
    match Condition::from_code(code) {
        Some(condition) => DecodedInstruction::BranchConditional {
            condition,
            offset: branch_offset(word, 5, 19),
        },
        None => DecodedInstruction::Unrecognized {
            word,
            fault: DecodeFault::UnsupportedCondition { code },
        },
    }
}
