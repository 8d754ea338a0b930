use std::fmt;

/// Number of architecturally visible general-purpose registers (`X0..X31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;
/// Index of the hard-wired zero register (`XZR`).
pub const ZERO_REGISTER_INDEX: u8 = 31;
/// `FLAGS` bit for zero result.
pub const FLAGS_Z: u8 = 1 << 0;
/// `FLAGS` bit for negative result.
pub const FLAGS_N: u8 = 1 << 1;
/// `FLAGS` bit for carry/borrow. Never set by this subset.
pub const FLAGS_C: u8 = 1 << 2;
/// `FLAGS` bit for signed overflow. Never set by this subset.
pub const FLAGS_V: u8 = 1 << 3;
/// Mask of architecturally active `FLAGS` bits (`Z/N`).
pub const FLAGS_ACTIVE_MASK: u8 = FLAGS_Z | FLAGS_N;

/// General-purpose register identifier decoded from a 5-bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Register(u8);

impl Register {
    /// The hard-wired zero register.
    pub const ZERO: Self = Self(ZERO_REGISTER_INDEX);

    /// Decodes a 5-bit register field. Bits above the field are ignored.
    #[must_use]
    pub const fn from_u5(bits: u32) -> Self {
        Self((bits & 0x1F) as u8)
    }

    /// Builds a register from an index, rejecting values outside `0..=31`.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < GENERAL_REGISTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for `XZR`.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == ZERO_REGISTER_INDEX
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            f.write_str("XZR")
        } else {
            write!(f, "X{}", self.0)
        }
    }
}

/// Architectural register state: register file, program counter and flags.
///
/// The zero register is enforced here: reads of `XZR` always return 0 and
/// writes to it are discarded, so no step ever observes a stale value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [i64; GENERAL_REGISTER_COUNT],
    pc: u64,
    flags: u8,
}

impl ArchitecturalState {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> i64 {
        if reg.is_zero() {
            0
        } else {
            self.gpr[reg.index()]
        }
    }

    /// Writes a general-purpose register. Writes to `XZR` are dropped.
    pub const fn set_gpr(&mut self, reg: Register, value: i64) {
        if !reg.is_zero() {
            self.gpr[reg.index()] = value;
        }
    }

    /// Returns the whole register file in index order.
    #[must_use]
    pub const fn registers(&self) -> &[i64; GENERAL_REGISTER_COUNT] {
        &self.gpr
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u64 {
        self.pc
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u64) {
        self.pc = value;
    }

    /// Reads the `FLAGS` register.
    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Writes the `FLAGS` register. Carry and overflow bits are discarded.
    pub const fn set_flags(&mut self, value: u8) {
        self.flags = value & FLAGS_ACTIVE_MASK;
    }

    /// Returns `true` when a specific `FLAGS` bit is set.
    #[must_use]
    pub const fn flag_is_set(&self, flag: u8) -> bool {
        (self.flags & flag) != 0
    }

    /// Sets or clears a specific active `FLAGS` bit.
    pub const fn set_flag(&mut self, flag: u8, enabled: bool) {
        if enabled {
            self.flags |= flag & FLAGS_ACTIVE_MASK;
        } else {
            self.flags &= !(flag & FLAGS_ACTIVE_MASK);
        }
    }

    /// Zero flag.
    #[must_use]
    pub const fn zero(&self) -> bool {
        self.flag_is_set(FLAGS_Z)
    }

    /// Negative flag.
    #[must_use]
    pub const fn negative(&self) -> bool {
        self.flag_is_set(FLAGS_N)
    }
}
