//! Register identifiers, register sets and the register-set builder used to
//! describe platform inventories.

use std::fmt;

use crate::width::Width;

/// Maximum register number per class; sets are 64-bit masks.
pub const MAX_REGISTERS_PER_CLASS: u8 = 64;

/// General-purpose register number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gpr(pub u8);

/// Floating-point / vector register number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fpr(pub u8);

impl fmt::Display for Gpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Display for Fpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// General-purpose location of one value.
///
/// On targets that box values in 64 bits this is always `Single`. On 32-bit
/// targets a boxed value needs a tag half and a payload half; the narrow C
/// convention reuses `Pair` for 64-bit integers held as (low = payload,
/// high = tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRegs {
    Single(Gpr),
    Pair { tag: Gpr, payload: Gpr },
}

impl ValueRegs {
    /// The register holding the payload (the only register for `Single`).
    #[must_use]
    pub const fn payload(self) -> Gpr {
        match self {
            ValueRegs::Single(gpr) | ValueRegs::Pair { payload: gpr, .. } => gpr,
        }
    }

    #[must_use]
    pub const fn tag(self) -> Option<Gpr> {
        match self {
            ValueRegs::Single(_) => None,
            ValueRegs::Pair { tag, .. } => Some(tag),
        }
    }

    #[must_use]
    pub const fn is_pair(self) -> bool {
        matches!(self, ValueRegs::Pair { .. })
    }

    /// Every register this location touches, payload first.
    pub fn gprs(self) -> impl Iterator<Item = Gpr> {
        std::iter::once(self.payload()).chain(self.tag())
    }
}

impl fmt::Display for ValueRegs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRegs::Single(gpr) => write!(f, "{gpr}"),
            ValueRegs::Pair { tag, payload } => write!(f, "{tag}:{payload}"),
        }
    }
}

/// A register of either class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Gpr(ValueRegs),
    Fpr(Fpr),
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::Gpr(regs) => write!(f, "{regs}"),
            Reg::Fpr(fpr) => write!(f, "{fpr}"),
        }
    }
}

/// One physical register, the unit stored in a [`RegisterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegisterId {
    Gpr(Gpr),
    Fpr(Fpr),
}

impl From<Gpr> for RegisterId {
    fn from(gpr: Gpr) -> Self {
        RegisterId::Gpr(gpr)
    }
}

impl From<Fpr> for RegisterId {
    fn from(fpr: Fpr) -> Self {
        RegisterId::Fpr(fpr)
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterId::Gpr(gpr) => write!(f, "{gpr}"),
            RegisterId::Fpr(fpr) => write!(f, "{fpr}"),
        }
    }
}

fn bit(n: u8) -> u64 {
    assert!(
        n < MAX_REGISTERS_PER_CLASS,
        "register number {n} exceeds the register set capacity"
    );
    1u64 << n
}

/// Immutable set of registers.
///
/// FPRs remember whether they were added at full vector width, which decides
/// the slot size they need when saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterSet {
    gprs: u64,
    fprs: u64,
    vector_fprs: u64,
}

impl RegisterSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gprs: 0,
            fprs: 0,
            vector_fprs: 0,
        }
    }

    pub fn add_gpr(&mut self, gpr: Gpr) {
        self.gprs |= bit(gpr.0);
    }

    pub fn add_value_regs(&mut self, regs: ValueRegs) {
        for gpr in regs.gprs() {
            self.add_gpr(gpr);
        }
    }

    /// Add an FPR; a `W128` width marks it as holding a full vector.
    pub fn add_fpr(&mut self, fpr: Fpr, width: Width) {
        self.fprs |= bit(fpr.0);
        if width == Width::W128 {
            self.vector_fprs |= bit(fpr.0);
        }
    }

    #[must_use]
    pub fn contains(&self, reg: RegisterId) -> bool {
        match reg {
            RegisterId::Gpr(gpr) => self.gprs & bit(gpr.0) != 0,
            RegisterId::Fpr(fpr) => self.fprs & bit(fpr.0) != 0,
        }
    }

    #[must_use]
    pub fn is_vector(&self, fpr: Fpr) -> bool {
        self.vector_fprs & bit(fpr.0) != 0
    }

    #[must_use]
    pub const fn is_disjoint(&self, other: &RegisterSet) -> bool {
        self.gprs & other.gprs == 0 && self.fprs & other.fprs == 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.gprs == 0 && self.fprs == 0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        (self.gprs.count_ones() + self.fprs.count_ones()) as usize
    }

    /// Registers in ascending number order, GPRs before FPRs.
    pub fn iter(&self) -> impl Iterator<Item = RegisterId> + '_ {
        let gprs = (0..MAX_REGISTERS_PER_CLASS)
            .filter(|&n| self.gprs & (1u64 << n) != 0)
            .map(|n| RegisterId::Gpr(Gpr(n)));
        let fprs = (0..MAX_REGISTERS_PER_CLASS)
            .filter(|&n| self.fprs & (1u64 << n) != 0)
            .map(|n| RegisterId::Fpr(Fpr(n)));
        gprs.chain(fprs)
    }
}

/// Accumulates a platform register list before it is frozen.
#[derive(Debug, Clone, Default)]
pub struct RegisterSetBuilder {
    registers: Vec<RegisterId>,
}

impl RegisterSetBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_gprs(mut self, gprs: &[u8]) -> Self {
        self.registers
            .extend(gprs.iter().map(|&n| RegisterId::Gpr(Gpr(n))));
        self
    }

    #[must_use]
    pub fn with_fprs(mut self, fprs: &[u8]) -> Self {
        self.registers
            .extend(fprs.iter().map(|&n| RegisterId::Fpr(Fpr(n))));
        self
    }

    pub fn add(&mut self, reg: impl Into<RegisterId>) {
        self.registers.push(reg.into());
    }

    /// Freeze the builder.
    ///
    /// # Panics
    ///
    /// Panics if a register was added twice or is out of range; either means
    /// the platform description is wrong.
    #[must_use]
    pub fn build_and_validate(self) -> RegisterSet {
        let mut set = RegisterSet::new();
        for reg in self.registers {
            assert!(
                !set.contains(reg),
                "register {reg} listed twice in a platform register set"
            );
            match reg {
                RegisterId::Gpr(gpr) => set.add_gpr(gpr),
                RegisterId::Fpr(fpr) => set.add_fpr(fpr, Width::W64),
            }
        }
        set
    }
}

/// A register paired with the byte offset it is saved at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterAtOffset {
    pub reg: RegisterId,
    pub offset: u32,
}

/// Save-area layout for a register set, zero-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterAtOffsetList {
    entries: Vec<RegisterAtOffset>,
    size_in_bytes: u32,
}

impl RegisterAtOffsetList {
    /// Lay out `set` from offset zero in set order. GPRs take `gpr_slot`
    /// bytes, FPRs take 8 bytes, or 16 bytes aligned to 16 when they hold a
    /// vector.
    #[must_use]
    pub fn zero_based(set: &RegisterSet, gpr_slot: u32) -> Self {
        let mut offset = 0;
        let mut entries = Vec::with_capacity(set.len());
        for reg in set.iter() {
            let (size, align) = match reg {
                RegisterId::Gpr(_) => (gpr_slot, gpr_slot),
                RegisterId::Fpr(fpr) if set.is_vector(fpr) => (16, 16),
                RegisterId::Fpr(_) => (8, 8),
            };
            offset = crate::abi::round_up(offset, align);
            entries.push(RegisterAtOffset { reg, offset });
            offset += size;
        }
        Self {
            entries,
            size_in_bytes: offset,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[RegisterAtOffset] {
        &self.entries
    }

    #[must_use]
    pub const fn size_in_bytes(&self) -> u32 {
        self.size_in_bytes
    }

    #[must_use]
    pub fn find(&self, reg: RegisterId) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.reg == reg)
            .map(|entry| entry.offset)
    }
}
