//! Host platform descriptions: word sizes, value representation and the
//! register inventory each calling convention may use.

mod aarch64;
mod armv7;
mod x86_64;

use crate::convention::ConventionKind;
use crate::location::{ArgumentLocation, ValueLocation};
use crate::registers::{Fpr, Gpr, Reg, RegisterSetBuilder, ValueRegs};
use crate::{Error, Result};

/// How the engine boxes a value in general-purpose registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRepresentation {
    /// One 64-bit register per value.
    Boxed64,
    /// A 32-bit tag register plus a 32-bit payload register per value.
    TagPayload32,
}

/// Registers a platform hands to one calling convention.
#[derive(Debug, Clone, Default)]
pub struct RegisterInventory {
    pub gpr_args: Vec<ValueRegs>,
    pub fpr_args: Vec<Fpr>,
    pub prologue_scratch_gprs: Vec<Gpr>,
    pub callee_saves: RegisterSetBuilder,
}

impl RegisterInventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-register GPR arguments, in consumption order.
    #[must_use]
    pub fn with_gprs(mut self, gprs: &[u8]) -> Self {
        self.gpr_args
            .extend(gprs.iter().map(|&n| ValueRegs::Single(Gpr(n))));
        self
    }

    /// Tag/payload GPR argument pairs given as `(tag, payload)`.
    #[must_use]
    pub fn with_gpr_pairs(mut self, pairs: &[(u8, u8)]) -> Self {
        self.gpr_args
            .extend(pairs.iter().map(|&(tag, payload)| ValueRegs::Pair {
                tag: Gpr(tag),
                payload: Gpr(payload),
            }));
        self
    }

    #[must_use]
    pub fn with_fprs(mut self, fprs: &[u8]) -> Self {
        self.fpr_args.extend(fprs.iter().map(|&n| Fpr(n)));
        self
    }

    #[must_use]
    pub fn with_scratch(mut self, gprs: &[u8]) -> Self {
        self.prologue_scratch_gprs
            .extend(gprs.iter().map(|&n| Gpr(n)));
        self
    }

    #[must_use]
    pub fn with_callee_saves(mut self, callee_saves: RegisterSetBuilder) -> Self {
        self.callee_saves = callee_saves;
        self
    }
}

/// Description of one target architecture.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub name: &'static str,
    pub pointer_size: u32,
    pub gpr_size: u32,
    pub value_representation: ValueRepresentation,
    pub stack_alignment: u32,
    /// Width in bytes of the floating-point argument registers.
    pub fpr_size: u32,
    gpr_names: &'static [&'static str],
    fpr_names: &'static [&'static str],
    registers: fn(ConventionKind) -> Option<RegisterInventory>,
}

pub const X86_64: Target = x86_64::TARGET;
pub const AARCH64: Target = aarch64::TARGET;
pub const ARMV7: Target = armv7::TARGET;

static ALL_TARGETS: [&Target; 3] = [&X86_64, &AARCH64, &ARMV7];

impl Target {
    /// Every built-in target.
    #[must_use]
    pub fn all() -> &'static [&'static Target] {
        &ALL_TARGETS
    }

    /// Find a built-in target by name or common alias.
    pub fn lookup(name: &str) -> Result<&'static Target> {
        let canonical = match name {
            "x86-64" | "amd64" | "x64" => "x86_64",
            "arm64" => "aarch64",
            "arm" | "thumb2" | "armv7-thumb2" => "armv7",
            other => other,
        };
        ALL_TARGETS
            .iter()
            .copied()
            .find(|target| target.name == canonical)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))
    }

    /// The target this crate was compiled for, if it is a built-in one.
    #[must_use]
    pub fn host() -> Option<&'static Target> {
        let name = if cfg!(target_arch = "x86_64") {
            "x86_64"
        } else if cfg!(target_arch = "aarch64") {
            "aarch64"
        } else if cfg!(target_arch = "arm") {
            "armv7"
        } else {
            return None;
        };
        Target::lookup(name).ok()
    }

    /// Register inventory for `kind`, or `None` if the convention does not
    /// exist on this target.
    #[must_use]
    pub fn registers(&self, kind: ConventionKind) -> Option<RegisterInventory> {
        (self.registers)(kind)
    }

    #[must_use]
    pub fn supports(&self, kind: ConventionKind) -> bool {
        self.registers(kind).is_some()
    }

    /// Whether the floating-point registers can hold a `v128`.
    #[must_use]
    pub const fn has_vector_fprs(&self) -> bool {
        self.fpr_size >= 16
    }

    #[must_use]
    pub fn gpr_name(&self, gpr: Gpr) -> String {
        self.gpr_names
            .get(usize::from(gpr.0))
            .map_or_else(|| gpr.to_string(), |name| (*name).to_string())
    }

    #[must_use]
    pub fn fpr_name(&self, fpr: Fpr) -> String {
        self.fpr_names
            .get(usize::from(fpr.0))
            .map_or_else(|| fpr.to_string(), |name| (*name).to_string())
    }

    #[must_use]
    pub fn reg_name(&self, reg: Reg) -> String {
        match reg {
            Reg::Gpr(ValueRegs::Single(gpr)) => self.gpr_name(gpr),
            Reg::Gpr(ValueRegs::Pair { tag, payload }) => {
                format!("{}:{}", self.gpr_name(tag), self.gpr_name(payload))
            }
            Reg::Fpr(fpr) => self.fpr_name(fpr),
        }
    }

    /// Render a location with this target's register names.
    #[must_use]
    pub fn describe(&self, loc: &ArgumentLocation) -> String {
        let place = match loc.location {
            ValueLocation::Register(reg) => self.reg_name(reg),
            ValueLocation::Stack(slot) => slot.to_string(),
        };
        if loc.used_width == loc.width {
            format!("{place} ({})", loc.width)
        } else {
            format!("{place} ({}, uses {})", loc.width, loc.used_width)
        }
    }
}
