//! Calling-convention tables.
//!
//! A [`ConventionTable`] holds the register inventory of one convention on
//! one target. Tables are built once at startup, bundled per target in
//! [`Conventions`], and passed by reference to every call site that needs a
//! layout. `assign` implements the location assigner over a table; `paired`
//! holds the register-pair path of the narrow C convention.

mod assign;
mod paired;

pub use assign::StackDemand;

use std::fmt;
use std::str::FromStr;

use crate::abi::{
    C_FRAME_HEADER_SIZE, CALL_FRAME_HEADER_SIZE, CALLER_ROLE_SHIFT, argument_area_offset,
};
use crate::registers::{Fpr, Gpr, RegisterSet, RegisterSetBuilder, ValueRegs};
use crate::target::{RegisterInventory, Target, ValueRepresentation};
use crate::width::Width;
use crate::{Error, Result};

/// The calling-convention variants the engine crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConventionKind {
    /// Engine-internal Wasm-to-Wasm calls.
    Wasm,
    /// Calls to and from the embedding JS engine: every value is one boxed
    /// 64-bit slot, vectors are not representable.
    Js,
    /// Platform C convention on 32-bit targets: 64-bit integers and
    /// references take an even/odd register pair.
    NarrowC,
}

impl ConventionKind {
    pub const ALL: [ConventionKind; 3] =
        [ConventionKind::Wasm, ConventionKind::Js, ConventionKind::NarrowC];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ConventionKind::Wasm => "wasm",
            ConventionKind::Js => "js",
            ConventionKind::NarrowC => "c",
        }
    }

    /// Fixed bytes before the `this` slot in the callee frame.
    #[must_use]
    pub const fn header_size(self) -> u32 {
        match self {
            ConventionKind::Wasm | ConventionKind::Js => CALL_FRAME_HEADER_SIZE,
            ConventionKind::NarrowC => C_FRAME_HEADER_SIZE,
        }
    }

    /// Whether values wider than a GPR are split across two argument
    /// registers taken from a flat register list.
    #[must_use]
    pub const fn splits_wide_values(self) -> bool {
        matches!(self, ConventionKind::NarrowC)
    }

    /// Whether the convention can carry `v128` at all. A table also needs
    /// 128-bit FPRs on its target, see [`ConventionTable::supports_vectors`].
    #[must_use]
    pub const fn supports_vectors(self) -> bool {
        matches!(self, ConventionKind::Wasm)
    }
}

impl fmt::Display for ConventionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConventionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wasm" => Ok(ConventionKind::Wasm),
            "js" => Ok(ConventionKind::Js),
            "c" | "narrow-c" => Ok(ConventionKind::NarrowC),
            _ => Err(Error::UnknownConvention(s.to_string())),
        }
    }
}

/// Register inventory and frame parameters of one calling convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionTable {
    kind: ConventionKind,
    gpr_args: Vec<ValueRegs>,
    fpr_args: Vec<Fpr>,
    prologue_scratch_gprs: Vec<Gpr>,
    callee_save_registers: RegisterSet,
    header_size: u32,
    pointer_size: u32,
    gpr_size: u32,
    stack_alignment: u32,
    vector_fprs: bool,
}

impl ConventionTable {
    /// Build and validate a table.
    ///
    /// # Panics
    ///
    /// Panics when the inventory contradicts itself or the target: a register
    /// listed twice, callee-saved registers that are also argument or scratch
    /// registers, register pairs where the target boxes values in one
    /// register (or the reverse), or a narrow C table on a 64-bit target.
    #[must_use]
    pub fn new(kind: ConventionKind, target: &Target, inventory: RegisterInventory) -> Self {
        let RegisterInventory {
            gpr_args,
            fpr_args,
            prologue_scratch_gprs,
            callee_saves,
        } = inventory;

        match kind {
            ConventionKind::NarrowC => {
                assert!(
                    target.gpr_size == 4,
                    "the narrow C convention needs 32-bit GPRs, {} has {}-byte GPRs",
                    target.name,
                    target.gpr_size
                );
                assert!(
                    gpr_args.iter().all(|regs| !regs.is_pair()),
                    "narrow C argument registers must be single registers"
                );
            }
            ConventionKind::Wasm | ConventionKind::Js => {
                let paired = target.value_representation == ValueRepresentation::TagPayload32;
                assert!(
                    gpr_args.iter().all(|regs| regs.is_pair() == paired),
                    "{kind} argument registers on {} must {}be tag/payload pairs",
                    target.name,
                    if paired { "" } else { "not " }
                );
            }
        }

        let mut argument_builder = RegisterSetBuilder::new();
        for regs in &gpr_args {
            for gpr in regs.gprs() {
                argument_builder.add(gpr);
            }
        }
        for &fpr in &fpr_args {
            argument_builder.add(fpr);
        }
        let argument_registers = argument_builder.build_and_validate();

        let mut scratch_builder = RegisterSetBuilder::new();
        for &gpr in &prologue_scratch_gprs {
            scratch_builder.add(gpr);
        }
        let scratch_registers = scratch_builder.build_and_validate();

        let callee_save_registers = callee_saves.build_and_validate();
        assert!(
            callee_save_registers.is_disjoint(&argument_registers),
            "{kind} callee-saved registers overlap argument registers on {}",
            target.name
        );
        assert!(
            callee_save_registers.is_disjoint(&scratch_registers),
            "{kind} callee-saved registers overlap prologue scratch registers on {}",
            target.name
        );

        let header_size = kind.header_size();
        assert!(header_size >= CALLER_ROLE_SHIFT);

        tracing::debug!(
            convention = %kind,
            target = target.name,
            gpr_args = gpr_args.len(),
            fpr_args = fpr_args.len(),
            header_size,
            vectors = kind.supports_vectors() && target.has_vector_fprs(),
            "built calling convention table"
        );

        Self {
            kind,
            gpr_args,
            fpr_args,
            prologue_scratch_gprs,
            callee_save_registers,
            header_size,
            pointer_size: target.pointer_size,
            gpr_size: target.gpr_size,
            stack_alignment: target.stack_alignment,
            vector_fprs: target.has_vector_fprs(),
        }
    }

    /// Build the table for `kind` from the target's own inventory.
    pub fn for_target(kind: ConventionKind, target: &Target) -> Result<Self> {
        let inventory = target
            .registers(kind)
            .ok_or(Error::ConventionUnavailable {
                convention: kind.name(),
                target: target.name,
            })?;
        Ok(Self::new(kind, target, inventory))
    }

    #[must_use]
    pub const fn kind(&self) -> ConventionKind {
        self.kind
    }

    #[must_use]
    pub fn gpr_args(&self) -> &[ValueRegs] {
        &self.gpr_args
    }

    #[must_use]
    pub fn fpr_args(&self) -> &[Fpr] {
        &self.fpr_args
    }

    #[must_use]
    pub fn prologue_scratch_gprs(&self) -> &[Gpr] {
        &self.prologue_scratch_gprs
    }

    #[must_use]
    pub const fn callee_save_registers(&self) -> &RegisterSet {
        &self.callee_save_registers
    }

    #[must_use]
    pub const fn header_size(&self) -> u32 {
        self.header_size
    }

    #[must_use]
    pub const fn pointer_size(&self) -> u32 {
        self.pointer_size
    }

    #[must_use]
    pub const fn gpr_size(&self) -> u32 {
        self.gpr_size
    }

    #[must_use]
    pub const fn stack_alignment(&self) -> u32 {
        self.stack_alignment
    }

    /// Callee offset of the first stack argument.
    #[must_use]
    pub const fn argument_start(&self) -> u32 {
        argument_area_offset(self.header_size, self.stack_alignment)
    }

    /// Whether `v128` values can cross this convention: the kind allows them
    /// and the target's FPRs are 128 bits wide.
    #[must_use]
    pub const fn supports_vectors(&self) -> bool {
        self.kind.supports_vectors() && self.vector_fprs
    }

    /// Every GPR that can carry an argument (both halves of pairs).
    #[must_use]
    pub fn argument_gprs(&self) -> RegisterSet {
        let mut set = RegisterSet::new();
        for &regs in &self.gpr_args {
            set.add_value_regs(regs);
        }
        set
    }

    #[must_use]
    pub fn argument_fprs(&self) -> RegisterSet {
        let width = if self.supports_vectors() {
            Width::W128
        } else {
            Width::W64
        };
        let mut set = RegisterSet::new();
        for &fpr in &self.fpr_args {
            set.add_fpr(fpr, width);
        }
        set
    }
}

/// The convention tables of one target, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct Conventions {
    target: Target,
    wasm: ConventionTable,
    js: ConventionTable,
    narrow_c: Option<ConventionTable>,
}

impl Conventions {
    /// # Panics
    ///
    /// Panics if the target lacks a Wasm or JS inventory, or if any of its
    /// inventories fails validation.
    #[must_use]
    pub fn new(target: &Target) -> Self {
        let table = |kind| {
            ConventionTable::for_target(kind, target).unwrap_or_else(|err| panic!("{err}"))
        };
        let narrow_c = target
            .registers(ConventionKind::NarrowC)
            .map(|inventory| ConventionTable::new(ConventionKind::NarrowC, target, inventory));
        Self {
            target: *target,
            wasm: table(ConventionKind::Wasm),
            js: table(ConventionKind::Js),
            narrow_c,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub const fn wasm(&self) -> &ConventionTable {
        &self.wasm
    }

    #[must_use]
    pub const fn js(&self) -> &ConventionTable {
        &self.js
    }

    #[must_use]
    pub const fn narrow_c(&self) -> Option<&ConventionTable> {
        self.narrow_c.as_ref()
    }

    pub fn get(&self, kind: ConventionKind) -> Result<&ConventionTable> {
        match kind {
            ConventionKind::Wasm => Ok(&self.wasm),
            ConventionKind::Js => Ok(&self.js),
            ConventionKind::NarrowC => {
                self.narrow_c
                    .as_ref()
                    .ok_or(Error::ConventionUnavailable {
                        convention: kind.name(),
                        target: self.target.name,
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{AARCH64, ARMV7, X86_64};

    #[test]
    fn test_builtin_targets_validate() {
        for target in Target::all() {
            let conventions = Conventions::new(target);
            assert_eq!(conventions.wasm().kind(), ConventionKind::Wasm);
            assert_eq!(conventions.js().kind(), ConventionKind::Js);
            assert_eq!(conventions.narrow_c().is_some(), target.gpr_size == 4);
        }
    }

    #[test]
    fn test_narrow_c_unavailable_on_64_bit() {
        let conventions = Conventions::new(&X86_64);
        let err = conventions.get(ConventionKind::NarrowC).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The c calling convention is not available on x86_64"
        );
        assert!(ConventionTable::for_target(ConventionKind::NarrowC, &AARCH64).is_err());
    }

    #[test]
    fn test_header_sizes() {
        let conventions = Conventions::new(&ARMV7);
        assert_eq!(conventions.wasm().header_size(), CALL_FRAME_HEADER_SIZE);
        assert_eq!(conventions.js().header_size(), CALL_FRAME_HEADER_SIZE);
        assert_eq!(
            conventions.narrow_c().map(ConventionTable::header_size),
            Some(C_FRAME_HEADER_SIZE)
        );
    }

    #[test]
    fn test_argument_sets_exclude_callee_saves() {
        for target in Target::all() {
            let conventions = Conventions::new(target);
            for kind in ConventionKind::ALL {
                let Ok(table) = conventions.get(kind) else {
                    continue;
                };
                assert!(table.argument_gprs().is_disjoint(table.callee_save_registers()));
                assert!(table.argument_fprs().is_disjoint(table.callee_save_registers()));
            }
        }
    }

    #[test]
    fn test_vector_support_needs_wide_fprs() {
        assert!(Conventions::new(&X86_64).wasm().supports_vectors());
        assert!(Conventions::new(&AARCH64).wasm().supports_vectors());
        assert!(!Conventions::new(&X86_64).js().supports_vectors());

        let armv7 = Conventions::new(&ARMV7);
        let table = armv7.wasm();
        assert!(!table.supports_vectors());
        let fprs = table.argument_fprs();
        assert!(table.fpr_args().iter().all(|&fpr| !fprs.is_vector(fpr)));
    }

    #[test]
    fn test_argument_start_per_header() {
        let conventions = Conventions::new(&ARMV7);
        assert_eq!(conventions.wasm().argument_start(), 56);
        assert_eq!(
            conventions.narrow_c().map(ConventionTable::argument_start),
            Some(24)
        );
    }

    #[test]
    fn test_paired_argument_gprs_include_both_halves() {
        let conventions = Conventions::new(&ARMV7);
        assert_eq!(conventions.wasm().argument_gprs().len(), 4);
    }

    #[test]
    #[should_panic(expected = "overlap argument registers")]
    fn test_callee_saves_must_not_overlap_arguments() {
        let inventory = RegisterInventory::new()
            .with_gprs(&[7, 6])
            .with_callee_saves(RegisterSetBuilder::new().with_gprs(&[3, 6]));
        let _ = ConventionTable::new(ConventionKind::Wasm, &X86_64, inventory);
    }

    #[test]
    #[should_panic(expected = "listed twice")]
    fn test_argument_registers_must_be_distinct() {
        let inventory = RegisterInventory::new().with_gprs(&[7, 7]);
        let _ = ConventionTable::new(ConventionKind::Js, &X86_64, inventory);
    }

    #[test]
    #[should_panic(expected = "must be tag/payload pairs")]
    fn test_32_bit_engine_tables_need_pairs() {
        let inventory = RegisterInventory::new().with_gprs(&[0, 1]);
        let _ = ConventionTable::new(ConventionKind::Wasm, &ARMV7, inventory);
    }

    #[test]
    #[should_panic(expected = "needs 32-bit GPRs")]
    fn test_narrow_c_rejects_64_bit_targets() {
        let inventory = RegisterInventory::new().with_gprs(&[0, 1, 2, 3]);
        let _ = ConventionTable::new(ConventionKind::NarrowC, &AARCH64, inventory);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("narrow-c".parse::<ConventionKind>().unwrap(), ConventionKind::NarrowC);
        assert!(matches!(
            "stdcall".parse::<ConventionKind>(),
            Err(Error::UnknownConvention(_))
        ));
    }
}
