//! Test harness for wasm-callconv unit and integration tests
//!
//! This module provides helpers for building small convention tables and for
//! asserting on the locations the assigner produces.
//!
//! # Example
//!
//! ```rust
//! use wasm_callconv::test_harness::*;
//! use wasm_callconv::{CallRole, ConventionKind};
//!
//! let table = toy_table(ConventionKind::Wasm, &[0, 1], &[0]);
//! let info = table.call_information_for(&sig("(i32, i32) -> (i32)"), CallRole::Callee);
//!
//! assert_locations(&info.params, &[
//!     LocationPattern::Gpr(Pat::Exact(1)),
//!     LocationPattern::Stack { offset: Pat::Any },
//! ]);
//! ```

#![allow(
    clippy::must_use_candidate,
    clippy::manual_assert,
    clippy::missing_panics_doc,
    clippy::uninlined_format_args
)]

use crate::abi::CALLER_ROLE_SHIFT;
use crate::convention::{ConventionKind, ConventionTable};
use crate::location::{ArgumentLocation, StackBase, StackSlot, ValueLocation};
use crate::registers::{Reg, ValueRegs};
use crate::signature::FunctionSignature;
use crate::target::{ARMV7, RegisterInventory, Target, X86_64};
#[cfg(feature = "wasmparser")]
use crate::{Error, ModuleSignatures, Result, module_signatures};

/// Parse a signature, panicking on malformed test input.
pub fn sig(text: &str) -> FunctionSignature {
    text.parse()
        .unwrap_or_else(|e| panic!("bad test signature `{text}`: {e}"))
}

/// A table with explicit single-register lists on a 64-bit target (or, for
/// the narrow C convention, on a 32-bit one).
pub fn toy_table(kind: ConventionKind, gprs: &[u8], fprs: &[u8]) -> ConventionTable {
    let target = toy_target(kind);
    let inventory = RegisterInventory::new().with_gprs(gprs).with_fprs(fprs);
    ConventionTable::new(kind, target, inventory)
}

/// A table on the 32-bit target whose GPR arguments are `(tag, payload)`
/// pairs.
pub fn toy_pair_table(kind: ConventionKind, pairs: &[(u8, u8)], fprs: &[u8]) -> ConventionTable {
    let inventory = RegisterInventory::new()
        .with_gpr_pairs(pairs)
        .with_fprs(fprs);
    ConventionTable::new(kind, &ARMV7, inventory)
}

fn toy_target(kind: ConventionKind) -> &'static Target {
    match kind {
        ConventionKind::NarrowC => &ARMV7,
        ConventionKind::Wasm | ConventionKind::Js => &X86_64,
    }
}

/// Parse WAT (WebAssembly Text) and collect its signatures.
#[cfg(feature = "wasmparser")]
pub fn signatures_from_wat(wat: &str) -> Result<ModuleSignatures> {
    let wasm =
        wat::parse_str(wat).map_err(|e| Error::Internal(format!("WAT parse error: {e}")))?;
    module_signatures(&wasm)
}

/// Stack offsets of the stack-resident locations, in order.
pub fn stack_offsets(locations: &[ArgumentLocation]) -> Vec<u32> {
    locations
        .iter()
        .filter_map(|loc| loc.stack_slot().map(|slot| slot.offset))
        .collect()
}

/// Indices of the locations that live in registers.
pub fn register_indices(locations: &[ArgumentLocation]) -> Vec<usize> {
    locations
        .iter()
        .enumerate()
        .filter(|(_, loc)| !loc.is_stack())
        .map(|(i, _)| i)
        .collect()
}

/// Pattern matching for location fields
#[derive(Debug, Clone)]
pub enum Pat<T> {
    /// Match any value
    Any,
    /// Match exact value
    Exact(T),
    /// Match if value satisfies predicate
    Predicate(fn(&T) -> bool),
}

impl<T: PartialEq> Pat<T> {
    /// Check if a value matches this pattern
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Pat::Any => true,
            Pat::Exact(expected) => value == expected,
            Pat::Predicate(pred) => pred(value),
        }
    }
}

/// Pattern for matching locations in tests
#[derive(Debug, Clone)]
pub enum LocationPattern {
    /// Match any location
    Any,
    /// A single general-purpose register
    Gpr(Pat<u8>),
    /// A general-purpose register pair
    GprPair { tag: Pat<u8>, payload: Pat<u8> },
    /// A floating-point register
    Fpr(Pat<u8>),
    /// A stack slot
    Stack { offset: Pat<u32> },
}

impl LocationPattern {
    /// Check if a location matches this pattern
    pub fn matches(&self, loc: &ArgumentLocation) -> bool {
        match (self, &loc.location) {
            (LocationPattern::Any, _) => true,
            (LocationPattern::Gpr(p), ValueLocation::Register(Reg::Gpr(ValueRegs::Single(g)))) => {
                p.matches(&g.0)
            }
            (
                LocationPattern::GprPair { tag, payload },
                ValueLocation::Register(Reg::Gpr(ValueRegs::Pair { tag: t, payload: p })),
            ) => tag.matches(&t.0) && payload.matches(&p.0),
            (LocationPattern::Fpr(p), ValueLocation::Register(Reg::Fpr(f))) => p.matches(&f.0),
            (LocationPattern::Stack { offset }, ValueLocation::Stack(slot)) => {
                offset.matches(&slot.offset)
            }
            _ => false,
        }
    }
}

/// Assert that `locations` match `patterns` one to one.
pub fn assert_locations(locations: &[ArgumentLocation], patterns: &[LocationPattern]) {
    if locations.len() != patterns.len() {
        panic!(
            "Expected {} locations, got {}:\n{:#?}",
            patterns.len(),
            locations.len(),
            locations
        );
    }
    for (i, (loc, pattern)) in locations.iter().zip(patterns).enumerate() {
        if !pattern.matches(loc) {
            panic!(
                "Location {} does not match.\nExpected: {:?}\nGot: {}\nAll: {:#?}",
                i, pattern, loc, locations
            );
        }
    }
}

/// Offset of `slot` from the caller's stack pointer, whichever role it was
/// emitted for.
pub fn stack_pointer_offset(slot: &StackSlot) -> u32 {
    match slot.base {
        StackBase::CallerStackPointer => slot.offset,
        StackBase::CalleeFrame => slot.offset - CALLER_ROLE_SHIFT,
    }
}

/// Assert that every stack slot in `locations` is aligned to its width,
/// rounded up to 8 bytes, relative to the caller's stack pointer.
pub fn assert_stack_alignment(locations: &[ArgumentLocation]) {
    for loc in locations {
        if let Some(slot) = loc.stack_slot() {
            let align = loc.width.bytes().max(8);
            if stack_pointer_offset(&slot) % align != 0 {
                panic!("Stack slot {} is not {}-byte aligned", loc, align);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::CallRole;

    #[test]
    fn test_pattern_matching() {
        let table = toy_table(ConventionKind::Wasm, &[0, 1], &[0]);
        let info = table.call_information_for(&sig("(i32, f64, i32) -> ()"), CallRole::Callee);
        assert_locations(
            &info.params,
            &[
                LocationPattern::Gpr(Pat::Exact(1)),
                LocationPattern::Fpr(Pat::Exact(0)),
                LocationPattern::Stack {
                    offset: Pat::Predicate(|o| o % 8 == 0),
                },
            ],
        );
        assert_eq!(register_indices(&info.params), vec![0, 1]);
        assert_eq!(stack_offsets(&info.params).len(), 1);
    }

    #[test]
    fn test_stack_alignment_is_checked_in_both_views() {
        let table = toy_table(ConventionKind::Wasm, &[0], &[]);
        let signature = sig("(v128, i32, v128) -> (v128)");
        for role in [CallRole::Callee, CallRole::Caller] {
            let info = table.call_information_for(&signature, role);
            assert_stack_alignment(&info.params);
            assert_stack_alignment(&info.results);
        }
    }

    #[test]
    #[should_panic(expected = "is not 16-byte aligned")]
    fn test_misaligned_vector_slot_panics() {
        let slot = StackSlot::from_callee_offset(CallRole::Caller, 48);
        let loc = ArgumentLocation::new(ValueLocation::Stack(slot), crate::Width::W128);
        assert_stack_alignment(&[loc]);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_pattern_mismatch_panics() {
        let table = toy_table(ConventionKind::Wasm, &[0, 1], &[0]);
        let info = table.call_information_for(&sig("(i32) -> ()"), CallRole::Callee);
        assert_locations(&info.params, &[LocationPattern::Fpr(Pat::Any)]);
    }

    #[cfg(feature = "wasmparser")]
    #[test]
    fn test_signatures_from_wat() {
        let module = signatures_from_wat("(module (func (param i32) (result i64) i64.const 0))")
            .expect("parse");
        assert_eq!(module.function_signature(0), Some(&sig("(i32) -> (i64)")));
        assert!(signatures_from_wat("(module (func").is_err());
    }
}
