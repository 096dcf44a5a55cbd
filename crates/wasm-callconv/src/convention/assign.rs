//! Location assignment: signature + role -> CallInformation.
//!
//! One left-to-right pass over the parameters and an independent pass over the
//! results, each driven by running per-class register counters and a stack
//! cursor. All stack offsets are computed in callee-frame coordinates and only
//! converted to the caller's view when a location is emitted. Alignment is
//! taken relative to the caller's stack pointer.
//!
//! The number of stack values (and the bytes they need) is computed a second
//! time from class demand alone; the results region has to be sized from that
//! estimate before any result is placed, and for arguments the estimate is
//! cross-checked against the running bookkeeping.

use crate::abi::{CALLER_ROLE_SHIFT, FRAME_SLOT_SIZE, round_up};
use crate::call_info::CallInformation;
use crate::location::{ArgumentLocation, CallRole, StackSlot, ValueLocation};
use crate::signature::FunctionSignature;
use crate::value_kind::{Classification, RegisterClass, ValueKind};
use crate::width::Width;

use super::{ConventionKind, ConventionTable, paired};

/// Register indices consumed so far, per class.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Counters {
    pub gp: usize,
    pub fp: usize,
}

impl Counters {
    /// Counters as they stand when the first parameter is assigned: `this`
    /// has consumed GP index 0.
    const AFTER_THIS: Counters = Counters { gp: 1, fp: 0 };
}

/// Running stack offset.
///
/// Slots are aligned relative to `origin`: zero for a region-relative cursor,
/// and the callee offset of the caller's stack pointer for a frame cursor.
#[derive(Debug, Clone, Copy)]
pub(super) struct StackCursor {
    pub offset: u32,
    origin: u32,
}

impl StackCursor {
    /// Region-relative cursor, used for demand estimates.
    pub const fn at(offset: u32) -> Self {
        Self { offset, origin: 0 }
    }

    /// Cursor over the callee frame, starting at `callee_offset`.
    pub const fn in_frame(callee_offset: u32) -> Self {
        Self {
            offset: callee_offset,
            origin: CALLER_ROLE_SHIFT,
        }
    }

    /// Reserve `size` bytes aligned to `align` and return their offset.
    pub fn place(&mut self, size: u32, align: u32) -> u32 {
        self.offset = round_up(self.offset - self.origin, align) + self.origin;
        let at = self.offset;
        self.offset += size;
        at
    }
}

/// Stack space needed by the values of one list that miss the register file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackDemand {
    /// Number of values placed on the stack.
    pub values: u32,
    /// Bytes from the start of the region to the end of the last value,
    /// including alignment padding.
    pub bytes: u32,
    /// Largest alignment among the stack values (0 when there are none).
    pub align: u32,
}

impl StackDemand {
    pub(super) fn record(&mut self, cursor: &mut StackCursor, size: u32, align: u32) {
        cursor.place(size, align);
        self.values += 1;
        self.bytes = cursor.offset;
        self.align = self.align.max(align);
    }

    /// Bytes to reserve so that the region can start at any offset aligned
    /// to `align` and still reproduce the same padding.
    #[must_use]
    pub const fn reserved_bytes(&self) -> u32 {
        if self.align == 0 {
            0
        } else {
            round_up(self.bytes, self.align)
        }
    }
}

/// Emit a stack location for a slot at `callee_offset`.
pub(super) fn stack_location(role: CallRole, callee_offset: u32, width: Width) -> ArgumentLocation {
    ArgumentLocation::new(
        ValueLocation::Stack(StackSlot::from_callee_offset(role, callee_offset)),
        width,
    )
}

fn count_stack(locations: &[ArgumentLocation]) -> u32 {
    u32::try_from(locations.iter().filter(|loc| loc.is_stack()).count())
        .expect("stack value count fits in u32")
}

impl ConventionTable {
    /// Compute where every value of `signature` lives for `role`.
    ///
    /// # Panics
    ///
    /// Panics if the signature contains a meta kind, or a kind this
    /// convention cannot carry (`v128` outside the Wasm convention, or on a
    /// target without 128-bit FPRs).
    #[must_use]
    pub fn call_information_for(
        &self,
        signature: &FunctionSignature,
        role: CallRole,
    ) -> CallInformation {
        let mut counters = Counters::default();
        let mut header_size = self.header_size();

        let this_argument = self.marshal_this(role, &mut counters, header_size);
        header_size += FRAME_SLOT_SIZE;

        let arg_start = self.argument_start();
        debug_assert!(arg_start >= header_size);
        let mut arg_cursor = StackCursor::in_frame(arg_start);
        let params: Vec<ArgumentLocation> = signature
            .params()
            .iter()
            .map(|&kind| self.marshal(role, kind, &mut counters, &mut arg_cursor))
            .collect();
        let arg_bytes = arg_cursor.offset - arg_start;
        let stack_args = count_stack(&params);

        let arg_demand = self.stack_argument_demand(signature);
        debug_assert_eq!(
            arg_demand.values, stack_args,
            "stack argument estimate disagrees with assignment for {signature}"
        );
        debug_assert_eq!(
            arg_demand.bytes, arg_bytes,
            "stack argument bytes disagree with assignment for {signature}"
        );
        if !self.kind().splits_wide_values() {
            let overflow = counters.gp.saturating_sub(self.gpr_args().len())
                + counters.fp.saturating_sub(self.fpr_args().len());
            debug_assert_eq!(
                overflow,
                stack_args as usize + usize::from(this_argument.is_stack()),
                "register overflow disagrees with stack arguments for {signature}"
            );
        }

        let result_demand = self.stack_result_demand(signature);
        let result_bytes = result_demand.reserved_bytes();
        let reserved = round_up(arg_bytes.max(result_bytes), self.stack_alignment());
        let region_end = arg_start + reserved;

        let mut counters = Counters::default();
        let mut result_cursor = StackCursor::in_frame(region_end - result_bytes);
        let results: Vec<ArgumentLocation> = signature
            .results()
            .iter()
            .map(|&kind| self.marshal(role, kind, &mut counters, &mut result_cursor))
            .collect();
        let stack_results = count_stack(&results);
        debug_assert_eq!(result_demand.values, stack_results);
        debug_assert!(result_cursor.offset <= region_end);

        let frame_end = arg_cursor.offset.max(result_cursor.offset).max(region_end);
        let header_and_argument_stack_size = match role {
            CallRole::Callee => frame_end,
            CallRole::Caller => frame_end - CALLER_ROLE_SHIFT,
        };
        let number_of_stack_values = stack_args.max(stack_results);

        tracing::trace!(
            convention = %self.kind(),
            %role,
            %signature,
            header_and_argument_stack_size,
            number_of_stack_values,
            "assigned call information"
        );

        CallInformation {
            this_argument,
            params,
            results,
            header_and_argument_stack_size,
            number_of_stack_values,
        }
    }

    /// Stack demand of the parameters, `this` excluded.
    #[must_use]
    pub fn stack_argument_demand(&self, signature: &FunctionSignature) -> StackDemand {
        self.demand(signature.params(), Counters::AFTER_THIS)
    }

    #[must_use]
    pub fn stack_result_demand(&self, signature: &FunctionSignature) -> StackDemand {
        self.demand(signature.results(), Counters::default())
    }

    #[must_use]
    pub fn number_of_stack_arguments(&self, signature: &FunctionSignature) -> u32 {
        self.stack_argument_demand(signature).values
    }

    #[must_use]
    pub fn number_of_stack_results(&self, signature: &FunctionSignature) -> u32 {
        self.stack_result_demand(signature).values
    }

    #[must_use]
    pub fn number_of_stack_values(&self, signature: &FunctionSignature) -> u32 {
        self.number_of_stack_arguments(signature)
            .max(self.number_of_stack_results(signature))
    }

    fn demand(&self, kinds: &[ValueKind], counters: Counters) -> StackDemand {
        if self.kind().splits_wide_values() {
            paired::demand(self, kinds, counters)
        } else {
            self.boxed_demand(kinds, counters)
        }
    }

    fn boxed_demand(&self, kinds: &[ValueKind], mut counters: Counters) -> StackDemand {
        let mut cursor = StackCursor::at(0);
        let mut demand = StackDemand::default();
        for &kind in kinds {
            let (slot_size, class) = self.boxed_slot(kind);
            let (used, available) = match class.class {
                RegisterClass::General => (&mut counters.gp, self.gpr_args().len()),
                RegisterClass::Float => (&mut counters.fp, self.fpr_args().len()),
            };
            if *used < available {
                *used += 1;
            } else {
                demand.record(&mut cursor, slot_size, slot_size);
            }
        }
        demand
    }

    /// `this` is a pointer taking the first GP argument slot; without a free
    /// register it stays in the reserved header slot.
    fn marshal_this(
        &self,
        role: CallRole,
        counters: &mut Counters,
        header_size: u32,
    ) -> ArgumentLocation {
        let width = Width::for_bytes(self.pointer_size());
        let index = counters.gp;
        counters.gp += 1;
        match self.gpr_args().get(index) {
            Some(&regs) => ArgumentLocation::new(ValueLocation::gpr(regs), width),
            None => stack_location(role, header_size, width),
        }
    }

    fn marshal(
        &self,
        role: CallRole,
        kind: ValueKind,
        counters: &mut Counters,
        cursor: &mut StackCursor,
    ) -> ArgumentLocation {
        if self.kind().splits_wide_values() {
            paired::marshal(self, role, kind, counters, cursor)
        } else {
            self.marshal_boxed(role, kind, counters, cursor)
        }
    }

    /// Slot size and classification of `kind` on a boxed-value convention.
    fn boxed_slot(&self, kind: ValueKind) -> (u32, Classification) {
        let class = kind.classify();
        let slot_size = match self.kind() {
            ConventionKind::Wasm => {
                assert!(
                    kind != ValueKind::V128 || self.supports_vectors(),
                    "v128 values cannot cross the wasm calling convention without 128-bit FPRs"
                );
                round_up(class.bytes(), FRAME_SLOT_SIZE)
            }
            ConventionKind::Js => {
                assert!(
                    kind != ValueKind::V128,
                    "v128 values cannot cross the js calling convention"
                );
                FRAME_SLOT_SIZE
            }
            ConventionKind::NarrowC => unreachable!("narrow C values are not boxed"),
        };
        (slot_size, class)
    }

    fn marshal_boxed(
        &self,
        role: CallRole,
        kind: ValueKind,
        counters: &mut Counters,
        cursor: &mut StackCursor,
    ) -> ArgumentLocation {
        let (slot_size, class) = self.boxed_slot(kind);
        let width = Width::for_bytes(slot_size);

        match class.class {
            RegisterClass::General => {
                if let Some(&regs) = self.gpr_args().get(counters.gp) {
                    counters.gp += 1;
                    // A 32-bit value in a tag/payload pair only lives in the payload.
                    let used_width = if self.kind() == ConventionKind::Wasm
                        && regs.is_pair()
                        && class.bytes() == 4
                    {
                        Width::W32
                    } else {
                        width
                    };
                    return ArgumentLocation::with_used_width(
                        ValueLocation::gpr(regs),
                        width,
                        used_width,
                    );
                }
                counters.gp += 1;
            }
            RegisterClass::Float => {
                if let Some(&fpr) = self.fpr_args().get(counters.fp) {
                    counters.fp += 1;
                    return ArgumentLocation::new(ValueLocation::fpr(fpr), width);
                }
                counters.fp += 1;
            }
        }

        let offset = cursor.place(slot_size, slot_size);
        stack_location(role, offset, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::CALL_FRAME_HEADER_SIZE;
    use crate::registers::{Fpr, Gpr, ValueRegs};
    use crate::target::{ARMV7, RegisterInventory, X86_64};

    fn table(kind: ConventionKind, gprs: &[u8], fprs: &[u8]) -> ConventionTable {
        let inventory = RegisterInventory::new().with_gprs(gprs).with_fprs(fprs);
        ConventionTable::new(kind, &X86_64, inventory)
    }

    fn sig(text: &str) -> FunctionSignature {
        text.parse().unwrap()
    }

    #[test]
    fn test_stack_cursor_aligns() {
        let mut cursor = StackCursor::at(8);
        assert_eq!(cursor.place(16, 16), 16);
        assert_eq!(cursor.offset, 32);
        assert_eq!(cursor.place(8, 8), 32);
    }

    #[test]
    fn test_frame_cursor_aligns_to_caller_stack_pointer() {
        let mut cursor = StackCursor::in_frame(56);
        assert_eq!(cursor.place(8, 8), 56);
        // Callee 64 is caller 56; the next 16-aligned caller offset is 64.
        assert_eq!(cursor.place(16, 16), 72);
        assert_eq!((72 - CALLER_ROLE_SHIFT) % 16, 0);
    }

    #[test]
    fn test_reserved_bytes() {
        assert_eq!(StackDemand::default().reserved_bytes(), 0);
        let demand = StackDemand {
            values: 2,
            bytes: 24,
            align: 16,
        };
        assert_eq!(demand.reserved_bytes(), 32);
    }

    #[test]
    fn test_this_takes_first_gpr() {
        let table = table(ConventionKind::Wasm, &[0, 1], &[0]);
        let info = table.call_information_for(&sig("() -> ()"), CallRole::Callee);
        assert_eq!(
            info.this_argument.location,
            ValueLocation::gpr(ValueRegs::Single(Gpr(0)))
        );
        assert_eq!(info.this_argument.width, Width::W64);
    }

    #[test]
    fn test_this_spills_to_header_slot() {
        let table = table(ConventionKind::Wasm, &[], &[]);
        let callee = table.call_information_for(&sig("() -> ()"), CallRole::Callee);
        let caller = table.call_information_for(&sig("() -> ()"), CallRole::Caller);
        assert_eq!(
            callee.this_argument.stack_slot().map(|slot| slot.offset),
            Some(CALL_FRAME_HEADER_SIZE)
        );
        assert_eq!(
            caller.this_argument.stack_slot().map(|slot| slot.offset),
            Some(CALL_FRAME_HEADER_SIZE - CALLER_ROLE_SHIFT)
        );
    }

    #[test]
    fn test_wasm_i32_register_width_is_slot_width() {
        let table = table(ConventionKind::Wasm, &[0, 1], &[0]);
        let info = table.call_information_for(&sig("(i32, f32) -> ()"), CallRole::Callee);
        assert_eq!(info.params[0].width, Width::W64);
        assert_eq!(info.params[0].used_width, Width::W64);
        assert_eq!(info.params[1].location, ValueLocation::fpr(Fpr(0)));
        assert_eq!(info.params[1].width, Width::W64);
    }

    #[test]
    fn test_float_params_do_not_consume_gprs() {
        let table = table(ConventionKind::Wasm, &[0, 1], &[0, 1]);
        let info =
            table.call_information_for(&sig("(f64, f64, i64) -> ()"), CallRole::Callee);
        assert_eq!(info.params[0].fpr(), Some(Fpr(0)));
        assert_eq!(info.params[1].fpr(), Some(Fpr(1)));
        assert_eq!(info.params[2].value_regs(), Some(ValueRegs::Single(Gpr(1))));
        assert_eq!(info.number_of_stack_values, 0);
    }

    #[test]
    fn test_results_reuse_registers_from_zero() {
        let table = table(ConventionKind::Wasm, &[0, 1], &[0]);
        let info = table.call_information_for(&sig("(i32) -> (i64, f32)"), CallRole::Callee);
        assert_eq!(info.results[0].value_regs(), Some(ValueRegs::Single(Gpr(0))));
        assert_eq!(info.results[1].fpr(), Some(Fpr(0)));
    }

    #[test]
    fn test_v128_spill_is_sixteen_byte_aligned() {
        let table = table(ConventionKind::Wasm, &[0, 1], &[]);
        let info = table.call_information_for(&sig("(f32, v128) -> ()"), CallRole::Callee);
        let first = info.params[0].stack_slot().unwrap().offset;
        let second = info.params[1].stack_slot().unwrap().offset;
        assert_eq!(first, table.argument_start());
        assert_eq!(second, first + 16);
        assert_eq!(info.params[1].width, Width::W128);

        let caller = table.call_information_for(&sig("(f32, v128) -> ()"), CallRole::Caller);
        let slot = caller.params[1].stack_slot().unwrap();
        assert_eq!(slot.offset % 16, 0);
        assert_eq!(slot.offset, second - CALLER_ROLE_SHIFT);
    }

    #[test]
    #[should_panic(expected = "v128 values cannot cross the wasm calling convention")]
    fn test_wasm_rejects_v128_without_quad_fprs() {
        let inventory = RegisterInventory::new()
            .with_gpr_pairs(&[(1, 0)])
            .with_fprs(&[0, 1]);
        let table = ConventionTable::new(ConventionKind::Wasm, &ARMV7, inventory);
        let _ = table.call_information_for(&sig("(v128) -> (v128)"), CallRole::Callee);
    }

    #[test]
    fn test_js_values_are_one_slot() {
        let table = table(ConventionKind::Js, &[0], &[]);
        let info = table.call_information_for(&sig("(i32, f32, i64) -> ()"), CallRole::Callee);
        let offsets: Vec<u32> = info
            .params
            .iter()
            .map(|loc| loc.stack_slot().unwrap().offset)
            .collect();
        let base = table.argument_start();
        assert_eq!(offsets, vec![base, base + 8, base + 16]);
        assert!(info.params.iter().all(|loc| loc.width == Width::W64));
    }

    #[test]
    #[should_panic(expected = "v128 values cannot cross the js calling convention")]
    fn test_js_rejects_v128() {
        let table = table(ConventionKind::Js, &[0, 1], &[0]);
        let _ = table.call_information_for(&sig("(v128) -> ()"), CallRole::Callee);
    }

    #[test]
    #[should_panic(expected = "not a value type")]
    fn test_meta_kind_aborts_assignment() {
        let table = table(ConventionKind::Wasm, &[0, 1], &[0]);
        let signature = FunctionSignature::new(vec![ValueKind::I32, ValueKind::Struct], vec![]);
        let _ = table.call_information_for(&signature, CallRole::Caller);
    }

    #[test]
    fn test_stack_results_pack_against_region_top() {
        let table = table(ConventionKind::Wasm, &[0], &[]);
        let info =
            table.call_information_for(&sig("() -> (i32, i32, i32)"), CallRole::Callee);
        // `this` took r0; results restart at index 0, so one result fits.
        assert!(info.results[0].is_gpr());
        let base = table.argument_start();
        // Two 8-byte results reserve 16 bytes: they fill the region exactly.
        assert_eq!(info.results[1].stack_slot().unwrap().offset, base);
        assert_eq!(info.results[2].stack_slot().unwrap().offset, base + 8);
        assert_eq!(info.header_and_argument_stack_size, base + 16);
        assert_eq!(info.number_of_stack_values, 2);
    }

    #[test]
    fn test_single_stack_result_sits_at_region_end() {
        let table = table(ConventionKind::Wasm, &[], &[]);
        let info = table.call_information_for(&sig("() -> (i64)"), CallRole::Callee);
        let base = table.argument_start();
        // 8 bytes rounded to a 16-byte region; the result takes the top slot.
        assert_eq!(info.results[0].stack_slot().unwrap().offset, base + 8);
        assert_eq!(info.header_and_argument_stack_size, base + 16);
    }

    #[test]
    fn test_argument_area_starts_after_pad_slot() {
        let table = table(ConventionKind::Wasm, &[], &[]);
        let info = table.call_information_for(&sig("(i64) -> ()"), CallRole::Caller);
        // `this` at 32, pad at 40, the argument at 48 from the stack pointer.
        assert_eq!(
            info.this_argument.stack_slot().map(|slot| slot.offset),
            Some(CALL_FRAME_HEADER_SIZE - CALLER_ROLE_SHIFT)
        );
        assert_eq!(info.params[0].stack_slot().map(|slot| slot.offset), Some(48));
        assert_eq!(info.header_and_argument_stack_size, 64);
        assert_eq!(table.argument_start(), CALL_FRAME_HEADER_SIZE + 2 * FRAME_SLOT_SIZE);
    }

    #[test]
    fn test_demand_counts() {
        let table = table(ConventionKind::Wasm, &[0, 1], &[0]);
        let signature = sig("(i32, i32, f32, f64, v128) -> (i64, i64, i64)");
        assert_eq!(table.number_of_stack_arguments(&signature), 3);
        assert_eq!(table.number_of_stack_results(&signature), 1);
        assert_eq!(table.number_of_stack_values(&signature), 3);
        let demand = table.stack_argument_demand(&signature);
        // i32 at 0, f64 at 8, v128 aligned to 16.
        assert_eq!(demand.bytes, 32);
        assert_eq!(demand.align, 16);
    }
}
