//! Narrow-register C convention: 32-bit GPRs, so 64-bit integers and
//! references occupy an (even, odd) register pair or an 8-aligned pair of
//! stack words. Pair starts are rounded up to an even register index before
//! the exhaustion test; a skipped odd register is never handed out later.

use crate::location::{ArgumentLocation, CallRole, ValueLocation};
use crate::registers::ValueRegs;
use crate::value_kind::{Classification, RegisterClass, ValueKind};
use crate::width::Width;

use super::ConventionTable;
use super::assign::{Counters, StackCursor, StackDemand, stack_location};

/// How one value is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Gpr,
    GprPair,
    Fpr(u32),
}

fn slot_for(kind: ValueKind) -> (Slot, Classification) {
    assert!(
        kind != ValueKind::V128,
        "v128 values cannot cross the narrow C calling convention"
    );
    let class = kind.classify();
    let slot = match (class.class, class.width) {
        (RegisterClass::General, Width::W32) => Slot::Gpr,
        (RegisterClass::General, _) => Slot::GprPair,
        (RegisterClass::Float, width) => Slot::Fpr(width.bytes()),
    };
    (slot, class)
}

const fn pair_start(index: usize) -> usize {
    index.next_multiple_of(2)
}

pub(super) fn marshal(
    table: &ConventionTable,
    role: CallRole,
    kind: ValueKind,
    counters: &mut Counters,
    cursor: &mut StackCursor,
) -> ArgumentLocation {
    let (slot, class) = slot_for(kind);
    let width = class.width;
    let gprs = table.gpr_args();

    match slot {
        Slot::Gpr => {
            let index = counters.gp;
            counters.gp += 1;
            if let Some(&regs) = gprs.get(index) {
                return ArgumentLocation::new(ValueLocation::gpr(regs), width);
            }
            stack_location(role, cursor.place(4, 4), width)
        }
        Slot::GprPair => {
            let low = pair_start(counters.gp);
            counters.gp = low + 2;
            if low + 1 < gprs.len() {
                let regs = ValueRegs::Pair {
                    tag: gprs[low + 1].payload(),
                    payload: gprs[low].payload(),
                };
                return ArgumentLocation::new(ValueLocation::gpr(regs), width);
            }
            stack_location(role, cursor.place(8, 8), width)
        }
        Slot::Fpr(size) => {
            let index = counters.fp;
            counters.fp += 1;
            if let Some(&fpr) = table.fpr_args().get(index) {
                return ArgumentLocation::new(ValueLocation::fpr(fpr), width);
            }
            stack_location(role, cursor.place(size, size), width)
        }
    }
}

pub(super) fn demand(
    table: &ConventionTable,
    kinds: &[ValueKind],
    mut counters: Counters,
) -> StackDemand {
    let gprs = table.gpr_args().len();
    let fprs = table.fpr_args().len();
    let mut cursor = StackCursor::at(0);
    let mut demand = StackDemand::default();

    for &kind in kinds {
        match slot_for(kind).0 {
            Slot::Gpr => {
                if counters.gp >= gprs {
                    demand.record(&mut cursor, 4, 4);
                }
                counters.gp += 1;
            }
            Slot::GprPair => {
                counters.gp = pair_start(counters.gp);
                if counters.gp + 1 >= gprs {
                    demand.record(&mut cursor, 8, 8);
                }
                counters.gp += 2;
            }
            Slot::Fpr(size) => {
                if counters.fp >= fprs {
                    demand.record(&mut cursor, size, size);
                }
                counters.fp += 1;
            }
        }
    }
    demand
}
