// ARMv7 in Thumb-2 mode: 32-bit GPRs, so engine values are tag/payload pairs
// and the platform C convention passes 64-bit integers in even/odd pairs.

use super::{RegisterInventory, Target, ValueRepresentation};
use crate::abi::STACK_ALIGNMENT;
use crate::convention::ConventionKind;
use crate::registers::RegisterSetBuilder;

const R0: u8 = 0;
const R1: u8 = 1;
const R2: u8 = 2;
const R3: u8 = 3;
const R4: u8 = 4;
const R5: u8 = 5;
const R6: u8 = 6;
const R8: u8 = 8;
const R10: u8 = 10;
const R11: u8 = 11;
const IP: u8 = 12;

/// `(tag, payload)` pairs for boxed engine values.
const VALUE_PAIRS: [(u8, u8); 2] = [(R1, R0), (R3, R2)];
const C_ARGUMENT_GPRS: [u8; 4] = [R0, R1, R2, R3];
const ARGUMENT_FPRS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
const CALLEE_SAVES: [u8; 5] = [R4, R5, R8, R10, R11];
const CALLEE_SAVE_FPRS: [u8; 8] = [8, 9, 10, 11, 12, 13, 14, 15];

const GPR_NAMES: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "ip", "sp", "lr",
    "pc",
];

const FPR_NAMES: [&str; 16] = [
    "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7", "d8", "d9", "d10", "d11", "d12", "d13", "d14",
    "d15",
];

pub(super) const TARGET: Target = Target {
    name: "armv7",
    pointer_size: 4,
    gpr_size: 4,
    value_representation: ValueRepresentation::TagPayload32,
    stack_alignment: STACK_ALIGNMENT,
    fpr_size: 8,
    gpr_names: &GPR_NAMES,
    fpr_names: &FPR_NAMES,
    registers,
};

fn callee_saves() -> RegisterSetBuilder {
    RegisterSetBuilder::new()
        .with_gprs(&CALLEE_SAVES)
        .with_fprs(&CALLEE_SAVE_FPRS)
}

fn registers(kind: ConventionKind) -> Option<RegisterInventory> {
    let inventory = match kind {
        ConventionKind::Wasm => RegisterInventory::new()
            .with_gpr_pairs(&VALUE_PAIRS)
            .with_fprs(&ARGUMENT_FPRS)
            .with_scratch(&[R6, IP]),
        ConventionKind::Js => RegisterInventory::new()
            .with_gpr_pairs(&VALUE_PAIRS)
            .with_fprs(&ARGUMENT_FPRS),
        ConventionKind::NarrowC => RegisterInventory::new()
            .with_gprs(&C_ARGUMENT_GPRS)
            .with_fprs(&ARGUMENT_FPRS)
            .with_scratch(&[IP]),
    };
    Some(inventory.with_callee_saves(callee_saves()))
}
