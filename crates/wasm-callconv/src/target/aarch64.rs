use super::{RegisterInventory, Target, ValueRepresentation};
use crate::abi::STACK_ALIGNMENT;
use crate::convention::ConventionKind;
use crate::registers::RegisterSetBuilder;

const ARGUMENT_GPRS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
const ARGUMENT_FPRS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
/// x9-x11; x16/x17 stay free for veneers.
const SCRATCH_GPRS: [u8; 3] = [9, 10, 11];
const CALLEE_SAVES: [u8; 10] = [19, 20, 21, 22, 23, 24, 25, 26, 27, 28];
/// d8-d15 keep their low halves across calls.
const CALLEE_SAVE_FPRS: [u8; 8] = [8, 9, 10, 11, 12, 13, 14, 15];

const GPR_NAMES: [&str; 32] = [
    "x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7", "x8", "x9", "x10", "x11", "x12", "x13", "x14",
    "x15", "x16", "x17", "x18", "x19", "x20", "x21", "x22", "x23", "x24", "x25", "x26", "x27",
    "x28", "fp", "lr", "sp",
];

const FPR_NAMES: [&str; 32] = [
    "v0", "v1", "v2", "v3", "v4", "v5", "v6", "v7", "v8", "v9", "v10", "v11", "v12", "v13", "v14",
    "v15", "v16", "v17", "v18", "v19", "v20", "v21", "v22", "v23", "v24", "v25", "v26", "v27",
    "v28", "v29", "v30", "v31",
];

pub(super) const TARGET: Target = Target {
    name: "aarch64",
    pointer_size: 8,
    gpr_size: 8,
    value_representation: ValueRepresentation::Boxed64,
    stack_alignment: STACK_ALIGNMENT,
    fpr_size: 16,
    gpr_names: &GPR_NAMES,
    fpr_names: &FPR_NAMES,
    registers,
};

fn registers(kind: ConventionKind) -> Option<RegisterInventory> {
    let callee_saves = RegisterSetBuilder::new()
        .with_gprs(&CALLEE_SAVES)
        .with_fprs(&CALLEE_SAVE_FPRS);
    let base = RegisterInventory::new()
        .with_gprs(&ARGUMENT_GPRS)
        .with_fprs(&ARGUMENT_FPRS)
        .with_callee_saves(callee_saves);
    match kind {
        ConventionKind::Wasm => Some(base.with_scratch(&SCRATCH_GPRS)),
        ConventionKind::Js => Some(base),
        ConventionKind::NarrowC => None,
    }
}
