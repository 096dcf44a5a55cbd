use super::{RegisterInventory, Target, ValueRepresentation};
use crate::abi::STACK_ALIGNMENT;
use crate::convention::ConventionKind;
use crate::registers::RegisterSetBuilder;

const RAX: u8 = 0;
const RCX: u8 = 1;
const RDX: u8 = 2;
const RBX: u8 = 3;
const RSI: u8 = 6;
const RDI: u8 = 7;
const R8: u8 = 8;
const R9: u8 = 9;
const R10: u8 = 10;
const R11: u8 = 11;
const R12: u8 = 12;
const R13: u8 = 13;
const R14: u8 = 14;
const R15: u8 = 15;

/// System V argument order.
const ARGUMENT_GPRS: [u8; 6] = [RDI, RSI, RDX, RCX, R8, R9];
const ARGUMENT_FPRS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
const CALLEE_SAVES: [u8; 5] = [RBX, R12, R13, R14, R15];

const GPR_NAMES: [&str; 16] = [
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12",
    "r13", "r14", "r15",
];

const FPR_NAMES: [&str; 16] = [
    "xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7", "xmm8", "xmm9", "xmm10",
    "xmm11", "xmm12", "xmm13", "xmm14", "xmm15",
];

pub(super) const TARGET: Target = Target {
    name: "x86_64",
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
    let base = RegisterInventory::new()
        .with_gprs(&ARGUMENT_GPRS)
        .with_fprs(&ARGUMENT_FPRS)
        .with_callee_saves(RegisterSetBuilder::new().with_gprs(&CALLEE_SAVES));
    match kind {
        ConventionKind::Wasm => Some(base.with_scratch(&[RAX, R10, R11])),
        ConventionKind::Js => Some(base),
        ConventionKind::NarrowC => None,
    }
}
