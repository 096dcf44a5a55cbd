//! Frame layout constants shared by every calling convention.

// ── Frame Slots ──

/// Size of one frame slot in bytes (the "machine word" of a call frame).
///
/// Every header entry occupies one slot, and the caller's view of the
/// argument area is shifted down by exactly one slot relative to the
/// callee's, because the callee frame includes the return-address slot.
pub const FRAME_SLOT_SIZE: u32 = 8;

/// Number of slots in the engine call-frame header.
///
/// Layout (callee view, offsets from the frame pointer):
/// - 0: Caller frame pointer
/// - 8: Return PC
/// - 16: Code block
/// - 24: Callee
/// - 32: Argument count
///
/// The implicit `this` slot follows at 40. One pad slot at 48 puts the
/// first stack argument at 56, which is 48 from the caller's stack pointer.
pub const CALL_FRAME_HEADER_SLOTS: u32 = 5;

/// Engine call-frame header size in bytes (Wasm and JS conventions).
pub const CALL_FRAME_HEADER_SIZE: u32 = CALL_FRAME_HEADER_SLOTS * FRAME_SLOT_SIZE;

/// Header size in bytes of the narrow-register C convention: only the
/// frame link slot precedes the `this` slot.
pub const C_FRAME_HEADER_SIZE: u32 = FRAME_SLOT_SIZE;

/// Shift between the callee's and the caller's view of the same stack slot.
pub const CALLER_ROLE_SHIFT: u32 = FRAME_SLOT_SIZE;

// ── Alignment ──

/// Stack alignment required at call boundaries on every supported target.
///
/// Offsets are aligned relative to the caller's stack pointer, which is
/// aligned at the call. The callee sees the same slots `CALLER_ROLE_SHIFT`
/// bytes higher, so a 16-aligned slot has a callee offset of 8 mod 16.
pub const STACK_ALIGNMENT: u32 = 16;

/// Round `value` up to the next multiple of `alignment` (a power of two).
#[must_use]
pub const fn round_up(value: u32, alignment: u32) -> u32 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Callee offset of the first stack argument for a convention whose header
/// is `header_size` bytes: past the `this` slot, then padded until the
/// caller's view of the offset is a multiple of `stack_alignment`.
#[must_use]
pub const fn argument_area_offset(header_size: u32, stack_alignment: u32) -> u32 {
    round_up(header_size + FRAME_SLOT_SIZE - CALLER_ROLE_SHIFT, stack_alignment)
        + CALLER_ROLE_SHIFT
}
