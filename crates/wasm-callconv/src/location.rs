//! Output locations of the assigner.

use std::fmt;

use crate::abi::CALLER_ROLE_SHIFT;
use crate::registers::{Fpr, Reg, ValueRegs};
use crate::width::Width;

/// Which side of a call site is asking where a value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallRole {
    Caller,
    Callee,
}

impl fmt::Display for CallRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallRole::Caller => f.write_str("caller"),
            CallRole::Callee => f.write_str("callee"),
        }
    }
}

/// Base register a stack offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackBase {
    /// The caller's stack pointer at the call instruction.
    CallerStackPointer,
    /// The callee's frame pointer; includes the return-address slot.
    CalleeFrame,
}

impl StackBase {
    #[must_use]
    pub const fn for_role(role: CallRole) -> Self {
        match role {
            CallRole::Caller => StackBase::CallerStackPointer,
            CallRole::Callee => StackBase::CalleeFrame,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackSlot {
    pub offset: u32,
    pub base: StackBase,
}

impl StackSlot {
    /// Slot at `callee_offset` in the callee frame, seen from `role`.
    ///
    /// # Panics
    ///
    /// Panics if a caller-side view would fall below the stack pointer.
    #[must_use]
    pub fn from_callee_offset(role: CallRole, callee_offset: u32) -> Self {
        let offset = match role {
            CallRole::Callee => callee_offset,
            CallRole::Caller => callee_offset
                .checked_sub(CALLER_ROLE_SHIFT)
                .expect("stack slot lies inside the caller frame link"),
        };
        Self {
            offset,
            base: StackBase::for_role(role),
        }
    }
}

impl fmt::Display for StackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            StackBase::CallerStackPointer => write!(f, "[sp+{}]", self.offset),
            StackBase::CalleeFrame => write!(f, "[fp+{}]", self.offset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueLocation {
    Register(Reg),
    Stack(StackSlot),
}

impl ValueLocation {
    #[must_use]
    pub const fn gpr(regs: ValueRegs) -> Self {
        ValueLocation::Register(Reg::Gpr(regs))
    }

    #[must_use]
    pub const fn fpr(fpr: Fpr) -> Self {
        ValueLocation::Register(Reg::Fpr(fpr))
    }
}

impl fmt::Display for ValueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueLocation::Register(reg) => write!(f, "{reg}"),
            ValueLocation::Stack(slot) => write!(f, "{slot}"),
        }
    }
}

/// Where one argument, result or `this` value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgumentLocation {
    pub location: ValueLocation,
    /// Width of the storage reserved for the value.
    pub width: Width,
    /// Width actually occupied; narrower than `width` only for a 32-bit value
    /// in a tag/payload register pair, where just the payload is live.
    pub used_width: Width,
}

impl ArgumentLocation {
    #[must_use]
    pub const fn new(location: ValueLocation, width: Width) -> Self {
        Self {
            location,
            width,
            used_width: width,
        }
    }

    #[must_use]
    pub const fn with_used_width(location: ValueLocation, width: Width, used_width: Width) -> Self {
        Self {
            location,
            width,
            used_width,
        }
    }

    #[must_use]
    pub const fn is_stack(&self) -> bool {
        matches!(self.location, ValueLocation::Stack(_))
    }

    #[must_use]
    pub const fn is_gpr(&self) -> bool {
        matches!(self.location, ValueLocation::Register(Reg::Gpr(_)))
    }

    #[must_use]
    pub const fn is_fpr(&self) -> bool {
        matches!(self.location, ValueLocation::Register(Reg::Fpr(_)))
    }

    #[must_use]
    pub const fn stack_slot(&self) -> Option<StackSlot> {
        match self.location {
            ValueLocation::Stack(slot) => Some(slot),
            ValueLocation::Register(_) => None,
        }
    }

    #[must_use]
    pub const fn value_regs(&self) -> Option<ValueRegs> {
        match self.location {
            ValueLocation::Register(Reg::Gpr(regs)) => Some(regs),
            _ => None,
        }
    }

    #[must_use]
    pub const fn fpr(&self) -> Option<Fpr> {
        match self.location {
            ValueLocation::Register(Reg::Fpr(fpr)) => Some(fpr),
            _ => None,
        }
    }
}

impl fmt::Display for ArgumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.location, self.width)?;
        if self.used_width != self.width {
            write!(f, ", uses {}", self.used_width)?;
        }
        f.write_str(")")
    }
}
