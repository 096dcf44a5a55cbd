use crate::abi::FRAME_SLOT_SIZE;
use crate::location::{ArgumentLocation, ValueLocation};
use crate::registers::{Reg, RegisterAtOffsetList, RegisterSet};

/// Locations of every value of one signature under one convention and role.
///
/// Computed fresh by [`ConventionTable::call_information_for`] on every query.
///
/// [`ConventionTable::call_information_for`]: crate::ConventionTable::call_information_for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInformation {
    /// The implicit leading context argument, present for every signature.
    pub this_argument: ArgumentLocation,
    pub params: Vec<ArgumentLocation>,
    pub results: Vec<ArgumentLocation>,
    /// End of the header, argument and result area in the role's own stack
    /// coordinates. As a callee this includes the frame link slot, as a
    /// caller it does not.
    pub header_and_argument_stack_size: u32,
    /// Larger of the number of stack arguments and stack results.
    pub number_of_stack_values: u32,
}

impl CallInformation {
    /// Every register a result is written to, including both halves of
    /// tag/payload pairs.
    #[must_use]
    pub fn result_registers(&self) -> RegisterSet {
        let mut set = RegisterSet::new();
        for loc in &self.results {
            match loc.location {
                ValueLocation::Register(Reg::Gpr(regs)) => set.add_value_regs(regs),
                ValueLocation::Register(Reg::Fpr(fpr)) => set.add_fpr(fpr, loc.width),
                ValueLocation::Stack(_) => {}
            }
        }
        set
    }

    /// Zero-based save area for the result registers, used by thunks that
    /// have to park results while they run other code.
    #[must_use]
    pub fn results_offset_list(&self) -> RegisterAtOffsetList {
        RegisterAtOffsetList::zero_based(&self.result_registers(), FRAME_SLOT_SIZE)
    }

    pub fn stack_params(&self) -> impl Iterator<Item = &ArgumentLocation> {
        self.params.iter().filter(|loc| loc.is_stack())
    }

    pub fn stack_results(&self) -> impl Iterator<Item = &ArgumentLocation> {
        self.results.iter().filter(|loc| loc.is_stack())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{CallRole, StackSlot};
    use crate::registers::{Fpr, Gpr, RegisterId, ValueRegs};
    use crate::width::Width;

    fn info(results: Vec<ArgumentLocation>) -> CallInformation {
        CallInformation {
            this_argument: ArgumentLocation::new(
                ValueLocation::gpr(ValueRegs::Single(Gpr(0))),
                Width::W64,
            ),
            params: Vec::new(),
            results,
            header_and_argument_stack_size: 48,
            number_of_stack_values: 0,
        }
    }

    #[test]
    fn test_result_registers_cover_pairs_and_vectors() {
        let info = info(vec![
            ArgumentLocation::new(
                ValueLocation::gpr(ValueRegs::Pair {
                    tag: Gpr(3),
                    payload: Gpr(2),
                }),
                Width::W64,
            ),
            ArgumentLocation::new(ValueLocation::fpr(Fpr(1)), Width::W128),
            ArgumentLocation::new(
                ValueLocation::Stack(StackSlot::from_callee_offset(CallRole::Callee, 48)),
                Width::W64,
            ),
        ]);
        let set = info.result_registers();
        assert_eq!(set.len(), 3);
        assert!(set.contains(RegisterId::Gpr(Gpr(2))));
        assert!(set.contains(RegisterId::Gpr(Gpr(3))));
        assert!(set.is_vector(Fpr(1)));

        let list = info.results_offset_list();
        assert_eq!(list.find(RegisterId::Gpr(Gpr(2))), Some(0));
        assert_eq!(list.find(RegisterId::Gpr(Gpr(3))), Some(8));
        assert_eq!(list.find(RegisterId::Fpr(Fpr(1))), Some(16));
        assert_eq!(list.size_in_bytes(), 32);
        assert_eq!(info.stack_results().count(), 1);
    }

    #[test]
    fn test_empty_results_have_empty_save_area() {
        let info = info(Vec::new());
        assert!(info.result_registers().is_empty());
        assert_eq!(info.results_offset_list().size_in_bytes(), 0);
    }
}
