#![allow(
    clippy::module_name_repetitions, // `CallInformation` in `call_info` reads fine
    clippy::missing_errors_doc // error variants are documented on `Error`
)]

//! Where arguments and results live across WebAssembly call boundaries.
//!
//! A [`ConventionTable`] describes the register inventory of one calling
//! convention on one [`Target`]. Given a [`FunctionSignature`] and the
//! [`CallRole`] of the asker, [`ConventionTable::call_information_for`]
//! returns a [`CallInformation`] naming the register or stack slot of every
//! value. Nothing here moves data; code generators consume the locations.

pub mod abi;
pub mod call_info;
pub mod convention;
pub mod error;
pub mod location;
#[cfg(feature = "wasmparser")]
pub mod module;
pub mod registers;
pub mod signature;
pub mod target;
pub mod value_kind;
pub mod width;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use call_info::CallInformation;
pub use convention::{ConventionKind, ConventionTable, Conventions, StackDemand};
pub use error::{Error, Result};
pub use location::{ArgumentLocation, CallRole, StackBase, StackSlot, ValueLocation};
#[cfg(feature = "wasmparser")]
pub use module::{ModuleSignatures, TypeSignature, module_signatures};
pub use registers::{Fpr, Gpr, Reg, RegisterSet, RegisterSetBuilder, ValueRegs};
pub use signature::FunctionSignature;
pub use target::{RegisterInventory, Target, ValueRepresentation};
pub use value_kind::{Classification, RegisterClass, ValueKind};
pub use width::Width;
