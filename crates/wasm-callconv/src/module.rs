//! Signature extraction from Wasm binaries.

use wasmparser::{CompositeInnerType, Parser, Payload};

use crate::Result;
use crate::signature::FunctionSignature;

/// A function type from a module's type section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSignature {
    pub type_index: u32,
    pub signature: FunctionSignature,
}

/// Function types of a module plus the type index of every function,
/// imported functions first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSignatures {
    pub types: Vec<TypeSignature>,
    pub function_types: Vec<u32>,
}

impl ModuleSignatures {
    #[must_use]
    pub fn signature(&self, type_index: u32) -> Option<&FunctionSignature> {
        self.types
            .iter()
            .find(|ty| ty.type_index == type_index)
            .map(|ty| &ty.signature)
    }

    /// Signature of the function at `func_index` in the function index space.
    #[must_use]
    pub fn function_signature(&self, func_index: u32) -> Option<&FunctionSignature> {
        let type_index = *self.function_types.get(func_index as usize)?;
        self.signature(type_index)
    }
}

/// Collect every function type of `wasm`. Struct and array types keep their
/// index slot but produce no entry.
pub fn module_signatures(wasm: &[u8]) -> Result<ModuleSignatures> {
    let mut module = ModuleSignatures::default();
    let mut next_type_index = 0u32;

    for payload in Parser::new(0).parse_all(wasm) {
        match payload? {
            Payload::TypeSection(reader) => {
                for rec_group in reader {
                    for sub_type in rec_group?.into_types() {
                        if let CompositeInnerType::Func(f) = &sub_type.composite_type.inner {
                            module.types.push(TypeSignature {
                                type_index: next_type_index,
                                signature: FunctionSignature::from(f),
                            });
                        }
                        next_type_index += 1;
                    }
                }
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    if let wasmparser::TypeRef::Func(type_index) = import?.ty {
                        module.function_types.push(type_index);
                    }
                }
            }
            Payload::FunctionSection(reader) => {
                for type_index in reader {
                    module.function_types.push(type_index?);
                }
            }
            _ => {}
        }
    }

    tracing::debug!(
        types = module.types.len(),
        functions = module.function_types.len(),
        "collected module signatures"
    );
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_kind::ValueKind;

    #[test]
    fn test_collects_types_and_functions() {
        let wasm = wat::parse_str(
            r#"
            (module
                (type (func (param i32 i64) (result f32)))
                (import "env" "log" (func (param externref)))
                (func (type 0) f32.const 0)
                (func (result v128) v128.const i64x2 0 0)
            )
            "#,
        )
        .unwrap();
        let module = module_signatures(&wasm).unwrap();
        assert_eq!(module.types.len(), 3);
        assert_eq!(module.function_types.len(), 3);

        let imported = module.function_signature(0).unwrap();
        assert_eq!(imported.params(), &[ValueKind::Externref]);
        let first = module.function_signature(1).unwrap();
        assert_eq!(first.to_string(), "(i32, i64) -> (f32)");
        let second = module.function_signature(2).unwrap();
        assert_eq!(second.results(), &[ValueKind::V128]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(module_signatures(b"not a wasm module").is_err());
    }
}
