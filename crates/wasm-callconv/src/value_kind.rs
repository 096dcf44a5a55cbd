//! Value kinds and the width / register-class classifier.

use std::fmt;
use std::str::FromStr;

use crate::Error;
use crate::width::Width;

/// Abstract type tag of a value crossing a call boundary.
///
/// The first group are concrete value types. The second group are type-section
/// markers that describe definitions rather than values; they can appear in a
/// signature only through a construction bug, and the classifier aborts on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    I32,
    I64,
    F32,
    F64,
    V128,
    Funcref,
    Externref,
    Exnref,
    /// Non-nullable typed reference.
    Ref,
    /// Nullable typed reference.
    RefNull,

    Void,
    Func,
    Struct,
    Array,
    Sub,
    SubFinal,
    Rec,
}

/// Register file a value is passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    General,
    Float,
}

/// Result of classifying a concrete [`ValueKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub width: Width,
    pub class: RegisterClass,
}

impl Classification {
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self.width.bytes()
    }
}

impl ValueKind {
    /// All concrete value kinds.
    pub const VALUE_TYPES: [ValueKind; 10] = [
        ValueKind::I32,
        ValueKind::I64,
        ValueKind::F32,
        ValueKind::F64,
        ValueKind::V128,
        ValueKind::Funcref,
        ValueKind::Externref,
        ValueKind::Exnref,
        ValueKind::Ref,
        ValueKind::RefNull,
    ];

    #[must_use]
    pub const fn is_value_type(self) -> bool {
        !matches!(
            self,
            ValueKind::Void
                | ValueKind::Func
                | ValueKind::Struct
                | ValueKind::Array
                | ValueKind::Sub
                | ValueKind::SubFinal
                | ValueKind::Rec
        )
    }

    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            ValueKind::Funcref
                | ValueKind::Externref
                | ValueKind::Exnref
                | ValueKind::Ref
                | ValueKind::RefNull
        )
    }

    /// Map a concrete kind to its storage width and register class.
    ///
    /// References are boxed engine values: one 64-bit general-purpose slot,
    /// whatever the referenced object looks like.
    ///
    /// # Panics
    ///
    /// Panics on meta kinds (`Void`, `Func`, `Struct`, `Array`, `Sub`,
    /// `SubFinal`, `Rec`).
    #[must_use]
    pub fn classify(self) -> Classification {
        let (width, class) = match self {
            ValueKind::I32 => (Width::W32, RegisterClass::General),
            ValueKind::I64
            | ValueKind::Funcref
            | ValueKind::Externref
            | ValueKind::Exnref
            | ValueKind::Ref
            | ValueKind::RefNull => (Width::W64, RegisterClass::General),
            ValueKind::F32 => (Width::W32, RegisterClass::Float),
            ValueKind::F64 => (Width::W64, RegisterClass::Float),
            ValueKind::V128 => (Width::W128, RegisterClass::Float),
            ValueKind::Void
            | ValueKind::Func
            | ValueKind::Struct
            | ValueKind::Array
            | ValueKind::Sub
            | ValueKind::SubFinal
            | ValueKind::Rec => {
                unreachable!("{self} is not a value type and cannot be passed or returned")
            }
        };
        Classification { width, class }
    }

    const fn name(self) -> &'static str {
        match self {
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::V128 => "v128",
            ValueKind::Funcref => "funcref",
            ValueKind::Externref => "externref",
            ValueKind::Exnref => "exnref",
            ValueKind::Ref => "ref",
            ValueKind::RefNull => "refnull",
            ValueKind::Void => "void",
            ValueKind::Func => "func",
            ValueKind::Struct => "struct",
            ValueKind::Array => "array",
            ValueKind::Sub => "sub",
            ValueKind::SubFinal => "subfinal",
            ValueKind::Rec => "rec",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "i32" => ValueKind::I32,
            "i64" => ValueKind::I64,
            "f32" => ValueKind::F32,
            "f64" => ValueKind::F64,
            "v128" => ValueKind::V128,
            "funcref" => ValueKind::Funcref,
            "externref" => ValueKind::Externref,
            "exnref" => ValueKind::Exnref,
            "ref" => ValueKind::Ref,
            "refnull" | "ref_null" => ValueKind::RefNull,
            "void" => ValueKind::Void,
            "func" => ValueKind::Func,
            "struct" => ValueKind::Struct,
            "array" => ValueKind::Array,
            "sub" => ValueKind::Sub,
            "subfinal" => ValueKind::SubFinal,
            "rec" => ValueKind::Rec,
            _ => return Err(Error::UnknownValueKind(s.to_string())),
        };
        Ok(kind)
    }
}

#[cfg(feature = "wasmparser")]
impl From<wasmparser::ValType> for ValueKind {
    fn from(ty: wasmparser::ValType) -> Self {
        use wasmparser::{AbstractHeapType, HeapType, ValType};

        match ty {
            ValType::I32 => ValueKind::I32,
            ValType::I64 => ValueKind::I64,
            ValType::F32 => ValueKind::F32,
            ValType::F64 => ValueKind::F64,
            ValType::V128 => ValueKind::V128,
            ValType::Ref(ref_type) => {
                let nullable = ref_type.is_nullable();
                match ref_type.heap_type() {
                    HeapType::Abstract {
                        ty: AbstractHeapType::Func,
                        ..
                    } if nullable => ValueKind::Funcref,
                    HeapType::Abstract {
                        ty: AbstractHeapType::Extern,
                        ..
                    } if nullable => ValueKind::Externref,
                    HeapType::Abstract {
                        ty: AbstractHeapType::Exn,
                        ..
                    } if nullable => ValueKind::Exnref,
                    _ if nullable => ValueKind::RefNull,
                    _ => ValueKind::Ref,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_and_references_are_general_purpose() {
        for kind in [
            ValueKind::I32,
            ValueKind::I64,
            ValueKind::Funcref,
            ValueKind::Externref,
            ValueKind::Exnref,
            ValueKind::Ref,
            ValueKind::RefNull,
        ] {
            assert_eq!(kind.classify().class, RegisterClass::General, "{kind}");
        }
    }

    #[test]
    fn test_floats_and_vectors_are_float_class() {
        assert_eq!(ValueKind::F32.classify().width, Width::W32);
        assert_eq!(ValueKind::F64.classify().width, Width::W64);
        assert_eq!(ValueKind::V128.classify().width, Width::W128);
        for kind in [ValueKind::F32, ValueKind::F64, ValueKind::V128] {
            assert_eq!(kind.classify().class, RegisterClass::Float);
        }
    }

    #[test]
    fn test_references_are_one_boxed_slot() {
        for kind in ValueKind::VALUE_TYPES.iter().filter(|k| k.is_reference()) {
            assert_eq!(kind.classify().width, Width::W64);
        }
    }

    #[test]
    #[should_panic(expected = "not a value type")]
    fn test_classify_void_aborts() {
        let _ = ValueKind::Void.classify();
    }

    #[test]
    #[should_panic(expected = "not a value type")]
    fn test_classify_rec_aborts() {
        let _ = ValueKind::Rec.classify();
    }

    #[test]
    fn test_parse_names() {
        for kind in ValueKind::VALUE_TYPES {
            assert_eq!(kind.to_string().parse::<ValueKind>().unwrap(), kind);
        }
        assert!(matches!(
            "i31".parse::<ValueKind>(),
            Err(Error::UnknownValueKind(name)) if name == "i31"
        ));
    }

    #[cfg(feature = "wasmparser")]
    #[test]
    fn test_from_wasmparser_ref_types() {
        use wasmparser::{RefType, ValType};

        assert_eq!(ValueKind::from(ValType::FUNCREF), ValueKind::Funcref);
        assert_eq!(ValueKind::from(ValType::EXTERNREF), ValueKind::Externref);
        assert_eq!(
            ValueKind::from(ValType::Ref(RefType::ANYREF)),
            ValueKind::RefNull
        );
        let non_null_func = RefType::FUNCREF.as_non_null();
        assert_eq!(ValueKind::from(ValType::Ref(non_null_func)), ValueKind::Ref);
    }
}
