use std::fmt;
use std::str::FromStr;

use crate::value_kind::ValueKind;
use crate::{Error, Result};

/// Ordered parameter and return kinds of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    params: Vec<ValueKind>,
    results: Vec<ValueKind>,
}

impl FunctionSignature {
    /// Build a signature without validation. Meta kinds are accepted here and
    /// rejected (fatally) by the classifier when a layout is requested.
    #[must_use]
    pub fn new(params: Vec<ValueKind>, results: Vec<ValueKind>) -> Self {
        Self { params, results }
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn parameter_type(&self, index: usize) -> ValueKind {
        self.params[index]
    }

    #[must_use]
    pub fn return_count(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn return_type(&self, index: usize) -> ValueKind {
        self.results[index]
    }

    #[must_use]
    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    #[must_use]
    pub fn results(&self) -> &[ValueKind] {
        &self.results
    }

    #[must_use]
    pub fn has_vector(&self) -> bool {
        self.params
            .iter()
            .chain(&self.results)
            .any(|&kind| kind == ValueKind::V128)
    }
}

fn invalid(input: &str, reason: impl Into<String>) -> Error {
    Error::InvalidSignature {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parse a comma separated kind list, with or without surrounding parens.
fn parse_kind_list(input: &str, list: &str) -> Result<Vec<ValueKind>> {
    let list = list.trim();
    let inner = match (list.strip_prefix('('), list.strip_suffix(')')) {
        (Some(_), Some(_)) => &list[1..list.len() - 1],
        (None, None) => list,
        _ => return Err(invalid(input, "unbalanced parentheses")),
    };
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|name| {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid(input, "empty entry in type list"));
            }
            let kind: ValueKind = name.parse()?;
            if !kind.is_value_type() {
                return Err(invalid(input, format!("`{kind}` is not a value type")));
            }
            Ok(kind)
        })
        .collect()
}

/// Parses `(i32, f64) -> (i64)`. The result list may be a bare kind
/// (`-> i32`) or omitted entirely (`(i32)`). Only value types are accepted.
impl FromStr for FunctionSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (params, results) = match s.split_once("->") {
            Some((params, results)) => (params, Some(results)),
            None => (s, None),
        };
        let params = params.trim();
        if !(params.starts_with('(') && params.ends_with(')')) {
            return Err(invalid(s, "parameter list must be parenthesized"));
        }
        let params = parse_kind_list(s, params)?;
        let results = match results {
            Some(results) if results.trim().is_empty() => {
                return Err(invalid(s, "missing result list after `->`"));
            }
            Some(results) => parse_kind_list(s, results)?,
            None => Vec::new(),
        };
        Ok(Self { params, results })
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, kinds: &[ValueKind]) -> fmt::Result {
    f.write_str("(")?;
    for (i, kind) in kinds.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{kind}")?;
    }
    f.write_str(")")
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.params)?;
        f.write_str(" -> ")?;
        write_list(f, &self.results)
    }
}

#[cfg(feature = "wasmparser")]
impl From<&wasmparser::FuncType> for FunctionSignature {
    fn from(ty: &wasmparser::FuncType) -> Self {
        Self {
            params: ty.params().iter().copied().map(ValueKind::from).collect(),
            results: ty.results().iter().copied().map(ValueKind::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_signature() {
        let sig: FunctionSignature = "(i32, i64, f32) -> (f64, externref)".parse().unwrap();
        assert_eq!(sig.parameter_count(), 3);
        assert_eq!(sig.parameter_type(1), ValueKind::I64);
        assert_eq!(sig.return_count(), 2);
        assert_eq!(sig.return_type(1), ValueKind::Externref);
    }

    #[test]
    fn test_parse_shorthands() {
        let bare: FunctionSignature = "(i32) -> i64".parse().unwrap();
        assert_eq!(bare.results(), &[ValueKind::I64]);

        let no_results: FunctionSignature = "(f32)".parse().unwrap();
        assert_eq!(no_results.return_count(), 0);

        let empty: FunctionSignature = "() -> ()".parse().unwrap();
        assert_eq!(empty, FunctionSignature::default());
    }

    #[test]
    fn test_parse_rejects_meta_kinds() {
        let err = "(i32, struct) -> ()".parse::<FunctionSignature>().unwrap_err();
        assert!(err.to_string().contains("not a value type"), "{err}");
    }

    #[test]
    fn test_parse_errors() {
        assert!("i32 -> i32".parse::<FunctionSignature>().is_err());
        assert!("(i32,) -> ()".parse::<FunctionSignature>().is_err());
        assert!("(i32) -> (i64".parse::<FunctionSignature>().is_err());
        assert!("(i32) ->".parse::<FunctionSignature>().is_err());
        assert!(matches!(
            "(u8)".parse::<FunctionSignature>(),
            Err(Error::UnknownValueKind(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        let sig = FunctionSignature::new(
            vec![ValueKind::V128, ValueKind::RefNull],
            vec![ValueKind::I32],
        );
        assert_eq!(sig.to_string(), "(v128, refnull) -> (i32)");
        assert_eq!(sig.to_string().parse::<FunctionSignature>().unwrap(), sig);
    }
}
