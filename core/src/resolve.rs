//! Type resolution: reduces a nested [`TypeDesc`] to schema metadata.
//!
//! Any nesting of optional/union wrapping, literal enumerations, lists, and
//! records collapses to four facts about an argument: its [`BaseType`], its
//! choice set, whether it accepts multiple values, and whether it is a
//! presence-only flag.

use serde_json::Value;

use crate::types::{BaseType, RecordDesc, TypeDesc, union_values};

/// Outcome of resolving one parameter's declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    /// Scalar category for value coercion.
    pub base_type: BaseType,
    /// Ordered-unique allowed values; empty means unconstrained.
    pub choices: Vec<Value>,
    /// Accepts one-or-more value tokens.
    pub multiple: bool,
    /// Presence-only boolean flag.
    pub is_flag: bool,
}

/// Resolves a type description, honoring an explicit choice-set annotation.
///
/// An explicit annotation replaces the derived choices entirely. A boolean
/// result forces the flag shape: choices cleared and multiplicity single,
/// because flags never take a value token.
///
/// # Examples
///
/// ```
/// use callsig_core::{BaseType, TypeDesc, resolve};
/// use serde_json::json;
///
/// let ty = TypeDesc::Literal(vec![json!("fmp"), json!("yfinance")]);
/// let resolved = resolve(&ty, None);
/// assert_eq!(resolved.base_type, BaseType::Str);
/// assert_eq!(resolved.choices, vec![json!("fmp"), json!("yfinance")]);
/// ```
pub fn resolve(ty: &TypeDesc, explicit_choices: Option<&[Value]>) -> ResolvedType {
    let base_type = resolve_base_type(ty);
    let is_flag = base_type == BaseType::Bool;

    let mut choices = match explicit_choices {
        Some(explicit) => {
            let mut values = Vec::new();
            union_values(&mut values, explicit.iter().cloned());
            values
        }
        None => resolve_choices(ty),
    };
    let mut multiple = resolve_multiple(ty);

    if is_flag {
        choices.clear();
        multiple = false;
    }

    ResolvedType {
        base_type,
        choices,
        multiple,
        is_flag,
    }
}

/// Reduces a type description to its base scalar type.
///
/// Unions with one concrete alternative recurse into it; unions with several
/// prefer `bool`, then `str`, then the first concrete alternative. A literal
/// enumeration takes the type of its first value. A list defers to its
/// element type. A record resolves to the [`BaseType::Structured`] sentinel,
/// which triggers flattening and never reaches a built schema.
pub fn resolve_base_type(ty: &TypeDesc) -> BaseType {
    match ty {
        TypeDesc::Str | TypeDesc::Date | TypeDesc::Absent => BaseType::Str,
        TypeDesc::Int => BaseType::Int,
        TypeDesc::Float => BaseType::Float,
        TypeDesc::Bool => BaseType::Bool,
        TypeDesc::Literal(values) => values.first().map(scalar_base).unwrap_or(BaseType::Str),
        TypeDesc::List(inner) => resolve_base_type(inner),
        TypeDesc::Union(alternatives) => {
            let concrete: Vec<&TypeDesc> = alternatives
                .iter()
                .filter(|alt| !matches!(alt, TypeDesc::Absent))
                .collect();
            match concrete.as_slice() {
                [] => BaseType::Str,
                [only] => resolve_base_type(only),
                [first, ..] => {
                    if concrete.iter().any(|alt| matches!(alt, TypeDesc::Bool)) {
                        BaseType::Bool
                    } else if concrete
                        .iter()
                        .any(|alt| matches!(alt, TypeDesc::Str | TypeDesc::Date))
                    {
                        BaseType::Str
                    } else {
                        resolve_base_type(first)
                    }
                }
            }
        }
        TypeDesc::Record(_) => BaseType::Structured,
    }
}

/// Collects literal values from every union alternative, deduplicated,
/// descending through lists. Plain scalars and records contribute nothing.
pub fn resolve_choices(ty: &TypeDesc) -> Vec<Value> {
    let mut choices = Vec::new();
    collect_choices(ty, &mut choices);
    choices
}

fn collect_choices(ty: &TypeDesc, into: &mut Vec<Value>) {
    match ty {
        TypeDesc::Literal(values) => union_values(into, values.iter().cloned()),
        TypeDesc::List(inner) => collect_choices(inner, into),
        TypeDesc::Union(alternatives) => {
            for alt in alternatives {
                collect_choices(alt, into);
            }
        }
        _ => {}
    }
}

/// True iff the type is a list, possibly behind one optional wrapper.
pub fn resolve_multiple(ty: &TypeDesc) -> bool {
    match ty {
        TypeDesc::List(_) => true,
        TypeDesc::Union(alternatives) => {
            let concrete: Vec<&TypeDesc> = alternatives
                .iter()
                .filter(|alt| !matches!(alt, TypeDesc::Absent))
                .collect();
            matches!(concrete.as_slice(), [TypeDesc::List(_)])
        }
        _ => false,
    }
}

/// True iff the resolved base type is exactly `bool`.
pub fn resolve_is_flag(ty: &TypeDesc) -> bool {
    resolve_base_type(ty) == BaseType::Bool
}

/// The record behind a structured type, if the shape supports flattening.
///
/// Mirrors the union descent of [`resolve_base_type`]: a record reached
/// through a list wrapper resolves structured but cannot be flattened, so
/// it yields `None` here and the caller reports a build error.
pub(crate) fn underlying_record(ty: &TypeDesc) -> Option<&RecordDesc> {
    match ty {
        TypeDesc::Record(record) => Some(record),
        TypeDesc::Union(alternatives) => {
            let concrete: Vec<&TypeDesc> = alternatives
                .iter()
                .filter(|alt| !matches!(alt, TypeDesc::Absent))
                .collect();
            match concrete.as_slice() {
                [only] => underlying_record(only),
                [first, ..] => {
                    if concrete
                        .iter()
                        .any(|alt| matches!(alt, TypeDesc::Bool | TypeDesc::Str | TypeDesc::Date))
                    {
                        None
                    } else {
                        underlying_record(first)
                    }
                }
                [] => None,
            }
        }
        _ => None,
    }
}

fn scalar_base(value: &Value) -> BaseType {
    match value {
        Value::Bool(_) => BaseType::Bool,
        Value::Number(n) if n.is_i64() || n.is_u64() => BaseType::Int,
        Value::Number(_) => BaseType::Float,
        _ => BaseType::Str,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::FieldDesc;

    #[test]
    fn test_optional_unwraps_to_inner_type() {
        let ty = TypeDesc::optional(TypeDesc::Int);
        assert_eq!(resolve_base_type(&ty), BaseType::Int);
        assert!(!resolve_multiple(&ty));
    }

    #[test]
    fn test_union_prefers_bool_then_str() {
        let with_bool = TypeDesc::Union(vec![TypeDesc::Int, TypeDesc::Bool]);
        assert_eq!(resolve_base_type(&with_bool), BaseType::Bool);

        let with_str = TypeDesc::Union(vec![TypeDesc::Int, TypeDesc::Str]);
        assert_eq!(resolve_base_type(&with_str), BaseType::Str);

        let neither = TypeDesc::Union(vec![TypeDesc::Int, TypeDesc::Float]);
        assert_eq!(resolve_base_type(&neither), BaseType::Int);
    }

    #[test]
    fn test_union_of_only_absent_falls_back_to_str() {
        let ty = TypeDesc::Union(vec![TypeDesc::Absent]);
        assert_eq!(resolve_base_type(&ty), BaseType::Str);
    }

    #[test]
    fn test_literal_takes_type_of_first_value() {
        assert_eq!(
            resolve_base_type(&TypeDesc::Literal(vec![json!(1), json!(2)])),
            BaseType::Int
        );
        assert_eq!(
            resolve_base_type(&TypeDesc::Literal(vec![json!(1.5)])),
            BaseType::Float
        );
        assert_eq!(resolve_base_type(&TypeDesc::Literal(vec![])), BaseType::Str);
    }

    #[test]
    fn test_list_affects_multiplicity_not_base_type() {
        let ty = TypeDesc::List(Box::new(TypeDesc::Int));
        assert_eq!(resolve_base_type(&ty), BaseType::Int);
        assert!(resolve_multiple(&ty));

        let optional_list = TypeDesc::optional(TypeDesc::List(Box::new(TypeDesc::Str)));
        assert!(resolve_multiple(&optional_list));
    }

    #[test]
    fn test_choices_union_across_alternatives_deduplicates() {
        let ty = TypeDesc::Union(vec![
            TypeDesc::Literal(vec![json!("a"), json!("b")]),
            TypeDesc::Literal(vec![json!("b"), json!("c")]),
            TypeDesc::Absent,
        ]);
        assert_eq!(
            resolve_choices(&ty),
            vec![json!("a"), json!("b"), json!("c")]
        );
    }

    #[test]
    fn test_explicit_choices_override_derived_entirely() {
        let ty = TypeDesc::Literal(vec![json!("a"), json!("b")]);
        let resolved = resolve(&ty, Some(&[json!("x")]));
        assert_eq!(resolved.choices, vec![json!("x")]);
    }

    #[test]
    fn test_flag_forces_empty_choices_and_single_multiplicity() {
        let ty = TypeDesc::List(Box::new(TypeDesc::Bool));
        let resolved = resolve(&ty, Some(&[json!(true)]));
        assert!(resolved.is_flag);
        assert!(resolved.choices.is_empty());
        assert!(!resolved.multiple);
    }

    #[test]
    fn test_optional_bool_is_flag() {
        let ty = TypeDesc::optional(TypeDesc::Bool);
        assert!(resolve_is_flag(&ty));
    }

    #[test]
    fn test_underlying_record_unwraps_optional() {
        let record = RecordDesc::new("Opts").with_field(FieldDesc::new("a", TypeDesc::Str));
        let ty = TypeDesc::optional(TypeDesc::Record(record.clone()));
        assert_eq!(underlying_record(&ty), Some(&record));
        assert_eq!(resolve_base_type(&ty), BaseType::Structured);

        let list = TypeDesc::List(Box::new(TypeDesc::Record(record)));
        assert!(underlying_record(&list).is_none());
    }
}
