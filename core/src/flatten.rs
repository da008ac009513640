//! Signature flattening: expands structured parameters into namespaced
//! scalar arguments.
//!
//! A parameter whose type resolves to a record is not emitted itself.
//! Each of its fields becomes a synthetic `outer__field` parameter, and the
//! algorithm recurses, so arbitrarily nested records flatten to one scalar
//! argument per leaf field. The record itself is remembered in a registry
//! so [`Schema::reconstruct_call`](crate::Schema::reconstruct_call) can
//! rebuild it later.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::SchemaError;
use crate::resolve::{resolve, resolve_base_type, underlying_record};
use crate::types::{ArgumentSpec, BaseType, ParamSpec, Signature};

/// Separator between a structured parameter and its field names.
///
/// Top-level parameter names and record field names must not contain it;
/// that is validated at build time, which makes flattening purely additive
/// to the namespace.
pub const NESTED_SEPARATOR: &str = "__";

/// Registry entry for one discovered structured parameter.
///
/// Created when the parameter is discovered, consumed once at schema-build
/// time and once at call-reconstruction time, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredParam {
    /// Flattened path of the parameter (e.g. `data` or `data__inner`).
    pub path: String,
    /// The record to reconstruct at this path.
    pub record: crate::types::RecordDesc,
}

/// Output of flattening one signature.
#[derive(Debug, Clone, Default)]
pub struct FlattenedSignature {
    /// Leaf argument specs in declaration order.
    pub specs: Vec<ArgumentSpec>,
    /// Structured parameters discovered along the way.
    pub structured: Vec<StructuredParam>,
}

/// Flattens a signature's parameters into leaf argument specs.
///
/// Structured parameters expand recursively into `outer__field` synthetic
/// parameters inheriting the field's type, default, and help text. A
/// top-level name or record field name containing the separator, or a
/// duplicate flattened name, is a build-time error.
///
/// # Examples
///
/// ```
/// use callsig_core::{FieldDesc, ParamSpec, RecordDesc, Signature, TypeDesc, flatten_signature};
/// use serde_json::json;
///
/// let record = RecordDesc::new("CustomData")
///     .with_field(FieldDesc::new("field1", TypeDesc::Str))
///     .with_field(FieldDesc::new("field2", TypeDesc::Int).with_default(json!(10)));
/// let signature = Signature::new("h")
///     .with_param(ParamSpec::new("data", TypeDesc::Record(record)));
///
/// let flattened = flatten_signature(&signature).unwrap();
/// let names: Vec<&str> = flattened.specs.iter().map(|s| s.name.as_str()).collect();
/// assert_eq!(names, vec!["data__field1", "data__field2"]);
/// ```
pub fn flatten_signature(signature: &Signature) -> Result<FlattenedSignature, SchemaError> {
    for param in &signature.params {
        if param.name.contains(NESTED_SEPARATOR) {
            return Err(SchemaError::SeparatorInName(param.name.clone()));
        }
    }

    let mut flattened = FlattenedSignature::default();
    for param in &signature.params {
        flatten_param(param, &mut flattened)?;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for spec in &flattened.specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(SchemaError::NameCollision(spec.name.clone()));
        }
    }

    Ok(flattened)
}

fn flatten_param(param: &ParamSpec, out: &mut FlattenedSignature) -> Result<(), SchemaError> {
    if resolve_base_type(&param.ty) == BaseType::Structured {
        let Some(record) = underlying_record(&param.ty) else {
            return Err(SchemaError::UnsupportedStructured(param.name.clone()));
        };
        out.structured.push(StructuredParam {
            path: param.name.clone(),
            record: record.clone(),
        });
        for field in &record.fields {
            // Field names join the namespace with the separator, so they
            // must not contain it themselves or reconstruction could never
            // regroup the flattened key under this record.
            if field.name.contains(NESTED_SEPARATOR) {
                return Err(SchemaError::SeparatorInName(field.name.clone()));
            }
            let synthetic = ParamSpec {
                name: format!("{}{NESTED_SEPARATOR}{}", param.name, field.name),
                ty: field.ty.clone(),
                default: field.default.clone(),
                help: field.help.clone(),
                choices: None,
            };
            flatten_param(&synthetic, out)?;
        }
        return Ok(());
    }

    let resolved = resolve(&param.ty, param.choices.as_deref());
    let mut spec = ArgumentSpec {
        name: param.name.clone(),
        base_type: resolved.base_type,
        dest: param.name.clone(),
        default: param.default.clone(),
        required: param.default.is_none(),
        multiple: resolved.multiple,
        choices: resolved.choices,
        help: None,
        is_flag: resolved.is_flag,
        choices_open: false,
    };
    if let Some(help) = &param.help {
        spec = spec.with_help(help);
    }
    out.specs.push(spec);
    Ok(())
}
