//! Data model for callable signatures and CLI argument schemas.
//!
//! This module defines the types shared by every stage of the pipeline:
//! declarative type descriptions ([`TypeDesc`]), the parameters of a
//! callable ([`ParamSpec`], [`Signature`]), and the schema-side output
//! ([`ArgumentSpec`], [`ArgumentGroup`]). Everything derives [`serde`]
//! traits so a built schema can round-trip through JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SchemaError;
use crate::help::escape_percent;

/// Title of the group holding arguments with no default.
pub const REQUIRED_GROUP: &str = "required";

/// Title of the group holding arguments with a default.
pub const OPTIONAL_GROUP: &str = "optional";

/// Scalar category an argument's values parse into.
///
/// Date-like types are carried as strings on the command line, so they
/// resolve to [`BaseType::Str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BaseType {
    /// String value (the default).
    #[default]
    Str,
    /// Integer value.
    Int,
    /// Floating-point value.
    Float,
    /// Boolean value; arguments resolving here become presence-only flags.
    Bool,
    /// Nested record placeholder. Never present in a built schema: a
    /// structured parameter is flattened into its fields instead.
    Structured,
}

/// Declarative description of a parameter's type.
///
/// Covers the closed set of shapes a typed signature can declare: plain
/// scalars, a union (optionally including [`TypeDesc::Absent`] to model an
/// optional type), a literal enumeration, a list, and a nested record.
/// [`resolve`](crate::resolve::resolve) reduces any nesting of these to a
/// [`BaseType`] plus choice, multiplicity, and flag metadata.
///
/// # Examples
///
/// ```
/// use callsig_core::{BaseType, TypeDesc, resolve_base_type};
///
/// let optional_int = TypeDesc::optional(TypeDesc::Int);
/// assert_eq!(resolve_base_type(&optional_int), BaseType::Int);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDesc {
    /// String scalar.
    Str,
    /// Integer scalar.
    Int,
    /// Floating-point scalar.
    Float,
    /// Boolean scalar.
    Bool,
    /// Date-like scalar, carried as a string.
    Date,
    /// The "no value" alternative inside a [`TypeDesc::Union`].
    Absent,
    /// Enumeration of concrete scalar values.
    Literal(Vec<Value>),
    /// One-or-more values of the inner type.
    List(Box<TypeDesc>),
    /// Union of alternatives.
    Union(Vec<TypeDesc>),
    /// Nested record with named fields.
    Record(RecordDesc),
}

impl TypeDesc {
    /// Convenience for `Union([ty, Absent])`.
    pub fn optional(ty: TypeDesc) -> Self {
        TypeDesc::Union(vec![ty, TypeDesc::Absent])
    }
}

/// Field list and name of a nested record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDesc {
    /// Record type name (e.g. the struct it materializes).
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDesc>,
}

impl RecordDesc {
    /// Creates an empty record description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldDesc) -> Self {
        self.fields.push(field);
        self
    }

    /// Materializes a record value from supplied field values.
    ///
    /// Supplied non-null values are overlaid on the fields' declared
    /// defaults. A field with neither a supplied value nor a default is a
    /// [`SchemaError::MissingRecordField`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use callsig_core::{FieldDesc, RecordDesc, TypeDesc};
    /// use serde_json::json;
    ///
    /// let record = RecordDesc::new("CustomData")
    ///     .with_field(FieldDesc::new("field1", TypeDesc::Str))
    ///     .with_field(FieldDesc::new("field2", TypeDesc::Int).with_default(json!(10)));
    ///
    /// let mut supplied = BTreeMap::new();
    /// supplied.insert("field1".to_string(), json!("x"));
    /// let value = record.construct(&supplied).unwrap();
    /// assert_eq!(value, json!({"field1": "x", "field2": 10}));
    /// ```
    pub fn construct(
        &self,
        supplied: &std::collections::BTreeMap<String, Value>,
    ) -> Result<Value, SchemaError> {
        let mut out = serde_json::Map::new();
        for field in &self.fields {
            let value = match supplied.get(&field.name).filter(|v| !v.is_null()) {
                Some(value) => value.clone(),
                None => match &field.default {
                    Some(default) => default.clone(),
                    None => {
                        return Err(SchemaError::MissingRecordField(
                            self.name.clone(),
                            field.name.clone(),
                        ));
                    }
                },
            };
            out.insert(field.name.clone(), value);
        }
        Ok(Value::Object(out))
    }
}

/// One field of a [`RecordDesc`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDesc {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: TypeDesc,
    /// Default value; `None` means the field is required.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_default"
    )]
    pub default: Option<Value>,
    /// Help text inherited by the flattened argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldDesc {
    /// Creates a required field with no help text.
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            help: None,
        }
    }

    /// Adds a default value, making the field optional.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }
}

/// One parameter of a callable's typed signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub ty: TypeDesc,
    /// Default value; `None` means the parameter is required. An explicit
    /// null default (`Some(Value::Null)`) still counts as a default.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_default"
    )]
    pub default: Option<Value>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Explicit choice-set annotation. When present it replaces any choices
    /// derived from the type, it is not merged with them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
}

impl ParamSpec {
    /// Creates a required parameter.
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            help: None,
            choices: None,
        }
    }

    /// Adds a default value, making the parameter optional.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the explicit choice-set annotation.
    pub fn with_choices<I: IntoIterator<Item = Value>>(mut self, choices: I) -> Self {
        let mut values = Vec::new();
        for value in choices {
            if !values.contains(&value) {
                values.push(value);
            }
        }
        self.choices = Some(values);
        self
    }
}

/// A callable's name and ordered parameter list.
///
/// # Examples
///
/// ```
/// use callsig_core::{ParamSpec, Signature, TypeDesc};
/// use serde_json::json;
///
/// let signature = Signature::new("quote")
///     .with_param(ParamSpec::new("symbol", TypeDesc::Str))
///     .with_param(ParamSpec::new("limit", TypeDesc::Int).with_default(json!(100)));
///
/// assert_eq!(signature.param_names(), vec!["symbol", "limit"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Callable name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<ParamSpec>,
}

impl Signature {
    /// Creates an empty signature.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

/// One logical CLI flag's full metadata.
///
/// Use [`with_value`](ArgumentSpec::with_value) or
/// [`flag`](ArgumentSpec::flag) to create specs, then chain builder methods.
/// Specs created by [`flag`](ArgumentSpec::flag) carry no choices and accept
/// no value token; presence alone conveys `true`.
///
/// # Examples
///
/// ```
/// use callsig_core::{ArgumentSpec, BaseType};
/// use serde_json::json;
///
/// let interval = ArgumentSpec::with_value("interval", BaseType::Str)
///     .with_choices([json!("1min"), json!("5min")])
///     .with_help("Interval");
/// assert_eq!(interval.choices.len(), 2);
/// assert!(!interval.required);
///
/// let verbose = ArgumentSpec::flag("verbose");
/// assert!(verbose.is_flag);
/// assert!(verbose.choices.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    /// Flag identifier, unique within a whole schema. Exposed as `--<name>`.
    pub name: String,
    /// Scalar category values coerce into.
    pub base_type: BaseType,
    /// Storage key; equals `name`, including for arguments flattened out of
    /// a structured parameter.
    pub dest: String,
    /// Default value; `None` means the original parameter had no default.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_default"
    )]
    pub default: Option<Value>,
    /// True iff the original parameter had no default.
    pub required: bool,
    /// Accepts one-or-more value tokens.
    pub multiple: bool,
    /// Ordered-unique allowed values; empty means unconstrained.
    pub choices: Vec<Value>,
    /// Help text, percent-escaped at attach time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Presence-only boolean flag; consumes no value token.
    pub is_flag: bool,
    /// Providers extended a previously unconstrained choice set, so the set
    /// is advisory rather than closed and must not be enforced at parse time.
    #[serde(default)]
    pub choices_open: bool,
}

impl ArgumentSpec {
    /// Creates an optional value-taking argument.
    pub fn with_value(name: &str, base_type: BaseType) -> Self {
        Self {
            name: name.to_string(),
            base_type,
            dest: name.to_string(),
            default: None,
            required: false,
            multiple: false,
            choices: Vec::new(),
            help: None,
            is_flag: false,
            choices_open: false,
        }
    }

    /// Creates a presence-only boolean flag.
    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_type: BaseType::Bool,
            dest: name.to_string(),
            default: None,
            required: false,
            multiple: false,
            choices: Vec::new(),
            help: None,
            is_flag: true,
            choices_open: false,
        }
    }

    /// Marks the argument as required.
    pub fn require(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds a default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attaches help text, escaping literal `%` for the help formatter.
    /// Escaping happens here, once, never at render time.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(escape_percent(help));
        self
    }

    /// Sets the choice set, deduplicating while preserving order.
    pub fn with_choices<I: IntoIterator<Item = Value>>(mut self, choices: I) -> Self {
        self.choices.clear();
        union_values(&mut self.choices, choices);
        self
    }

    /// Marks the argument as accepting multiple values.
    pub fn multi(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// An ordered collection of argument specs under one title.
///
/// Titles are [`REQUIRED_GROUP`], [`OPTIONAL_GROUP`], or a provider name.
/// Within a built [`Schema`](crate::Schema) a given argument name lives in
/// exactly one group at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentGroup {
    /// Group title.
    pub title: String,
    /// Specs in insertion order.
    pub specs: Vec<ArgumentSpec>,
}

impl ArgumentGroup {
    /// Creates an empty group.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            specs: Vec::new(),
        }
    }

    /// Appends a spec.
    pub fn with_spec(mut self, spec: ArgumentSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Finds a spec by name.
    pub fn find(&self, name: &str) -> Option<&ArgumentSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Finds a spec by name, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut ArgumentSpec> {
        self.specs.iter_mut().find(|spec| spec.name == name)
    }

    /// Whether a spec with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Removes and returns the spec with this name, if present.
    pub fn remove(&mut self, name: &str) -> Option<ArgumentSpec> {
        let index = self.specs.iter().position(|spec| spec.name == name)?;
        Some(self.specs.remove(index))
    }

    /// Number of specs in the group.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Deserializes a default field that is present in the JSON, wrapping even
/// an explicit `null` in `Some`. Absent fields take the serde default
/// (`None`), so "no default" and "explicit null default" stay distinct
/// across a round trip.
fn explicit_default<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Appends each value not already present, preserving insertion order.
pub(crate) fn union_values<I: IntoIterator<Item = Value>>(into: &mut Vec<Value>, from: I) {
    for value in from {
        if !into.contains(&value) {
            into.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_record_construct_fills_defaults() {
        let record = RecordDesc::new("CustomData")
            .with_field(FieldDesc::new("field1", TypeDesc::Str))
            .with_field(FieldDesc::new("field2", TypeDesc::Int).with_default(json!(10)));

        let mut supplied = BTreeMap::new();
        supplied.insert("field1".to_string(), json!("x"));

        let value = record.construct(&supplied).unwrap();
        assert_eq!(value, json!({"field1": "x", "field2": 10}));
    }

    #[test]
    fn test_record_construct_rejects_missing_required_field() {
        let record = RecordDesc::new("CustomData").with_field(FieldDesc::new("field1", TypeDesc::Str));

        let err = record.construct(&BTreeMap::new()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingRecordField("CustomData".to_string(), "field1".to_string())
        );
    }

    #[test]
    fn test_record_construct_ignores_null_supplied_values() {
        let record = RecordDesc::new("Opts")
            .with_field(FieldDesc::new("limit", TypeDesc::Int).with_default(json!(5)));

        let mut supplied = BTreeMap::new();
        supplied.insert("limit".to_string(), Value::Null);

        let value = record.construct(&supplied).unwrap();
        assert_eq!(value, json!({"limit": 5}));
    }

    #[test]
    fn test_with_choices_deduplicates_preserving_order() {
        let spec = ArgumentSpec::with_value("interval", BaseType::Str)
            .with_choices([json!("1min"), json!("5min"), json!("1min")]);
        assert_eq!(spec.choices, vec![json!("1min"), json!("5min")]);
    }

    #[test]
    fn test_with_help_escapes_percent_once() {
        let spec = ArgumentSpec::with_value("change", BaseType::Float).with_help("Change in %");
        assert_eq!(spec.help.as_deref(), Some("Change in %%"));
    }

    #[test]
    fn test_explicit_null_default_survives_json_round_trip() {
        let spec =
            ArgumentSpec::with_value("start_date", BaseType::Str).with_default(Value::Null);
        let encoded = serde_json::to_string(&spec).unwrap();
        let decoded: ArgumentSpec = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.default, Some(Value::Null));
        assert_eq!(decoded, spec);

        let no_default = ArgumentSpec::with_value("symbol", BaseType::Str);
        let encoded = serde_json::to_string(&no_default).unwrap();
        let decoded: ArgumentSpec = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.default, None);
    }

    #[test]
    fn test_group_remove_returns_spec() {
        let mut group = ArgumentGroup::new("p1")
            .with_spec(ArgumentSpec::with_value("interval", BaseType::Str));

        let removed = group.remove("interval").unwrap();
        assert_eq!(removed.name, "interval");
        assert!(group.is_empty());
        assert!(group.remove("interval").is_none());
    }
}
