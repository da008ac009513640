//! Call reconstruction from parsed flag values.
//!
//! Inverts flattening over the flat dest→value map a parser produces:
//! flattened keys regroup under their structured parameter, each registry
//! record is materialized deepest-first, and the final keyword set is
//! filtered down to what the target callable and the active provider
//! actually accept.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::SchemaError;
use crate::flatten::{NESTED_SEPARATOR, StructuredParam};
use crate::schema::{Schema, all_provider_arguments};

/// Parsed key whose value selects the active provider.
pub const PROVIDER_PARAM: &str = "provider";

impl Schema {
    /// Rebuilds call keyword arguments from parsed flag values.
    ///
    /// Keys containing the separator regroup under their structured
    /// parameter and each registered record is constructed deepest-first,
    /// so nested records rebuild from the leaves up. The result then keeps
    /// only keys that name a callable parameter or fall inside the active
    /// provider's contributed names, and only values that are truthy or
    /// exactly `false` — unset optionals never override the callable's own
    /// defaults, while an explicit `false` still does.
    ///
    /// Missing optional values are omitted silently, never an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use callsig_core::{ParamSpec, Schema, Signature, TypeDesc};
    /// use serde_json::{Value, json};
    ///
    /// let signature = Signature::new("quote")
    ///     .with_param(ParamSpec::new("symbol", TypeDesc::Str))
    ///     .with_param(
    ///         ParamSpec::new("start_date", TypeDesc::optional(TypeDesc::Date))
    ///             .with_default(Value::Null),
    ///     );
    /// let schema = Schema::from_signature(&signature).unwrap();
    ///
    /// let mut parsed = BTreeMap::new();
    /// parsed.insert("symbol".to_string(), json!("AAPL"));
    /// parsed.insert("start_date".to_string(), Value::Null);
    ///
    /// let call = schema.reconstruct_call(&parsed).unwrap();
    /// assert_eq!(call.get("symbol"), Some(&json!("AAPL")));
    /// assert!(!call.contains_key("start_date"));
    /// ```
    pub fn reconstruct_call(
        &self,
        parsed: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, SchemaError> {
        let mut working = parsed.clone();

        let mut registry: Vec<&StructuredParam> = self.structured.iter().collect();
        registry.sort_by_key(|entry| std::cmp::Reverse(depth_of(&entry.path)));

        for entry in registry {
            let prefix = format!("{}{NESTED_SEPARATOR}", entry.path);
            let field_keys: Vec<String> = working
                .keys()
                .filter(|key| {
                    key.starts_with(&prefix) && !key[prefix.len()..].contains(NESTED_SEPARATOR)
                })
                .cloned()
                .collect();

            let mut fields = BTreeMap::new();
            for key in field_keys {
                if let Some(value) = working.remove(&key) {
                    fields.insert(key[prefix.len()..].to_string(), value);
                }
            }

            let record_value = entry.record.construct(&fields)?;
            working.insert(entry.path.clone(), record_value);
        }

        let allowed = self.provider_scope(&working);
        working.retain(|key, value| {
            let known = self.callable_params.iter().any(|param| param == key)
                || allowed.iter().any(|name| name == key);
            known && (is_truthy(value) || *value == Value::Bool(false))
        });
        Ok(working)
    }

    /// Argument names the parsed values may carry for the selected provider.
    ///
    /// When the parsed `provider` value names a known provider, only that
    /// provider's contributed names apply; otherwise every provider's
    /// contributions do.
    fn provider_scope(&self, values: &BTreeMap<String, Value>) -> Vec<String> {
        if let Some(Value::String(selected)) = values.get(PROVIDER_PARAM) {
            if let Some(names) = self.provider_index.get(selected) {
                return names.clone();
            }
        }
        all_provider_arguments(&self.provider_index)
    }
}

/// Unset and empty values are treated as "not provided".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn depth_of(path: &str) -> usize {
    path.matches(NESTED_SEPARATOR).count()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{
        ArgumentGroup, ArgumentSpec, BaseType, FieldDesc, ParamSpec, RecordDesc, Signature,
        TypeDesc,
    };

    fn parsed(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_reconstruct_builds_nested_records_deepest_first() {
        let inner = RecordDesc::new("Inner")
            .with_field(FieldDesc::new("x", TypeDesc::Int))
            .with_field(FieldDesc::new("y", TypeDesc::Str).with_default(json!("left")));
        let outer = RecordDesc::new("Outer")
            .with_field(FieldDesc::new("inner", TypeDesc::Record(inner)))
            .with_field(FieldDesc::new("label", TypeDesc::Str).with_default(json!("none")));
        let signature =
            Signature::new("draw").with_param(ParamSpec::new("shape", TypeDesc::Record(outer)));
        let schema = Schema::from_signature(&signature).unwrap();

        let call = schema
            .reconstruct_call(&parsed(&[
                ("shape__inner__x", json!(3)),
                ("shape__inner__y", Value::Null),
                ("shape__label", json!("box")),
            ]))
            .unwrap();

        assert_eq!(
            call.get("shape"),
            Some(&json!({"inner": {"x": 3, "y": "left"}, "label": "box"}))
        );
    }

    #[test]
    fn test_reconstruct_drops_untruthy_values_but_keeps_explicit_false() {
        let signature = Signature::new("g")
            .with_param(ParamSpec::new("adjusted", TypeDesc::Bool).with_default(json!(false)))
            .with_param(
                ParamSpec::new("extended_hours", TypeDesc::optional(TypeDesc::Bool))
                    .with_default(Value::Null),
            )
            .with_param(ParamSpec::new("note", TypeDesc::Str).with_default(json!("")));
        let schema = Schema::from_signature(&signature).unwrap();

        let call = schema
            .reconstruct_call(&parsed(&[
                ("adjusted", json!(false)),
                ("extended_hours", Value::Null),
                ("note", json!("")),
            ]))
            .unwrap();

        assert_eq!(call.get("adjusted"), Some(&json!(false)));
        assert!(!call.contains_key("extended_hours"));
        assert!(!call.contains_key("note"));
    }

    #[test]
    fn test_reconstruct_scopes_values_to_selected_provider() {
        let signature = Signature::new("quote")
            .with_param(ParamSpec::new("symbol", TypeDesc::Str))
            .with_param(
                ParamSpec::new("provider", TypeDesc::Literal(vec![json!("p1"), json!("p2")]))
                    .with_default(json!("p1")),
            );
        let mut schema = Schema::from_signature(&signature).unwrap();
        schema
            .merge_provider_group(
                ArgumentGroup::new("p1")
                    .with_spec(ArgumentSpec::with_value("interval", BaseType::Str)),
            )
            .unwrap();
        schema
            .merge_provider_group(
                ArgumentGroup::new("p2").with_spec(ArgumentSpec::with_value("span", BaseType::Str)),
            )
            .unwrap();

        let call = schema
            .reconstruct_call(&parsed(&[
                ("symbol", json!("AAPL")),
                ("provider", json!("p1")),
                ("interval", json!("5min")),
                ("span", json!("1d")),
            ]))
            .unwrap();

        assert_eq!(call.get("interval"), Some(&json!("5min")));
        assert!(!call.contains_key("span"));

        // With no provider selected, every provider's names apply.
        let call = schema
            .reconstruct_call(&parsed(&[
                ("symbol", json!("AAPL")),
                ("interval", json!("5min")),
                ("span", json!("1d")),
            ]))
            .unwrap();
        assert!(call.contains_key("interval"));
        assert!(call.contains_key("span"));
    }

    #[test]
    fn test_reconstruct_drops_unknown_keys() {
        let signature = Signature::new("f").with_param(ParamSpec::new("symbol", TypeDesc::Str));
        let schema = Schema::from_signature(&signature).unwrap();

        let call = schema
            .reconstruct_call(&parsed(&[
                ("symbol", json!("AAPL")),
                ("stray", json!("value")),
            ]))
            .unwrap();

        assert!(call.contains_key("symbol"));
        assert!(!call.contains_key("stray"));
    }
}
