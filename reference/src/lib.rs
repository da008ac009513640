//! Builds argument groups from a declarative reference dictionary.
//!
//! Some routes have no live callable signature to introspect; their
//! argument metadata arrives as a dictionary keyed by route, then provider,
//! then an ordered list of field descriptors with string-encoded types.
//! This crate parses that dictionary into the same
//! [`ArgumentGroup`]/[`ArgumentSpec`] shapes the signature-based builder
//! produces, so reference-built groups merge through
//! [`Schema::merge_provider_group`](callsig_core::Schema::merge_provider_group)
//! without special-casing.
//!
//! # Example
//!
//! ```
//! use callsig_reference::{build_route_groups, parse_reference};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "equity.price.historical": {
//!         "parameters": {
//!             "fmp": [
//!                 {"name": "interval", "type": "Literal['1min','5min']",
//!                  "description": "Interval", "optional": true, "standard": false},
//!             ],
//!         },
//!     },
//! });
//!
//! let reference = parse_reference(&raw).unwrap();
//! let route = reference.get("equity.price.historical").unwrap();
//! let groups = build_route_groups(route);
//! assert_eq!(groups[0].title, "fmp");
//! assert_eq!(groups[0].specs[0].choices.len(), 2);
//! ```

mod typestr;

pub use typestr::{ParsedType, parse_type_string};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use callsig_core::{ArgumentGroup, ArgumentSpec, BaseType};

/// Errors raised while reading a reference dictionary.
///
/// Note that an unparseable *type string* is not an error: the grammar
/// degrades it to a plain string type. Only a structurally malformed
/// dictionary or an unknown route fails.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The dictionary does not match the expected shape.
    #[error("reference dictionary is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The requested route is not present.
    #[error("route {0:?} not found in reference dictionary")]
    UnknownRoute(String),
}

/// One field descriptor as serialized in the reference dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReference {
    /// Argument name.
    pub name: String,
    /// String-encoded type annotation.
    #[serde(rename = "type", default)]
    pub type_string: String,
    /// Help text.
    #[serde(default)]
    pub description: Option<String>,
    /// Default value.
    #[serde(default)]
    pub default: Option<Value>,
    /// Whether the argument may be omitted.
    #[serde(default)]
    pub optional: bool,
    /// Standard fields are shared across providers and excluded from
    /// provider-specific groups.
    #[serde(default)]
    pub standard: bool,
    /// Explicit choice set; overrides anything the type string derives.
    #[serde(default)]
    pub choices: Option<Vec<Value>>,
}

/// One route's provider-keyed parameter lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RouteReference {
    /// Field descriptors per provider name.
    #[serde(default)]
    pub parameters: BTreeMap<String, Vec<FieldReference>>,
}

/// Full reference dictionary, keyed by route.
pub type ReferenceMap = BTreeMap<String, RouteReference>;

/// Deserializes a raw JSON reference dictionary.
pub fn parse_reference(raw: &Value) -> Result<ReferenceMap, ReferenceError> {
    Ok(serde_json::from_value(raw.clone())?)
}

/// Builds the provider groups for one route of the dictionary.
pub fn groups_for_route(
    reference: &ReferenceMap,
    route: &str,
) -> Result<Vec<ArgumentGroup>, ReferenceError> {
    let entry = reference
        .get(route)
        .ok_or_else(|| ReferenceError::UnknownRoute(route.to_string()))?;
    Ok(build_route_groups(entry))
}

/// Builds one argument group per provider from a route's descriptors.
///
/// Standard descriptors are skipped. Providers iterate in key order, so
/// repeated builds produce the same group sequence.
pub fn build_route_groups(route: &RouteReference) -> Vec<ArgumentGroup> {
    route
        .parameters
        .iter()
        .map(|(provider, fields)| {
            let mut group = ArgumentGroup::new(provider.clone());
            for field in fields {
                if field.standard {
                    continue;
                }
                group.specs.push(spec_from_field(field));
            }
            group
        })
        .collect()
}

fn spec_from_field(field: &FieldReference) -> ArgumentSpec {
    let parsed = parse_type_string(&field.type_string);

    let mut spec = if parsed.base_type == BaseType::Bool {
        ArgumentSpec::flag(&field.name)
    } else {
        let mut spec = ArgumentSpec::with_value(&field.name, parsed.base_type);
        let choices = field.choices.clone().unwrap_or(parsed.choices);
        spec = spec.with_choices(choices);
        if parsed.multiple {
            spec = spec.multi();
        }
        spec
    };

    if !field.optional {
        spec = spec.require();
    }
    spec.default = field.default.clone();
    if let Some(description) = &field.description {
        spec = spec.with_help(description);
    }
    spec
}
