//! Construction-time invariant checks for argument specs and schemas.
//!
//! A flag argument cannot declare a value shape, argument names are unique
//! across a whole schema, and every spec in the required group is actually
//! required. Violations are rejected when specs enter a schema, not
//! coerced and not deferred to parse time.

use std::collections::HashSet;

use crate::SchemaError;
use crate::schema::Schema;
use crate::types::ArgumentSpec;

/// Validates one argument spec's shape.
///
/// # Examples
///
/// ```
/// use callsig_core::{ArgumentSpec, validate_spec};
/// use serde_json::json;
///
/// assert!(validate_spec(&ArgumentSpec::flag("verbose")).is_ok());
///
/// let mut bad = ArgumentSpec::flag("verbose");
/// bad.choices.push(json!("yes"));
/// assert!(validate_spec(&bad).is_err());
/// ```
pub fn validate_spec(spec: &ArgumentSpec) -> Result<(), SchemaError> {
    if spec.is_flag {
        if !spec.choices.is_empty() {
            return Err(SchemaError::FlagWithChoices(spec.name.clone()));
        }
        if spec.multiple {
            return Err(SchemaError::FlagWithMultiple(spec.name.clone()));
        }
    }
    Ok(())
}

/// Validates a whole schema: spec shapes, cross-group name uniqueness, and
/// required-group requiredness.
pub fn validate_schema(schema: &Schema) -> Result<(), SchemaError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for spec in schema.all_specs() {
        validate_spec(spec)?;
        if !seen.insert(spec.name.as_str()) {
            return Err(SchemaError::NameCollision(spec.name.clone()));
        }
    }
    for spec in &schema.required.specs {
        if !spec.required {
            return Err(SchemaError::MisplacedOptional(spec.name.clone()));
        }
    }
    Ok(())
}
