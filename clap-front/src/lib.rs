//! Clap front end materialized from a built [`Schema`].
//!
//! A schema is assembled once, at setup time, by the signature or reference
//! builders; this crate turns the finished value into a [`clap::Command`]
//! for actual flag parsing. Parse-stage errors — a missing required flag, a
//! value outside a closed choice set — surface as [`clap::Error`] and render
//! to the user unchanged.
//!
//! [`collect_values`] then produces the flat dest→value map the
//! reconstructor consumes: every argument is present, falling back to its
//! declared default and then to null, so unspecified optionals flow through
//! the call-reconstruction filter instead of overriding callable defaults.
//!
//! # Example
//!
//! ```
//! use callsig_core::{ParamSpec, Schema, Signature, TypeDesc};
//! use callsig_clap::parse_args;
//! use serde_json::json;
//!
//! let signature = Signature::new("quote")
//!     .with_param(ParamSpec::new("symbol", TypeDesc::Str))
//!     .with_param(ParamSpec::new("limit", TypeDesc::Int).with_default(json!(100)));
//! let schema = Schema::from_signature(&signature).unwrap();
//!
//! let values = parse_args(&schema, "quote", ["--symbol", "AAPL"]).unwrap();
//! assert_eq!(values.get("symbol"), Some(&json!("AAPL")));
//! assert_eq!(values.get("limit"), Some(&json!(100)));
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use thiserror::Error;

use callsig_core::{ArgumentSpec, BaseType, Schema};

/// Errors raised while parsing argv against a schema.
#[derive(Debug, Error)]
pub enum FrontendError {
    /// The underlying parser rejected the invocation (missing required
    /// flag, unknown flag, value outside a closed choice set).
    #[error(transparent)]
    Usage(#[from] clap::Error),
    /// A parsed token could not coerce into the argument's scalar type.
    #[error("argument {name:?} expected {expected} value, got {value:?}")]
    InvalidValue {
        /// Argument name.
        name: String,
        /// Expected scalar category.
        expected: &'static str,
        /// Offending token.
        value: String,
    },
}

/// Materializes a `clap::Command` from every group in the schema.
///
/// Each argument becomes `--<name>`: flags are presence-only
/// (`ArgAction::SetTrue`), multi-valued arguments append one-or-more
/// tokens, and closed choice sets become possible-value constraints.
/// Choice sets providers marked open are advisory and not enforced.
pub fn to_command(name: impl Into<String>, schema: &Schema) -> Command {
    let mut command = Command::new(name.into()).no_binary_name(true);
    for spec in schema.all_specs() {
        command = command.arg(to_arg(spec));
    }
    command
}

fn to_arg(spec: &ArgumentSpec) -> Arg {
    let mut arg = Arg::new(spec.dest.clone()).long(spec.name.clone());
    if let Some(help) = &spec.help {
        arg = arg.help(help.clone());
    }
    if spec.is_flag {
        return arg.action(ArgAction::SetTrue).required(spec.required);
    }
    if spec.multiple {
        arg = arg.action(ArgAction::Append).num_args(1..);
    }
    if !spec.choices.is_empty() && !spec.choices_open {
        let values: Vec<String> = spec.choices.iter().map(render_choice).collect();
        arg = arg.value_parser(PossibleValuesParser::new(values));
    }
    arg.required(spec.required)
}

fn render_choice(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Parses argv against the schema and returns the flat dest→value map.
pub fn parse_args<I, T>(
    schema: &Schema,
    command_name: &str,
    argv: I,
) -> Result<BTreeMap<String, Value>, FrontendError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = to_command(command_name.to_string(), schema).try_get_matches_from(argv)?;
    collect_values(schema, &matches)
}

/// Extracts one value per argument from parsed matches.
///
/// Absent arguments fall back to their declared default, then to null;
/// absent flags fall back to their default (typically `false` or null), so
/// an explicit default of `false` survives downstream filtering while an
/// unset optional does not.
pub fn collect_values(
    schema: &Schema,
    matches: &ArgMatches,
) -> Result<BTreeMap<String, Value>, FrontendError> {
    let mut values = BTreeMap::new();
    for spec in schema.all_specs() {
        let value = if spec.is_flag {
            if matches.get_flag(spec.dest.as_str()) {
                Value::Bool(true)
            } else {
                spec.default.clone().unwrap_or(Value::Null)
            }
        } else if spec.multiple {
            match matches.get_many::<String>(spec.dest.as_str()) {
                Some(items) => Value::Array(
                    items
                        .map(|item| coerce(spec, item))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                None => spec.default.clone().unwrap_or(Value::Null),
            }
        } else {
            match matches.get_one::<String>(spec.dest.as_str()) {
                Some(item) => coerce(spec, item)?,
                None => spec.default.clone().unwrap_or(Value::Null),
            }
        };
        values.insert(spec.dest.clone(), value);
    }
    Ok(values)
}

fn coerce(spec: &ArgumentSpec, raw: &str) -> Result<Value, FrontendError> {
    let invalid = |expected: &'static str| FrontendError::InvalidValue {
        name: spec.name.clone(),
        expected,
        value: raw.to_string(),
    };
    match spec.base_type {
        BaseType::Int => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("an integer")),
        BaseType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("a float")),
        BaseType::Bool => raw
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| invalid("a boolean")),
        BaseType::Str | BaseType::Structured => Ok(Value::String(raw.to_string())),
    }
}
