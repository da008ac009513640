//! Core types and algorithms for compiling typed callable signatures into
//! CLI argument schemas.
//!
//! The pipeline:
//!
//! - [`TypeDesc`] — declarative description of a parameter's type (scalars,
//!   optional/union wrapping, literal enumerations, lists, nested records).
//! - [`resolve`] — reduces any nesting of those shapes to a [`BaseType`],
//!   a choice set, a multiplicity flag, and a boolean-flag flag.
//! - [`flatten_signature`] — expands structured parameters into namespaced
//!   `outer__field` arguments, recording a registry for reconstruction.
//! - [`Schema`] — owns the required/optional groups, merges provider
//!   argument groups with deterministic conflict resolution, and
//!   reconstructs call keyword arguments from parsed flag values.
//!
//! Schema construction is a pure function of its inputs and runs once per
//! callable at setup time; a built schema is immutable thereafter, so
//! concurrent reads are safe without locking.
//!
//! # Example
//!
//! ```
//! use callsig_core::*;
//! use serde_json::json;
//!
//! let signature = Signature::new("quote")
//!     .with_param(ParamSpec::new("symbol", TypeDesc::Str))
//!     .with_param(
//!         ParamSpec::new("provider", TypeDesc::Literal(vec![json!("fmp"), json!("yfinance")]))
//!             .with_default(json!("fmp")),
//!     );
//!
//! let mut schema = Schema::from_signature(&signature).unwrap();
//! assert!(schema.required.contains("symbol"));
//!
//! // Providers contribute their own arguments into the same namespace.
//! let group = ArgumentGroup::new("fmp")
//!     .with_spec(ArgumentSpec::with_value("interval", BaseType::Str));
//! schema.merge_provider_group(group).unwrap();
//! assert!(schema.find_spec("interval").is_some());
//! ```

mod error;
mod flatten;
mod help;
mod reconstruct;
mod resolve;
mod schema;
mod types;
mod validate;

pub use error::SchemaError;
pub use flatten::{FlattenedSignature, NESTED_SEPARATOR, StructuredParam, flatten_signature};
pub use help::{escape_percent, provider_list, with_providers};
pub use reconstruct::PROVIDER_PARAM;
pub use resolve::{
    ResolvedType, resolve, resolve_base_type, resolve_choices, resolve_is_flag, resolve_multiple,
};
pub use schema::{Schema, all_provider_arguments};
pub use types::*;
pub use validate::{validate_schema, validate_spec};
