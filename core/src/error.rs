//! Build-time and reconstruction errors.

use thiserror::Error;

/// Errors raised while building a schema or reconstructing a call.
///
/// Construction-time violations (a flag declaring a value shape, a name
/// collision) are rejected immediately and never silently coerced.
/// Parse-stage errors (missing required flag, value outside a closed choice
/// set) belong to the flag-parsing front end, not to this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A top-level parameter name contains the reserved `__` separator, so
    /// flattened names could collide with it.
    #[error("parameter name {0:?} contains the reserved separator \"__\"")]
    SeparatorInName(String),
    /// Two arguments in the same schema share a name.
    #[error("argument name {0:?} is declared more than once")]
    NameCollision(String),
    /// A flag argument declared a choice set.
    #[error("flag argument {0:?} cannot declare choices")]
    FlagWithChoices(String),
    /// A flag argument declared itself multi-valued.
    #[error("flag argument {0:?} cannot accept multiple values")]
    FlagWithMultiple(String),
    /// A parameter resolved to a structured base type that cannot be
    /// flattened into fields (e.g. a list of records).
    #[error("structured parameter {0:?} cannot be flattened into fields")]
    UnsupportedStructured(String),
    /// A structured parameter field had neither a parsed value nor a default
    /// at reconstruction time.
    #[error("structured parameter {0:?} is missing required field {1:?}")]
    MissingRecordField(String, String),
    /// An argument without `required` set was found in the required group.
    #[error("argument {0:?} in the required group is not required")]
    MisplacedOptional(String),
}
