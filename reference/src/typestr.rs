//! Minimal grammar over string-encoded type annotations.
//!
//! Reference metadata carries types as strings (`"Optional[int]"`,
//! `"Literal['a','b']"`). This grammar reduces them to the same base
//! type / choices / multiplicity facts live type resolution produces.
//! It is deliberately lenient: an unrecognized token degrades to a plain
//! string type rather than failing, favoring availability over strictness
//! for malformed metadata.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use callsig_core::BaseType;

static OPTIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Optional\[(.*)\]$").expect("static regex must compile"));
static ANNOTATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Annotated\[(.*)\]$").expect("static regex must compile"));
static LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Literal\[(.*)\]$").expect("static regex must compile"));
static LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:List|list|Sequence)\[(.*)\]$").expect("static regex must compile")
});
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("static regex must compile"));

/// Outcome of parsing one type string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedType {
    /// Scalar category the values coerce into.
    pub base_type: BaseType,
    /// Choices extracted from a literal enumeration; empty otherwise.
    pub choices: Vec<Value>,
    /// The type denotes a list.
    pub multiple: bool,
}

impl Default for ParsedType {
    fn default() -> Self {
        Self {
            base_type: BaseType::Str,
            choices: Vec::new(),
            multiple: false,
        }
    }
}

/// Parses a string-encoded type annotation.
///
/// `Optional[...]` and `... | None` wrappers strip to their inner type.
/// `Literal[...]` yields a string base type with the quoted values as
/// choices. `Annotated[T, ...]` defers to `T`. List wrappers only set
/// multiplicity. A fixed set of primitive tokens maps to scalar types;
/// anything else is treated as a string.
///
/// # Examples
///
/// ```
/// use callsig_core::BaseType;
/// use callsig_reference::parse_type_string;
/// use serde_json::json;
///
/// let parsed = parse_type_string("Literal['a','b']");
/// assert_eq!(parsed.base_type, BaseType::Str);
/// assert_eq!(parsed.choices, vec![json!("a"), json!("b")]);
///
/// assert!(parse_type_string("Optional[List[int]]").multiple);
/// ```
pub fn parse_type_string(raw: &str) -> ParsedType {
    let text = raw.trim();
    if text.is_empty() {
        return ParsedType::default();
    }

    if let Some(inner) = strip_none_union(text) {
        return parse_type_string(inner);
    }
    if let Some(caps) = OPTIONAL_RE.captures(text) {
        return parse_type_string(&caps[1]);
    }
    if let Some(caps) = ANNOTATED_RE.captures(text) {
        return parse_type_string(first_top_level_segment(&caps[1]));
    }
    if let Some(caps) = LITERAL_RE.captures(text) {
        let choices = QUOTED_RE
            .captures_iter(&caps[1])
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| Value::String(m.as_str().to_string()))
            .collect();
        return ParsedType {
            base_type: BaseType::Str,
            choices,
            multiple: false,
        };
    }
    if let Some(caps) = LIST_RE.captures(text) {
        return ParsedType {
            multiple: true,
            ..parse_type_string(&caps[1])
        };
    }

    let base_type = match text {
        "str" => BaseType::Str,
        "int" => BaseType::Int,
        "float" => BaseType::Float,
        "bool" => BaseType::Bool,
        "date" | "datetime" | "time" => BaseType::Str,
        other => {
            debug!(token = other, "unrecognized type token, treating as string");
            BaseType::Str
        }
    };
    ParsedType {
        base_type,
        ..ParsedType::default()
    }
}

/// Strips a trailing `| None` union arm, if the text has one at top level.
fn strip_none_union(text: &str) -> Option<&str> {
    let trimmed = text.strip_suffix("None")?.trim_end().strip_suffix('|')?;
    Some(trimmed.trim_end())
}

/// The segment of `text` before the first comma outside any brackets.
fn first_top_level_segment(text: &str) -> &str {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return &text[..idx],
            _ => {}
        }
    }
    text
}
