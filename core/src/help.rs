//! Help-text conventions: percent escaping and the provider parenthetical.

use std::sync::LazyLock;

use regex::Regex;

static PROVIDER_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(provider:\s*(.*?)\)").expect("static regex must compile"));

/// Escapes literal `%` as `%%` for the help formatter.
///
/// Already-escaped pairs pass through unchanged, so applying this twice
/// (for example when provider merges re-attach help text) never produces
/// `%%%%`.
///
/// # Examples
///
/// ```
/// use callsig_core::escape_percent;
///
/// assert_eq!(escape_percent("50% of value"), "50%% of value");
/// assert_eq!(escape_percent("50%% of value"), "50%% of value");
/// ```
pub fn escape_percent(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '%' {
            if chars.peek() == Some(&'%') {
                chars.next();
            }
            out.push_str("%%");
        } else {
            out.push(ch);
        }
    }
    out
}

/// Provider names listed in a help string's `(provider: ...)` parenthetical.
///
/// Returns an empty list when no parenthetical is present.
pub fn provider_list(help: &str) -> Vec<String> {
    PROVIDER_LIST_RE
        .captures(help)
        .map(|caps| {
            caps[1]
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Re-renders help text with a provider parenthetical naming the providers
/// already listed plus `add`, in order, deduplicated.
///
/// Any pre-existing parenthetical is parsed and replaced rather than
/// stacked, so repeated extension stays a single `(provider: ...)` suffix.
///
/// # Examples
///
/// ```
/// use callsig_core::with_providers;
///
/// let once = with_providers(Some("Interval"), &["p1".to_string()]);
/// assert_eq!(once, "Interval (provider: p1)");
///
/// let twice = with_providers(Some(&once), &["p2".to_string()]);
/// assert_eq!(twice, "Interval (provider: p1, p2)");
/// ```
pub fn with_providers(help: Option<&str>, add: &[String]) -> String {
    let help = help.unwrap_or("");
    let mut providers = provider_list(help);
    for name in add {
        if !providers.iter().any(|existing| existing == name) {
            providers.push(name.clone());
        }
    }

    // Removing a mid-string parenthetical leaves its surrounding spaces
    // behind, so re-join on single spaces.
    let base: String = PROVIDER_LIST_RE
        .replace(help, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if providers.is_empty() {
        return base;
    }
    let rendered = format!("(provider: {})", providers.join(", "));
    if base.is_empty() {
        rendered
    } else {
        format!("{base} {rendered}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_percent_is_idempotent() {
        let once = escape_percent("gain of 5% (max 10%)");
        let twice = escape_percent(&once);
        assert_eq!(once, "gain of 5%% (max 10%%)");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_escape_percent_handles_trailing_percent() {
        assert_eq!(escape_percent("100%"), "100%%");
    }

    #[test]
    fn test_provider_list_parses_names() {
        assert_eq!(
            provider_list("Interval (provider: p1, p2)"),
            vec!["p1".to_string(), "p2".to_string()]
        );
        assert!(provider_list("Interval").is_empty());
    }

    #[test]
    fn test_with_providers_replaces_existing_parenthetical() {
        let extended = with_providers(
            Some("Interval (provider: p1)"),
            &["p2".to_string(), "p1".to_string()],
        );
        assert_eq!(extended, "Interval (provider: p1, p2)");
    }

    #[test]
    fn test_with_providers_removes_mid_string_parenthetical_cleanly() {
        let extended = with_providers(
            Some("Interval (provider: p1) in minutes"),
            &["p2".to_string()],
        );
        assert_eq!(extended, "Interval in minutes (provider: p1, p2)");
    }

    #[test]
    fn test_with_providers_without_base_help() {
        assert_eq!(with_providers(None, &["p1".to_string()]), "(provider: p1)");
    }
}
