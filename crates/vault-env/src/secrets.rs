//! Secret-key classification
//!
//! Two independent signals mark a key as secret, either one sufficient:
//! a name heuristic (the key contains a well-known secret-ish substring) and
//! the explicit `!SYNCVAULT` marker at the end of a value. Secret status is
//! monotonic: once a key is in a mapping it is never auto-revoked, even if a
//! later edit drops the name pattern or the marker.

use std::collections::BTreeSet;

use crate::document::{EnvDocument, EnvLine};

/// Explicit per-line marker forcing a key secret, case-insensitive.
pub const SECRET_MARKER: &str = "!SYNCVAULT";

/// Key-name substrings that mark a key as likely secret.
const NAME_HINTS: &[&str] = &[
    "SECRET",
    "TOKEN",
    "PASSWORD",
    "PASS",
    "API_KEY",
    "PRIVATE_KEY",
    "KEY",
];

/// Heuristic name match: does the key name contain a secret-ish substring?
pub fn is_likely_secret_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    NAME_HINTS.iter().any(|hint| upper.contains(hint))
}

/// Strip a trailing `!SYNCVAULT` marker from a value body.
///
/// Returns the value without the marker (and without whitespace between the
/// value and the marker) and whether the marker was present. The check is
/// case-insensitive and also fires when the marker directly abuts the value
/// text (`secret!SYNCVAULT` yields `secret`).
pub fn strip_secret_marker(value: &str) -> (String, bool) {
    let trimmed = value.trim_end();
    if trimmed.len() < SECRET_MARKER.len() {
        return (value.to_string(), false);
    }

    let marker_start = trimmed.len() - SECRET_MARKER.len();
    if !trimmed.is_char_boundary(marker_start)
        || !trimmed[marker_start..].eq_ignore_ascii_case(SECRET_MARKER)
    {
        return (value.to_string(), false);
    }

    let without_marker = trimmed[..marker_start].trim_end();
    (without_marker.to_string(), true)
}

/// Whether a value body carries the explicit secret marker.
pub fn has_secret_marker(value: &str) -> bool {
    strip_secret_marker(value).1
}

/// Collect the keys of all key-value lines matched by `matcher`.
pub fn collect_secret_keys<F>(document: &EnvDocument, matcher: F) -> BTreeSet<String>
where
    F: Fn(&str, &str) -> bool,
{
    let mut keys = BTreeSet::new();
    for line in &document.lines {
        if let EnvLine::KeyValue { key, value, .. } = line
            && matcher(key, value)
        {
            keys.insert(key.clone());
        }
    }
    keys
}

/// Collect keys tagged with the explicit `!SYNCVAULT` marker.
pub fn collect_marker_keys(document: &EnvDocument) -> BTreeSet<String> {
    collect_secret_keys(document, |_, value| has_secret_marker(value))
}

/// Collect keys matching the name heuristic.
pub fn collect_heuristic_keys(document: &EnvDocument) -> BTreeSet<String> {
    collect_secret_keys(document, |key, _| is_likely_secret_key(key))
}

/// All key-value keys of the document, used as the first-time-import
/// fallback when no explicit selection is given and no signal fires.
pub fn collect_all_keys(document: &EnvDocument) -> BTreeSet<String> {
    document.keys().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("DB_PASSWORD", true)]
    #[case("API_TOKEN", true)]
    #[case("STRIPE_SECRET", true)]
    #[case("SSH_PRIVATE_KEY", true)]
    #[case("license_key", true)]
    #[case("PORT", false)]
    #[case("DB_HOST", false)]
    fn name_heuristic(#[case] key: &str, #[case] expected: bool) {
        assert_eq!(is_likely_secret_key(key), expected);
    }

    #[rstest]
    #[case("hunter2 !SYNCVAULT", "hunter2", true)]
    #[case("hunter2 !syncvault", "hunter2", true)]
    #[case("hunter2!SYNCVAULT", "hunter2", true)]
    #[case("hunter2 !SYNCVAULT  ", "hunter2", true)]
    #[case("!SYNCVAULT", "", true)]
    #[case("hunter2", "hunter2", false)]
    #[case("SYNCVAULT", "SYNCVAULT", false)]
    fn marker_stripping(#[case] input: &str, #[case] value: &str, #[case] present: bool) {
        let (stripped, has) = strip_secret_marker(input);
        assert_eq!(stripped, value);
        assert_eq!(has, present);
    }

    #[test]
    fn marker_keys_are_collected() {
        let doc = EnvDocument::parse("DB_PASSWORD=secret!SYNCVAULT\nPORT=8080\n");
        let keys = collect_marker_keys(&doc);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["DB_PASSWORD"]);
    }

    #[test]
    fn all_keys_fallback_covers_every_kv_line() {
        let doc = EnvDocument::parse("# config\nA=1\nB=2\nnot-a-line\n");
        let keys = collect_all_keys(&doc);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
