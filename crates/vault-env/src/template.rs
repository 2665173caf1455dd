//! Template rendering and hydration
//!
//! Rendering replaces secret value bodies with `{{SYNCVAULT:KEY}}`
//! placeholders and extracts the real values. Hydration is the inverse and
//! is deliberately pure text replacement, not document-model-aware: the
//! remote side reconstructs a file from template plus blob without needing
//! to re-parse the grammar.

use std::collections::{BTreeMap, BTreeSet};

use crate::document::{EnvDocument, EnvLine};
use crate::secrets::strip_secret_marker;

/// Extracted secret values, key to trimmed non-empty value.
pub type SecretMap = BTreeMap<String, String>;

/// Result of rendering a document against a secret-key set.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The secret-free template document, safe for version control.
    pub template: EnvDocument,
    /// The values that were extracted; keys with empty values are omitted.
    pub secrets: SecretMap,
}

/// The literal placeholder for a secret key, case-sensitive on the key.
pub fn make_placeholder(key: &str) -> String {
    format!("{{{{SYNCVAULT:{key}}}}}")
}

/// Render a template from a parsed document.
///
/// Key-value lines whose key is in `secret_keys` get their value body
/// replaced by the placeholder; the trimmed value (after stripping an
/// explicit `!SYNCVAULT` marker) is recorded when non-empty. Every other
/// line, and every other field of a secret line, passes through verbatim.
pub fn render(document: &EnvDocument, secret_keys: &BTreeSet<String>) -> RenderOutput {
    let mut secrets = SecretMap::new();
    let mut lines = Vec::with_capacity(document.lines.len());

    for line in &document.lines {
        match line {
            EnvLine::KeyValue {
                prefix,
                key,
                separator,
                value,
                trailing_whitespace,
                comment,
            } if secret_keys.contains(key) => {
                let (stripped, _) = strip_secret_marker(value);
                let trimmed = stripped.trim();
                if !trimmed.is_empty() {
                    secrets.insert(key.clone(), trimmed.to_string());
                }
                lines.push(EnvLine::KeyValue {
                    prefix: prefix.clone(),
                    key: key.clone(),
                    separator: separator.clone(),
                    value: make_placeholder(key),
                    trailing_whitespace: trailing_whitespace.clone(),
                    comment: comment.clone(),
                });
            }
            other => lines.push(other.clone()),
        }
    }

    RenderOutput {
        template: EnvDocument {
            lines,
            ends_with_newline: document.ends_with_newline,
        },
        secrets,
    }
}

/// Substitute secret values back into template text.
///
/// Literal substring replacement of every `{{SYNCVAULT:KEY}}` occurrence.
/// Keys absent from `values` leave their placeholder untouched, signalling a
/// missing secret to the caller.
pub fn hydrate(template: &str, values: &SecretMap) -> String {
    let mut output = template.to_string();
    for (key, value) in values {
        output = output.replace(&make_placeholder(key), value);
    }
    output
}
