//! Lossless line-oriented dotenv document model
//!
//! Every physical line is kept with enough sub-structure to reproduce its
//! original text exactly. Lines that don't match the `KEY=VALUE` grammar are
//! passed through verbatim forever; parsing is total and never fails.
//!
//! Known one-way normalization: `\r\n` is converted to `\n` on parse.

use std::sync::LazyLock;

use regex::Regex;

/// `^(\s*)(KEY)(\s*=\s*)(rest)` — the only shape that becomes a key-value line.
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*=\s*)(.*)$").expect("line regex is valid")
});

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("key regex is valid"));

/// One physical line of a dotenv file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    /// A line that is empty after trimming.
    Blank { raw: String },
    /// A line whose first non-whitespace character is `#`.
    Comment { raw: String },
    /// A line that does not match the `KEY=VALUE` grammar; preserved verbatim.
    Unparsed { raw: String },
    /// A parsed `KEY=VALUE` line, split so that re-concatenation of the
    /// fields in order reproduces the original text exactly.
    KeyValue {
        /// Leading whitespace before the key.
        prefix: String,
        key: String,
        /// The `=` and any whitespace around it.
        separator: String,
        /// The value body, excluding trailing whitespace and inline comment.
        value: String,
        /// Whitespace between the value body and the inline comment (or end
        /// of line when there is no comment).
        trailing_whitespace: String,
        /// Inline comment starting at the first unquoted, unescaped `#`.
        comment: String,
    },
}

impl EnvLine {
    /// Reconstruct the original line text.
    pub fn raw(&self) -> String {
        match self {
            Self::Blank { raw } | Self::Comment { raw } | Self::Unparsed { raw } => raw.clone(),
            Self::KeyValue {
                prefix,
                key,
                separator,
                value,
                trailing_whitespace,
                comment,
            } => format!("{prefix}{key}{separator}{value}{trailing_whitespace}{comment}"),
        }
    }

    /// The key of a key-value line, if this is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::KeyValue { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// A parsed dotenv file: the ordered line sequence plus whether the original
/// text ended with a trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDocument {
    pub lines: Vec<EnvLine>,
    pub ends_with_newline: bool,
}

impl EnvDocument {
    /// Parse dotenv text. Total: every line is classified, unrecognized ones
    /// become [`EnvLine::Unparsed`].
    pub fn parse(content: &str) -> Self {
        let ends_with_newline = content.ends_with('\n');
        let normalized = content.replace("\r\n", "\n");

        let mut segments: Vec<&str> = normalized.split('\n').collect();
        // The trailing newline is recorded in the flag, not kept as an empty
        // final line.
        if ends_with_newline {
            segments.pop();
        }

        let lines = segments.into_iter().map(parse_line).collect();

        Self {
            lines,
            ends_with_newline,
        }
    }

    /// Serialize back to text. A document that was not semantically modified
    /// reproduces its original byte stream exactly (modulo the documented
    /// CRLF normalization).
    pub fn serialize(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(EnvLine::raw)
            .collect::<Vec<_>>()
            .join("\n");
        if self.ends_with_newline {
            out.push('\n');
        }
        out
    }

    /// Iterate over the keys of all key-value lines, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(EnvLine::key)
    }
}

fn parse_line(line: &str) -> EnvLine {
    if line.trim().is_empty() {
        return EnvLine::Blank {
            raw: line.to_string(),
        };
    }

    if line.trim_start().starts_with('#') {
        return EnvLine::Comment {
            raw: line.to_string(),
        };
    }

    let Some(caps) = LINE_RE.captures(line) else {
        return EnvLine::Unparsed {
            raw: line.to_string(),
        };
    };

    let key = &caps[2];
    if !KEY_RE.is_match(key) {
        return EnvLine::Unparsed {
            raw: line.to_string(),
        };
    }

    let (value_part, comment) = split_inline_comment(&caps[4]);
    let trimmed = value_part.trim_end_matches(|c: char| c.is_whitespace());
    let trailing_whitespace = value_part[trimmed.len()..].to_string();

    EnvLine::KeyValue {
        prefix: caps[1].to_string(),
        key: key.to_string(),
        separator: caps[3].to_string(),
        value: trimmed.to_string(),
        trailing_whitespace,
        comment,
    }
}

/// Split a raw value remainder into the value part and the inline comment.
///
/// Tracks single-quote, double-quote and backslash-escape state; the first
/// unquoted, unescaped `#` starts the comment.
fn split_inline_comment(value_raw: &str) -> (String, String) {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for (i, ch) in value_raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => {
                return (value_raw[..i].to_string(), value_raw[i..].to_string());
            }
            _ => {}
        }
    }

    (value_raw.to_string(), String::new())
}
