//! Best-effort parser for the `---`-fenced YAML subset at the top of skill and
//! agent markdown files.
//!
//! Recognised line shapes inside the block:
//! - `key: value` (quotes stripped, `true`/`false` become booleans)
//! - `key: [a, b, c]` (inline list)
//! - `key:` followed by indented `- item` lines (block list)
//!
//! Anything else is ignored. Parsing never fails: a file without a leading
//! `---` line, or without a closing one, has empty frontmatter and the whole
//! text as its body. Numbers stay strings.

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::OnceLock;

pub const DELIM: &str = "---";

static KV_RE: OnceLock<Regex> = OnceLock::new();
static ITEM_RE: OnceLock<Regex> = OnceLock::new();

fn kv_re() -> &'static Regex {
    KV_RE.get_or_init(|| Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_-]*):\s*(.*)$").unwrap())
}

fn item_re() -> &'static Regex {
    ITEM_RE.get_or_init(|| Regex::new(r"^\s+-\s+(.+)$").unwrap())
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

/// Ordered key/value mapping plus the raw block it was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    entries: Vec<(String, Value)>,
    raw: String,
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// List value for `key`. A scalar string is read as a comma-separated list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::List(items)) => items.clone(),
            Some(Value::Str(s)) => split_comma_list(s),
            _ => Vec::new(),
        }
    }

    /// The raw text of the frontmatter block, without the fences.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The `key:` line and its indented continuation lines, verbatim.
    ///
    /// Used for nested blocks (e.g. agent `hooks:`) that the subset parser
    /// cannot represent as a value.
    pub fn raw_block(&self, key: &str) -> Option<String> {
        let prefix = format!("{key}:");
        let mut lines = self.raw.lines();
        let first = lines.by_ref().find(|l| l.starts_with(&prefix))?;
        let mut block = vec![first];
        for line in lines {
            if line.trim().is_empty() || line.starts_with([' ', '\t']) || line.starts_with("- ") {
                block.push(line);
            } else {
                break;
            }
        }
        while block.last().is_some_and(|l| l.trim().is_empty()) {
            block.pop();
        }
        Some(block.join("\n"))
    }
}

impl Serialize for Frontmatter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Document {
    fn plain(content: &str) -> Self {
        Self {
            frontmatter: Frontmatter::default(),
            body: content.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse(content: &str) -> Document {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.first().map(|l| l.trim_end()) != Some(DELIM) {
        return Document::plain(content);
    }

    let end = lines
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(i, line)| (line.trim() == DELIM).then_some(i));
    let Some(end) = end else {
        return Document::plain(content);
    };

    let block = &lines[1..end];
    let mut frontmatter = parse_block(block);
    frontmatter.raw = block
        .iter()
        .map(|l| l.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n");

    Document {
        frontmatter,
        body: lines[end + 1..].join("\n"),
    }
}

fn parse_block(lines: &[&str]) -> Frontmatter {
    let mut fm = Frontmatter::default();
    // Key whose block list is currently accepting `- item` lines.
    let mut open_list: Option<String> = None;

    for line in lines {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(key) = &open_list {
            if let Some(caps) = item_re().captures(line) {
                let item = unquote(caps[1].trim());
                if let Some((_, Value::List(items))) =
                    fm.entries.iter_mut().find(|(k, _)| k == key)
                {
                    items.push(item);
                }
                continue;
            }
        }

        let Some(caps) = kv_re().captures(line) else {
            continue;
        };
        let key = caps[1].to_string();
        let raw_val = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

        if raw_val.is_empty() || raw_val == "[]" {
            fm.insert(key.clone(), Value::List(Vec::new()));
            open_list = Some(key);
        } else if raw_val.starts_with('[') && raw_val.ends_with(']') {
            let items = raw_val[1..raw_val.len() - 1]
                .split(',')
                .map(|item| unquote(item.trim()))
                .filter(|item| !item.is_empty())
                .collect();
            fm.insert(key, Value::List(items));
            open_list = None;
        } else if raw_val.eq_ignore_ascii_case("true") || raw_val.eq_ignore_ascii_case("false") {
            fm.insert(key, Value::Bool(raw_val.eq_ignore_ascii_case("true")));
            open_list = None;
        } else {
            fm.insert(key, Value::Str(unquote(raw_val)));
            open_list = None;
        }
    }

    fm
}

/// Remove one pair of surrounding quotes. Single-quoted text unescapes `''`.
fn unquote(s: &str) -> String {
    if s.len() >= 2 {
        if let Some(inner) = s.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
            return inner.replace("''", "'");
        }
        if let Some(inner) = s.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            return inner.replace("\\\"", "\"");
        }
    }
    s.to_string()
}

/// `"a, b,, c"` → `["a", "b", "c"]`
pub fn split_comma_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Serialise entries back to the subset, one logical entry per key.
/// Lists are always written as block lists.
pub fn render_lines(fm: &Frontmatter) -> Vec<String> {
    let mut out = Vec::new();
    for (key, value) in fm.iter() {
        match value {
            Value::Bool(b) => out.push(format!("{key}: {b}")),
            Value::Str(s) => out.push(format!("{key}: {}", quote_if_needed(s))),
            Value::List(items) if items.is_empty() => out.push(format!("{key}: []")),
            Value::List(items) => {
                out.push(format!("{key}:"));
                out.extend(items.iter().map(|item| format!("  - {}", quote_if_needed(item))));
            }
        }
    }
    out
}

/// Full fenced block, including both `---` lines and a trailing newline.
/// `raw_tail` is copied verbatim before the closing fence, for nested blocks
/// the subset cannot express.
pub fn render(fm: &Frontmatter, raw_tail: Option<&str>) -> String {
    let mut out = String::from(DELIM);
    out.push('\n');
    for line in render_lines(fm) {
        out.push_str(&line);
        out.push('\n');
    }
    if let Some(tail) = raw_tail {
        out.push_str(tail);
        out.push('\n');
    }
    out.push_str(DELIM);
    out.push('\n');
    out
}

/// Single-quote strings a YAML loader or this parser would read back
/// differently: booleans and nulls, flow/indicator prefixes, `: ` and ` #`
/// inside, surrounding quotes or whitespace.
fn quote_if_needed(s: &str) -> String {
    const INDICATORS: &[char] = &[
        '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`', ',',
    ];
    let lower = s.to_ascii_lowercase();
    let needs_quotes = s.is_empty()
        || matches!(lower.as_str(), "true" | "false" | "null" | "~")
        || s.starts_with(INDICATORS)
        || s.starts_with("- ")
        || s.starts_with("? ")
        || s.ends_with(['\'', '"', ':'])
        || s.contains(": ")
        || s.contains(" #")
        || s != s.trim();
    if needs_quotes {
        format!("'{}'", s.replace('\'', "''"))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
