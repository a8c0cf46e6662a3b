//! Literal parsing for the right-hand side of a Lua assignment.
//!
//! Every scan here is a single linear pass over the input. Quote and brace
//! matching never goes through a regular expression, so hostile input cannot
//! trigger backtracking.

use crate::models::ParsedValue;
use regex::Regex;
use std::sync::LazyLock;

/// Inputs longer than this (in characters) are rejected outright.
pub const MAX_VALUE_CHARS: usize = 10_000;

/// Maximum number of elements collected from one list literal.
pub const MAX_LIST_ELEMENTS: usize = 100;

/// Maximum nesting of list literals inside list literals.
pub const MAX_LIST_DEPTH: usize = 16;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d{1,15}(?:\.\d{1,15})?$").expect("Invalid number regex"));

/// Parse a scalar or list literal.
///
/// Returns `None` for `nil` and for anything that is not a recognizable
/// boolean, number, quoted string or `{ ... }` list.
pub fn parse_scalar_or_array(text: &str) -> Option<ParsedValue> {
    let trimmed = text.trim();

    if trimmed.chars().count() > MAX_VALUE_CHARS {
        return None;
    }

    match trimmed {
        "true" => return Some(ParsedValue::Boolean(true)),
        "false" => return Some(ParsedValue::Boolean(false)),
        "nil" => return None,
        _ => {}
    }

    if NUMBER_PATTERN.is_match(trimmed) {
        if let Ok(number) = trimmed.parse::<f64>()
            && number.is_finite()
        {
            return Some(ParsedValue::Number(number));
        }
    }

    let first = trimmed.chars().next()?;

    if first == '"' || first == '\'' {
        let end = find_closing_quote(trimmed, 0)?;
        return Some(ParsedValue::String(unescape(&trimmed[1..end])));
    }

    if first == '{' {
        let end = find_matching_brace(trimmed, 0)?;
        return parse_list(&trimmed[..=end], 0);
    }

    None
}

/// Byte index of the quote closing the string that opens at `start`.
///
/// Backslash escapes are skipped, so `"a\"b"` closes at the final quote.
pub fn find_closing_quote(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let quote = *bytes.get(start)?;
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }

    None
}

/// Byte index of the brace closing the `{` at `start`.
///
/// Braces inside quoted strings do not count.
pub fn find_matching_brace(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                // An unterminated string swallows the rest of the input.
                i = find_closing_quote(text, i)?;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Resolve `\n \r \t \" \' \\` in one pass. Unknown escapes are kept as written.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Parse a `{ ... }` literal (braces included).
///
/// Strings, numbers and nested lists become elements; everything else (keys,
/// `=`, identifiers, function calls) is skipped character by character.
fn parse_list(literal: &str, depth: usize) -> Option<ParsedValue> {
    let content = literal[1..literal.len() - 1].trim();
    if content.is_empty() {
        return Some(ParsedValue::List(Vec::new()));
    }

    let bytes = content.as_bytes();
    let mut items = Vec::new();
    let mut i = 0;

    while i < bytes.len() && items.len() < MAX_LIST_ELEMENTS {
        match bytes[i] {
            b if b.is_ascii_whitespace() || b == b',' => i += 1,
            b'"' | b'\'' => {
                let Some(end) = find_closing_quote(content, i) else {
                    break;
                };
                items.push(ParsedValue::String(unescape(&content[i + 1..end])));
                i = end + 1;
            }
            b'{' => {
                let Some(end) = find_matching_brace(content, i) else {
                    break;
                };
                if depth + 1 < MAX_LIST_DEPTH
                    && let Some(nested) = parse_list(&content[i..=end], depth + 1)
                {
                    items.push(nested);
                }
                i = end + 1;
            }
            b'-' | b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i], b'-' | b'.' | b'0'..=b'9') {
                    i += 1;
                }
                if let Some(number) = parse_number_prefix(&content[start..i]) {
                    items.push(ParsedValue::Number(number));
                }
            }
            _ => i += 1,
        }
    }

    if items.is_empty() {
        None
    } else {
        Some(ParsedValue::List(items))
    }
}

/// Longest leading `-?digits(.digits)?` of a run, as a finite number.
fn parse_number_prefix(run: &str) -> Option<f64> {
    let bytes = run.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let digits_start = end;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    run[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}
