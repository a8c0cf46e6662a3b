use crate::models::{FileConfig, OptionRegistry, ParsedValue, ParserSettings};
use crate::services::value_parser::{
    MAX_VALUE_CHARS, find_closing_quote, find_matching_brace, parse_scalar_or_array,
};
use regex::Regex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Scalar color fields read from a `colors = { ... }` table.
pub const COLOR_KEYS: [&str; 7] = [
    "foreground",
    "background",
    "cursor_bg",
    "cursor_fg",
    "cursor_border",
    "selection_bg",
    "selection_fg",
];

/// Eight-entry palette fields read from a `colors = { ... }` table.
pub const PALETTE_KEYS: [&str; 2] = ["ansi", "brights"];

/// Sides read from a `window_padding = { ... }` table.
pub const PADDING_SIDES: [&str; 4] = ["left", "right", "top", "bottom"];

/// Assignment targets handled by the nested-table stages only.
const NESTED_TABLES: [&str; 2] = ["colors", "window_padding"];

const PALETTE_SIZE: usize = 8;
const MAX_PADDING: u32 = 99_999;

/// Errors that abort the parse of a whole file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("File too large: {size} bytes exceeds the maximum of {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Parsing timeout after {0:?}: configuration may be malformed or too complex")]
    Timeout(Duration),
}

/// Cooperative wall-clock budget, checked between parsing sub-steps.
struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    fn start(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    fn check(&self) -> Result<(), ParseError> {
        if self.start.elapsed() >= self.budget {
            return Err(ParseError::Timeout(self.budget));
        }
        Ok(())
    }
}

/// Best-effort extractor for WezTerm Lua configuration scripts.
///
/// The parser does not evaluate Lua. It recognizes three shapes:
///
/// - `config.<key> = <literal>` assignments (see
///   [`parse_scalar_or_array`](crate::services::value_parser::parse_scalar_or_array))
/// - a `colors = { ... }` table, flattened to `foreground`, `ansi`, ...
/// - a `window_padding = { ... }` table, flattened to `window_padding_left`, ...
///
/// Patterns are compiled once at construction. The `regex` crate guarantees
/// linear-time matching; brace and quote matching is done by hand.
pub struct ScriptParser<'r> {
    registry: &'r OptionRegistry,
    settings: ParserSettings,

    /// `config.<key> = <rest of line>`
    assignment_pattern: Regex,

    /// Openings of the colors table, `config.colors = {` before a bare `colors = {`
    colors_patterns: [Regex; 2],

    /// Openings of the window_padding table, prefixed form first
    padding_patterns: [Regex; 2],

    /// A quoted hex color and nothing else
    quoted_color_pattern: Regex,

    /// An unquoted hex color and nothing else
    color_pattern: Regex,

    /// A padding value: one to five digits
    padding_value_pattern: Regex,
}

impl<'r> ScriptParser<'r> {
    pub fn new(registry: &'r OptionRegistry, settings: ParserSettings) -> Self {
        Self {
            registry,
            settings,
            assignment_pattern: Regex::new(r"\bconfig\.([a-z_][a-z0-9_]*)\s*=\s*([^\n]+)")
                .expect("Invalid assignment regex"),
            colors_patterns: [
                Regex::new(r"\bconfig\.colors\s*=\s*\{").expect("Invalid colors regex"),
                Regex::new(r"\bcolors\s*=\s*\{").expect("Invalid colors regex"),
            ],
            padding_patterns: [
                Regex::new(r"\bconfig\.window_padding\s*=\s*\{")
                    .expect("Invalid padding regex"),
                Regex::new(r"\bwindow_padding\s*=\s*\{").expect("Invalid padding regex"),
            ],
            quoted_color_pattern: Regex::new(
                r#"^(?:"(#[0-9a-fA-F]{3,8})"|'(#[0-9a-fA-F]{3,8})')$"#,
            )
            .expect("Invalid quoted color regex"),
            color_pattern: Regex::new(r"^#[0-9a-fA-F]{3,8}$").expect("Invalid color regex"),
            padding_value_pattern: Regex::new(r"^\d{1,5}$").expect("Invalid padding value regex"),
        }
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Parse one file's text into a flat key/value mapping.
    ///
    /// # Errors
    ///
    /// - [`ParseError::TooLarge`] if the text exceeds `max_script_bytes`
    /// - [`ParseError::Timeout`] if the time budget runs out between sub-steps
    ///
    /// Values that cannot be parsed are skipped, never reported as errors.
    pub fn parse(&self, text: &str) -> Result<FileConfig, ParseError> {
        if text.len() > self.settings.max_script_bytes {
            return Err(ParseError::TooLarge {
                size: text.len(),
                max: self.settings.max_script_bytes,
            });
        }

        let mut config = FileConfig::new();
        if text.trim().is_empty() {
            return Ok(config);
        }

        let deadline = Deadline::start(self.settings.time_budget);
        let code = strip_comments(text, &deadline)?;

        deadline.check()?;
        self.extract_assignments(&code, &mut config, &deadline)?;

        deadline.check()?;
        let strings = string_spans(&code);
        if let Some(body) = table_body(&code, &self.colors_patterns, &strings, &deadline)? {
            self.extract_colors(body, &mut config);
        }

        deadline.check()?;
        if let Some(body) = table_body(&code, &self.padding_patterns, &strings, &deadline)? {
            self.extract_padding(body, &mut config);
        }

        tracing::trace!("Parsed {} keys from {} bytes", config.len(), text.len());
        Ok(config)
    }

    fn extract_assignments(
        &self,
        code: &str,
        config: &mut FileConfig,
        deadline: &Deadline,
    ) -> Result<(), ParseError> {
        for caps in self.assignment_pattern.captures_iter(code) {
            deadline.check()?;

            let key = &caps[1];
            if NESTED_TABLES.contains(&key) {
                continue;
            }

            if !self.registry.is_known(key) && !self.settings.preserve_unknown_keys {
                tracing::trace!("Skipping unrecognized option {}", key);
                continue;
            }

            let Some(value) = caps.get(2) else {
                continue;
            };
            let raw = multiline_table(code, value.start() + leading_ws(value.as_str()))
                .unwrap_or(value.as_str());

            match parse_scalar_or_array(raw) {
                Some(value) => {
                    config.insert(key.to_string(), value);
                }
                None => {
                    tracing::debug!("Could not parse value for {}: {}", key, raw.trim());
                }
            }
        }

        Ok(())
    }

    fn extract_colors(&self, body: &str, config: &mut FileConfig) {
        let fields = table_fields(body);

        for key in COLOR_KEYS {
            let Some(value) = field(&fields, key) else {
                continue;
            };
            let color = self
                .quoted_color_pattern
                .captures(value)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)));
            match color {
                Some(color) => {
                    config.insert(key.to_string(), ParsedValue::from(color.as_str()));
                }
                None => tracing::debug!("Skipping invalid color for {}: {}", key, value),
            }
        }

        for key in PALETTE_KEYS {
            let Some(value) = field(&fields, key) else {
                continue;
            };
            match self.parse_palette(value) {
                Some(palette) => {
                    config.insert(key.to_string(), palette);
                }
                None => tracing::debug!("Skipping invalid {} palette", key),
            }
        }
    }

    /// A list of exactly eight hex colors, or nothing.
    fn parse_palette(&self, value: &str) -> Option<ParsedValue> {
        if !value.starts_with('{') {
            return None;
        }
        let parsed = parse_scalar_or_array(value)?;
        let entries = parsed.as_list()?;
        let valid = entries.len() == PALETTE_SIZE
            && entries.iter().all(|entry| {
                entry
                    .as_str()
                    .is_some_and(|color| self.color_pattern.is_match(color))
            });
        valid.then_some(parsed)
    }

    fn extract_padding(&self, body: &str, config: &mut FileConfig) {
        let fields = table_fields(body);

        for side in PADDING_SIDES {
            let Some(value) = field(&fields, side) else {
                continue;
            };
            let amount = self
                .padding_value_pattern
                .is_match(value)
                .then(|| value.parse::<u32>().ok())
                .flatten()
                .filter(|amount| *amount <= MAX_PADDING);
            match amount {
                Some(amount) => {
                    config.insert(
                        format!("window_padding_{side}"),
                        ParsedValue::Number(f64::from(amount)),
                    );
                }
                None => tracing::debug!("Skipping invalid padding for {}: {}", side, value),
            }
        }
    }
}

impl Default for ScriptParser<'static> {
    fn default() -> Self {
        Self::new(OptionRegistry::builtin(), ParserSettings::default())
    }
}

/// Parse with the built-in registry and default limits.
pub fn parse_script(text: &str) -> Result<FileConfig, ParseError> {
    ScriptParser::default().parse(text)
}

/// Remove `--` comments outside string literals, line by line.
fn strip_comments(text: &str, deadline: &Deadline) -> Result<String, ParseError> {
    let mut out = String::with_capacity(text.len());

    for (index, line) in text.split('\n').enumerate() {
        deadline.check()?;
        if index > 0 {
            out.push('\n');
        }
        out.push_str(strip_line_comment(line));
    }

    Ok(out)
}

fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'-' if bytes.get(i + 1) == Some(&b'-') => return &line[..i],
                _ => {}
            },
        }
        i += 1;
    }

    line
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// A `{ ... }` value that continues past the end of its line.
///
/// The scan window is capped at what the value parser would accept anyway,
/// keeping repeated unbalanced openings linear in practice.
fn multiline_table(code: &str, start: usize) -> Option<&str> {
    if code.as_bytes().get(start) != Some(&b'{') {
        return None;
    }
    let mut window_end = (start + MAX_VALUE_CHARS * 4).min(code.len());
    while !code.is_char_boundary(window_end) {
        window_end -= 1;
    }
    let window = &code[start..window_end];
    let end = find_matching_brace(window, 0)?;
    Some(&window[..=end])
}

/// The text between the braces of the first balanced table opened by one of
/// `openings`, trying each pattern in turn.
///
/// Openings inside string literals are skipped, as are openings whose brace
/// never closes.
fn table_body<'a>(
    code: &'a str,
    openings: &[Regex],
    strings: &[(usize, usize)],
    deadline: &Deadline,
) -> Result<Option<&'a str>, ParseError> {
    for opening in openings {
        for found in opening.find_iter(code) {
            deadline.check()?;
            if in_string(strings, found.start()) {
                continue;
            }
            if let Some(table) = multiline_table(code, found.end() - 1) {
                return Ok(Some(&table[1..table.len() - 1]));
            }
        }
    }
    Ok(None)
}

/// Byte ranges of quoted strings, each from its opening quote to just past its
/// closing quote. A string left open ends at its line break.
fn string_spans(code: &str) -> Vec<(usize, usize)> {
    let bytes = code.as_bytes();
    let mut spans = Vec::new();
    let mut open: Option<(u8, usize)> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match open {
            Some((_, start)) if b == b'\n' => {
                spans.push((start, i));
                open = None;
            }
            Some(_) if b == b'\\' => i += 1,
            Some((quote, start)) if b == quote => {
                spans.push((start, i + 1));
                open = None;
            }
            Some(_) => {}
            None if b == b'"' || b == b'\'' => open = Some((b, i)),
            None => {}
        }
        i += 1;
    }
    if let Some((_, start)) = open {
        spans.push((start, bytes.len()));
    }

    spans
}

fn in_string(spans: &[(usize, usize)], pos: usize) -> bool {
    let after = spans.partition_point(|&(start, _)| start <= pos);
    after > 0 && pos < spans[after - 1].1
}

/// Split a table body into its depth-0 `name = value` fields.
///
/// Positional entries and `[expr] = value` entries are dropped. Separators
/// inside strings, nested tables and call arguments are ignored.
fn table_fields(body: &str) -> Vec<(&str, &str)> {
    let bytes = body.as_bytes();
    let mut fields = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() || b == b',' || b == b';' {
            i += 1;
            continue;
        }
        let end = end_of_entry(body, i);
        if let Some(named) = split_named_field(&body[i..end]) {
            fields.push(named);
        }
        i = end + 1;
    }

    fields
}

fn end_of_entry(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut parens = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => match find_closing_quote(text, i) {
                Some(end) => i = end,
                None => return bytes.len(),
            },
            b'{' => match find_matching_brace(text, i) {
                Some(end) => i = end,
                None => return bytes.len(),
            },
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b',' | b';' if parens == 0 => return i,
            _ => {}
        }
        i += 1;
    }

    bytes.len()
}

fn split_named_field(entry: &str) -> Option<(&str, &str)> {
    let name_len = entry
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(entry.len());
    let name = &entry[..name_len];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let value = entry[name_len..].trim_start().strip_prefix('=')?;
    if value.starts_with('=') {
        return None;
    }
    Some((name, value.trim()))
}

fn field<'a>(fields: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(field_name, _)| *field_name == name)
        .map(|(_, value)| *value)
}
