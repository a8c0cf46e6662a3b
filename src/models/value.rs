use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal value recovered from a Lua configuration script.
///
/// "Could not parse" is modelled as `Option::None` by the parsers and is never
/// stored inside a [`FileConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedValue {
    Boolean(bool),
    Number(f64),
    String(String),
    List(Vec<ParsedValue>),
}

/// Keys and values parsed from a single file, in parse order.
pub type FileConfig = IndexMap<String, ParsedValue>;

impl ParsedValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParsedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParsedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParsedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParsedValue]> {
        match self {
            ParsedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ParsedValue::List(_))
    }

    /// Canonical JSON text of the value.
    ///
    /// Two values are structurally equal when their canonical forms are equal;
    /// the merger and the store compare values this way.
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Short type label for reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParsedValue::Boolean(_) => "boolean",
            ParsedValue::Number(_) => "number",
            ParsedValue::String(_) => "string",
            ParsedValue::List(_) => "list",
        }
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for ParsedValue {
    fn from(value: &str) -> Self {
        ParsedValue::String(value.to_string())
    }
}

impl From<String> for ParsedValue {
    fn from(value: String) -> Self {
        ParsedValue::String(value)
    }
}

impl From<f64> for ParsedValue {
    fn from(value: f64) -> Self {
        ParsedValue::Number(value)
    }
}

impl From<bool> for ParsedValue {
    fn from(value: bool) -> Self {
        ParsedValue::Boolean(value)
    }
}

impl<T: Into<ParsedValue>> From<Vec<T>> for ParsedValue {
    fn from(values: Vec<T>) -> Self {
        ParsedValue::List(values.into_iter().map(Into::into).collect())
    }
}
