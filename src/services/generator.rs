//! Lua output for a flat configuration mapping.

use crate::models::{OptionRegistry, ParsedValue};
use crate::services::script_parser::{COLOR_KEYS, PADDING_SIDES, PALETTE_KEYS};
use indexmap::IndexMap;
use std::fmt::Write;

const PALETTE_SIZE: usize = 8;
const MAX_PADDING: f64 = 99_999.0;
const MAX_FRACTION_DIGITS: usize = 15;

/// Lua literal for a value, readable back by the value parser.
pub fn serialize_value(value: &ParsedValue) -> String {
    match value {
        ParsedValue::Boolean(b) => b.to_string(),
        ParsedValue::Number(n) => serialize_number(*n),
        ParsedValue::String(s) => quote(s),
        ParsedValue::List(items) if items.is_empty() => "{}".to_string(),
        ParsedValue::List(items) => {
            let inner: Vec<String> = items.iter().map(serialize_value).collect();
            format!("{{ {} }}", inner.join(", "))
        }
    }
}

/// Integers print without a fraction. Other values keep at most
/// `MAX_FRACTION_DIGITS` decimals, the most the value parser reads back, so
/// a computed float like `0.1 + 0.2` is written rounded.
fn serialize_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }

    let text = format!("{n}");
    let fraction_digits = text.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    if fraction_digits <= MAX_FRACTION_DIGITS {
        return text;
    }

    let rounded = format!("{:.*}", MAX_FRACTION_DIGITS, n);
    rounded.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Render a complete `wezterm.lua`.
///
/// Known options come first in catalog order, followed by any other keys in
/// mapping order. Color and padding keys are folded into `config.colors` and
/// `config.window_padding` tables when the values fit those tables; anything
/// else is written as a plain `config.<key>` assignment.
pub fn generate_script(mapping: &IndexMap<String, ParsedValue>, registry: &OptionRegistry) -> String {
    let ordered: Vec<(&str, &ParsedValue)> = registry
        .iter()
        .filter_map(|spec| mapping.get_key_value(spec.id))
        .chain(mapping.iter().filter(|(key, _)| !registry.is_known(key)))
        .map(|(key, value)| (key.as_str(), value))
        .collect();

    let mut colors = Vec::new();
    let mut padding = Vec::new();
    let mut script = String::from(
        "local wezterm = require(\"wezterm\")\nlocal config = wezterm.config_builder()\n\n",
    );

    for (key, value) in ordered {
        if fits_colors_table(key, value) {
            colors.push((key, value));
        } else if let Some(side) = padding_side(key, value) {
            padding.push((side, value));
        } else {
            let _ = writeln!(script, "config.{key} = {}", serialize_value(value));
        }
    }

    write_table(&mut script, "colors", &colors);
    write_table(&mut script, "window_padding", &padding);

    script.push_str("\nreturn config\n");
    script
}

fn write_table(script: &mut String, name: &str, fields: &[(&str, &ParsedValue)]) {
    if fields.is_empty() {
        return;
    }
    let _ = writeln!(script, "config.{name} = {{");
    for (field, value) in fields {
        let _ = writeln!(script, "  {field} = {},", serialize_value(value));
    }
    script.push_str("}\n");
}

fn fits_colors_table(key: &str, value: &ParsedValue) -> bool {
    if COLOR_KEYS.contains(&key) {
        return value.as_str().is_some_and(is_hex_color);
    }
    if PALETTE_KEYS.contains(&key) {
        return value.as_list().is_some_and(|items| {
            items.len() == PALETTE_SIZE
                && items.iter().all(|item| item.as_str().is_some_and(is_hex_color))
        });
    }
    false
}

fn padding_side<'k>(key: &'k str, value: &ParsedValue) -> Option<&'k str> {
    let side = key.strip_prefix("window_padding_")?;
    let amount = value.as_f64()?;
    let fits = PADDING_SIDES.contains(&side)
        && amount.fract() == 0.0
        && (0.0..=MAX_PADDING).contains(&amount);
    fits.then_some(side)
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#').is_some_and(|digits| {
        (3..=8).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::script_parser::parse_script;
    use crate::services::value_parser::parse_scalar_or_array;
    use proptest::prelude::*;

    #[test]
    fn test_serialize_scalars() {
        assert_eq!(serialize_value(&ParsedValue::Boolean(true)), "true");
        assert_eq!(serialize_value(&ParsedValue::Number(14.0)), "14");
        assert_eq!(serialize_value(&ParsedValue::Number(-0.95)), "-0.95");
        assert_eq!(serialize_value(&"say \"hi\"".into()), r#""say \"hi\"""#);
        assert_eq!(serialize_value(&ParsedValue::List(vec![])), "{}");
    }

    #[test]
    fn test_long_fractions_are_rounded() {
        let computed = ParsedValue::Number(0.1 + 0.2);
        assert_eq!(serialize_value(&computed), "0.3");
        assert_eq!(
            parse_scalar_or_array(&serialize_value(&computed)),
            Some(ParsedValue::Number(0.3))
        );
        assert_eq!(serialize_value(&ParsedValue::Number(1.0 / 3.0)), "0.333333333333333");
        assert_eq!(serialize_value(&ParsedValue::Number(-1e-20)), "-0");
    }

    #[test]
    fn test_serialize_nested_list() {
        let value = ParsedValue::List(vec![ParsedValue::from(vec!["t", "CTRL"])]);
        assert_eq!(serialize_value(&value), r#"{ { "t", "CTRL" } }"#);
        assert_eq!(parse_scalar_or_array(&serialize_value(&value)), Some(value));
    }

    #[test]
    fn test_generated_script_round_trips() {
        let palette: Vec<&str> = vec![
            "#000000", "#ff0000", "#00ff00", "#ffff00", "#0000ff", "#ff00ff", "#00ffff", "#ffffff",
        ];
        let mut mapping = IndexMap::new();
        mapping.insert("font_size".to_string(), ParsedValue::Number(13.5));
        mapping.insert("enable_tab_bar".to_string(), ParsedValue::Boolean(false));
        mapping.insert("foreground".to_string(), ParsedValue::from("#c0c0c0"));
        mapping.insert("background".to_string(), ParsedValue::from("midnight"));
        mapping.insert("ansi".to_string(), ParsedValue::from(palette));
        mapping.insert("window_padding_left".to_string(), ParsedValue::Number(4.0));
        mapping.insert("window_padding_top".to_string(), ParsedValue::Number(2.5));
        mapping.insert(
            "keys".to_string(),
            ParsedValue::List(vec![ParsedValue::from(vec!["t", "CTRL", "SpawnTab"])]),
        );
        mapping.insert("my_plugin_setting".to_string(), ParsedValue::from("x -- y"));

        let script = generate_script(&mapping, OptionRegistry::builtin());
        assert!(script.contains("config.colors = {"));
        assert!(script.contains("config.window_padding = {"));
        assert!(script.ends_with("return config\n"));

        let parsed = parse_script(&script).unwrap();
        assert_eq!(parsed, mapping);
    }

    #[test]
    fn test_known_keys_before_unknown() {
        let mut mapping = IndexMap::new();
        mapping.insert("zzz_custom".to_string(), ParsedValue::Number(1.0));
        mapping.insert("font_size".to_string(), ParsedValue::Number(12.0));

        let script = generate_script(&mapping, OptionRegistry::builtin());
        let font = script.find("config.font_size").unwrap();
        let custom = script.find("config.zzz_custom").unwrap();
        assert!(font < custom);
    }

    proptest! {
        #[test]
        fn prop_scalar_round_trip(n in -1_000_000i64..1_000_000i64, s in "[ -~]{0,40}", b in any::<bool>()) {
            let values = [
                ParsedValue::Number(n as f64),
                ParsedValue::Number(n as f64 / 100.0),
                ParsedValue::String(s),
                ParsedValue::Boolean(b),
            ];
            for value in values {
                prop_assert_eq!(parse_scalar_or_array(&serialize_value(&value)), Some(value));
            }
        }

        #[test]
        fn prop_fractional_numbers_parse_back(n in -1.0e6f64..1.0e6f64) {
            let parsed = parse_scalar_or_array(&serialize_value(&ParsedValue::Number(n)));
            let Some(ParsedValue::Number(back)) = parsed else {
                return Err(TestCaseError::fail(format!("{n} did not parse back")));
            };
            prop_assert!((back - n).abs() <= 1e-9, "{} came back as {}", n, back);
        }
    }
}
