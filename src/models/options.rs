//! Static catalog of the WezTerm options the editor understands.
//!
//! The registry is consulted read-only by the script parser (to tell known keys
//! from unknown ones), the merger (scalar vs. list merge policy) and the
//! configuration store (default-aware imports).

use crate::models::value::ParsedValue;
use indexmap::IndexMap;
use std::sync::LazyLock;

/// Declared value type of an option.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    String,
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    Enum(&'static [&'static str]),
    Color,
    Palette { size: usize },
    Keybind,
    LaunchMenu,
}

/// How values for an option combine across files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// One value; the first file to set it wins.
    Scalar,
    /// Entries from every file are concatenated.
    List,
}

impl ValueType {
    pub fn kind(&self) -> OptionKind {
        match self {
            ValueType::Keybind | ValueType::LaunchMenu => OptionKind::List,
            _ => OptionKind::Scalar,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub value_type: ValueType,
    pub default: ParsedValue,
}

impl OptionSpec {
    pub fn kind(&self) -> OptionKind {
        self.value_type.kind()
    }

    /// Whether `value` fits the declared type (and range, for numbers).
    pub fn accepts(&self, value: &ParsedValue) -> bool {
        match (&self.value_type, value) {
            (ValueType::String | ValueType::Color, ParsedValue::String(_)) => true,
            (ValueType::Enum(choices), ParsedValue::String(s)) => choices.contains(&s.as_str()),
            (ValueType::Boolean, ParsedValue::Boolean(_)) => true,
            (ValueType::Number { min, max }, ParsedValue::Number(n)) => {
                min.is_none_or(|m| *n >= m) && max.is_none_or(|m| *n <= m)
            }
            (ValueType::Palette { size }, ParsedValue::List(items)) => items.len() == *size,
            (ValueType::Keybind | ValueType::LaunchMenu, ParsedValue::List(_)) => true,
            _ => false,
        }
    }
}

/// Lookup table of every recognized option, in catalog order.
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    options: IndexMap<&'static str, OptionSpec>,
}

static BUILTIN: LazyLock<OptionRegistry> = LazyLock::new(OptionRegistry::build_builtin);

impl OptionRegistry {
    /// The built-in WezTerm catalog.
    pub fn builtin() -> &'static OptionRegistry {
        &BUILTIN
    }

    pub fn from_specs(specs: impl IntoIterator<Item = OptionSpec>) -> Self {
        Self {
            options: specs.into_iter().map(|spec| (spec.id, spec)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionSpec> {
        self.options.get(key)
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// `None` for keys the registry does not know.
    pub fn kind(&self, key: &str) -> Option<OptionKind> {
        self.get(key).map(OptionSpec::kind)
    }

    pub fn is_list(&self, key: &str) -> bool {
        self.kind(key) == Some(OptionKind::List)
    }

    pub fn default_value(&self, key: &str) -> Option<&ParsedValue> {
        self.get(key).map(|spec| &spec.default)
    }

    pub fn defaults(&self) -> IndexMap<String, ParsedValue> {
        self.options
            .values()
            .map(|spec| (spec.id.to_string(), spec.default.clone()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.values()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn build_builtin() -> Self {
        const WEIGHTS: &[&str] = &[
            "Thin",
            "ExtraLight",
            "Light",
            "Regular",
            "Medium",
            "DemiBold",
            "Bold",
            "ExtraBold",
            "Black",
        ];
        const FREETYPE_TARGETS: &[&str] = &["Normal", "Light", "Mono", "HorizontalLcd"];
        const EASINGS: &[&str] = &["Linear", "EaseIn", "EaseOut", "EaseInOut", "Constant"];

        let ansi_default = ParsedValue::from(vec![
            "#45475a", "#f38ba8", "#a6e3a1", "#f9e2af", "#89b4fa", "#f5c2e7", "#94e2d5", "#bac2de",
        ]);
        let brights_default = ParsedValue::from(vec![
            "#585b70", "#f38ba8", "#a6e3a1", "#f9e2af", "#89b4fa", "#f5c2e7", "#94e2d5", "#a6adc8",
        ]);

        Self::from_specs([
            // Fonts
            string("font_family", "Font Family", "JetBrains Mono"),
            number("font_size", "Font Size", 14.0, 6.0, 72.0),
            choice("font_weight", "Font Weight", WEIGHTS, "Regular"),
            choice("font_weight_bold", "Bold Font Weight", WEIGHTS, "Bold"),
            number("line_height", "Line Height", 1.0, 0.5, 2.0),
            number("cell_width", "Cell Width", 1.0, 0.5, 2.0),
            choice("freetype_load_target", "FreeType Load Target", FREETYPE_TARGETS, "Normal"),
            choice("freetype_render_target", "FreeType Render Target", FREETYPE_TARGETS, "Normal"),
            // Colors
            string("color_scheme", "Color Scheme", ""),
            color("foreground", "Foreground", "#cdd6f4"),
            color("background", "Background", "#1e1e2e"),
            color("cursor_bg", "Cursor Background", "#f5e0dc"),
            color("cursor_fg", "Cursor Foreground", "#1e1e2e"),
            color("cursor_border", "Cursor Border", "#f5e0dc"),
            color("selection_bg", "Selection Background", "#45475a"),
            color("selection_fg", "Selection Foreground", "#cdd6f4"),
            palette("ansi", "ANSI Colors", ansi_default),
            palette("brights", "Bright Colors", brights_default),
            // Window
            number("window_background_opacity", "Background Opacity", 1.0, 0.0, 1.0),
            choice(
                "window_decorations",
                "Window Decorations",
                &["FULL", "RESIZE", "NONE", "TITLE", "INTEGRATED_BUTTONS|RESIZE"],
                "FULL",
            ),
            number("window_padding_left", "Left Padding", 0.0, 0.0, 100.0),
            number("window_padding_right", "Right Padding", 0.0, 0.0, 100.0),
            number("window_padding_top", "Top Padding", 0.0, 0.0, 100.0),
            number("window_padding_bottom", "Bottom Padding", 0.0, 0.0, 100.0),
            boolean("enable_tab_bar", "Enable Tab Bar", true),
            boolean("hide_tab_bar_if_only_one_tab", "Hide Tab Bar If Only One Tab", false),
            boolean("use_fancy_tab_bar", "Use Fancy Tab Bar", true),
            boolean("tab_bar_at_bottom", "Tab Bar At Bottom", false),
            number("tab_max_width", "Tab Max Width", 16.0, 1.0, 100.0),
            boolean("show_tab_index_in_tab_bar", "Show Tab Index", false),
            choice(
                "window_close_confirmation",
                "Close Confirmation",
                &["AlwaysPrompt", "NeverPrompt"],
                "AlwaysPrompt",
            ),
            number("initial_cols", "Initial Columns", 80.0, 20.0, 500.0),
            number("initial_rows", "Initial Rows", 24.0, 5.0, 200.0),
            // Cursor
            choice(
                "default_cursor_style",
                "Cursor Style",
                &[
                    "SteadyBlock",
                    "BlinkingBlock",
                    "SteadyUnderline",
                    "BlinkingUnderline",
                    "SteadyBar",
                    "BlinkingBar",
                ],
                "SteadyBlock",
            ),
            number("cursor_blink_rate", "Blink Rate", 500.0, 0.0, 2000.0),
            choice("cursor_blink_ease_in", "Blink Ease In", EASINGS, "EaseIn"),
            choice("cursor_blink_ease_out", "Blink Ease Out", EASINGS, "EaseOut"),
            number("animation_fps", "Animation FPS", 60.0, 1.0, 120.0),
            boolean("force_reverse_video_cursor", "Force Reverse Video Cursor", false),
            // GPU
            choice("front_end", "Graphics Frontend", &["WebGpu", "OpenGL", "Software"], "WebGpu"),
            choice(
                "webgpu_power_preference",
                "Power Preference",
                &["HighPerformance", "LowPower"],
                "HighPerformance",
            ),
            number("max_fps", "Max FPS", 60.0, 1.0, 240.0),
            // General
            number("scrollback_lines", "Scrollback Lines", 3500.0, 0.0, 100_000.0),
            boolean("enable_scroll_bar", "Enable Scroll Bar", false),
            choice("audible_bell", "Audible Bell", &["SystemBeep", "Disabled"], "SystemBeep"),
            choice(
                "visual_bell",
                "Visual Bell",
                &["Disabled", "FadeIn", "FadeOut", "Bounce"],
                "Disabled",
            ),
            boolean("automatically_reload_config", "Auto Reload Config", true),
            boolean("check_for_updates", "Check for Updates", true),
            choice(
                "exit_behavior",
                "Exit Behavior",
                &["Close", "Hold", "CloseOnCleanExit"],
                "CloseOnCleanExit",
            ),
            // Shell
            string("default_prog", "Default Program", ""),
            string("default_cwd", "Default Working Directory", ""),
            string("term", "TERM Variable", "xterm-256color"),
            list("launch_menu", "Launch Menu", ValueType::LaunchMenu),
            // Keys
            list("keys", "Keybindings", ValueType::Keybind),
            boolean("disable_default_key_bindings", "Disable Default Keybindings", false),
            string("leader", "Leader Key", ""),
            // Advanced
            boolean("enable_wayland", "Enable Wayland", true),
            boolean("hyperlink_rules", "Hyperlink Rules", true),
            boolean("warn_about_missing_glyphs", "Warn About Missing Glyphs", true),
            boolean(
                "adjust_window_size_when_changing_font_size",
                "Adjust Window Size on Font Change",
                true,
            ),
            boolean("use_ime", "Enable IME", true),
            boolean("hide_mouse_cursor_when_typing", "Hide Mouse When Typing", true),
        ])
    }
}

fn string(id: &'static str, name: &'static str, default: &str) -> OptionSpec {
    OptionSpec {
        id,
        name,
        value_type: ValueType::String,
        default: default.into(),
    }
}

fn number(id: &'static str, name: &'static str, default: f64, min: f64, max: f64) -> OptionSpec {
    OptionSpec {
        id,
        name,
        value_type: ValueType::Number {
            min: Some(min),
            max: Some(max),
        },
        default: default.into(),
    }
}

fn boolean(id: &'static str, name: &'static str, default: bool) -> OptionSpec {
    OptionSpec {
        id,
        name,
        value_type: ValueType::Boolean,
        default: default.into(),
    }
}

fn choice(
    id: &'static str,
    name: &'static str,
    choices: &'static [&'static str],
    default: &str,
) -> OptionSpec {
    OptionSpec {
        id,
        name,
        value_type: ValueType::Enum(choices),
        default: default.into(),
    }
}

fn color(id: &'static str, name: &'static str, default: &str) -> OptionSpec {
    OptionSpec {
        id,
        name,
        value_type: ValueType::Color,
        default: default.into(),
    }
}

fn palette(id: &'static str, name: &'static str, default: ParsedValue) -> OptionSpec {
    OptionSpec {
        id,
        name,
        value_type: ValueType::Palette { size: 8 },
        default,
    }
}

// Default keybindings are WezTerm's built-in table, which the parser cannot
// represent; an empty list stands in for "no custom bindings".
fn list(id: &'static str, name: &'static str, value_type: ValueType) -> OptionSpec {
    OptionSpec {
        id,
        name,
        value_type,
        default: ParsedValue::List(Vec::new()),
    }
}
