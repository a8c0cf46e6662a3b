//! Shared fixtures for integration tests

#![allow(dead_code)]

use camino::Utf8PathBuf;
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Build a zip archive in memory from `(path, content)` pairs
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Write bytes to `name` inside a fresh temporary directory
pub fn write_temp_file(name: &str, bytes: &[u8]) -> (Utf8PathBuf, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().join(name)).unwrap();
    std::fs::write(&path, bytes).unwrap();
    (path, temp_dir)
}

/// A modular configuration split across an entry point and three modules
pub fn modular_config() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "wezterm.lua",
            r#"local wezterm = require("wezterm")
local config = wezterm.config_builder()

require("appearance").apply(config)
require("keys").apply(config)

config.font_size = 14
config.keys = {
  { key = "t", mods = "CTRL", action = wezterm.action.SpawnTab("CurrentPaneDomain") },
}
return config
"#,
        ),
        (
            "appearance.lua",
            r##"local M = {}
function M.apply(config)
  config.font_size = 12 -- overridden by the entry point
  config.window_background_opacity = 0.95
  config.colors = {
    foreground = "#c0c0c0",
    background = "#1a1b26",
  }
  config.window_padding = { left = 4, right = 4, top = 2, bottom = 2 }
  config.my_plugin_theme = "nord"
end
return M
"##,
        ),
        (
            "keys.lua",
            r#"local M = {}
function M.apply(config)
  config.keys = {
    { key = "w", mods = "CTRL", action = "CloseCurrentTab" },
  }
end
return M
"#,
        ),
        ("README.md", "# dotfiles"),
    ]
}
