//! Integration tests for archive extraction and require resolution
//!
//! These tests verify:
//! - Entry point detection and its priority order
//! - Depth-first, cycle-safe traversal of require calls
//! - Paths from zip entries resolve the same as hand-built maps

mod common;

use common::{build_zip, modular_config};
use wezconf::models::{ArchiveSettings, FileMap};
use wezconf::services::{extract_archive, extract_requires, find_entry, resolve_graph};

fn file_map(entries: &[(&str, &str)]) -> FileMap {
    entries
        .iter()
        .map(|(path, text)| (path.to_string(), text.to_string()))
        .collect()
}

#[test]
fn test_cycle_terminates_without_warning() {
    let files = file_map(&[
        ("wezterm.lua", "require('a')"),
        ("a.lua", "require('wezterm')"),
    ]);
    let graph = resolve_graph(&files);

    assert_eq!(graph.entry_path.as_deref(), Some("wezterm.lua"));
    assert_eq!(graph.resolved, vec!["wezterm.lua", "a.lua"]);
    assert!(graph.warnings.is_empty());
}

#[test]
fn test_entry_priority() {
    let files = file_map(&[
        ("wezterm/init.lua", ""),
        ("config/wezterm.lua", ""),
        (".config/wezterm/wezterm.lua", ""),
    ]);
    assert_eq!(
        find_entry(&files).as_deref(),
        Some(".config/wezterm/wezterm.lua")
    );

    let nested = file_map(&[("dotfiles/term/wezterm.lua", ""), ("init.lua", "")]);
    assert_eq!(
        find_entry(&nested).as_deref(),
        Some("dotfiles/term/wezterm.lua")
    );
}

#[test]
fn test_module_paths_and_init_files() {
    let files = file_map(&[
        ("wezterm.lua", "require 'theme'\nrequire(\"ui.tabs\")"),
        ("theme/init.lua", "return {}"),
        ("ui/tabs.lua", "require('util.strings')"),
        ("util/strings.lua", ""),
        ("unused.lua", ""),
    ]);
    let graph = resolve_graph(&files);

    assert_eq!(
        graph.resolved,
        vec![
            "wezterm.lua",
            "theme/init.lua",
            "ui/tabs.lua",
            "util/strings.lua"
        ]
    );
    assert!(!graph.resolved.contains(&"unused.lua".to_string()));
}

#[test]
fn test_unresolved_require_is_a_warning() {
    let files = file_map(&[("wezterm.lua", "local w = require('wezterm')\nrequire('missing')")]);
    let graph = resolve_graph(&files);

    // `wezterm` names the entry itself, which is already visited
    assert_eq!(graph.resolved, vec!["wezterm.lua"]);
    assert_eq!(
        graph.warnings,
        vec!["Unresolved require('missing') referenced from wezterm.lua"]
    );
}

#[test]
fn test_missing_entry_falls_back_to_known_roots() {
    let files = file_map(&[
        ("nvim/init.lua", "require('nvim.opts')"),
        ("nvim/opts.lua", ""),
        ("notes.txt", "require('nvim.opts')"),
    ]);
    let graph = resolve_graph(&files);

    assert_eq!(graph.entry_path, None);
    assert_eq!(graph.resolved, vec!["nvim/init.lua", "nvim/opts.lua"]);
    assert_eq!(
        graph.warnings,
        vec!["No entry point (wezterm.lua) found in archive."]
    );
}

#[test]
fn test_require_forms() {
    let text = r#"
local a = require("alpha")
local b = require 'beta'
local c = require('gamma.delta')
local d = require "epsilon"
-- require("commented")
local f = myrequire("zeta")
"#;
    assert_eq!(
        extract_requires(text),
        vec!["alpha", "beta", "gamma.delta", "epsilon", "commented", "zeta"]
    );
}

#[test]
fn test_resolve_extracted_archive() {
    let bytes = build_zip(&modular_config());
    let files = extract_archive(&bytes, &ArchiveSettings::default()).unwrap();

    assert_eq!(files.len(), 4);
    assert_eq!(files.get("README.md").map(String::as_str), Some(""));

    let graph = resolve_graph(&files);
    assert_eq!(
        graph.resolved,
        vec!["wezterm.lua", "appearance.lua", "keys.lua"]
    );
}

#[test]
fn test_windows_separators_in_archive() {
    let bytes = build_zip(&[
        (".\\wezterm.lua", "require('lib.colors')"),
        ("lib\\colors.lua", "config.foreground = '#ffffff'"),
    ]);
    let files = extract_archive(&bytes, &ArchiveSettings::default()).unwrap();
    let graph = resolve_graph(&files);

    assert_eq!(graph.resolved, vec!["wezterm.lua", "lib/colors.lua"]);
}
