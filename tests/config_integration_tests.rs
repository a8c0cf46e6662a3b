//! Integration tests for ConfigManager and settings/store file handling
//!
//! These tests verify:
//! - Settings defaults when no file exists
//! - Hand-written YAML settings are honored by the importer
//! - Store files round-trip modified values and profiles
//! - Corrupt files surface as errors instead of silent defaults

mod common;

use camino::Utf8PathBuf;
use common::build_zip;
use std::fs;
use tempfile::TempDir;
use wezconf::models::ParsedValue;
use wezconf::{ConfigManager, ConfigStore, ImportService, ImporterSettings};

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.settings_path(), config_path.join("wezconf.yaml"));
    assert_eq!(manager.store_path(), config_path.join("wezconf-store.yaml"));
}

#[test]
fn test_config_dir_is_created() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("a/b/c");
    ConfigManager::new(&nested).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn test_load_default_settings() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let settings = manager.load_settings().unwrap();
    assert_eq!(settings.limits.max_archive_bytes, 10 * 1024 * 1024);
    assert_eq!(settings.limits.max_script_bytes, 1024 * 1024);
    assert!(settings.preserve_unknown_keys);
    assert!(settings.text_extensions.iter().any(|ext| ext == "lua"));
}

#[test]
fn test_partial_settings_file_keeps_other_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.settings_path(),
        "limits:\n  parse_timeout_ms: 250\npreserve_unknown_keys: false\n",
    )
    .unwrap();

    let settings = manager.load_settings().unwrap();
    assert_eq!(settings.limits.parse_timeout_ms, 250);
    assert_eq!(settings.limits.max_archive_bytes, 10 * 1024 * 1024);
    assert!(!settings.preserve_unknown_keys);
}

#[test]
fn test_custom_settings_path() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let custom = config_path.join("elsewhere.yaml");
    fs::write(&custom, "text_extensions: [lua]\n").unwrap();

    let manager = ConfigManager::new(&config_path)
        .unwrap()
        .with_settings_path(custom.clone());
    assert_eq!(manager.settings_path(), custom);

    let settings = manager.load_settings().unwrap();
    assert_eq!(settings.text_extensions, vec!["lua"]);
}

#[test]
fn test_settings_drive_the_importer() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut settings = ImporterSettings::default();
    settings.preserve_unknown_keys = false;
    manager.save_settings(&settings).unwrap();

    let service = ImportService::new(manager.load_settings().unwrap());
    let merged = service.merge(
        &service
            .import_bytes(
                "dots.zip",
                &build_zip(&[(
                    "wezterm.lua",
                    "config.font_size = 9\nconfig.not_an_option = 1",
                )]),
            )
            .unwrap(),
    );
    assert_eq!(merged.config.len(), 1);
    assert_eq!(merged.config["font_size"], ParsedValue::Number(9.0));
}

#[test]
fn test_corrupt_settings_file_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.settings_path(), "limits: [this, is, not, a, map]\n").unwrap();
    assert!(manager.load_settings().is_err());
}

#[test]
fn test_store_round_trip_with_profiles() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let store = ConfigStore::from_state(manager.load_store().unwrap());
    store.set_value("font_size", ParsedValue::Number(16.0));
    store.set_value("default_prog", ParsedValue::from(vec!["/usr/bin/fish", "-l"]));
    store.create_profile("Laptop");
    store.set_value("color_scheme", ParsedValue::from("Tokyo Night"));
    manager.save_store(&store.snapshot()).unwrap();

    let loaded = manager.load_store().unwrap();
    assert_eq!(loaded, store.snapshot());
    assert_eq!(loaded.profiles.len(), 1);
    assert_eq!(loaded.profiles[0].config.len(), 2);
    assert_eq!(loaded.active_profile_id.as_deref(), Some("profile-1"));
}

#[test]
fn test_store_in_new_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let store_path = config_path.join("state/nested/store.yaml");
    let manager = ConfigManager::new(&config_path)
        .unwrap()
        .with_store_path(store_path.clone());

    let store = ConfigStore::new();
    store.set_value("enable_wayland", ParsedValue::Boolean(false));
    manager.save_store(&store.snapshot()).unwrap();

    assert!(store_path.exists());
    assert_eq!(manager.load_store().unwrap().config.len(), 1);
}

#[test]
fn test_corrupt_store_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.store_path(), "config: [unterminated\n").unwrap();
    assert!(manager.load_store().is_err());
}
