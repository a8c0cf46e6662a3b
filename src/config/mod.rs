use crate::models::{EditorState, ImporterSettings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ::config::{Config, Environment, File, FileFormat};
use std::fs;

/// Prefix for environment overrides, e.g. `WEZCONF_LIMITS__PARSE_TIMEOUT_MS=250`
pub const ENV_PREFIX: &str = "WEZCONF";

pub const SETTINGS_FILE_NAME: &str = "wezconf.yaml";
pub const STORE_FILE_NAME: &str = "wezconf-store.yaml";

/// Configuration manager for the importer settings and the persisted store.
///
/// Manages two YAML files:
/// - Settings (`wezconf.yaml`): import limits and parser switches, layered
///   under `WEZCONF_*` environment variables
/// - Store (`wezconf-store.yaml`): modified options and profiles
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    store_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager rooted at `config_dir`, creating it if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE_NAME),
            store_path: config_dir.join(STORE_FILE_NAME),
            config_dir,
        })
    }

    /// Use a settings file outside the config directory.
    pub fn with_settings_path<P: Into<Utf8PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = path.into();
        self
    }

    /// Use a store file outside the config directory.
    pub fn with_store_path<P: Into<Utf8PathBuf>>(mut self, path: P) -> Self {
        self.store_path = path.into();
        self
    }

    /// Load importer settings.
    ///
    /// Sources, later overriding earlier: built-in defaults, the settings file
    /// (optional), then `WEZCONF_*` environment variables with `__` separating
    /// nested keys.
    pub fn load_settings(&self) -> Result<ImporterSettings> {
        if !self.settings_path.exists() {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings: ImporterSettings = Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("text_extensions")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Save importer settings.
    pub fn save_settings(&self, settings: &ImporterSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the persisted editor state.
    ///
    /// # Returns
    /// The stored state, or an empty one if the file doesn't exist
    pub fn load_store(&self) -> Result<EditorState> {
        if !self.store_path.exists() {
            tracing::debug!("Store file not found at {}, starting empty", self.store_path);
            return Ok(EditorState::default());
        }

        let file_contents = fs::read_to_string(&self.store_path)
            .with_context(|| format!("Failed to read store: {}", self.store_path))?;

        let state: EditorState = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse store: {}", self.store_path))?;

        tracing::info!(
            "Loaded store from {} ({} modified, {} profiles)",
            self.store_path,
            state.config.len(),
            state.profiles.len()
        );
        Ok(state)
    }

    /// Save the editor state.
    pub fn save_store(&self, state: &EditorState) -> Result<()> {
        if let Some(parent) = self.store_path.parent()
            && !parent.as_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {}", parent))?;
        }

        let yaml_string =
            serde_yaml_ng::to_string(state).context("Failed to serialize store to YAML")?;

        fs::write(&self.store_path, yaml_string)
            .with_context(|| format!("Failed to write store: {}", self.store_path))?;

        tracing::info!("Saved store to {}", self.store_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn store_path(&self) -> &Utf8Path {
        &self.store_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsedValue;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.settings_path().ends_with(SETTINGS_FILE_NAME));
        assert!(manager.store_path().ends_with(STORE_FILE_NAME));
    }

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        let settings = manager.load_settings().unwrap();
        assert_eq!(settings.limits, ImporterSettings::default().limits);
    }

    #[test]
    fn test_load_save_settings() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut settings = ImporterSettings::default();
        settings.limits.max_entry_bytes = 2048;
        settings.preserve_unknown_keys = false;
        manager.save_settings(&settings).unwrap();

        let loaded = manager.load_settings().unwrap();
        assert_eq!(loaded.limits.max_entry_bytes, 2048);
        assert!(!loaded.preserve_unknown_keys);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert_eq!(manager.load_store().unwrap(), EditorState::default());
    }

    #[test]
    fn test_load_save_store() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut state = EditorState::default();
        state
            .config
            .insert("font_size".to_string(), ParsedValue::Number(15.0));
        state.config.insert(
            "keys".to_string(),
            ParsedValue::List(vec![ParsedValue::from(vec!["t", "CTRL"])]),
        );
        state.config.insert("term".to_string(), ParsedValue::from("true"));
        manager.save_store(&state).unwrap();

        assert_eq!(manager.load_store().unwrap(), state);
    }
}
