use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Importer settings, loaded from `wezconf.yaml` and `WEZCONF_*` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterSettings {
    pub limits: ImportLimits,

    /// Archive entries with these extensions are read as text.
    pub text_extensions: Vec<String>,

    /// Keep `config.<key>` assignments whose key the option registry does not know.
    pub preserve_unknown_keys: bool,
}

/// Resource ceilings applied to untrusted archives and scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLimits {
    pub max_archive_bytes: u64,
    pub max_script_bytes: usize,
    pub max_entry_bytes: u64,
    pub parse_timeout_ms: u64,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 10 * 1024 * 1024,
            max_script_bytes: 1024 * 1024,
            max_entry_bytes: 4 * 1024 * 1024,
            parse_timeout_ms: 5_000,
        }
    }
}

impl ImportLimits {
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_millis(self.parse_timeout_ms)
    }
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            limits: ImportLimits::default(),
            text_extensions: ["lua", "txt", "conf", "json"]
                .into_iter()
                .map(String::from)
                .collect(),
            preserve_unknown_keys: true,
        }
    }
}

/// Settings the script parser needs, split out so it can be built without
/// the archive-level configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserSettings {
    pub max_script_bytes: usize,
    pub time_budget: Duration,
    pub preserve_unknown_keys: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ImporterSettings::default().parser_settings()
    }
}

/// Settings the archive extractor needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSettings {
    pub text_extensions: Vec<String>,
    pub max_entry_bytes: u64,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        ImporterSettings::default().archive_settings()
    }
}

impl ImporterSettings {
    pub fn parser_settings(&self) -> ParserSettings {
        ParserSettings {
            max_script_bytes: self.limits.max_script_bytes,
            time_budget: self.limits.parse_timeout(),
            preserve_unknown_keys: self.preserve_unknown_keys,
        }
    }

    pub fn archive_settings(&self) -> ArchiveSettings {
        ArchiveSettings {
            text_extensions: self.text_extensions.clone(),
            max_entry_bytes: self.limits.max_entry_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importer_settings_defaults() {
        let settings = ImporterSettings::default();
        assert_eq!(settings.limits.max_archive_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.limits.max_script_bytes, 1_048_576);
        assert_eq!(settings.limits.parse_timeout(), Duration::from_secs(5));
        assert!(settings.preserve_unknown_keys);
        assert_eq!(settings.text_extensions, vec!["lua", "txt", "conf", "json"]);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "limits:\n  parse_timeout_ms: 250\n";
        let settings: ImporterSettings = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(settings.limits.parse_timeout_ms, 250);
        assert_eq!(settings.limits.max_script_bytes, 1_048_576);
        assert_eq!(settings.text_extensions.len(), 4);
    }

    #[test]
    fn test_derived_settings() {
        let settings = ImporterSettings::default();
        let parser = settings.parser_settings();
        assert_eq!(parser.max_script_bytes, settings.limits.max_script_bytes);
        assert_eq!(parser.time_budget, Duration::from_secs(5));

        let archive = settings.archive_settings();
        assert_eq!(archive.max_entry_bytes, 4 * 1024 * 1024);
    }
}
