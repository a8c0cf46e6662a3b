use crate::metrics::ImportMetrics;
use crate::models::{
    FileConfig, FileKeys, FileMap, ImportReport, ImportResult, ImporterSettings, KeyStatus,
    MergedConfig, MergedKey, OptionRegistry,
};
use crate::services::archive::extract_archive;
use crate::services::merger::merge;
use crate::services::resolver::resolve_graph;
use crate::services::script_parser::ScriptParser;
use crate::state::ConfigSink;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Reason given for a resolved file that has no text to parse.
pub const EMPTY_CONTENT: &str =
    "no readable content (empty, not a text file, over the entry size limit or unreadable)";

/// Errors that abort an import
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Please select a .zip file (got {0})")]
    InvalidExtension(String),

    #[error("Archive is {size} bytes; the maximum is {max} bytes")]
    ArchiveTooLarge { size: u64, max: u64 },

    #[error("Failed to read zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Import task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Runs the import pipeline: validate, extract, resolve, parse, merge
///
/// The service holds no per-import state. Each call builds fresh values, so
/// one instance (or clones of it) can serve any number of imports.
///
/// # Usage Example
///
/// ```ignore
/// let service = ImportService::new(ImporterSettings::default());
/// let result = service.import_file(Utf8Path::new("dotfiles.zip")).await?;
/// let merged = service.merge(&result);
/// service.apply(&merged, &store);
/// ```
#[derive(Clone)]
pub struct ImportService {
    settings: ImporterSettings,
    registry: &'static OptionRegistry,
    metrics: Arc<ImportMetrics>,
}

impl ImportService {
    pub fn new(settings: ImporterSettings) -> Self {
        Self::with_metrics(settings, Arc::new(ImportMetrics::new()))
    }

    pub fn with_metrics(settings: ImporterSettings, metrics: Arc<ImportMetrics>) -> Self {
        Self {
            settings,
            registry: OptionRegistry::builtin(),
            metrics,
        }
    }

    pub fn settings(&self) -> &ImporterSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<ImportMetrics> {
        &self.metrics
    }

    /// Check the archive name and size before anything is read
    ///
    /// # Errors
    ///
    /// - [`ImportError::InvalidExtension`] unless the name ends in `.zip`
    /// - [`ImportError::ArchiveTooLarge`] above `max_archive_bytes`
    pub fn validate_archive_input(&self, name: &str, size: u64) -> Result<(), ImportError> {
        let result = if !name.to_ascii_lowercase().ends_with(".zip") {
            Err(ImportError::InvalidExtension(name.to_string()))
        } else if size > self.settings.limits.max_archive_bytes {
            Err(ImportError::ArchiveTooLarge {
                size,
                max: self.settings.limits.max_archive_bytes,
            })
        } else {
            Ok(())
        };

        if let Err(e) = &result {
            tracing::warn!("Rejected archive {}: {}", name, e);
            self.metrics.record_archive_rejected();
        }
        result
    }

    /// Run the synchronous pipeline over archive bytes already in memory
    pub fn import_bytes(&self, name: &str, bytes: &[u8]) -> Result<ImportResult, ImportError> {
        self.validate_archive_input(name, bytes.len() as u64)?;

        let file_map = extract_archive(bytes, &self.settings.archive_settings()).inspect_err(|e| {
            tracing::warn!("Failed to extract {}: {}", name, e);
            self.metrics.record_archive_rejected();
        })?;
        self.metrics.record_archive_imported();

        let graph = resolve_graph(&file_map);
        let (parsed_per_file, parse_warnings) = self.parse_resolved(&file_map, &graph.resolved);

        let mut warnings = graph.warnings.clone();
        warnings.extend(parse_warnings);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        self.metrics.record_warnings(warnings.len());

        tracing::info!(
            "Imported {}: {} files, {} resolved, {} warnings",
            name,
            file_map.len(),
            graph.resolved.len(),
            warnings.len()
        );

        Ok(ImportResult {
            file_map,
            graph,
            parsed_per_file,
            warnings,
        })
    }

    /// Validate from file metadata, then read and import on the blocking pool
    pub async fn import_file(&self, path: &Utf8Path) -> Result<ImportResult, ImportError> {
        let io_error = |source| ImportError::Io {
            path: path.to_owned(),
            source,
        };

        let name = path.file_name().unwrap_or(path.as_str()).to_string();
        let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
        self.validate_archive_input(&name, metadata.len())?;

        tracing::debug!("Reading archive {} ({} bytes)", path, metadata.len());
        let bytes = tokio::fs::read(path).await.map_err(io_error)?;

        let service = self.clone();
        tokio::task::spawn_blocking(move || service.import_bytes(&name, &bytes)).await?
    }

    /// Parse each resolved file; a failed file yields a warning and an empty config
    ///
    /// A resolved file with no text counts as failed. The extractor leaves
    /// content empty for non-text, oversized and unreadable entries, so this
    /// is where those gaps are reported.
    pub fn parse_resolved(
        &self,
        file_map: &FileMap,
        resolved: &[String],
    ) -> (IndexMap<String, FileConfig>, Vec<String>) {
        let parser = ScriptParser::new(self.registry, self.settings.parser_settings());
        let mut parsed = IndexMap::new();
        let mut warnings = Vec::new();

        for path in resolved {
            let text = file_map.get(path).map(String::as_str).unwrap_or_default();
            if text.trim().is_empty() {
                self.metrics.record_parse_failure();
                warnings.push(format!("Failed to parse {path}: {EMPTY_CONTENT}"));
                parsed.insert(path.clone(), FileConfig::new());
                continue;
            }

            let started = Instant::now();
            let config = match parser.parse(text) {
                Ok(config) => config,
                Err(e) => {
                    self.metrics.record_parse_failure();
                    warnings.push(format!("Failed to parse {path}: {e}"));
                    FileConfig::new()
                }
            };
            self.metrics.record_file_parsed(started.elapsed());
            tracing::debug!("Parsed {}: {} keys", path, config.len());
            parsed.insert(path.clone(), config);
        }

        (parsed, warnings)
    }

    pub fn merge(&self, result: &ImportResult) -> MergedConfig {
        let merged = merge(
            &result.parsed_per_file,
            result.entry_path(),
            result.resolved(),
            self.registry,
        );
        self.metrics.record_conflicts(merged.conflicts.len());
        for conflict in &merged.conflicts {
            tracing::debug!(
                "Conflicting values for {} across {} files",
                conflict.key,
                conflict.values.len()
            );
        }
        merged
    }

    pub fn report(&self, result: &ImportResult, merged: &MergedConfig) -> ImportReport {
        let merged_keys: Vec<MergedKey> = merged
            .config
            .iter()
            .map(|(key, value)| MergedKey {
                key: key.clone(),
                value: value.clone(),
                source: merged.sources.get(key).cloned(),
                recognized: self.registry.is_known(key),
            })
            .collect();

        let files = result
            .parsed_per_file
            .iter()
            .map(|(path, config)| FileKeys {
                path: path.clone(),
                keys: config
                    .keys()
                    .map(|key| KeyStatus {
                        key: key.clone(),
                        recognized: self.registry.is_known(key),
                    })
                    .collect(),
            })
            .collect();

        ImportReport {
            entry_path: result.graph.entry_path.clone(),
            resolved: result.graph.resolved.clone(),
            warnings: result.warnings.clone(),
            conflicts: merged.conflicts.clone(),
            total_keys: merged_keys.len(),
            recognized_keys: merged_keys.iter().filter(|entry| entry.recognized).count(),
            merged: merged_keys,
            files,
        }
    }

    /// Hand the merged values to a configuration sink
    pub fn apply(&self, merged: &MergedConfig, sink: &dyn ConfigSink) -> usize {
        let changed = sink.import_config(&merged.config);
        tracing::info!("Applied {} keys ({} changed)", merged.config.len(), changed);
        changed
    }
}

impl Default for ImportService {
    fn default() -> Self {
        Self::new(ImporterSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsedValue;
    use crate::state::MockConfigSink;
    use std::io::{Cursor, Write};
    use std::sync::atomic::Ordering;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_validate_archive_input() {
        let service = ImportService::default();
        assert!(service.validate_archive_input("dots.zip", 1024).is_ok());
        assert!(service.validate_archive_input("DOTS.ZIP", 1024).is_ok());
        assert!(matches!(
            service.validate_archive_input("dots.rar", 1024),
            Err(ImportError::InvalidExtension(_))
        ));
        assert!(matches!(
            service.validate_archive_input("dots.zip", 10 * 1024 * 1024 + 1),
            Err(ImportError::ArchiveTooLarge { .. })
        ));
        assert_eq!(service.metrics().archives_rejected.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_failed_file_becomes_warning() {
        let mut settings = ImporterSettings::default();
        settings.limits.max_script_bytes = 64;
        let service = ImportService::new(settings);

        let big = format!("config.font_size = 12\n{}", "-".repeat(100));
        let bytes = build_zip(&[("wezterm.lua", "require('big')"), ("big.lua", &big)]);
        let result = service.import_bytes("dots.zip", &bytes).unwrap();

        assert_eq!(result.resolved(), ["wezterm.lua", "big.lua"]);
        assert!(result.parsed_per_file["big.lua"].is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Failed to parse big.lua: File too large"));
    }

    #[test]
    fn test_oversized_entry_becomes_warning() {
        let mut settings = ImporterSettings::default();
        settings.limits.max_entry_bytes = 16;
        let service = ImportService::new(settings);

        let big = format!("config.font_size = 12\n{}", "-".repeat(64));
        let bytes = build_zip(&[("wezterm.lua", "require('big')"), ("big.lua", &big)]);
        let result = service.import_bytes("dots.zip", &bytes).unwrap();

        assert_eq!(result.resolved(), ["wezterm.lua", "big.lua"]);
        assert!(result.parsed_per_file["big.lua"].is_empty());
        assert_eq!(
            result.warnings,
            vec![format!("Failed to parse big.lua: {EMPTY_CONTENT}")]
        );
        assert_eq!(service.metrics().parse_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_empty_module_becomes_warning() {
        let bytes = build_zip(&[
            ("wezterm.lua", "config.font_size = 12\nrequire('theme')"),
            ("theme/init.lua", ""),
        ]);
        let result = ImportService::default()
            .import_bytes("dots.zip", &bytes)
            .unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Failed to parse theme/init.lua: "));
        assert_eq!(
            result.parsed_per_file["wezterm.lua"]["font_size"],
            ParsedValue::Number(12.0)
        );
    }

    #[test]
    fn test_report_flags_unrecognized_keys() {
        let service = ImportService::default();
        let bytes = build_zip(&[(
            "wezterm.lua",
            "config.font_size = 13\nconfig.totally_unknown_option = 5",
        )]);
        let result = service.import_bytes("dots.zip", &bytes).unwrap();
        let merged = service.merge(&result);
        let report = service.report(&result, &merged);

        assert_eq!(report.total_keys, 2);
        assert_eq!(report.recognized_keys, 1);
        let unknown: Vec<&str> = report.unrecognized_keys().map(|k| k.key.as_str()).collect();
        assert_eq!(unknown, vec!["totally_unknown_option"]);
        assert!(!report.files[0].keys[1].recognized);
    }

    #[test]
    fn test_apply_hands_merged_config_to_sink() {
        let service = ImportService::default();
        let mut merged = MergedConfig::default();
        merged
            .config
            .insert("term".to_string(), ParsedValue::from("xterm"));

        let mut sink = MockConfigSink::new();
        sink.expect_import_config()
            .withf(|values| values.len() == 1 && values.contains_key("term"))
            .times(1)
            .return_const(1usize);

        assert_eq!(service.apply(&merged, &sink), 1);
    }
}
