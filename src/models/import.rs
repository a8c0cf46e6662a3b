use crate::models::{FileConfig, ParsedValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Archive contents keyed by normalized path, in archive order.
pub type FileMap = IndexMap<String, String>;

/// Derived module name (`lua.theme` for `lua/theme.lua`) to every path sharing it.
pub type ModuleGraph = IndexMap<String, Vec<String>>;

/// Outcome of following `require` calls from the entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedGraph {
    pub entry_path: Option<String>,

    /// Distinct paths, entry first, then includes in pre-order.
    pub resolved: Vec<String>,

    pub modules: ModuleGraph,
    pub warnings: Vec<String>,
}

/// Everything produced from one archive before merging.
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub file_map: FileMap,
    pub graph: ResolvedGraph,
    pub parsed_per_file: IndexMap<String, FileConfig>,

    /// Resolver warnings followed by per-file parse failures.
    pub warnings: Vec<String>,
}

impl ImportResult {
    pub fn entry_path(&self) -> Option<&str> {
        self.graph.entry_path.as_deref()
    }

    pub fn resolved(&self) -> &[String] {
        &self.graph.resolved
    }
}

/// One file's value for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedValue {
    pub path: String,
    pub value: ParsedValue,
}

/// A key set to structurally different values by more than one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub key: String,
    pub values: Vec<SourcedValue>,
}

/// The single configuration produced from all parsed files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedConfig {
    pub config: FileConfig,

    /// File that supplied (or last extended) each key.
    pub sources: IndexMap<String, String>,

    pub conflicts: Vec<Conflict>,
}

/// Serializable summary of an import for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub entry_path: Option<String>,
    pub resolved: Vec<String>,
    pub warnings: Vec<String>,
    pub conflicts: Vec<Conflict>,
    pub merged: Vec<MergedKey>,
    pub total_keys: usize,
    pub recognized_keys: usize,
    pub files: Vec<FileKeys>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedKey {
    pub key: String,
    pub value: ParsedValue,
    pub source: Option<String>,
    pub recognized: bool,
}

/// Keys one file contributed, with whether the option registry knows each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileKeys {
    pub path: String,
    pub keys: Vec<KeyStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStatus {
    pub key: String,
    pub recognized: bool,
}

impl ImportReport {
    pub fn unrecognized_keys(&self) -> impl Iterator<Item = &MergedKey> {
        self.merged.iter().filter(|entry| !entry.recognized)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}
