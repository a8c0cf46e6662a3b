//! Data models for the wezconf importer.
//!
//! - [`ParsedValue`] / [`FileConfig`]: literal values recovered from Lua scripts
//! - [`OptionRegistry`]: the static catalog of WezTerm options and their defaults
//! - [`ImporterSettings`]: limits and switches loaded from `wezconf.yaml`
//! - [`ImportResult`], [`MergedConfig`], [`ImportReport`]: what one archive import produces
//! - [`EditorState`]: persisted editor configuration and profiles
//!
//! # Architecture Note
//!
//! Import models are created fresh per archive and never mutated after
//! construction. Only `MergedConfig.config` outlives an import, handed to the
//! [`ConfigStore`](crate::state::ConfigStore), which wraps `EditorState` in
//! `Arc<RwLock<>>`.

pub mod config;
pub mod editor_state;
pub mod import;
pub mod options;
pub mod value;

pub use config::{ArchiveSettings, ImportLimits, ImporterSettings, ParserSettings};
pub use editor_state::{EditorState, Profile};
pub use import::{
    Conflict, FileKeys, FileMap, ImportReport, ImportResult, KeyStatus, MergedConfig, MergedKey,
    ModuleGraph, ResolvedGraph, SourcedValue,
};
pub use options::{OptionKind, OptionRegistry, OptionSpec, ValueType};
pub use value::{FileConfig, ParsedValue};
