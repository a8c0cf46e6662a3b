// wezconf - Import engine for zipped WezTerm Lua configurations
//
// This is the library crate containing the import pipeline, option catalog and store.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::ImportMetrics;
pub use models::{
    EditorState, FileConfig, ImportReport, ImportResult, ImporterSettings, MergedConfig,
    OptionRegistry, ParsedValue,
};
pub use services::{ImportError, ImportService, ParseError};
pub use state::{ConfigSink, ConfigStore, StoreChange};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
