//! Services module - the import pipeline for zipped WezTerm configurations.
//!
//! Everything here is framework-agnostic: no terminal output, no persistence.
//! Each stage takes an immutable input and returns a new value.
//!
//! # Components
//!
//! - [`value_parser`]: literal parsing (`true`, `14`, `"text"`, `{ ... }`) with
//!   linear-time quote and brace matching
//! - [`ScriptParser`]: best-effort extraction of `config.<key> = ...`, `colors`
//!   and `window_padding` from one Lua file, under size and time budgets
//! - [`extract_archive`]: zip bytes to an in-memory file map
//! - [`resolve_graph`]: entry point detection and `require` traversal
//! - [`merge`]: first-writer-wins merge with list concatenation and conflict detection
//! - [`generate_script`]: renders a mapping back to `wezterm.lua`
//! - [`ImportService`]: validation plus the stages above, sync or async
//!
//! # Pipeline
//!
//! 1. Validate name and size (`.zip`, 10 MiB) before reading anything
//! 2. Extract entries, reading only text extensions
//! 3. Resolve the entry point and follow `require` calls depth-first
//! 4. Parse each resolved file; a failed file becomes a warning
//! 5. Merge, entry first, and hand the result to a [`ConfigSink`](crate::state::ConfigSink)
//!
//! # Usage Example
//!
//! ```ignore
//! use wezconf::services::ImportService;
//!
//! let service = ImportService::default();
//! let result = service.import_bytes("dotfiles.zip", &bytes)?;
//! let merged = service.merge(&result);
//! let report = service.report(&result, &merged);
//! ```

pub mod archive;
pub mod generator;
pub mod importer;
pub mod merger;
pub mod resolver;
pub mod script_parser;
pub mod value_parser;

pub use archive::{extract_archive, normalize_path};
pub use generator::{generate_script, serialize_value};
pub use importer::{EMPTY_CONTENT, ImportError, ImportService};
pub use merger::merge;
pub use resolver::{derive_module_name, extract_requires, find_entry, resolve_graph};
pub use script_parser::{ParseError, ScriptParser, parse_script};
pub use value_parser::parse_scalar_or_array;
