//! wezconf - Import zipped WezTerm configurations
//!
//! Main entry point for the command line tool.
//!
//! # Overview
//!
//! `wezconf import` reads a `.zip` of Lua files, finds `wezterm.lua`, follows its
//! `require` calls, extracts literal settings from every reachable file and
//! merges them into one configuration. The result can be printed (text or
//! JSON), rendered back to a single `wezterm.lua`, or applied to a persisted
//! store, optionally saved as a named profile.
//!
//! `wezconf options` lists every option the importer recognizes.
//!
//! # Execution Flow
//!
//! 1. Parse arguments and initialize logging (stderr, plus daily files with `--log-dir`)
//! 2. Load settings from `wezconf.yaml` and `WEZCONF_*` variables
//! 3. Read and validate the archive on a tokio runtime, decompress on the blocking pool
//! 4. Merge, report, then emit or apply as requested

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::fs;
use std::time::Duration;
use wezconf::logging::{LogOptions, setup_logging};
use wezconf::models::ImportReport;
use wezconf::services::generate_script;
use wezconf::{APP_NAME, ConfigManager, ConfigStore, ImportService, OptionRegistry, VERSION};

/// wezconf - Import modular WezTerm configurations from zip archives
#[derive(Parser)]
#[command(name = "wezconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: ./wezconf.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<Utf8PathBuf>,

    /// Also write daily-rotated log files to this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<Utf8PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a zipped configuration directory
    Import {
        /// Path to the .zip archive
        archive: Utf8PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write the merged configuration as a single wezterm.lua
        #[arg(long, value_name = "OUT.lua")]
        emit: Option<Utf8PathBuf>,

        /// Apply the merged configuration to this store file
        #[arg(long, value_name = "STORE.yaml")]
        store: Option<Utf8PathBuf>,

        /// Save the imported store state as a new profile (requires --store)
        #[arg(long, value_name = "NAME", requires = "store")]
        profile: Option<String>,
    },

    /// List every recognized option with its type and default
    Options,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(&LogOptions {
        log_dir: cli.log_dir.clone(),
        log_prefix: APP_NAME.to_string(),
        debug: cli.debug,
        json_file: false,
    })?;

    tracing::debug!("Starting {} v{}", APP_NAME, VERSION);

    let mut config_manager = ConfigManager::new(".")?;
    if let Some(path) = &cli.settings {
        config_manager = config_manager.with_settings_path(path.clone());
    }

    match cli.command {
        Commands::Import {
            archive,
            json,
            emit,
            store,
            profile,
        } => {
            let settings = config_manager.load_settings()?;
            let service = ImportService::new(settings);

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .thread_name("wezconf-worker")
                .build()
                .context("Failed to create tokio runtime")?;

            let result = runtime
                .block_on(service.import_file(&archive))
                .with_context(|| format!("Failed to import {}", archive))?;
            runtime.shutdown_timeout(Duration::from_secs(5));

            let merged = service.merge(&result);
            let report = service.report(&result, &merged);

            if json {
                let output = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize report to JSON")?;
                println!("{output}");
            } else {
                print_report(&report);
            }

            if let Some(out) = emit {
                let script = generate_script(&merged.config, OptionRegistry::builtin());
                fs::write(&out, script).with_context(|| format!("Failed to write {}", out))?;
                tracing::info!("Wrote merged configuration to {}", out);
            }

            if let Some(store_path) = store {
                let config_manager = config_manager.with_store_path(store_path);
                let store = ConfigStore::from_state(config_manager.load_store()?);
                service.apply(&merged, &store);

                if let Some(name) = profile {
                    store.create_profile(&name);
                }
                config_manager.save_store(&store.snapshot())?;
            }

            service.metrics().log_summary();
        }
        Commands::Options => print_options(OptionRegistry::builtin()),
    }

    Ok(())
}

fn print_report(report: &ImportReport) {
    match &report.entry_path {
        Some(entry) => println!("Entry point: {entry}"),
        None => println!("Entry point: (none)"),
    }

    println!("Resolved files ({}):", report.resolved.len());
    for file in &report.files {
        println!("  {} ({} keys)", file.path, file.keys.len());
    }

    println!(
        "Merged keys: {} ({} recognized)",
        report.total_keys, report.recognized_keys
    );
    for entry in &report.merged {
        let marker = if entry.recognized { " " } else { "?" };
        let source = entry.source.as_deref().unwrap_or("-");
        println!("  {marker} {} = {}  [{source}]", entry.key, entry.value);
    }

    if report.has_conflicts() {
        println!("Conflicts ({}):", report.conflicts.len());
        for conflict in &report.conflicts {
            println!("  {}", conflict.key);
            for sourced in &conflict.values {
                println!("    {} = {}", sourced.path, sourced.value);
            }
        }
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  {warning}");
        }
    }
}

fn print_options(registry: &OptionRegistry) {
    for spec in registry.iter() {
        let kind = format!("{:?}", spec.kind());
        println!("{:<36} {:<8} {:<32} {}", spec.id, kind, spec.name, spec.default);
    }
}
