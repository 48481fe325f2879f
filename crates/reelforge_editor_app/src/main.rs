// SPDX-License-Identifier: MIT OR Apache-2.0
//! ReelForge editor command-line front end.
//!
//! Loads pipeline workflows through the same graph model the canvas uses
//! to check, lay out and re-export them.

mod commands;
mod settings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use settings::{EditorSettings, DEFAULT_LOG_FILTER};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "reelforge-editor",
    version,
    about = "Check, lay out and export ReelForge pipeline workflows"
)]
struct Cli {
    /// RON settings file
    #[arg(long, global = true, env = "REELFORGE_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a workflow and report validation issues
    Check {
        /// Workflow JSON file
        file: PathBuf,
    },
    /// Print auto-layout positions for a workflow as JSON
    Layout {
        /// Workflow JSON file
        file: PathBuf,
    },
    /// Load a workflow and write it back in canonical form
    Export {
        /// Workflow JSON file
        file: PathBuf,
        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the node catalog
    Catalog,
    /// Write a settings file with every default filled in
    InitSettings {
        /// Destination RON file
        path: PathBuf,
    },
}

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli, settings: &EditorSettings) -> anyhow::Result<ExitCode> {
    let catalog = Arc::new(commands::load_catalog(settings)?);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Check { file } => {
            let store = commands::open_workflow(&file, catalog, settings)?;
            if !commands::check(&store, &mut out)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Layout { file } => {
            let mut store = commands::open_workflow(&file, catalog, settings)?;
            commands::layout(&mut store, settings, &mut out)?;
        }
        Command::Export { file, output } => {
            let store = commands::open_workflow(&file, catalog, settings)?;
            commands::export(&store, output.as_deref(), &mut out)?;
        }
        Command::Catalog => commands::catalog(&catalog, &mut out)?,
        Command::InitSettings { path } => {
            settings
                .save(&path)
                .with_context(|| format!("Failed to write settings {}", path.display()))?;
            tracing::info!("Wrote settings to {}", path.display());
        }
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => EditorSettings::load(path)
            .with_context(|| format!("Failed to load settings {}", path.display())),
        None => Ok(EditorSettings::default()),
    };
    let filter = settings
        .as_ref()
        .map_or(DEFAULT_LOG_FILTER, |s| s.log_filter.as_str());
    init_tracing(filter);

    let settings = settings?;
    tracing::debug!("ReelForge editor v{}", env!("CARGO_PKG_VERSION"));
    run(cli, &settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_with_output() {
        let cli = Cli::try_parse_from(["reelforge-editor", "export", "in.json", "-o", "out.json"])
            .unwrap();
        match cli.command {
            Command::Export { file, output } => {
                assert_eq!(file, PathBuf::from("in.json"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
