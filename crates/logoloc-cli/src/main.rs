// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Logoloc: locate a known logo in scanned documents.
//
// Entry point. Initialises logging, loads configuration, and dispatches to a
// subcommand. Errors from the library are turned into an operator-facing
// message and an exit code.

mod args;
mod commands;
mod session;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use logoloc_core::config::LocatorConfig;
use logoloc_core::error::LocatorError;
use logoloc_core::human_errors::humanize_error;
use logoloc_store::JsonProfileStore;

use args::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = LocatorConfig::load(cli.config.as_deref())?;
    tracing::debug!(?config, "Configuration loaded");

    match &cli.command {
        Commands::Annotate(args) => commands::annotate::run(&config, args),
        Commands::Detect(args) => commands::detect::run(&config, args),
        Commands::Cut(args) => commands::cut::run(&config, args),
        Commands::Profiles(command) => {
            let store = JsonProfileStore::resolve(&config);
            commands::profiles::run(&store, command)
        }
    }
}

/// Print the error for a person and pick the exit code.
fn report(err: &anyhow::Error) -> ExitCode {
    let Some(locator_err) = err.chain().find_map(|e| e.downcast_ref::<LocatorError>()) else {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    };

    let human = humanize_error(locator_err);
    eprintln!("error: {}", human.message);
    eprintln!("  {}", human.suggestion);
    eprintln!("  ({err:#})");
    ExitCode::from(u8::try_from(human.severity.exit_code()).unwrap_or(1))
}
