// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — turn a stack of images into a single PDF.
//
// Entry point. Initialises logging, loads settings, builds the backend
// services, and dispatches the subcommand.

mod cli;
mod commands;
mod services;

use std::process::ExitCode;

use clap::Parser;
use folio_core::FolioConfig;
use folio_core::error::Result;
use folio_core::human_errors::humanize_error;

use cli::{Cli, Command};
use services::app_services::AppServices;
use services::data_dir::default_config_path;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Folio starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(default_config_path);
    let mut config = FolioConfig::load(&path)?;

    match cli.command {
        Command::Build(args) => {
            args.apply_to(&mut config);
            config.validate()?;
            let services = AppServices::init(config);
            let summary = commands::build(&services, &args).await?;
            commands::print_json(&summary)
        }
        Command::Order { inputs } => {
            let report = commands::order(&inputs)?;
            commands::print_json(&report)
        }
        Command::Assess => {
            let services = AppServices::init(config);
            let state = services.device_state();
            commands::print_json(&*state)
        }
    }
}
