/*
 * catalog-admin - browse and edit a product catalog from the terminal
 *
 * SPDX-FileCopyrightText: 2025-2026 Steve Schoettler
 * SPDX-License-Identifier: Apache-2.0
 */
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::option_if_let_else)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unused_async)]

mod cli;

use std::{fs::OpenOptions, io::IsTerminal, path::Path, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[tokio::main]
async fn main() {
    // clap exits with status 2 on usage errors
    let cli = cli::Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err:#}");
        let code = if err.downcast_ref::<cli::UsageError>().is_some() {
            EXIT_USAGE
        } else {
            EXIT_FAILURE
        };
        std::process::exit(code);
    }
}

async fn run(cli: cli::Cli) -> Result<()> {
    init_tracing(cli.verbose, cli.log_file.as_deref(), cli.is_tui())?;
    cli::run(cli).await
}

fn init_tracing(verbose: u8, log_file: Option<&Path>, tui: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = std::env::var("RUST_LOG").map_or_else(
        |_| {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(level)
        },
        EnvFilter::new,
    );

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if !tui {
        fmt()
            .with_env_filter(filter)
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .init();
    }
    // the browser owns the terminal; without a log file, logs are discarded
    Ok(())
}
