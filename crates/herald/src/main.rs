// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - message dispatch service.
//!
//! This is the binary entry point: the queue worker, operator re-dispatch,
//! and the record listing.

mod bootstrap;
mod commands;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use herald_core::{MessageStatus, RecordId};

/// Herald - message dispatch service.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the queue worker until interrupted.
    Serve,
    /// Dispatch a stored message again.
    Dispatch {
        /// Message record id.
        id: RecordId,
        /// Queue the message for the worker instead of sending it now.
        #[arg(long = "async")]
        dispatch_async: bool,
        /// Also take a record stuck in pending, e.g. after a crash.
        #[arg(long)]
        force: bool,
    },
    /// List stored messages, newest first.
    List(ListArgs),
    /// List registered handlers in matching order.
    Handlers,
    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only messages of this handler type.
    #[arg(long = "type")]
    kind: Option<String>,
    /// NEW, PENDING, DONE, or ERROR.
    #[arg(long)]
    status: Option<MessageStatus>,
    #[arg(long)]
    language: Option<String>,
    /// Substring matched against type and recipients.
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    created_after: Option<String>,
    #[arg(long)]
    created_before: Option<String>,
    #[arg(long)]
    modified_after: Option<String>,
    #[arg(long)]
    modified_before: Option<String>,
    #[arg(long, default_value_t = 50)]
    limit: i64,
    /// Print records as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => herald_config::load_and_validate_path(path),
        None => herald_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    serve::init_tracing(&config.log.level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Dispatch {
            id,
            dispatch_async,
            force,
        }) => commands::run_dispatch(config, id, dispatch_async, force).await,
        Some(Commands::List(args)) => commands::run_list(config, args).await,
        Some(Commands::Handlers) => commands::run_handlers(&config),
        Some(Commands::Config) => commands::run_config(&config),
        None => {
            println!("herald: use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
