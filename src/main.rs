//! CLI entry point for shelf-archiver.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shelf_archiver_core::{
    CatalogClient, ConfigStore, DatabaseClient, FileKeyValueStore, ProxyFetchClient, Session,
    Transport,
};
use tracing::{debug, info};

mod app_config;
mod cli;
mod commands;
mod terminal;

use app_config::{RuntimeSettings, load_default_file_config};
use cli::{Cli, Command, ConfigCommand};
use commands::CommandContext;

/// Process outcome of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse first so --help and --version work without logs.
    let cli = Cli::parse();

    match run(cli).await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ProcessExit> {
    let loaded = load_default_file_config()?;
    let file_config = loaded.config.clone().unwrap_or_default();

    let default_level =
        terminal::resolve_default_log_level(&cli.global, file_config.verbosity);
    terminal::init_tracing(
        default_level,
        terminal::should_force_cli_log_level(&cli.global),
        terminal::is_no_color_requested(),
    );
    // Arguments are not logged: `config set` carries credentials.
    debug!(
        settings_loaded = loaded.loaded_from_file(),
        "CLI arguments parsed"
    );

    let settings = RuntimeSettings::resolve(&cli.global, &file_config)?;
    info!(transport = settings.transport.name(), "shelf-archiver starting");

    let backend = FileKeyValueStore::at_default_path()
        .context("Cannot locate a configuration directory; set XDG_CONFIG_HOME or HOME")?;
    let state_path = backend.path().to_path_buf();

    let transport: Arc<dyn Transport> = Arc::new(
        ProxyFetchClient::with_settings(settings.transport.clone(), settings.http)
            .context("Failed to build HTTP client")?,
    );
    let mut session = Session::new(
        ConfigStore::open(backend),
        CatalogClient::new(Arc::clone(&transport)).with_max_results(settings.max_results),
        DatabaseClient::new(transport).with_api_version(settings.api_version.clone()),
    );

    // `open` applies its own link explicitly.
    if !matches!(cli.command, Command::Open(_)) {
        let startup_link = commands::startup_link_from_env();
        commands::apply_startup_link(&mut session, startup_link.as_deref()).await;
    }

    let ctx = CommandContext {
        show_progress: terminal::should_use_spinner(
            io::stderr().is_terminal(),
            cli.global.quiet,
            terminal::is_dumb_terminal(),
        ),
        explain_failures: cli.global.verbose > 0,
        settings,
        loaded,
        state_path,
    };

    let exit = match &cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Show => commands::run_config_show_command(&session, &ctx),
            ConfigCommand::Set(args) => commands::run_config_set_command(&mut session, &ctx, args),
            ConfigCommand::Path => commands::run_config_path_command(&ctx),
        },
        Command::Share(args) => commands::run_share_command(&session, &ctx, args),
        Command::Open(args) => commands::run_open_command(&mut session, &ctx, args).await,
        Command::Collections(args) => {
            commands::run_collections_command(&mut session, &ctx, args).await
        }
        Command::Search(args) => commands::run_search_command(&mut session, &ctx, args).await,
    };
    Ok(exit)
}
