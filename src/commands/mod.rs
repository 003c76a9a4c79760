//! CLI command handlers.
//!
//! Each handler runs one user action against the session. Action failures
//! are printed as a status line and turned into a failing exit; only setup
//! problems propagate as `anyhow` errors.

mod collections;
mod config;
mod open;
mod search;
mod share;

use std::path::PathBuf;

use shelf_archiver_core::ActionError;

use crate::ProcessExit;
use crate::app_config::{LoadedConfig, RuntimeSettings};

pub(crate) use collections::run_collections_command;
pub(crate) use config::{run_config_path_command, run_config_set_command, run_config_show_command};
pub(crate) use open::{apply_startup_link, run_open_command, startup_link_from_env};
pub(crate) use search::run_search_command;
pub(crate) use share::run_share_command;

/// Values every handler may need besides the session.
#[derive(Debug)]
pub(crate) struct CommandContext {
    pub settings: RuntimeSettings,
    pub loaded: LoadedConfig,
    /// Location of the persisted credential state.
    pub state_path: PathBuf,
    /// Show a spinner while a call is in flight.
    pub show_progress: bool,
    /// Print the failure descriptor after the status line.
    pub explain_failures: bool,
}

/// Prints `error` as a status line on stderr and returns the failing exit.
pub(crate) fn report_failure(ctx: &CommandContext, error: &ActionError) -> ProcessExit {
    eprintln!("{}", error.status());
    if ctx.explain_failures {
        eprintln!("{}", error.describe().render());
    }
    ProcessExit::Failure
}

/// Display value for an optional text field.
pub(crate) fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "<not set>"
    } else {
        value
    }
}
