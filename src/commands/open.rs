//! Shared links: the `open` command and the start-up link from the environment.

use shelf_archiver_core::{KeyValueStore, Session, StatusMessage};
use tracing::{info, warn};

use crate::ProcessExit;
use crate::cli::OpenArgs;
use crate::commands::{CommandContext, report_failure};
use crate::terminal::Activity;

/// Environment variable holding a shared link applied before any command runs.
pub(crate) const STARTUP_LINK_ENV: &str = "SHELF_ARCHIVER_LINK";

/// Shared link from [`STARTUP_LINK_ENV`], when set and non-blank.
pub(crate) fn startup_link_from_env() -> Option<String> {
    std::env::var(STARTUP_LINK_ENV)
        .ok()
        .filter(|link| !link.trim().is_empty())
}

/// Applies a start-up shared link without failing the command that follows.
///
/// A broken link keeps the stored configuration; a discovery failure is only logged.
pub(crate) async fn apply_startup_link<S: KeyValueStore>(
    session: &mut Session<S>,
    link: Option<&str>,
) {
    let outcome = session.bootstrap(link).await;
    if !outcome.applied_shared {
        return;
    }
    info!(
        source = STARTUP_LINK_ENV,
        discovered = ?outcome.discovered,
        "Shared configuration applied at start-up"
    );
    if let Some(error) = outcome.discovery_error {
        warn!(error = %error, "Database discovery after start-up link failed");
    }
}

pub(crate) async fn run_open_command<S: KeyValueStore>(
    session: &mut Session<S>,
    ctx: &CommandContext,
    args: &OpenArgs,
) -> ProcessExit {
    let activity = Activity::start(ctx.show_progress, "Applying shared configuration...");
    let outcome = session.open_shared_link(&args.link).await;
    activity.finish();

    let bootstrap = match outcome {
        Ok(bootstrap) => bootstrap,
        Err(error) => return report_failure(ctx, &error),
    };

    println!("{}", StatusMessage::success("Shared configuration applied."));
    if let Some(count) = bootstrap.discovered {
        println!(
            "{}",
            StatusMessage::info(format!("Found {count} database(s) for this token."))
        );
    }
    if let Some(error) = bootstrap.discovery_error {
        // Configuration is saved; only discovery failed.
        return report_failure(ctx, &error);
    }
    ProcessExit::Success
}
