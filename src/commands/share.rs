//! Share command: print the configuration as a link or bare query.

use shelf_archiver_core::{KeyValueStore, Session, encode_shared_query};
use tracing::warn;

use crate::ProcessExit;
use crate::cli::ShareArgs;
use crate::commands::CommandContext;

pub(crate) fn run_share_command<S: KeyValueStore>(
    session: &Session<S>,
    ctx: &CommandContext,
    args: &ShareArgs,
) -> ProcessExit {
    let config = session.configuration();
    if config.is_empty() {
        warn!("Sharing an empty configuration");
    }

    let base_url = args
        .base_url
        .as_deref()
        .or(ctx.settings.share_base_url.as_deref());
    match base_url {
        Some(base_url) => println!("{}", session.share_link(base_url)),
        None => println!("{}", encode_shared_query(config)),
    }
    ProcessExit::Success
}
