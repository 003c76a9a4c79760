//! Config command handlers: show, set, and locate stored configuration.

use shelf_archiver_core::config::mask_secret;
use shelf_archiver_core::{ConfigField, KeyValueStore, Session, StatusMessage};
use tracing::info;

use crate::ProcessExit;
use crate::cli::ConfigSetArgs;
use crate::commands::{CommandContext, or_unset, report_failure};

pub(crate) fn run_config_show_command<S: KeyValueStore>(
    session: &Session<S>,
    ctx: &CommandContext,
) -> ProcessExit {
    let config = session.configuration();
    println!("state_file = {}", ctx.state_path.display());
    println!("settings_file = {}", settings_file_label(ctx));
    println!(
        "access_token = {}",
        or_unset(&mask_secret(&config.access_token))
    );
    println!(
        "target_collection_id = {}",
        or_unset(&config.target_collection_id)
    );
    println!("catalog_key = {}", or_unset(&mask_secret(&config.catalog_key)));
    println!("transport = {}", ctx.settings.transport.name());
    println!("max_results = {}", ctx.settings.max_results);
    println!("notion_version = {}", ctx.settings.api_version);
    println!(
        "verbosity = {}",
        ctx.loaded
            .config
            .as_ref()
            .and_then(|config| config.verbosity)
            .map_or("default", |verbosity| verbosity.as_str())
    );
    ProcessExit::Success
}

pub(crate) fn run_config_set_command<S: KeyValueStore>(
    session: &mut Session<S>,
    ctx: &CommandContext,
    args: &ConfigSetArgs,
) -> ProcessExit {
    let updates = [
        (ConfigField::AccessToken, args.token.as_deref()),
        (ConfigField::TargetCollectionId, args.collection.as_deref()),
        (ConfigField::CatalogKey, args.catalog_key.as_deref()),
    ];

    let mut saved = Vec::new();
    for (field, value) in updates {
        let Some(value) = value else {
            continue;
        };
        if let Err(error) = session.update_field(field, value) {
            return report_failure(ctx, &error);
        }
        info!(field = field.storage_key(), "Configuration field updated");
        saved.push(field.label());
    }

    println!(
        "{}",
        StatusMessage::success(format!("Saved {}.", saved.join(", ")))
    );
    ProcessExit::Success
}

pub(crate) fn run_config_path_command(ctx: &CommandContext) -> ProcessExit {
    println!("state_file = {}", ctx.state_path.display());
    println!("settings_file = {}", settings_file_label(ctx));
    ProcessExit::Success
}

fn settings_file_label(ctx: &CommandContext) -> String {
    let Some(path) = ctx.loaded.path.as_ref() else {
        return "<unresolved>".to_string();
    };
    if ctx.loaded.loaded_from_file() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    }
}
