//! Collections command: list databases and optionally select the target.

use shelf_archiver_core::schema::Reconciliation;
use shelf_archiver_core::{ConfigField, KeyValueStore, Session, StatusMessage};

use crate::ProcessExit;
use crate::cli::CollectionsArgs;
use crate::commands::{CommandContext, report_failure};
use crate::terminal::Activity;

pub(crate) async fn run_collections_command<S: KeyValueStore>(
    session: &mut Session<S>,
    ctx: &CommandContext,
    args: &CollectionsArgs,
) -> ProcessExit {
    let activity = Activity::start(ctx.show_progress, "Discovering databases...");
    let refreshed = session.refresh_collections().await.map(<[_]>::len);
    activity.finish();

    let count = match refreshed {
        Ok(count) => count,
        Err(error) => return report_failure(ctx, &error),
    };

    if let Some(id) = args.select.as_deref() {
        let id = id.trim();
        if !session.collections().iter().any(|collection| collection.id == id) {
            eprintln!(
                "{}",
                StatusMessage::error(format!(
                    "Database '{id}' is not shared with this token. Pick one of the listed ids."
                ))
            );
            print_collections(session);
            return ProcessExit::Failure;
        }
        if let Err(error) = session.update_field(ConfigField::TargetCollectionId, id) {
            return report_failure(ctx, &error);
        }
        println!("{}", StatusMessage::success(format!("Target database set to {id}.")));
    }

    if count == 0 {
        println!(
            "{}",
            StatusMessage::info("No databases are shared with this token.")
        );
        return ProcessExit::Success;
    }

    print_collections(session);
    if session.active_collection().is_some() {
        print_binding(&session.reconciliation());
    }
    ProcessExit::Success
}

fn print_collections<S: KeyValueStore>(session: &Session<S>) {
    let active_id = session.configuration().target_collection_id.trim();
    for collection in session.collections() {
        let marker = if collection.id == active_id { "*" } else { " " };
        println!(
            "{marker} {}  {}  ({} columns)",
            collection.id,
            collection.display_title,
            collection.schema.len()
        );
    }
}

fn print_binding(reconciliation: &Reconciliation) {
    println!();
    println!("title  -> {}", column_label(&reconciliation.map.title_column));
    println!("author -> {}", column_label(&reconciliation.map.author_column));
    println!("link   -> {}", column_label(&reconciliation.map.link_column));
    for diagnostic in &reconciliation.type_errors {
        println!("{}", StatusMessage::info(diagnostic.as_str()));
    }
}

fn column_label(column: &str) -> &str {
    if column.is_empty() { "(skipped)" } else { column }
}
