//! Search command: query the catalog and archive selected results.

use shelf_archiver_core::{BookRecord, KeyValueStore, SearchScope, Session, StatusMessage};
use tracing::{debug, warn};

use crate::ProcessExit;
use crate::cli::SearchArgs;
use crate::commands::{CommandContext, report_failure};
use crate::terminal::Activity;

pub(crate) async fn run_search_command<S: KeyValueStore>(
    session: &mut Session<S>,
    ctx: &CommandContext,
    args: &SearchArgs,
) -> ProcessExit {
    let query = args.query_text();
    let scope = SearchScope::from(args.scope);

    let activity = Activity::start(ctx.show_progress, format!("Searching for '{query}'..."));
    let outcome = session.search(&query, scope).await;
    activity.finish();

    let books = match outcome {
        Ok(books) => books,
        Err(error) => return report_failure(ctx, &error),
    };
    debug!(results = books.len(), scope = scope.as_wire(), "Catalog search finished");

    if books.is_empty() {
        println!("{}", StatusMessage::info("No books found."));
        if args.save.is_empty() {
            return ProcessExit::Success;
        }
    }
    for (index, book) in books.iter().enumerate() {
        print_book(index + 1, book);
    }

    if args.save.is_empty() {
        return ProcessExit::Success;
    }
    let selected = match select_books(&books, &args.save) {
        Ok(selected) => selected,
        Err(message) => {
            eprintln!("{}", StatusMessage::error(message));
            return ProcessExit::Failure;
        }
    };
    archive_selected(session, ctx, &selected).await
}

async fn archive_selected<S: KeyValueStore>(
    session: &mut Session<S>,
    ctx: &CommandContext,
    books: &[&BookRecord],
) -> ProcessExit {
    let activity = Activity::start(ctx.show_progress, "Reading database columns...");
    // Without a fresh schema the default column names are used.
    if !session.configuration().access_token.trim().is_empty()
        && let Err(error) = session.refresh_collections().await
    {
        warn!(error = %error, "Schema discovery failed; using default column names");
    }

    for book in books {
        activity.set_message(format!("Archiving '{}'...", book.title));
        match session.archive(book).await {
            Ok(receipt) => {
                let location = receipt.url.as_deref().unwrap_or(&receipt.page_id);
                println!(
                    "{}",
                    StatusMessage::success(format!("Archived '{}' ({location}).", book.title))
                );
            }
            Err(error) => {
                activity.finish();
                return report_failure(ctx, &error);
            }
        }
    }
    activity.finish();
    ProcessExit::Success
}

/// Resolves 1-based `indexes` against `books`, keeping order and dropping repeats.
fn select_books<'a>(
    books: &'a [BookRecord],
    indexes: &[u32],
) -> Result<Vec<&'a BookRecord>, String> {
    let mut seen = Vec::new();
    let mut selected = Vec::new();
    for &index in indexes {
        let position = usize::try_from(index).unwrap_or(usize::MAX);
        let Some(book) = position.checked_sub(1).and_then(|slot| books.get(slot)) else {
            return Err(format!(
                "Result {index} does not exist; the search returned {} result(s).",
                books.len()
            ));
        };
        if seen.contains(&position) {
            continue;
        }
        seen.push(position);
        selected.push(book);
    }
    Ok(selected)
}

fn print_book(number: usize, book: &BookRecord) {
    println!("{number:>2}. {}", book.title);
    let mut details = Vec::new();
    for value in [&book.author, &book.publisher, &book.pub_date] {
        if !value.trim().is_empty() {
            details.push(value.as_str());
        }
    }
    if !details.is_empty() {
        println!("    {}", details.join(" | "));
    }
    if !book.source_link.is_empty() {
        println!("    {}", book.source_link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            ..BookRecord::default()
        }
    }

    #[test]
    fn test_select_books_is_one_based_and_ordered() {
        let books = vec![book("a"), book("b"), book("c")];
        let selected = select_books(&books, &[3, 1]).unwrap();
        let titles: Vec<_> = selected.iter().map(|book| book.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);
    }

    #[test]
    fn test_select_books_drops_repeats() {
        let books = vec![book("a"), book("b")];
        let selected = select_books(&books, &[2, 2, 2]).unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_select_books_rejects_out_of_range() {
        let books = vec![book("a")];
        let message = select_books(&books, &[2]).unwrap_err();
        assert!(message.contains("Result 2"));
        assert!(select_books(&[], &[1]).is_err());
    }
}
