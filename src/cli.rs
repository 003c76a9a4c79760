//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand, ValueEnum};
use shelf_archiver_core::SearchScope;

/// Search a book catalog and archive books into a workspace database.
///
/// Credentials are stored per user and can be moved between machines with
/// `share` and `open`.
#[derive(Parser, Debug)]
#[command(name = "shelf-archiver")]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted before any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// How outbound calls reach the services
    #[arg(long, value_enum, global = true)]
    pub transport: Option<TransportArg>,

    /// Same-origin relay endpoint (relay transport)
    #[arg(long, value_name = "URL", global = true)]
    pub relay_url: Option<String>,

    /// Public bridge endpoint (proxy transport)
    #[arg(long, value_name = "URL", global = true)]
    pub proxy_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show or edit stored credentials
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print a link that carries the stored configuration
    Share(ShareArgs),
    /// Apply configuration from a shared link
    Open(OpenArgs),
    /// List databases visible to the access token
    Collections(CollectionsArgs),
    /// Search the catalog and optionally archive results
    Search(SearchArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the stored configuration (secrets masked)
    Show,
    /// Update one or more stored values
    #[command(arg_required_else_help = true)]
    Set(ConfigSetArgs),
    /// Print the state and settings file locations
    Path,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSetArgs {
    /// Workspace integration token
    #[arg(long)]
    pub token: Option<String>,

    /// Target database id
    #[arg(long)]
    pub collection: Option<String>,

    /// Catalog API key
    #[arg(long)]
    pub catalog_key: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShareArgs {
    /// Base URL to prepend to the shared query
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct OpenArgs {
    /// Shared link or bare query string
    pub link: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CollectionsArgs {
    /// Make this database the archive target
    #[arg(long, value_name = "ID")]
    pub select: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Keywords to search for
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Catalog to search
    #[arg(long, value_enum, default_value_t = ScopeArg::Book)]
    pub scope: ScopeArg,

    /// Archive result N (1-based, repeatable)
    #[arg(long = "save", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub save: Vec<u32>,
}

impl SearchArgs {
    /// Query words joined with single spaces.
    #[must_use]
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportArg {
    /// Call services directly
    #[default]
    Direct,
    /// Call a same-origin relay with the target in a header
    Relay,
    /// Call a public bridge with the target as a query value
    Proxy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Book,
    Ebook,
}

impl From<ScopeArg> for SearchScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Book => Self::Book,
            ScopeArg::Ebook => Self::EBook,
        }
    }
}
