//! Shared User-Agent string for every outbound call.
//!
//! Catalog, database and relay traffic all identify the same way.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/shelf-archiver";

/// Default User-Agent for outbound calls.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("shelf-archiver/{version} (book-archiver; +{PROJECT_UA_URL})")
}
