//! Shelf Archiver Core Library
//!
//! Searches a book catalog and archives chosen books as pages in a workspace
//! database, using only the credentials the user supplies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Credential configuration, its persisted store, and shareable links
//! - [`proxy`] - Outbound calls routed directly, through a relay, or through a public proxy
//! - [`catalog`] - Catalog keyword search and book ingestion
//! - [`database`] - Database discovery and page creation
//! - [`schema`] - Binding book fields to the columns of a live database schema
//! - [`session`] - The action boundary the CLI drives
//! - [`status`] - User-facing status lines and failure descriptors

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod database;
pub mod proxy;
pub mod schema;
pub mod session;
pub mod status;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use catalog::{BookRecord, CatalogClient, CatalogError, SearchScope};
pub use config::{
    ConfigField, ConfigStore, Configuration, FileKeyValueStore, KeyValueStore,
    MemoryKeyValueStore, ShareDecodeError, StorageError, build_share_link, decode_shared_query,
    encode_shared_query,
};
pub use database::{CollectionDescriptor, DatabaseClient, DatabaseError, Receipt};
pub use proxy::{
    FailureKind, FetchFailure, FetchOutcome, FetchRequest, FetchResponse, HttpSettings,
    ProxyFetchClient, Transport, TransportMode,
};
pub use schema::{
    ColumnDescriptor, ColumnKind, PropertyMap, Reconciliation, Role, reconcile,
    resolve_for_collection,
};
pub use session::{ActionError, Bootstrap, Session};
pub use status::{FailureCategory, FailureDescriptor, StatusMessage, StatusTone};
