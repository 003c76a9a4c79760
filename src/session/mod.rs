//! Process-wide session: the configuration store, both clients, and the
//! databases discovered with the current token.
//!
//! Every user action is one method here. Methods return [`ActionError`],
//! which the command layer turns into a status line; nothing retries.

mod error;

pub use error::ActionError;

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{BookRecord, CatalogClient, SearchScope};
use crate::config::{
    ConfigField, ConfigStore, Configuration, KeyValueStore, build_share_link, decode_shared_query,
};
use crate::database::{CollectionDescriptor, DatabaseClient, Receipt};
use crate::proxy::Transport;
use crate::schema::{Reconciliation, resolve_for_collection};

/// What happened while starting a session.
#[derive(Debug, Default)]
pub struct Bootstrap {
    /// A shared link was decoded and replaced the stored configuration.
    pub applied_shared: bool,
    /// Number of databases discovered right after applying the link.
    pub discovered: Option<usize>,
    /// Discovery failure after applying the link; the session is still usable.
    pub discovery_error: Option<ActionError>,
}

/// Action context shared by every command.
pub struct Session<S> {
    store: ConfigStore<S>,
    catalog: CatalogClient,
    database: DatabaseClient,
    collections: Vec<CollectionDescriptor>,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("catalog", &self.catalog)
            .field("database", &self.database)
            .field("collections", &self.collections.len())
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> Session<S> {
    /// Creates a session from explicit parts.
    #[must_use]
    pub fn new(store: ConfigStore<S>, catalog: CatalogClient, database: DatabaseClient) -> Self {
        Self {
            store,
            catalog,
            database,
            collections: Vec::new(),
        }
    }

    /// Creates a session over `backend` with production endpoints behind `transport`.
    #[must_use]
    pub fn with_transport(backend: S, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            ConfigStore::open(backend),
            CatalogClient::new(Arc::clone(&transport)),
            DatabaseClient::new(transport),
        )
    }

    /// Active configuration.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        self.store.current()
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    /// Applies a shared link when present, then discovers databases with the new token.
    ///
    /// Never fails: a broken link keeps the stored configuration and a
    /// discovery failure is reported in the returned [`Bootstrap`].
    pub async fn bootstrap(&mut self, shared: Option<&str>) -> Bootstrap {
        let Some(applied) = self.store.apply_shared_if_present(shared) else {
            return Bootstrap::default();
        };
        self.after_shared_applied(&applied).await
    }

    /// Explicitly applies a shared link.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Decode`] when the link cannot be decoded (stored
    /// configuration untouched) or [`ActionError::Storage`] when it cannot be saved.
    pub async fn open_shared_link(&mut self, link: &str) -> Result<Bootstrap, ActionError> {
        let decoded = decode_shared_query(link)?;
        self.store.save(decoded.clone())?;
        info!(collection_id = %decoded.target_collection_id, "Applied shared configuration");
        Ok(self.after_shared_applied(&decoded).await)
    }

    async fn after_shared_applied(&mut self, applied: &Configuration) -> Bootstrap {
        let mut outcome = Bootstrap {
            applied_shared: true,
            ..Bootstrap::default()
        };
        if applied.access_token.trim().is_empty() {
            return outcome;
        }
        match self.refresh_collections().await {
            Ok(collections) => outcome.discovered = Some(collections.len()),
            Err(error) => {
                warn!(error = %error, "Database discovery after shared link failed");
                outcome.discovery_error = Some(error);
            }
        }
        outcome
    }

    /// Updates and persists one configuration field, trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Storage`] when persisting fails; the in-memory
    /// value is updated regardless.
    pub fn update_field(&mut self, field: ConfigField, value: &str) -> Result<(), ActionError> {
        self.store.set_field(field, value.trim())?;
        Ok(())
    }

    /// Discovers databases with the current token, replacing the known list.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the token is empty or discovery fails; the
    /// previous list is kept on failure.
    pub async fn refresh_collections(&mut self) -> Result<&[CollectionDescriptor], ActionError> {
        let token = self.store.current().access_token.clone();
        let collections = self.database.discover_collections(&token).await?;
        self.collections = collections;
        Ok(&self.collections)
    }

    /// Databases from the last successful discovery.
    #[must_use]
    pub fn collections(&self) -> &[CollectionDescriptor] {
        &self.collections
    }

    /// The discovered database matching the configured target id.
    #[must_use]
    pub fn active_collection(&self) -> Option<&CollectionDescriptor> {
        let active_id = self.store.current().target_collection_id.trim();
        self.collections
            .iter()
            .find(|collection| collection.id == active_id)
    }

    /// Role binding for the active database, computed from current state.
    #[must_use]
    pub fn reconciliation(&self) -> Reconciliation {
        resolve_for_collection(
            &self.collections,
            &self.store.current().target_collection_id,
        )
    }

    /// Searches the catalog with the configured key.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the key is empty or the search fails.
    pub async fn search(
        &self,
        query: &str,
        scope: SearchScope,
    ) -> Result<Vec<BookRecord>, ActionError> {
        let key = &self.store.current().catalog_key;
        Ok(self.catalog.search(query, key, scope).await?)
    }

    /// Archives `book` into the configured database using the current reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::MissingCollection`] when no database is selected,
    /// or the classified failure from the database client.
    pub async fn archive(&self, book: &BookRecord) -> Result<Receipt, ActionError> {
        let config = self.store.current();
        if config.target_collection_id.trim().is_empty() {
            return Err(ActionError::MissingCollection);
        }
        let reconciliation = self.reconciliation();
        for diagnostic in &reconciliation.type_errors {
            warn!(diagnostic = %diagnostic, "Column skipped");
        }
        Ok(self
            .database
            .create_record(
                book,
                &config.access_token,
                &config.target_collection_id,
                &reconciliation.map,
            )
            .await?)
    }

    /// Shareable link for the current configuration.
    #[must_use]
    pub fn share_link(&self, base_url: &str) -> String {
        build_share_link(base_url, self.store.current())
    }
}
