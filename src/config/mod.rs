//! Credential configuration: the three values every action needs.
//!
//! - [`Configuration`] - access token, target collection id, catalog key
//! - [`share`] - encodes/decodes the configuration as a shareable link query
//! - [`store`] - load-on-start / persist-on-change lifecycle over a key/value backend

pub mod share;
pub mod store;

pub use share::{ShareDecodeError, build_share_link, decode_shared_query, encode_shared_query};
pub use store::{
    ConfigStore, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError,
    default_state_path,
};

/// Process-wide credential configuration.
///
/// The zero value (all fields empty) is the "nothing configured yet" state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Workspace integration token (secret).
    pub access_token: String,
    /// Id of the database that books are archived into. Not secret.
    pub target_collection_id: String,
    /// Catalog API key (secret).
    pub catalog_key: String,
}

impl Configuration {
    /// Creates a configuration from its three fields.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        target_collection_id: impl Into<String>,
        catalog_key: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            target_collection_id: target_collection_id.into(),
            catalog_key: catalog_key.into(),
        }
    }

    /// Returns the current value of `field`.
    #[must_use]
    pub fn get(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::AccessToken => &self.access_token,
            ConfigField::TargetCollectionId => &self.target_collection_id,
            ConfigField::CatalogKey => &self.catalog_key,
        }
    }

    /// Replaces the value of `field`.
    pub fn set(&mut self, field: ConfigField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ConfigField::AccessToken => self.access_token = value,
            ConfigField::TargetCollectionId => self.target_collection_id = value,
            ConfigField::CatalogKey => self.catalog_key = value,
        }
    }

    /// Returns true when no field has been configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
            && self.target_collection_id.is_empty()
            && self.catalog_key.is_empty()
    }
}

// Secrets never reach logs through `{:?}`.
impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("access_token", &mask_secret(&self.access_token))
            .field("target_collection_id", &self.target_collection_id)
            .field("catalog_key", &mask_secret(&self.catalog_key))
            .finish()
    }
}

/// One independently editable configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// Workspace integration token.
    AccessToken,
    /// Target database id.
    TargetCollectionId,
    /// Catalog API key.
    CatalogKey,
}

impl ConfigField {
    /// All fields in persistence order.
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::TargetCollectionId, Self::CatalogKey];

    /// Fixed key under which the field is persisted.
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::AccessToken => "notion_token",
            Self::TargetCollectionId => "notion_db_id",
            Self::CatalogKey => "aladdin_ttb_key",
        }
    }

    /// Returns true when the field holds a credential that must be masked in output.
    #[must_use]
    pub fn is_secret(self) -> bool {
        !matches!(self, Self::TargetCollectionId)
    }

    /// Human-readable label for status output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AccessToken => "access token",
            Self::TargetCollectionId => "collection id",
            Self::CatalogKey => "catalog key",
        }
    }
}

/// Masks a secret for display, keeping at most the last four characters.
///
/// Short secrets are fully masked so that nothing meaningful leaks.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
