//! Action-level error taxonomy.
//!
//! Component errors converge here so the action boundary has one type to
//! turn into a status line.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::{ConfigField, ShareDecodeError, StorageError};
use crate::database::DatabaseError;
use crate::proxy::{FailureKind, FetchFailure};
use crate::status::{FailureCategory, FailureDescriptor, StatusMessage};

const GENERIC_UPSTREAM_MESSAGE: &str = "the service rejected the request";

/// Failure of one user action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A required credential is empty; nothing was sent.
    #[error("{} is not configured", .0.label())]
    EmptyCredential(ConfigField),

    /// No target database is selected.
    #[error("no target database is selected")]
    MissingCollection,

    /// A shared link could not be decoded; stored configuration was kept.
    #[error("shared link ignored: {0}")]
    Decode(#[from] ShareDecodeError),

    /// The service could not be reached.
    #[error("cannot reach service: {message}")]
    Network { message: String },

    /// A credential was rejected.
    #[error("credential rejected: {message}")]
    Unauthorized { message: String },

    /// The transport or a bridge timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// The request could not be built locally; nothing was sent.
    #[error("request not sent: {message}")]
    InvalidRequest { message: String },

    /// The service answered with an application error.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Configuration could not be persisted.
    #[error("could not save configuration: {0}")]
    Storage(#[from] StorageError),
}

impl From<FetchFailure> for ActionError {
    fn from(failure: FetchFailure) -> Self {
        let FetchFailure {
            kind,
            status,
            message,
        } = failure;
        match kind {
            FailureKind::Network => Self::Network { message },
            FailureKind::Unauthorized => Self::Unauthorized { message },
            FailureKind::Timeout => Self::Timeout { message },
            FailureKind::InvalidRequest => Self::InvalidRequest { message },
            FailureKind::Upstream4xx | FailureKind::Upstream5xx => {
                Self::Upstream { status, message }
            }
        }
    }
}

impl From<CatalogError> for ActionError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::EmptyCredential => Self::EmptyCredential(ConfigField::CatalogKey),
            CatalogError::Upstream { message, .. } => Self::Upstream {
                status: None,
                message,
            },
            CatalogError::Fetch(failure) => failure.into(),
        }
    }
}

impl From<DatabaseError> for ActionError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::EmptyCredential => Self::EmptyCredential(ConfigField::AccessToken),
            DatabaseError::MissingCollection => Self::MissingCollection,
            DatabaseError::InvalidResponse(message) => Self::Upstream {
                status: None,
                message,
            },
            DatabaseError::Fetch(failure) => failure.into(),
        }
    }
}

impl ActionError {
    /// The one-line status shown for this failure.
    #[must_use]
    pub fn status(&self) -> StatusMessage {
        let text = match self {
            Self::EmptyCredential(field) => format!(
                "The {} is not set. Add it with `shelf-archiver config set`.",
                field.label()
            ),
            Self::MissingCollection => {
                "No target database selected. Run `shelf-archiver collections` and pick one."
                    .to_string()
            }
            Self::Decode(error) => {
                format!("Shared link ignored ({error}); keeping the stored configuration.")
            }
            Self::Network { .. } => "Cannot reach the service. Retry later.".to_string(),
            Self::Unauthorized { message } => format!(
                "Credential rejected ({message}). Re-check the access token and catalog key."
            ),
            Self::Timeout { .. } => "The request timed out. Try the action again.".to_string(),
            Self::InvalidRequest { message } => format!(
                "Request not sent ({message}). Check the stored access token for unsupported characters."
            ),
            Self::Upstream { message, .. } => {
                let message = message.trim();
                if message.is_empty() {
                    capitalize(GENERIC_UPSTREAM_MESSAGE)
                } else {
                    message.to_string()
                }
            }
            Self::Storage(error) => format!("Could not save configuration: {error}"),
        };
        StatusMessage::error(text)
    }

    /// Structured explanation of this failure.
    #[must_use]
    pub fn describe(&self) -> FailureDescriptor {
        match self {
            Self::EmptyCredential(_) => FailureDescriptor {
                category: FailureCategory::Configuration,
                what: "Credential missing",
                why: "The action needs a credential that has not been configured yet.",
                fix: "Run `shelf-archiver config set` or open a shared link.",
            },
            Self::MissingCollection => FailureDescriptor {
                category: FailureCategory::Configuration,
                what: "No target database",
                why: "Books are archived into one database, and none is selected.",
                fix: "Run `shelf-archiver collections --select <ID>`.",
            },
            Self::Decode(_) => FailureDescriptor {
                category: FailureCategory::Configuration,
                what: "Shared link could not be read",
                why: "The link is missing a parameter or a value is not valid base64 text.",
                fix: "Ask for a fresh link generated with `shelf-archiver share`.",
            },
            Self::Network { .. } => FailureDescriptor {
                category: FailureCategory::Network,
                what: "Service unreachable",
                why: "Connectivity, DNS, TLS, or the relay/proxy rejected the request.",
                fix: "Check connectivity or switch `--transport`, then retry.",
            },
            Self::Unauthorized { .. } => FailureDescriptor {
                category: FailureCategory::Auth,
                what: "Credential rejected",
                why: "The token is invalid, expired, or not shared with the database.",
                fix: "Re-check the token and that the integration is connected to the database.",
            },
            Self::Timeout { .. } => FailureDescriptor {
                category: FailureCategory::Network,
                what: "Request timed out",
                why: "The service or a bridging proxy did not answer in time.",
                fix: "Retry the action; consider `--transport relay` if a public proxy is slow.",
            },
            Self::InvalidRequest { .. } => FailureDescriptor {
                category: FailureCategory::Configuration,
                what: "Request could not be built",
                why: "A credential contains characters that HTTP headers cannot carry.",
                fix: "Re-enter the access token with `shelf-archiver config set --token`.",
            },
            Self::Upstream { .. } => FailureDescriptor {
                category: FailureCategory::Upstream,
                what: "Service rejected the request",
                why: "The request reached the service but was refused; see the message.",
                fix: "Check the database columns and credentials, then retry.",
            },
            Self::Storage(_) => FailureDescriptor {
                category: FailureCategory::Storage,
                what: "Configuration not saved",
                why: "The state file could not be written.",
                fix: "Check permissions on the config directory (`shelf-archiver config path`).",
            },
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
