//! Database client error types.

use thiserror::Error;

use crate::proxy::{FailureKind, FetchFailure};

/// Errors from database discovery and record creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    /// The access token is empty; nothing was sent.
    #[error("access token is not configured")]
    EmptyCredential,

    /// No target database is selected; nothing was sent.
    #[error("no target database is selected")]
    MissingCollection,

    /// The call succeeded but the body is not what the API documents.
    #[error("unexpected response from database API: {0}")]
    InvalidResponse(String),

    /// The call itself failed, classified by the transport.
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
}

impl DatabaseError {
    /// Classification of the underlying call failure, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Fetch(failure) => Some(failure.kind),
            Self::EmptyCredential | Self::MissingCollection | Self::InvalidResponse(_) => None,
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(detail: impl Into<String>) -> Self {
        Self::InvalidResponse(detail.into())
    }
}
