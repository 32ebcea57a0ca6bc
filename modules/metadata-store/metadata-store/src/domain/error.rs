//! Domain error types for the Metadata Store module.

use metadata_store_sdk::{MetadataStoreError, StructuralKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A recoverable error recorded into the store's error list instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedError {
    /// What was being materialized (a validator name, a type name).
    pub source: String,
    pub message: String,
}

impl RecordedError {
    #[must_use]
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RecordedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Domain-level errors for the Metadata Store module.
#[derive(Error, Debug)]
pub enum DomainError {
    /// A concrete entity type was added without any key property.
    #[error("Entity type has no key properties: {0}")]
    MissingKey(String),

    /// No structural type with the given name exists.
    #[error("Structural type not found: {0}")]
    NotFound(String),

    /// The name resolved to a type of the other kind.
    #[error("{name} is not of kind {expected}")]
    WrongKind {
        name: String,
        expected: StructuralKind,
    },

    /// A short name matched more than one registered type.
    #[error("Short name is ambiguous: {0}")]
    AmbiguousShortName(String),

    /// A document named a naming convention the store does not know.
    #[error("Unknown naming convention: {0}")]
    UnknownNamingConvention(String),

    /// A metadata document could not be decoded.
    #[error("Invalid metadata document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// The transport failed to fetch a service's metadata.
    #[error("Failed to fetch metadata for service {service}: {source}")]
    Transport {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    /// A discovery callback failed while probing a module.
    #[error("Discovery callback failed for {native_type} in module {module}: {source}")]
    Discovery {
        module: String,
        native_type: String,
        #[source]
        source: anyhow::Error,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    /// Creates a `MissingKey` error.
    #[must_use]
    pub fn missing_key(name: impl Into<String>) -> Self {
        Self::MissingKey(name.into())
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Creates a `WrongKind` error.
    #[must_use]
    pub fn wrong_kind(name: impl Into<String>, expected: StructuralKind) -> Self {
        Self::WrongKind {
            name: name.into(),
            expected,
        }
    }

    /// Creates an `AmbiguousShortName` error.
    #[must_use]
    pub fn ambiguous(short_name: impl Into<String>) -> Self {
        Self::AmbiguousShortName(short_name.into())
    }

    /// Creates a `Transport` error.
    #[must_use]
    pub fn transport(service: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Transport {
            service: service.into(),
            source,
        }
    }

    /// Returns `true` for lookups that found nothing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<DomainError> for MetadataStoreError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::MissingKey(name) => Self::missing_key(name),
            DomainError::NotFound(name) => Self::not_found(name),
            e @ (DomainError::WrongKind { .. } | DomainError::AmbiguousShortName(_)) => {
                Self::wrong_kind(e.to_string())
            }
            e @ (DomainError::UnknownNamingConvention(_) | DomainError::InvalidDocument(_)) => {
                Self::invalid_document(e.to_string())
            }
            e @ DomainError::Transport { .. } => Self::transport(e.to_string()),
            e @ (DomainError::Discovery { .. } | DomainError::Internal(_)) => {
                Self::internal(e.to_string())
            }
        }
    }
}
