//! Public error types for the `metadata-store` module.
//!
//! These errors are safe to expose to other modules and consumers.

use thiserror::Error;

/// Errors that can be returned by the `MetadataStoreClient`.
#[derive(Error, Debug, Clone)]
pub enum MetadataStoreError {
    /// The requested structural type was not found.
    #[error("Structural type not found: {0}")]
    NotFound(String),

    /// The name denotes a structural type of the other kind, or is ambiguous.
    #[error("Wrong structural type: {0}")]
    WrongKind(String),

    /// A concrete entity type was declared without key properties.
    #[error("Entity type has no key properties: {0}")]
    MissingKey(String),

    /// A metadata document could not be decoded.
    #[error("Invalid metadata document: {0}")]
    InvalidDocument(String),

    /// Fetching remote metadata failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MetadataStoreError {
    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Creates a `WrongKind` error.
    #[must_use]
    pub fn wrong_kind(message: impl Into<String>) -> Self {
        Self::WrongKind(message.into())
    }

    /// Creates a `MissingKey` error.
    #[must_use]
    pub fn missing_key(name: impl Into<String>) -> Self {
        Self::MissingKey(name.into())
    }

    /// Creates an `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }

    /// Creates a `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is a wrong kind error.
    #[must_use]
    pub const fn is_wrong_kind(&self) -> bool {
        matches!(self, Self::WrongKind(_))
    }

    /// Returns `true` if this is a missing key error.
    #[must_use]
    pub const fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey(_))
    }

    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
