//! Error types for credential reconciliation.
//!
//! Errors fall into three groups: configuration errors (the reconciler was
//! wired up wrong), corrupt-identity errors (the persisted identifier cannot
//! be decoded), and upstream errors (the credential store rejected a call).
//! None of them are retried here.

use crate::backend::StoreError;
use std::fmt;
use thiserror::Error;

/// Which scope flag of an identifier failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeField {
    /// Third identifier component
    Client,
    /// Fourth identifier component
    Controller,
}

impl fmt::Display for ScopeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client credential"),
            Self::Controller => write!(f, "controller credential"),
        }
    }
}

/// Errors returned by the reconciler and the identity codec.
#[derive(Debug, Error)]
pub enum Error {
    /// No credential store was supplied
    #[error(
        "credential store not configured; expected a configured store before managing credentials"
    )]
    NotConfigured,

    /// An operation other than create was given a descriptor without an id
    #[error("unable to {operation} credential resource: no identifier assigned")]
    MissingIdentifier {
        /// Verb that needed the identifier
        operation: &'static str,
    },

    /// Identifier does not split into four non-empty components
    #[error(
        "invalid ID {id:?}, expected {{credentialName, cloudName, isClient, isController}} - got {parts} part(s)"
    )]
    MalformedIdentifier {
        /// The offending identifier
        id: String,
        /// Number of components found
        parts: usize,
    },

    /// A scope component is not literally `true` or `false`
    #[error("unable to parse {field} from provided ID: {value:?}")]
    InvalidScopeFlag {
        /// Which flag failed
        field: ScopeField,
        /// The offending text
        value: String,
    },

    /// A name component is empty
    #[error("{field} must not be empty")]
    EmptyComponent {
        /// Field name
        field: &'static str,
    },

    /// A name component contains the identifier delimiter
    #[error("{field} {value:?} must not contain ':'")]
    ReservedDelimiter {
        /// Field name
        field: &'static str,
        /// The offending value
        value: String,
    },

    /// The store failed to create the credential
    #[error("unable to create credential resource {name:?}, got error: {source}")]
    UpstreamCreateFailed {
        /// Credential name
        name: String,
        /// Store error that caused the failure
        #[source]
        source: StoreError,
    },

    /// The store failed to read the credential
    #[error("unable to read credential resource {name:?}, got error: {source}")]
    UpstreamReadFailed {
        /// Credential name
        name: String,
        /// Store error that caused the failure
        #[source]
        source: StoreError,
    },

    /// The store failed to update the credential
    #[error("unable to update credential resource {name:?}, got error: {source}")]
    UpstreamUpdateFailed {
        /// Credential name
        name: String,
        /// Store error that caused the failure
        #[source]
        source: StoreError,
    },

    /// The store failed to delete the credential
    #[error("unable to delete credential resource {name:?}, got error: {source}")]
    UpstreamDeleteFailed {
        /// Credential name
        name: String,
        /// Store error that caused the failure
        #[source]
        source: StoreError,
    },
}

impl Error {
    /// Returns true for wiring errors in the host, as opposed to bad data
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::NotConfigured)
    }

    /// Returns true if the persisted identifier is unusable
    pub fn is_corrupt_identity(&self) -> bool {
        matches!(
            self,
            Error::MissingIdentifier { .. }
                | Error::MalformedIdentifier { .. }
                | Error::InvalidScopeFlag { .. }
        )
    }

    /// Returns true if the credential store rejected the call
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamCreateFailed { .. }
                | Error::UpstreamReadFailed { .. }
                | Error::UpstreamUpdateFailed { .. }
                | Error::UpstreamDeleteFailed { .. }
        )
    }

    /// The underlying store error, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Error::UpstreamCreateFailed { source, .. }
            | Error::UpstreamReadFailed { source, .. }
            | Error::UpstreamUpdateFailed { source, .. }
            | Error::UpstreamDeleteFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, Error>;
