// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for provider calls and record reconciliation.
//!
//! This module provides specialized error types for:
//! - Zone store operations (zone lookup, record fetch, create, delete)
//! - Reconciliation failures (zone discovery, provider rejections)
//! - Record spec loading
//!
//! Live DNS resolution failures are deliberately absent: they are narrowed to
//! "record not present" inside the resolver and never surface as errors.

use thiserror::Error;

use crate::record::RecordType;

/// Errors returned by a [`ZoneStore`](crate::store::ZoneStore) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Hosted zone id does not exist at the provider
    #[error("Hosted zone '{zone_id}' not found")]
    ZoneNotFound {
        /// The zone id that was requested
        zone_id: String,
    },

    /// No record set exists at `(name, type)`
    ///
    /// Returned by delete when the record disappeared since it was read.
    #[error("Record {record_type} '{name}' not found")]
    RecordNotFound {
        /// Fully-qualified record name
        name: String,
        /// Record type
        record_type: RecordType,
    },

    /// The provider refused a request with a structured error message
    #[error("Provider rejected {operation}: {message}")]
    Rejected {
        /// Operation that was rejected (e.g. "create record")
        operation: String,
        /// Message extracted verbatim from the provider's error body
        message: String,
    },

    /// The request never got a usable answer (connection, timeout, 5xx)
    #[error("Provider request for {operation} failed: {reason}")]
    Transport {
        /// Operation in flight
        operation: String,
        /// Underlying failure
        reason: String,
    },

    /// The provider answered with a payload we could not interpret
    #[error("Invalid provider response for {operation}: {reason}")]
    InvalidResponse {
        /// Operation in flight
        operation: String,
        /// Parse failure details
        reason: String,
    },

    /// No usable credentials could be resolved
    #[error("Unable to resolve provider credentials: {reason}")]
    Credentials {
        /// Why resolution failed
        reason: String,
    },
}

impl StoreError {
    /// Returns true if re-invoking the same call could plausibly succeed.
    ///
    /// Nothing in this crate retries on its own; callers use this to decide.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::ZoneNotFound { .. }
            | Self::RecordNotFound { .. }
            | Self::Rejected { .. }
            | Self::InvalidResponse { .. }
            | Self::Credentials { .. } => false,
        }
    }

    /// Stable reason code for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::ZoneNotFound { .. } => "ZoneNotFound",
            Self::RecordNotFound { .. } => "RecordNotFound",
            Self::Rejected { .. } => "ProviderRejected",
            Self::Transport { .. } => "ProviderUnreachable",
            Self::InvalidResponse { .. } => "InvalidProviderResponse",
            Self::Credentials { .. } => "CredentialsUnavailable",
        }
    }
}

/// Errors that abort the reconciliation of a single record.
///
/// Every variant maps to the `Failed` terminal state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// No hosted zone owns the record name
    #[error("ZoneID not provided and unable to determine zone for '{name}'")]
    ZoneNotFound {
        /// The record name being placed
        name: String,
    },

    /// The explicitly supplied zone id does not exist
    #[error("Hosted zone '{zone_id}' not found")]
    ZoneIdNotFound {
        /// The zone id supplied by the caller
        zone_id: String,
    },

    /// More than one hosted zone matched at the first matching suffix
    #[error("Unable to determine zone for '{name}': {} zones match '{suffix}' ({})", .candidates.len(), .candidates.join(", "))]
    ZoneAmbiguous {
        /// The record name being placed
        name: String,
        /// The suffix at which the tie occurred
        suffix: String,
        /// Ids of the tied zones
        candidates: Vec<String>,
    },

    /// A mutating provider call was refused; the message is the provider's own
    #[error("{operation} failed for '{name}': {message}")]
    ProviderRejected {
        /// The record name
        name: String,
        /// Operation that was refused
        operation: String,
        /// Provider's structured error message
        message: String,
    },

    /// Any other provider failure (transport, unreadable response, credentials)
    #[error(transparent)]
    Provider(StoreError),

    /// The desired record itself is unusable
    #[error("Invalid record '{name}': {reason}")]
    InvalidRecord {
        /// The record name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ReconcileError {
    /// Lift a store error raised while operating on `name`.
    ///
    /// Provider rejections keep their verbatim message; zone misses keep the id.
    #[must_use]
    pub fn from_store(name: &str, err: StoreError) -> Self {
        match err {
            StoreError::Rejected { operation, message } => Self::ProviderRejected {
                name: name.to_string(),
                operation,
                message,
            },
            StoreError::ZoneNotFound { zone_id } => Self::ZoneIdNotFound { zone_id },
            other => Self::Provider(other),
        }
    }

    /// Stable reason code for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::ZoneNotFound { .. } | Self::ZoneIdNotFound { .. } => "ZoneNotFound",
            Self::ZoneAmbiguous { .. } => "ZoneAmbiguous",
            Self::ProviderRejected { .. } => "ProviderRejected",
            Self::Provider(inner) => inner.status_reason(),
            Self::InvalidRecord { .. } => "InvalidRecord",
        }
    }
}

/// Errors raised while loading a record spec.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The spec file could not be read
    #[error("Failed to read record spec '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The spec document is not valid YAML/JSON for a record spec
    #[error("Failed to parse record spec: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The spec parsed but describes an unusable record
    #[error("Invalid record spec for '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
