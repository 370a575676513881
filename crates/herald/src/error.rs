// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors returned by the notification engine.
//!
//! Synchronous API calls return [`Error`]; asynchronous flows never report
//! back through this type, they only log and skip the callback.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors returned by Herald operations.
///
/// # Example
///
/// ```rust,no_run
/// use herald::Error;
///
/// fn describe(err: &Error) -> &'static str {
///     match err {
///         Error::NoRecipients { .. } => "nobody is listening",
///         Error::NotRunning => "service stopped",
///         _ => "other failure",
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Caller misuse
    // ========================================================================
    /// A required argument was empty or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The service was stopped (or its scheduler is not accepting tasks).
    #[error("Service not running")]
    NotRunning,

    // ========================================================================
    // Store results
    // ========================================================================
    /// Lookup against a missing key.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Write of a key that a unique store already holds.
    #[error("{kind} already present: {key}")]
    AlreadyPresent { kind: &'static str, key: String },

    // ========================================================================
    // Delivery
    // ========================================================================
    /// Fan-out computed an empty recipient set; nothing was sent.
    #[error("No recipients for {what}")]
    NoRecipients { what: String },

    /// The wire layer refused or failed a send.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    // ========================================================================
    // Runtime
    // ========================================================================
    /// A rendezvous reply did not arrive in time.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker thread spawn failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, key: impl std::fmt::Display) -> Self {
        Error::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// True for the distinguishable not-found result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
