// Copyright 2025 Compbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Harness error taxonomy.
//!
//! Only configuration problems, workload generation failures and report
//! persistence failures are errors. Anything that goes wrong inside a single
//! target run is recorded as data on its [`crate::MeasurementRecord`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a harness run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The caller supplied a malformed request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A storage operation failed.
    #[error("I/O failure while {context}: {source}")]
    Io {
        /// What the harness was doing when the failure happened.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The report document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HarnessError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Whether this error was caused by the caller's request.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// A workload artifact that could not be deleted during cleanup.
///
/// Cleanup failures never abort a run; they are collected and reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    /// Artifact location.
    pub path: PathBuf,
    /// OS error text.
    pub message: String,
}

impl std::fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to delete {}: {}", self.path.display(), self.message)
    }
}
