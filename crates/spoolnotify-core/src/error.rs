// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolnotify.

use thiserror::Error;

/// Top-level error type for all Spoolnotify operations.
#[derive(Debug, Error)]
pub enum NotifyError {
    // -- Spooler lookups --
    #[error("printer '{0}' is not known to the spooler")]
    PrinterNotFound(String),

    #[error("driver description unavailable for '{printer}': {detail}")]
    DriverUnavailable { printer: String, detail: String },

    #[error("spooler request failed: {0}")]
    Spooler(String),

    // -- Inter-process bus --
    #[error("bus error: {0}")]
    Bus(String),

    #[error("notification daemon error: {0}")]
    Notification(String),

    #[error("invalid driver status {0}")]
    InvalidStatus(i32),

    // -- Child processes --
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a failure is treated by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Printer or driver missing at the moment of an event. Drop the event.
    TransientLookup,
    /// The required bus cannot be reached. Fatal at startup.
    Connectivity,
    /// An optional feature (notifications, RPC export) is unavailable.
    OptionalSubsystem,
    /// A helper program could not be started. Reported, never fatal.
    ChildLaunch,
    /// Anything else.
    Internal,
}

impl NotifyError {
    /// Classify this error for the caller's fatal/silent decision.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::PrinterNotFound(_) | Self::DriverUnavailable { .. } | Self::Spooler(_) => {
                ErrorClass::TransientLookup
            }
            Self::Bus(_) => ErrorClass::Connectivity,
            Self::Notification(_) => ErrorClass::OptionalSubsystem,
            Self::Launch { .. } => ErrorClass::ChildLaunch,
            Self::InvalidStatus(_) | Self::Config(_) | Self::Io(_) | Self::Serialization(_) => {
                ErrorClass::Internal
            }
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NotifyError>;
