// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolnotify — Core types, error definitions and notification templates
// shared across all crates.

pub mod config;
pub mod error;
pub mod make_model;
pub mod templates;
pub mod types;

pub use config::AppConfig;
pub use error::{ErrorClass, NotifyError};
pub use types::*;
