// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Action dispatcher.
//
// Each notification action starts a helper program as a detached child in
// its own process group.  The child is never waited on by the caller; tokio
// reaps it in the background once it exits.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use spoolnotify_core::AppConfig;
use spoolnotify_core::error::{NotifyError, Result};
use spoolnotify_core::types::ActionKind;

/// Launches the configuration tool and package installer.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    config_tool: PathBuf,
    install_tool: PathBuf,
}

impl ActionDispatcher {
    pub fn new(config_tool: impl Into<PathBuf>, install_tool: impl Into<PathBuf>) -> Self {
        Self {
            config_tool: config_tool.into(),
            install_tool: install_tool.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.config_tool.clone(), config.install_tool.clone())
    }

    /// Program and arguments for an action.
    pub fn command_for(&self, kind: &ActionKind) -> (PathBuf, Vec<String>) {
        match kind {
            ActionKind::ConfigurePrinter { printer } => (
                self.config_tool.clone(),
                vec!["--configure-printer".into(), printer.clone()],
            ),
            ActionKind::FindDriver { printer } => (
                self.config_tool.clone(),
                vec!["--choose-driver".into(), printer.clone()],
            ),
            ActionKind::InstallDriver { packages } => (self.install_tool.clone(), packages.clone()),
        }
    }

    /// Start the helper for `kind` and return its pid.
    ///
    /// A spawn failure is logged and returned; it never affects the caller
    /// beyond that.  Must be called from within a tokio runtime.
    pub fn dispatch(&self, kind: &ActionKind) -> Result<u32> {
        let (program, args) = self.command_for(kind);

        let spawned = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .kill_on_drop(false)
            .spawn();

        match spawned {
            Ok(child) => {
                let pid = child.id().unwrap_or_default();
                info!(program = %program.display(), ?args, pid, "helper launched");
                Ok(pid)
            }
            Err(source) => {
                let err = NotifyError::Launch {
                    program: program.display().to_string(),
                    source,
                };
                warn!(error = %err, "helper launch failed");
                Err(err)
            }
        }
    }
}
