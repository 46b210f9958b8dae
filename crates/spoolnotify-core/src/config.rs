// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{NotifyError, Result};

/// Well-known bus name of the new-printer RPC service.
pub const SERVICE_NAME: &str = "com.redhat.NewPrinterNotification";
/// Object path the RPC service is exported at.
pub const SERVICE_PATH: &str = "/com/redhat/NewPrinterNotification";
/// Object path of the spooler's "state changed" broadcasts.
pub const SPOOLER_SIGNAL_PATH: &str = "/com/redhat/PrinterSpooler";
/// Interface of the spooler's "state changed" broadcasts.
pub const SPOOLER_SIGNAL_INTERFACE: &str = "com.redhat.PrinterSpooler";

/// Icon shown while a driver search is outstanding.
pub const SEARCHING_ICON: &str = "document-print-preview";
/// Icon used for printer notifications.
pub const PRINTER_ICON: &str = "printer";

const CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "spoolnotify";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name reported to the notification daemon.
    pub app_name: String,
    /// Spooler host (IPP and HTTP).
    pub spooler_host: String,
    /// Spooler port (default 631).
    pub spooler_port: u16,
    /// Requesting user for "my jobs" queries. Empty means `$USER`.
    pub user: String,
    /// Directory holding the spooler's filter programs.
    pub filter_dir: PathBuf,
    /// Printer configuration tool launched by "Configure" / "Find driver".
    pub config_tool: PathBuf,
    /// Package installer launched by "Install".
    pub install_tool: PathBuf,
    /// How long a "searching for driver" indication may stay up unresolved.
    pub readiness_timeout_secs: u64,
    /// Debounce between a spooler-changed signal and the job recheck.
    pub job_recheck_delay_ms: u64,
    /// Give up waiting for a first job after this long. `None` waits forever.
    pub job_wait_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "system-config-printer-applet".into(),
            spooler_host: "localhost".into(),
            spooler_port: 631,
            user: String::new(),
            filter_dir: PathBuf::from("/usr/lib/cups/filter"),
            config_tool: PathBuf::from("/usr/bin/system-config-printer"),
            install_tool: PathBuf::from("/usr/bin/system-install-packages"),
            readiness_timeout_secs: 60,
            job_recheck_delay_ms: 200,
            job_wait_timeout_secs: None,
        }
    }
}

impl AppConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    pub fn job_recheck_delay(&self) -> Duration {
        Duration::from_millis(self.job_recheck_delay_ms)
    }

    pub fn job_wait_timeout(&self) -> Option<Duration> {
        self.job_wait_timeout_secs.map(Duration::from_secs)
    }

    /// The user whose jobs count for the startup gate.
    pub fn effective_user(&self) -> String {
        if self.user.is_empty() {
            std::env::var("USER").unwrap_or_else(|_| "root".into())
        } else {
            self.user.clone()
        }
    }

    /// Apply `CUPS_SERVER=host[:port]` if present.
    ///
    /// Socket paths (values starting with `/`) are ignored since the spooler
    /// is reached over TCP.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(server) = std::env::var("CUPS_SERVER") {
            self.apply_server_override(&server);
        }
    }

    fn apply_server_override(&mut self, server: &str) {
        let server = server.trim();
        if server.is_empty() || server.starts_with('/') {
            return;
        }
        match server.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => {
                    self.spooler_host = host.to_string();
                    self.spooler_port = port;
                }
                Err(_) => warn!(server, "ignoring CUPS_SERVER with invalid port"),
            },
            None => self.spooler_host = server.to_string(),
        }
    }

    /// Load the config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.spooler_host.trim().is_empty() {
            return Err(NotifyError::Config("spooler_host is empty".into()));
        }
        if self.spooler_port == 0 {
            return Err(NotifyError::Config("spooler_port must be non-zero".into()));
        }
        if self.readiness_timeout_secs == 0 {
            return Err(NotifyError::Config(
                "readiness_timeout_secs must be non-zero".into(),
            ));
        }
        if self.job_wait_timeout_secs == Some(0) {
            return Err(NotifyError::Config(
                "job_wait_timeout_secs must be non-zero when set".into(),
            ));
        }
        Ok(())
    }

    /// Load the config at `path`, falling back to defaults when the file is
    /// missing or unreadable. Environment overrides are applied either way.
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = match Self::load(path) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded configuration");
                config
            }
            Err(NotifyError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "bad configuration, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }
}

/// Default location of the config file: `$XDG_CONFIG_HOME/spoolnotify/config.json`.
pub fn default_config_path() -> PathBuf {
    config_base().join(APP_DIR).join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from("/etc")
}
