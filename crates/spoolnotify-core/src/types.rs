// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the new-printer notification service.

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Outcome of the spooler's driver search for a newly detected printer.
///
/// Carried on the wire as an `int32`; the ordering matters because the
/// notification title switches at [`DriverStatus::GenericDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DriverStatus {
    /// An exact driver was found.
    Success = 0,
    /// A driver was installed, but for a different model.
    ModelMismatch = 1,
    /// Only a generic driver could be used.
    GenericDriver = 2,
    /// No usable driver.
    NoDriver = 3,
}

impl TryFrom<i32> for DriverStatus {
    type Error = NotifyError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::ModelMismatch),
            2 => Ok(Self::GenericDriver),
            3 => Ok(Self::NoDriver),
            other => Err(NotifyError::InvalidStatus(other)),
        }
    }
}

impl DriverStatus {
    /// Decode a status received over the bus, folding values outside the
    /// known range onto the nearest "driver problem" status so the event is
    /// still reported. Values below zero read as a model mismatch, values
    /// above the range as no driver.
    pub fn from_wire(value: i32) -> Self {
        Self::try_from(value).unwrap_or(if value < 0 {
            Self::ModelMismatch
        } else {
            Self::NoDriver
        })
    }
}

/// A "new printer" event as delivered by the spooler over the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterEvent {
    pub status: DriverStatus,
    /// Queue name assigned by the spooler.
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub description: String,
    /// IEEE 1284 command set reported by the device.
    pub command: String,
}

/// Attributes of a queue as reported by the spooler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterInfo {
    pub name: String,
    /// `printer-make-and-model`, possibly including a driver suffix.
    pub make_and_model: String,
}

/// A queued job returned by the spooler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub job_id: i32,
    pub job_name: String,
}

/// Software a driver needs but which is not installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingSoftware {
    /// Distribution packages that would provide the missing pieces.
    pub packages: Vec<String>,
    /// Programs with no known providing package.
    pub executables: Vec<String>,
}

impl MissingSoftware {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.executables.is_empty()
    }
}

/// Notification urgency, as understood by the desktop notification daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    /// Value of the freedesktop `urgency` hint.
    pub fn hint_value(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::Critical => 2,
        }
    }
}

/// When an on-screen notification goes away on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Server default.
    Default,
    /// Stays until dismissed or replaced.
    Never,
    Milliseconds(u32),
}

impl Expiry {
    /// The freedesktop `expire_timeout` argument.
    pub fn as_timeout(&self) -> i32 {
        match self {
            Self::Default => -1,
            Self::Never => 0,
            Self::Milliseconds(ms) => i32::try_from(*ms).unwrap_or(i32::MAX),
        }
    }
}

/// What happens when the user picks a notification action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Open the configuration tool on a queue.
    ConfigurePrinter { printer: String },
    /// Open the driver chooser on a queue.
    FindDriver { printer: String },
    /// Install the listed packages.
    InstallDriver { packages: Vec<String> },
}

/// One user-selectable button on a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    /// Action identifier sent back by the notification daemon.
    pub key: String,
    pub label: String,
    pub kind: ActionKind,
}

/// A fully built notification, ready to hand to a presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterNotification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub urgency: Urgency,
    pub expiry: Expiry,
    pub actions: Vec<NotificationAction>,
}

/// Construction flags passed to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerFlags {
    /// Whether a tray icon / desktop notifications are wanted at all.
    pub tray_icon: bool,
    /// Whether the RPC service was exported successfully.
    pub service_running: bool,
    /// Keep the icon visible even with no jobs (set when woken by an RPC).
    pub suppress_icon_hide: bool,
}
