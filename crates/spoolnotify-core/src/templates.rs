// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Notification templates for newly added printers.
//
// Exactly one of three templates is chosen per event, in order of precedence:
//   1. missing packages  -> "Install printer driver" (critical, Install)
//   2. exact driver      -> "Printer added"          (normal, Configure)
//   3. anything else     -> mismatch / generic / none (critical, Find driver)

use crate::config::PRINTER_ICON;
use crate::types::{
    ActionKind, DriverStatus, Expiry, MissingSoftware, NotificationAction, PrinterNotification,
    Urgency,
};

pub const ACTION_INSTALL: &str = "install-driver";
pub const ACTION_CONFIGURE: &str = "configure";
pub const ACTION_FIND_DRIVER: &str = "find-driver";

/// Which template a new-printer event resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    InstallDriver,
    Ready,
    DriverMismatch,
}

/// Pick the template for an event.
pub fn select_template(status: DriverStatus, missing: &MissingSoftware) -> Template {
    if !missing.packages.is_empty() {
        Template::InstallDriver
    } else if status == DriverStatus::Success {
        Template::Ready
    } else {
        Template::DriverMismatch
    }
}

/// Build the notification for printer `name`.
///
/// `driver` is the human-readable "make model" of the driver in use.
pub fn new_printer_notification(
    status: DriverStatus,
    name: &str,
    driver: &str,
    missing: &MissingSoftware,
) -> PrinterNotification {
    let base_title = if status < DriverStatus::GenericDriver {
        "Printer added"
    } else {
        "Missing printer driver"
    };

    let (title, body, icon, urgency, action) = match select_template(status, missing) {
        Template::InstallDriver => (
            "Install printer driver".to_string(),
            format!(
                "`{name}' requires driver installation: {}.",
                missing.packages.join(", ")
            ),
            None,
            Urgency::Critical,
            NotificationAction {
                key: ACTION_INSTALL.into(),
                label: "Install".into(),
                kind: ActionKind::InstallDriver {
                    packages: missing.packages.clone(),
                },
            },
        ),
        Template::Ready => (
            base_title.to_string(),
            format!("`{name}' is ready for printing."),
            None,
            Urgency::Normal,
            NotificationAction {
                key: ACTION_CONFIGURE.into(),
                label: "Configure".into(),
                kind: ActionKind::ConfigurePrinter {
                    printer: name.to_string(),
                },
            },
        ),
        Template::DriverMismatch => (
            base_title.to_string(),
            format!("`{name}' has been added, using the `{driver}' driver."),
            Some(PRINTER_ICON.to_string()),
            Urgency::Critical,
            NotificationAction {
                key: ACTION_FIND_DRIVER.into(),
                label: "Find driver".into(),
                kind: ActionKind::FindDriver {
                    printer: name.to_string(),
                },
            },
        ),
    };

    PrinterNotification {
        title,
        body,
        icon,
        urgency,
        expiry: Expiry::Never,
        actions: vec![action],
    }
}
