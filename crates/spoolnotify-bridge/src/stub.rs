// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Headless viewer for `--no-tray-icon` runs and sessions without a
// notification daemon.
//
// Every call is logged and otherwise ignored.

use tracing::info;

use spoolnotify_core::types::{PrinterNotification, ViewerFlags};

use crate::traits::Viewer;

/// Viewer that only writes to the log.
#[derive(Debug)]
pub struct HeadlessViewer {
    flags: ViewerFlags,
    searching: bool,
}

impl HeadlessViewer {
    pub fn new(flags: ViewerFlags) -> Self {
        info!(?flags, "headless viewer created");
        Self {
            flags,
            searching: false,
        }
    }

    pub fn flags(&self) -> ViewerFlags {
        self.flags
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }
}

impl Viewer for HeadlessViewer {
    async fn notify_new_printer(&mut self, printer: &str, notification: PrinterNotification) {
        info!(
            printer,
            title = %notification.title,
            body = %notification.body,
            urgency = ?notification.urgency,
            "new printer"
        );
    }

    async fn set_searching_indicator(&mut self) {
        self.searching = true;
        info!("searching for printer driver");
    }

    async fn unset_searching_indicator(&mut self) {
        self.searching = false;
        info!("driver search finished");
    }

    async fn dispose(&mut self) {
        self.searching = false;
    }
}
