// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for the desktop collaborators of the notification
// service.

use spoolnotify_core::error::Result;
use spoolnotify_core::types::{PrinterNotification, ViewerFlags};

/// Puts notifications on screen.
#[allow(async_fn_in_trait)]
pub trait NotificationPresenter {
    /// Show a notification. Returns the daemon's id for it.
    async fn show(&self, notification: &PrinterNotification) -> Result<u32>;

    /// Withdraw a notification previously shown.
    async fn close(&self, id: u32) -> Result<()>;
}

/// The job-monitoring view.
///
/// Display failures are the viewer's own business; none of these calls
/// fail from the caller's point of view.
#[allow(async_fn_in_trait)]
pub trait Viewer {
    /// Present the notification built for a newly added printer.
    async fn notify_new_printer(&mut self, printer: &str, notification: PrinterNotification);

    /// Show the "searching for driver" indicator.
    async fn set_searching_indicator(&mut self);

    /// Hide the "searching for driver" indicator.
    async fn unset_searching_indicator(&mut self);

    /// Release everything the viewer put on screen.
    async fn dispose(&mut self);
}

/// Constructs the viewer. Called at most once per process.
#[allow(async_fn_in_trait)]
pub trait ViewerFactory {
    type Viewer: Viewer;

    async fn create(&mut self, flags: ViewerFlags) -> Self::Viewer;
}
