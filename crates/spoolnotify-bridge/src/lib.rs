// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolnotify — Desktop integration.
//
// The notification service talks to the desktop only through the traits in
// `traits`.  `desktop` implements them over the session bus, `stub` is the
// headless fallback used with `--no-tray-icon` or when no notification
// daemon can be reached, and `launcher` starts the helper programs bound to
// notification actions.

pub mod desktop;
pub mod launcher;
pub mod stub;
pub mod traits;

pub use desktop::{DesktopNotifier, DesktopViewer, DesktopViewerFactory, TrayViewer};
pub use launcher::ActionDispatcher;
pub use stub::HeadlessViewer;
pub use traits::{NotificationPresenter, Viewer, ViewerFactory};

/// Build the viewer factory for this session.
///
/// With a notifier, tray-mode viewers present on the desktop; without one
/// every viewer is headless.
pub fn viewer_factory(notifier: Option<DesktopNotifier>) -> DesktopViewerFactory {
    DesktopViewerFactory::new(notifier)
}
