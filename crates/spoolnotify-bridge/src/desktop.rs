// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop notifications over the session bus.
//
// `DesktopNotifier` speaks `org.freedesktop.Notifications`.  Actions offered
// on a notification are remembered by notification id; when the daemon
// reports `ActionInvoked`, the matching action is handed to the
// `ActionDispatcher`.  The entry is dropped when the daemon reports the
// notification closed.
//
// `TrayViewer` is the tray-mode viewer built on any presenter: it shows
// new-printer notifications (one per printer, newest wins) and renders the
// searching indicator as a resident notification.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::Connection;
use zbus::zvariant::Value;

use spoolnotify_core::config::SEARCHING_ICON;
use spoolnotify_core::error::{NotifyError, Result};
use spoolnotify_core::types::{
    ActionKind, Expiry, NotificationAction, PrinterNotification, Urgency, ViewerFlags,
};

use crate::launcher::ActionDispatcher;
use crate::stub::HeadlessViewer;
use crate::traits::{NotificationPresenter, Viewer, ViewerFactory};

#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn action_invoked(&self, id: u32, action_key: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;
}

/// Actions offered on notifications that are still open, by notification id.
#[derive(Debug, Default)]
pub struct PendingActions {
    by_id: HashMap<u32, Vec<NotificationAction>>,
}

impl PendingActions {
    pub fn remember(&mut self, id: u32, actions: Vec<NotificationAction>) {
        if !actions.is_empty() {
            self.by_id.insert(id, actions);
        }
    }

    /// The action bound to `key` on notification `id`.
    ///
    /// An invoked notification is spent, so its entry is removed and a
    /// repeated signal dispatches nothing.
    pub fn take_action(&mut self, id: u32, key: &str) -> Option<ActionKind> {
        let actions = self.by_id.get(&id)?;
        let kind = actions.iter().find(|a| a.key == key)?.kind.clone();
        self.by_id.remove(&id);
        Some(kind)
    }

    pub fn forget(&mut self, id: u32) {
        self.by_id.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

type SharedActions = Arc<Mutex<PendingActions>>;

/// Aborts the signal listener when the last notifier clone goes away.
struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Notification presenter backed by the desktop notification daemon.
#[derive(Clone)]
pub struct DesktopNotifier {
    proxy: NotificationsProxy<'static>,
    app_name: Arc<str>,
    pending: SharedActions,
    _listener: Arc<ListenerGuard>,
}

impl DesktopNotifier {
    /// Bind to the notification daemon on `connection` and start listening
    /// for action invocations.
    pub async fn connect(
        connection: &Connection,
        app_name: &str,
        dispatcher: ActionDispatcher,
    ) -> Result<Self> {
        let proxy = NotificationsProxy::new(connection)
            .await
            .map_err(|e| NotifyError::Notification(e.to_string()))?;
        let mut invoked = proxy
            .receive_action_invoked()
            .await
            .map_err(|e| NotifyError::Notification(e.to_string()))?;
        let mut closed = proxy
            .receive_notification_closed()
            .await
            .map_err(|e| NotifyError::Notification(e.to_string()))?;

        let pending: SharedActions = Arc::new(Mutex::new(PendingActions::default()));
        let listener_pending = Arc::clone(&pending);

        let listener = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(signal) = invoked.next() => {
                        let Ok(args) = signal.args() else { continue };
                        let id = *args.id();
                        let key: &str = args.action_key();
                        let kind = listener_pending.lock().await.take_action(id, key);
                        match kind {
                            Some(kind) => {
                                debug!(id, key, "notification action invoked");
                                // Launch failures are already logged by the dispatcher.
                                let _ = dispatcher.dispatch(&kind);
                            }
                            None => debug!(id, key, "action for unknown notification"),
                        }
                    }
                    Some(signal) = closed.next() => {
                        if let Ok(args) = signal.args() {
                            listener_pending.lock().await.forget(*args.id());
                        }
                    }
                    else => break,
                }
            }
            debug!("notification signal streams ended");
        });

        info!(app_name, "connected to notification daemon");
        Ok(Self {
            proxy,
            app_name: Arc::from(app_name),
            pending,
            _listener: Arc::new(ListenerGuard(listener)),
        })
    }
}

impl NotificationPresenter for DesktopNotifier {
    async fn show(&self, notification: &PrinterNotification) -> Result<u32> {
        // Flat [key, label, key, label, ...] list.
        let actions: Vec<&str> = notification
            .actions
            .iter()
            .flat_map(|a| [a.key.as_str(), a.label.as_str()])
            .collect();

        let mut hints = HashMap::new();
        hints.insert("urgency", Value::from(notification.urgency.hint_value()));

        let id = self
            .proxy
            .notify(
                &self.app_name,
                0,
                notification.icon.as_deref().unwrap_or_default(),
                &notification.title,
                &notification.body,
                &actions,
                hints,
                notification.expiry.as_timeout(),
            )
            .await
            .map_err(|e| NotifyError::Notification(e.to_string()))?;

        self.pending
            .lock()
            .await
            .remember(id, notification.actions.clone());
        debug!(id, title = %notification.title, "notification shown");
        Ok(id)
    }

    async fn close(&self, id: u32) -> Result<()> {
        self.pending.lock().await.forget(id);
        self.proxy
            .close_notification(id)
            .await
            .map_err(|e| NotifyError::Notification(e.to_string()))
    }
}

/// The resident notification standing in for the "searching" tray icon.
fn searching_notification() -> PrinterNotification {
    PrinterNotification {
        title: "Searching for printer driver".into(),
        body: "A new printer is being set up.".into(),
        icon: Some(SEARCHING_ICON.into()),
        urgency: Urgency::Low,
        expiry: Expiry::Never,
        actions: Vec::new(),
    }
}

/// Tray-mode viewer.
///
/// `flags` are kept for inspection only. There is no persistent tray icon to
/// keep or hide, so `suppress_icon_hide` does not alter rendering; the
/// searching indicator follows the outstanding-search count alone.
pub struct TrayViewer<P> {
    presenter: P,
    flags: ViewerFlags,
    searching: Option<u32>,
    shown: HashMap<String, u32>,
}

impl<P: NotificationPresenter> TrayViewer<P> {
    pub fn new(presenter: P, flags: ViewerFlags) -> Self {
        info!(?flags, "tray viewer created");
        Self {
            presenter,
            flags,
            searching: None,
            shown: HashMap::new(),
        }
    }

    pub fn flags(&self) -> ViewerFlags {
        self.flags
    }

    pub fn is_searching(&self) -> bool {
        self.searching.is_some()
    }

    async fn withdraw(&self, id: u32) {
        if let Err(e) = self.presenter.close(id).await {
            debug!(id, error = %e, "could not close notification");
        }
    }
}

impl<P: NotificationPresenter> Viewer for TrayViewer<P> {
    async fn notify_new_printer(&mut self, printer: &str, notification: PrinterNotification) {
        if let Some(previous) = self.shown.remove(printer) {
            self.withdraw(previous).await;
        }
        match self.presenter.show(&notification).await {
            Ok(id) => {
                self.shown.insert(printer.to_string(), id);
            }
            Err(e) => warn!(printer, error = %e, "could not show new-printer notification"),
        }
    }

    async fn set_searching_indicator(&mut self) {
        if self.searching.is_some() {
            return;
        }
        match self.presenter.show(&searching_notification()).await {
            Ok(id) => self.searching = Some(id),
            Err(e) => warn!(error = %e, "could not show searching indicator"),
        }
    }

    async fn unset_searching_indicator(&mut self) {
        if let Some(id) = self.searching.take() {
            self.withdraw(id).await;
        }
    }

    async fn dispose(&mut self) {
        self.unset_searching_indicator().await;
        let shown: Vec<u32> = self.shown.drain().map(|(_, id)| id).collect();
        for id in shown {
            self.withdraw(id).await;
        }
        debug!("tray viewer disposed");
    }
}

/// The viewer the applet actually runs with.
pub enum DesktopViewer {
    Tray(TrayViewer<DesktopNotifier>),
    Headless(HeadlessViewer),
}

impl Viewer for DesktopViewer {
    async fn notify_new_printer(&mut self, printer: &str, notification: PrinterNotification) {
        match self {
            Self::Tray(v) => v.notify_new_printer(printer, notification).await,
            Self::Headless(v) => v.notify_new_printer(printer, notification).await,
        }
    }

    async fn set_searching_indicator(&mut self) {
        match self {
            Self::Tray(v) => v.set_searching_indicator().await,
            Self::Headless(v) => v.set_searching_indicator().await,
        }
    }

    async fn unset_searching_indicator(&mut self) {
        match self {
            Self::Tray(v) => v.unset_searching_indicator().await,
            Self::Headless(v) => v.unset_searching_indicator().await,
        }
    }

    async fn dispose(&mut self) {
        match self {
            Self::Tray(v) => v.dispose().await,
            Self::Headless(v) => v.dispose().await,
        }
    }
}

/// Picks tray or headless depending on the flags and whether a notification
/// daemon was reached.
pub struct DesktopViewerFactory {
    notifier: Option<DesktopNotifier>,
}

impl DesktopViewerFactory {
    pub fn new(notifier: Option<DesktopNotifier>) -> Self {
        Self { notifier }
    }
}

impl ViewerFactory for DesktopViewerFactory {
    type Viewer = DesktopViewer;

    async fn create(&mut self, flags: ViewerFlags) -> DesktopViewer {
        match (&self.notifier, flags.tray_icon) {
            (Some(notifier), true) => DesktopViewer::Tray(TrayViewer::new(notifier.clone(), flags)),
            (None, true) => {
                warn!("no notification daemon, continuing without desktop notifications");
                DesktopViewer::Headless(HeadlessViewer::new(flags))
            }
            (_, false) => DesktopViewer::Headless(HeadlessViewer::new(flags)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolnotify_core::templates::new_printer_notification;
    use spoolnotify_core::types::{DriverStatus, MissingSoftware};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingPresenter {
        next_id: StdMutex<u32>,
        shown: StdMutex<Vec<(u32, String)>>,
        closed: StdMutex<Vec<u32>>,
        fail: bool,
    }

    impl NotificationPresenter for &RecordingPresenter {
        async fn show(&self, notification: &PrinterNotification) -> Result<u32> {
            if self.fail {
                return Err(NotifyError::Notification("no daemon".into()));
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            self.shown
                .lock()
                .unwrap()
                .push((*next, notification.title.clone()));
            Ok(*next)
        }

        async fn close(&self, id: u32) -> Result<()> {
            self.closed.lock().unwrap().push(id);
            Ok(())
        }
    }

    fn flags() -> ViewerFlags {
        ViewerFlags {
            tray_icon: true,
            service_running: true,
            suppress_icon_hide: false,
        }
    }

    fn ready(name: &str) -> PrinterNotification {
        new_printer_notification(DriverStatus::Success, name, "HP LaserJet", &MissingSoftware::default())
    }

    #[tokio::test]
    async fn searching_indicator_is_shown_once_and_closed() {
        let presenter = RecordingPresenter::default();
        let mut viewer = TrayViewer::new(&presenter, flags());

        viewer.set_searching_indicator().await;
        viewer.set_searching_indicator().await;
        assert!(viewer.is_searching());
        assert_eq!(presenter.shown.lock().unwrap().len(), 1);

        viewer.unset_searching_indicator().await;
        assert!(!viewer.is_searching());
        assert_eq!(*presenter.closed.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn newer_notification_replaces_older_for_same_printer() {
        let presenter = RecordingPresenter::default();
        let mut viewer = TrayViewer::new(&presenter, flags());

        viewer.notify_new_printer("lp0", ready("lp0")).await;
        viewer.notify_new_printer("lp1", ready("lp1")).await;
        viewer.notify_new_printer("lp0", ready("lp0")).await;
        assert_eq!(*presenter.closed.lock().unwrap(), vec![1]);

        viewer.dispose().await;
        let mut closed = presenter.closed.lock().unwrap().clone();
        closed.sort_unstable();
        assert_eq!(closed, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn woken_viewer_still_hides_indicator() {
        let presenter = RecordingPresenter::default();
        let woken = ViewerFlags {
            suppress_icon_hide: true,
            ..flags()
        };
        let mut viewer = TrayViewer::new(&presenter, woken);
        assert_eq!(viewer.flags(), woken);

        viewer.set_searching_indicator().await;
        viewer.unset_searching_indicator().await;
        assert!(!viewer.is_searching());
        assert_eq!(*presenter.closed.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn presenter_failure_is_not_fatal() {
        let presenter = RecordingPresenter {
            fail: true,
            ..Default::default()
        };
        let mut viewer = TrayViewer::new(&presenter, flags());
        viewer.notify_new_printer("lp0", ready("lp0")).await;
        viewer.set_searching_indicator().await;
        assert!(!viewer.is_searching());
        viewer.dispose().await;
    }

    #[tokio::test]
    async fn factory_without_daemon_is_headless() {
        let mut factory = DesktopViewerFactory::new(None);
        assert!(matches!(
            factory.create(flags()).await,
            DesktopViewer::Headless(_)
        ));
    }

    #[test]
    fn invoked_action_resolves_to_its_kind_once() {
        let notification = new_printer_notification(
            DriverStatus::Success,
            "lp0",
            "HP LaserJet",
            &MissingSoftware::default(),
        );
        let mut pending = PendingActions::default();
        pending.remember(7, notification.actions.clone());
        pending.remember(8, Vec::new());
        assert_eq!(pending.len(), 1);

        assert_eq!(pending.take_action(7, "install-driver"), None);
        assert_eq!(pending.take_action(9, "configure"), None);
        assert_eq!(
            pending.take_action(7, "configure"),
            Some(ActionKind::ConfigurePrinter {
                printer: "lp0".into()
            })
        );
        assert_eq!(pending.take_action(7, "configure"), None);
        assert!(pending.is_empty());
    }

    #[test]
    fn closed_notification_forgets_its_actions() {
        let missing = MissingSoftware {
            packages: vec!["foo2zjs".into()],
            executables: vec![],
        };
        let notification =
            new_printer_notification(DriverStatus::Success, "lp0", "HP LaserJet", &missing);
        let mut pending = PendingActions::default();
        pending.remember(3, notification.actions.clone());
        pending.remember(4, notification.actions.clone());

        pending.forget(3);
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending.take_action(4, "install-driver"),
            Some(ActionKind::InstallDriver {
                packages: vec!["foo2zjs".into()]
            })
        );
        assert!(pending.is_empty());
        assert_eq!(pending.take_action(3, "install-driver"), None);
    }

    #[test]
    fn searching_indicator_uses_preview_icon() {
        let n = searching_notification();
        assert_eq!(n.icon.as_deref(), Some("document-print-preview"));
        assert_eq!(n.expiry, Expiry::Never);
        assert!(n.actions.is_empty());
    }
}
