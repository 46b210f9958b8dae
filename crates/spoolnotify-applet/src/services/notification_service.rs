// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The notification service.
//
// Owns every piece of mutable process state: the readiness counter and its
// timers, the job-wait gate, and the viewer.  Events arrive one at a time
// from the loop in `run`; each handler finishes before the next event is
// taken, so no state here needs a lock.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, instrument, warn};

use spoolnotify_bridge::{Viewer, ViewerFactory};
use spoolnotify_core::AppConfig;
use spoolnotify_core::error::{ErrorClass, Result};
use spoolnotify_core::make_model::display_driver_name;
use spoolnotify_core::templates::new_printer_notification;
use spoolnotify_core::types::{PrinterEvent, ViewerFlags};
use spoolnotify_print::{DriverResolver, Spooler};

use super::event::ServiceEvent;
use super::job_wait::{JobWaitGate, SpoolerSignals};
use super::readiness::ReadinessDebouncer;
use super::timer::TimerSet;

/// Startup decisions and timings.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub tray_icon: bool,
    /// Whether the RPC object was exported.
    pub service_running: bool,
    /// Hold the viewer back until the user has a job.
    pub wait_for_jobs: bool,
    pub readiness_timeout: Duration,
    pub job_recheck_delay: Duration,
    pub job_wait_timeout: Option<Duration>,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig, tray_icon: bool, service_running: bool, debug: bool) -> Self {
        Self {
            tray_icon,
            service_running,
            wait_for_jobs: tray_icon && !debug,
            readiness_timeout: config.readiness_timeout(),
            job_recheck_delay: config.job_recheck_delay(),
            job_wait_timeout: config.job_wait_timeout(),
        }
    }
}

pub struct NotificationService<S, D, F: ViewerFactory, G: SpoolerSignals> {
    spooler: S,
    resolver: D,
    factory: F,
    signals: G,
    settings: ServiceSettings,
    events: UnboundedSender<ServiceEvent>,
    viewer: Option<F::Viewer>,
    readiness: ReadinessDebouncer,
    readiness_timers: TimerSet,
    gate: Option<JobWaitGate<G::Subscription>>,
}

impl<S, D, F, G> NotificationService<S, D, F, G>
where
    S: Spooler,
    D: DriverResolver,
    F: ViewerFactory,
    G: SpoolerSignals,
{
    pub fn new(
        spooler: S,
        resolver: D,
        factory: F,
        signals: G,
        settings: ServiceSettings,
        events: UnboundedSender<ServiceEvent>,
    ) -> Self {
        Self {
            spooler,
            resolver,
            factory,
            signals,
            settings,
            events,
            viewer: None,
            readiness: ReadinessDebouncer::new(),
            readiness_timers: TimerSet::new(),
            gate: None,
        }
    }

    /// Enter the job-wait gate if enabled, otherwise create the viewer.
    pub async fn start(&mut self) {
        if self.settings.wait_for_jobs {
            self.gate = JobWaitGate::enter(
                &self.spooler,
                &self.signals,
                &self.events,
                self.settings.job_recheck_delay,
                self.settings.job_wait_timeout,
            )
            .await;
        }
        if self.gate.is_none() {
            self.ensure_viewer(false).await;
        }
    }

    /// Handle events until shutdown, then clean up.
    pub async fn run(mut self, mut events: UnboundedReceiver<ServiceEvent>) {
        while let Some(event) = events.recv().await {
            if self.handle(event).await.is_break() {
                break;
            }
        }
        self.shutdown().await;
    }

    pub async fn handle(&mut self, event: ServiceEvent) -> ControlFlow<()> {
        match event {
            ServiceEvent::GetReady => self.get_ready().await,
            ServiceEvent::NewPrinter(event) => self.new_printer(event).await,
            ServiceEvent::ReadinessTimeout => self.resolve_readiness().await,
            ServiceEvent::SpoolerChanged => {
                if let Some(gate) = self.gate.as_mut() {
                    gate.on_signal(&self.events);
                }
            }
            ServiceEvent::JobRecheck(generation) => self.job_recheck(generation).await,
            ServiceEvent::JobWaitTimeout(generation) => {
                let elapsed = self
                    .gate
                    .as_mut()
                    .is_some_and(|gate| gate.safety_elapsed(generation));
                if elapsed {
                    self.finish_waiting("safety timeout").await;
                }
            }
            ServiceEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// `GetReady`: a search started. Shows the indicator on the first one.
    pub async fn get_ready(&mut self) {
        let show = self.readiness.get_ready();
        let viewer = self.wake_up().await;
        if show {
            viewer.set_searching_indicator().await;
        }
        self.readiness_timers
            .schedule(self.settings.readiness_timeout, &self.events, ServiceEvent::ReadinessTimeout);
        debug!(outstanding = self.readiness.outstanding(), "driver search started");
    }

    /// `NewPrinter`: notify about the printer, then resolve one search.
    ///
    /// Lookup failures drop the event silently. The search is resolved on
    /// every path.
    #[instrument(skip(self, event), fields(printer = %event.name, status = ?event.status))]
    pub async fn new_printer(&mut self, event: PrinterEvent) {
        self.wake_up().await;
        if let Err(e) = self.present_new_printer(&event).await {
            match e.class() {
                ErrorClass::TransientLookup => debug!(error = %e, "new-printer event dropped"),
                _ => warn!(error = %e, "new-printer event failed"),
            }
        }
        self.resolve_readiness().await;
    }

    async fn present_new_printer(&mut self, event: &PrinterEvent) -> Result<()> {
        let printer = self.spooler.printer(&event.name).await?;

        // The temporary file goes away with `ppd`, whatever the resolver says.
        let ppd = self.spooler.fetch_ppd(&event.name).await?;
        let missing = self.resolver.missing_software(ppd.path());
        drop(ppd);
        let missing = missing?;
        if !missing.executables.is_empty() {
            debug!(executables = ?missing.executables, "driver needs programs with no known package");
        }

        let driver = display_driver_name(&printer.make_and_model);
        let notification = new_printer_notification(event.status, &event.name, &driver, &missing);
        info!(title = %notification.title, driver = %driver, "notifying about new printer");

        if let Some(viewer) = self.viewer.as_mut() {
            viewer.notify_new_printer(&event.name, notification).await;
        }
        Ok(())
    }

    /// One search resolved, by timeout or by `NewPrinter`.
    async fn resolve_readiness(&mut self) {
        if self.readiness.resolve() {
            debug!("no driver searches outstanding");
            if let Some(viewer) = self.viewer.as_mut() {
                viewer.unset_searching_indicator().await;
            }
        }
    }

    async fn job_recheck(&mut self, generation: u64) {
        let Some(gate) = self.gate.as_mut() else {
            return;
        };
        if gate.recheck(generation, &self.spooler).await {
            self.finish_waiting("print job queued").await;
        }
    }

    /// The gate ended on its own: proceed with the normal viewer.
    async fn finish_waiting(&mut self, reason: &str) {
        self.close_gate(reason);
        self.ensure_viewer(false).await;
    }

    fn close_gate(&mut self, reason: &str) {
        if let Some(gate) = self.gate.take() {
            gate.close(reason);
        }
    }

    /// The viewer for an RPC. If it does not exist yet, any job wait is
    /// abandoned and the viewer keeps its icon visible.
    async fn wake_up(&mut self) -> &mut F::Viewer {
        if self.viewer.is_none() {
            self.close_gate("woken by request");
        }
        self.ensure_viewer(true).await
    }

    /// Get-or-create the viewer. `suppress_icon_hide` only matters on
    /// creation.
    async fn ensure_viewer(&mut self, suppress_icon_hide: bool) -> &mut F::Viewer {
        let viewer = match self.viewer.take() {
            Some(viewer) => viewer,
            None => {
                let flags = ViewerFlags {
                    tray_icon: self.settings.tray_icon,
                    service_running: self.settings.service_running,
                    suppress_icon_hide,
                };
                info!(?flags, "creating viewer");
                self.factory.create(flags).await
            }
        };
        self.viewer.insert(viewer)
    }

    /// Tear down the gate, abort timers, dispose the viewer.
    pub async fn shutdown(&mut self) {
        self.close_gate("shutting down");
        self.readiness_timers.abort_all();
        if let Some(mut viewer) = self.viewer.take() {
            viewer.dispose().await;
        }
        info!("notification service stopped");
    }
}

#[cfg(test)]
impl<S, D, F, G> NotificationService<S, D, F, G>
where
    F: ViewerFactory,
    G: SpoolerSignals,
{
    pub fn has_viewer(&self) -> bool {
        self.viewer.is_some()
    }

    pub fn is_waiting_for_jobs(&self) -> bool {
        self.gate.is_some()
    }

    pub fn outstanding_searches(&self) -> u32 {
        self.readiness.outstanding()
    }
}
