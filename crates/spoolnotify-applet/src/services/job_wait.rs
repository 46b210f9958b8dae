// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job-wait gate.
//
// At login there is usually nothing to show, so the viewer is held back
// until the user has a queued job.  The gate polls once on entry; if that
// finds nothing it subscribes to the spooler's state-changed broadcast and
// rechecks 200 ms after the last signal of a burst.  A recheck that finds no
// job does nothing further; only another signal rearms it.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use spoolnotify_core::error::Result;
use spoolnotify_print::Spooler;

use super::event::ServiceEvent;
use super::timer::TimerSlot;

/// Source of the spooler's state-changed broadcasts.
#[allow(async_fn_in_trait)]
pub trait SpoolerSignals {
    /// Live subscription; dropping it unsubscribes.
    type Subscription;

    /// Post `ServiceEvent::SpoolerChanged` for every broadcast until the
    /// returned subscription is dropped.
    async fn subscribe(&self, events: UnboundedSender<ServiceEvent>) -> Result<Self::Subscription>;
}

/// A gate that is currently waiting.
pub struct JobWaitGate<Sub> {
    recheck: TimerSlot,
    safety: TimerSlot,
    recheck_delay: Duration,
    // Dropped last, after both timers are cancelled.
    _subscription: Sub,
}

impl<Sub> JobWaitGate<Sub> {
    /// Run the entry poll and, if no job exists, start waiting.
    ///
    /// Returns `None` when there is nothing to wait for: a job already
    /// exists, or the spooler's broadcasts cannot be watched.
    pub async fn enter<S, G>(
        spooler: &S,
        signals: &G,
        events: &UnboundedSender<ServiceEvent>,
        recheck_delay: Duration,
        safety_timeout: Option<Duration>,
    ) -> Option<Self>
    where
        S: Spooler,
        G: SpoolerSignals<Subscription = Sub>,
    {
        if spooler.has_own_jobs().await {
            info!("print jobs already queued, not waiting");
            return None;
        }

        let subscription = match signals.subscribe(events.clone()).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "cannot watch the spooler, not waiting for jobs");
                return None;
            }
        };

        let mut safety = TimerSlot::new();
        if let Some(timeout) = safety_timeout {
            safety.arm(timeout, events, ServiceEvent::JobWaitTimeout);
        }

        info!(safety_timeout = ?safety_timeout, "waiting for a print job");
        Some(Self {
            recheck: TimerSlot::new(),
            safety,
            recheck_delay,
            _subscription: subscription,
        })
    }

    /// A state-changed broadcast arrived: (re)schedule the recheck.
    pub fn on_signal(&mut self, events: &UnboundedSender<ServiceEvent>) {
        self.recheck
            .arm(self.recheck_delay, events, ServiceEvent::JobRecheck);
        debug!(delay_ms = self.recheck_delay.as_millis() as u64, "job recheck scheduled");
    }

    /// The recheck timer fired. Returns `true` when a job now exists and
    /// the wait is over. Stale fires are ignored.
    pub async fn recheck<S: Spooler>(&mut self, generation: u64, spooler: &S) -> bool {
        if !self.recheck.take_fire(generation) {
            return false;
        }
        debug!("checking for jobs");
        spooler.has_own_jobs().await
    }

    /// The safety timeout fired. Returns `true` if it is current.
    pub fn safety_elapsed(&mut self, generation: u64) -> bool {
        self.safety.take_fire(generation)
    }

    #[cfg(test)]
    pub fn recheck_pending(&self) -> bool {
        self.recheck.is_armed()
    }

    /// Stop waiting: cancel timers and drop the subscription.
    pub fn close(self, reason: &str) {
        drop(self);
        info!(reason, "stopped waiting for jobs");
    }
}
