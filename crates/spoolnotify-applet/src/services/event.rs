// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Events consumed by the notification service's loop.

use spoolnotify_core::types::PrinterEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// `GetReady` RPC: a driver search has started.
    GetReady,
    /// `NewPrinter` RPC.
    NewPrinter(PrinterEvent),
    /// One readiness timeout elapsed.
    ReadinessTimeout,
    /// The spooler broadcast a state change.
    SpoolerChanged,
    /// The debounced job recheck is due. Carries the timer generation.
    JobRecheck(u64),
    /// The job-wait safety timeout elapsed. Carries the timer generation.
    JobWaitTimeout(u64),
    /// Ctrl-C received; clean up and leave the loop.
    Shutdown,
}
