// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — the notification service and the pieces it owns.
//
// Everything here runs on the single event loop in `main`: bus callbacks and
// timers only post `ServiceEvent`s, and `NotificationService` handles them
// one at a time.

pub mod bus;
pub mod event;
pub mod job_wait;
pub mod notification_service;
pub mod readiness;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;
