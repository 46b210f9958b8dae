// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-shot timers that post an event to the service loop when they fire.
//
// `TimerSlot` holds at most one pending timer: arming it aborts whatever was
// pending and bumps a generation counter carried in the posted event, so a
// fire that was already queued before the re-arm is recognisably stale.
// `TimerSet` holds any number of independent timers.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

fn spawn_timer<E: Send + 'static>(delay: Duration, events: &UnboundedSender<E>, event: E) -> JoinHandle<()> {
    // The deadline is fixed now, not when the task is first polled.
    let deadline = Instant::now() + delay;
    let events = events.clone();
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        let _ = events.send(event);
    })
}

/// One logical timer that can be replaced or cancelled.
#[derive(Debug, Default)]
pub struct TimerSlot {
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending timer and arm a new one. `event` receives the new
    /// generation.
    pub fn arm<E, F>(&mut self, delay: Duration, events: &UnboundedSender<E>, event: F) -> u64
    where
        E: Send + 'static,
        F: FnOnce(u64) -> E,
    {
        self.cancel();
        self.generation += 1;
        self.pending = Some(spawn_timer(delay, events, event(self.generation)));
        self.generation
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a fire posted with `generation`.
    ///
    /// Returns `false` for stale fires (superseded or cancelled); a current
    /// fire disarms the slot.
    pub fn take_fire(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && generation == self.generation {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Independent single-shot timers, all of which fire.
#[derive(Debug, Default)]
pub struct TimerSet {
    pending: Vec<JoinHandle<()>>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<E: Send + 'static>(&mut self, delay: Duration, events: &UnboundedSender<E>, event: E) {
        self.pending.retain(|handle| !handle.is_finished());
        self.pending.push(spawn_timer(delay, events, event));
    }

    /// Timers that have not fired yet.
    #[cfg(test)]
    pub fn outstanding(&self) -> usize {
        self.pending.iter().filter(|handle| !handle.is_finished()).count()
    }

    pub fn abort_all(&mut self) {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new();

        let first = slot.arm(Duration::from_millis(200), &tx, |g| g);
        tokio::time::advance(Duration::from_millis(150)).await;
        let second = slot.arm(Duration::from_millis(200), &tx, |g| g);
        assert_ne!(first, second);

        // The first deadline passes without a fire.
        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(rx.try_recv().unwrap(), second);
        assert!(slot.take_fire(second));
        assert!(!slot.is_armed());
    }

    #[test]
    fn stale_generation_is_rejected() {
        let mut slot = TimerSlot::new();
        assert!(!slot.take_fire(0));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new();
        let generation = slot.arm(Duration::from_millis(200), &tx, |g| g);
        slot.cancel();

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
        assert!(!slot.take_fire(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn every_timer_in_a_set_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut set = TimerSet::new();
        set.schedule(Duration::from_secs(60), &tx, 1);
        tokio::time::advance(Duration::from_secs(10)).await;
        set.schedule(Duration::from_secs(60), &tx, 2);
        assert_eq!(set.outstanding(), 2);

        tokio::time::advance(Duration::from_secs(50)).await;
        settle().await;
        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(rx.try_recv().unwrap(), 2);
        assert_eq!(set.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_set_stays_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut set = TimerSet::new();
        set.schedule(Duration::from_secs(60), &tx, ());
        set.abort_all();

        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }
}
