// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Readiness debouncer: how many driver searches are outstanding.
//
// The searching indicator is visible iff the count is above zero.  Each
// `GetReady` adds one and schedules its own timeout; each timeout (and each
// `NewPrinter`) takes one away, never going below zero.

/// Outstanding-search counter.
#[derive(Debug, Default)]
pub struct ReadinessDebouncer {
    count: u32,
}

impl ReadinessDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new search. Returns `true` on the idle-to-searching edge,
    /// when the indicator must be shown.
    pub fn get_ready(&mut self) -> bool {
        self.count += 1;
        self.count == 1
    }

    /// Resolve one search. Returns `true` when this brought the count back
    /// to zero, when the indicator must be hidden.
    pub fn resolve(&mut self) -> bool {
        match self.count {
            0 => false,
            n => {
                self.count = n - 1;
                self.count == 0
            }
        }
    }

    pub fn outstanding(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_get_ready_shows() {
        let mut r = ReadinessDebouncer::new();
        assert!(r.get_ready());
        assert!(!r.get_ready());
        assert!(!r.get_ready());
        assert_eq!(r.outstanding(), 3);
    }

    #[test]
    fn hides_exactly_when_count_returns_to_zero() {
        let mut r = ReadinessDebouncer::new();
        r.get_ready();
        r.get_ready();
        assert!(!r.resolve());
        assert!(r.outstanding() > 0);
        assert!(r.resolve());
        assert_eq!(r.outstanding(), 0);
    }

    #[test]
    fn resolve_saturates_at_zero() {
        let mut r = ReadinessDebouncer::new();
        assert!(!r.resolve());
        assert_eq!(r.outstanding(), 0);

        // A later search still shows the indicator.
        assert!(r.get_ready());
    }
}
