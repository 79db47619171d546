use std::time::{Duration, Instant};

use crate::models::Observation;

/// Process-lifetime mutable state shared between the live sampling path and
/// the manual analysis path. Created once at startup and reset in place by a
/// confirmed clear; never stored globally.
#[derive(Debug, Default)]
pub struct SessionContext {
    /// Most recent face observation. Overwritten on every successful live
    /// classification; empty detections leave the last-known-good value.
    live_face: Option<Observation>,
    /// When the live path last committed a history record.
    last_commit: Option<Instant>,
    /// Set by a clear request, consumed by confirm or cancel.
    clear_pending: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_face(&self) -> Option<&Observation> {
        self.live_face.as_ref()
    }

    pub fn update_live_face(&mut self, observation: Observation) {
        self.live_face = Some(observation);
    }

    /// Whether the live path may commit at `now`. Opens immediately when
    /// nothing has been committed yet, then once per `interval` after that.
    pub fn commit_allowed(&self, now: Instant, interval: Duration) -> bool {
        match self.last_commit {
            Some(last) => now.duration_since(last) >= interval,
            None => true,
        }
    }

    pub fn record_commit(&mut self, now: Instant) {
        self.last_commit = Some(now);
    }

    pub fn request_clear(&mut self) {
        self.clear_pending = true;
    }

    pub fn cancel_clear(&mut self) {
        self.clear_pending = false;
    }

    pub fn clear_pending(&self) -> bool {
        self.clear_pending
    }

    /// Full reset after a confirmed clear: the next session starts with no
    /// cached observation and an open commit gate.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_opens_immediately_on_fresh_session() {
        let session = SessionContext::new();
        assert!(session.commit_allowed(Instant::now(), Duration::from_secs(4)));
    }

    #[test]
    fn gate_stays_closed_within_interval() {
        let mut session = SessionContext::new();
        let start = Instant::now();
        let interval = Duration::from_secs(4);

        session.record_commit(start);
        assert!(!session.commit_allowed(start + Duration::from_secs(1), interval));
        assert!(!session.commit_allowed(start + Duration::from_millis(3999), interval));
        assert!(session.commit_allowed(start + Duration::from_secs(5), interval));
    }

    #[test]
    fn two_events_inside_interval_yield_one_commit() {
        let mut session = SessionContext::new();
        let start = Instant::now();
        let interval = Duration::from_secs(4);
        let mut commits = 0;

        for offset in [Duration::ZERO, Duration::from_secs(2)] {
            let now = start + offset;
            if session.commit_allowed(now, interval) {
                session.record_commit(now);
                commits += 1;
            }
        }
        assert_eq!(commits, 1);

        // A third event past the interval commits again.
        let later = start + Duration::from_secs(5);
        assert!(session.commit_allowed(later, interval));
    }

    #[test]
    fn reset_drops_cache_and_reopens_gate() {
        let mut session = SessionContext::new();
        session.update_live_face(Observation::new("Happy", 0.9));
        session.record_commit(Instant::now());
        session.request_clear();

        session.reset();

        assert!(session.live_face().is_none());
        assert!(!session.clear_pending());
        assert!(session.commit_allowed(Instant::now(), Duration::from_secs(4)));
    }
}
