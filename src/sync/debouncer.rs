use std::time::Duration;

use tokio::time::Instant;

/// Pure debouncer: only handles timing.
///
/// Every `arm` restarts the quiet window; the debouncer is ready once the
/// window has passed since the last one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_event: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    pub fn cancel(&mut self) {
        self.last_event = None;
    }

    pub fn is_armed(&self) -> bool {
        self.last_event.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|at| at + self.window)
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| deadline <= now)
    }

    /// Disarm and report true if the window has elapsed.
    pub fn take_if_ready(&mut self, now: Instant) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_event = None;
        true
    }
}
