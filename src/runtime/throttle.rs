//! Leading-and-trailing throttle.
//!
//! The first submission in a quiet period fires at once. Submissions inside
//! the interval are held, newest wins, and fire when the interval elapses.
//! The caller owns the clock: it asks for `deadline()` and calls
//! `take_due()` when its timer goes off.

use std::time::Duration;

use tokio::time::Instant;

pub struct Throttle<T> {
    interval: Duration,
    last_fire: Option<Instant>,
    trailing: Option<(Instant, T)>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
            trailing: None,
        }
    }

    /// Submit a value. Returns it back when it should fire immediately.
    pub fn submit(&mut self, now: Instant, value: T) -> Option<T> {
        match self.last_fire {
            Some(last) if now < last + self.interval => {
                self.trailing = Some((last + self.interval, value));
                None
            }
            _ => {
                self.last_fire = Some(now);
                self.trailing = None;
                Some(value)
            }
        }
    }

    /// When the held value is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.trailing.as_ref().map(|(at, _)| *at)
    }

    /// The held value, if its time has come.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.trailing {
            Some((at, _)) if *at <= now => {
                self.last_fire = Some(now);
                self.trailing.take().map(|(_, value)| value)
            }
            _ => None,
        }
    }

    /// Drop any held value and forget the last firing.
    pub fn cancel(&mut self) {
        self.last_fire = None;
        self.trailing = None;
    }
}
