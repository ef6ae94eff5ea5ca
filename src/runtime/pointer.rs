//! Pointer input and enter/leave synthesis.
//!
//! Raw `over`/`out` events fire for every element boundary the pointer
//! crosses. A leave is only reported once no `over` follows an `out`
//! within the grace window, so moving between child elements reads as one
//! continuous hover.

use std::time::Duration;

use tokio::time::Instant;

use crate::dom::{NodePath, Viewport};
use crate::protocol::ScrollPosition;

/// Simulated user input delivered to a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DomInput {
    PointerOver { target: NodePath, x: f64, y: f64 },
    PointerOut,
    PointerMove { target: NodePath, x: f64, y: f64 },
    Click { target: NodePath, x: f64, y: f64 },
    /// The user scrolled the document.
    Scroll(ScrollPosition),
    /// The frame's viewport changed size.
    Resize(Viewport),
}

pub struct PointerTracker {
    grace: Duration,
    inside: bool,
    leave_at: Option<Instant>,
}

impl PointerTracker {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            inside: false,
            leave_at: None,
        }
    }

    /// Pointer entered some element. Returns true when this is a real enter.
    pub fn over(&mut self) -> bool {
        self.leave_at = None;
        if self.inside {
            false
        } else {
            self.inside = true;
            true
        }
    }

    /// Pointer left some element; arm the leave timer.
    pub fn out(&mut self, now: Instant) {
        self.leave_at = Some(now + self.grace);
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.leave_at
    }

    /// Whether the pending leave has come due. Fires at most once per arm.
    pub fn take_leave(&mut self, now: Instant) -> bool {
        match self.leave_at {
            Some(at) if at <= now => {
                self.leave_at = None;
                self.inside = false;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.inside = false;
        self.leave_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_millis(10);

    #[tokio::test(start_paused = true)]
    async fn test_out_then_over_within_grace_is_no_leave() {
        let mut pointer = PointerTracker::new(GRACE);
        let start = Instant::now();

        assert!(pointer.over());
        pointer.out(start);
        assert!(!pointer.over());
        assert!(!pointer.take_leave(start + GRACE * 5));
        assert!(pointer.is_inside());
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_without_over_is_one_leave() {
        let mut pointer = PointerTracker::new(GRACE);
        let start = Instant::now();

        pointer.over();
        pointer.out(start);
        assert!(!pointer.take_leave(start + Duration::from_millis(5)));
        assert!(pointer.take_leave(start + GRACE));
        assert!(!pointer.take_leave(start + GRACE * 2));
        assert!(!pointer.is_inside());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_out_rearms_single_timer() {
        let mut pointer = PointerTracker::new(GRACE);
        let start = Instant::now();

        pointer.over();
        pointer.out(start);
        pointer.out(start + Duration::from_millis(5));
        assert!(!pointer.take_leave(start + GRACE));
        assert!(pointer.take_leave(start + Duration::from_millis(15)));
        assert!(!pointer.take_leave(start + Duration::from_millis(30)));
    }
}
