//! Monotonic time source driven by explicit frame deltas.
//!
//! The host (a render loop, a test, an offline tool) reports elapsed time via
//! [`Scheduler::advance`]; nothing in the crate reads a wall clock.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scheduler {
    now_ms: f64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler { now_ms: 0.0 }
    }

    /// Start at an arbitrary timestamp (e.g. `performance.now()`).
    pub fn starting_at(now_ms: f64) -> Self {
        Scheduler {
            now_ms: if now_ms.is_finite() { now_ms.max(0.0) } else { 0.0 },
        }
    }

    /// Move time forward. Negative and non-finite deltas are ignored.
    pub fn advance(&mut self, delta_ms: f64) -> f64 {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.now_ms += delta_ms;
        }
        self.now_ms
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }
}
