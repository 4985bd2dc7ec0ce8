// src/core/clock.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Wall-clock abstraction. All animation and debounce state is a pure
/// function of `now()`, sampled once per frame by the engine.
pub trait Clock: Send {
    /// Monotonic seconds since an arbitrary origin.
    fn now(&self) -> f64;
}

/// Real clock anchored at construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for deterministic tests. Clones share the same
/// underlying time, so a test can keep one handle and give the engine
/// another.
#[derive(Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: f64) {
        self.bits.store(t.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, dt: f64) {
        self.set(self.now_value() + dt);
    }

    fn now_value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(1.25);
        assert_eq!(b.now(), 1.25);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let c = SystemClock::new();
        let t0 = c.now();
        let t1 = c.now();
        assert!(t1 >= t0);
    }
}
