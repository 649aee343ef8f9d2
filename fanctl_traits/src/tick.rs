//! Wrapping microsecond tick source used to timestamp tachometer edges.
//!
//! Ticks are a free-running `u32` microsecond counter that wraps every
//! 2^32 µs (~71.6 minutes). Differences are computed with [`tick_diff`],
//! which is exact across a single wraparound.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Source of wrapping 32-bit microsecond timestamps.
pub trait TickSource {
    fn ticks(&self) -> u32;
}

/// Elapsed microseconds from tick `earlier` to tick `later`, i.e.
/// `(later - earlier) mod 2^32`.
#[inline]
pub fn tick_diff(earlier: u32, later: u32) -> u32 {
    later.wrapping_sub(earlier)
}

/// Tick source backed by `Instant`, counting from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTicks {
    epoch: Instant,
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicTicks {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl TickSource for MonotonicTicks {
    #[inline]
    fn ticks(&self) -> u32 {
        // Truncation is the wraparound.
        self.epoch.elapsed().as_micros() as u32
    }
}

/// Manually driven tick source; clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct TestTicks {
    now: Arc<AtomicU32>,
}

impl TestTicks {
    pub fn starting_at(tick: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(tick)),
        }
    }

    /// Advance by `us` microseconds, wrapping at 2^32.
    pub fn advance(&self, us: u32) {
        let cur = self.now.load(Ordering::Relaxed);
        self.now.store(cur.wrapping_add(us), Ordering::Relaxed);
    }
}

impl TickSource for TestTicks {
    fn ticks(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }
}
