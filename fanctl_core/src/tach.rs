//! Tachometer pulse-to-RPM estimation.
//!
//! `on_pulse` runs in the edge dispatch context (rppal's interrupt thread on
//! real hardware) while the control loop calls `read_rpm` from its own
//! thread. All state lives in atomics: the RPM value is stored as the bit
//! pattern of an `f64` in an `AtomicU64`, so a reader always observes a
//! complete value written by some earlier revolution boundary.
//!
//! Single writer: only one context may call `on_pulse`. The pulse counter
//! and last tick use plain load/store pairs that are not safe against two
//! concurrent writers.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use fanctl_traits::tick_diff;

use crate::util::MICROS_PER_MINUTE;

/// Tachometer edges per shaft revolution (property of the fan).
pub const PULSES_PER_REVOLUTION: u8 = 2;

#[derive(Debug, Default)]
pub struct TachometerEstimator {
    /// Tick of the last revolution boundary (or of the anchoring edge).
    last_tick: AtomicU32,
    /// Edges seen since the last boundary.
    pulse_count: AtomicU8,
    /// False until the first edge has anchored `last_tick`.
    anchored: AtomicBool,
    rpm_bits: AtomicU64,
    updates: AtomicU64,
}

impl TachometerEstimator {
    pub const fn new() -> Self {
        Self {
            last_tick: AtomicU32::new(0),
            pulse_count: AtomicU8::new(0),
            anchored: AtomicBool::new(false),
            // 0.0_f64 has an all-zero bit pattern
            rpm_bits: AtomicU64::new(0),
            updates: AtomicU64::new(0),
        }
    }

    /// Consume one falling edge stamped at `tick` (wrapping µs).
    ///
    /// Returns the new estimate when this edge closes a revolution, `None`
    /// otherwise. A zero-length revolution (duplicate tick) resets the
    /// counter and boundary but leaves the previous estimate in place.
    /// O(1), allocation-free, never panics.
    pub fn on_pulse(&self, tick: u32) -> Option<f64> {
        if !self.anchored.load(Ordering::Relaxed) {
            self.last_tick.store(tick, Ordering::Relaxed);
            self.anchored.store(true, Ordering::Relaxed);
            return None;
        }

        let count = self.pulse_count.load(Ordering::Relaxed).saturating_add(1);
        if count < PULSES_PER_REVOLUTION {
            self.pulse_count.store(count, Ordering::Relaxed);
            return None;
        }

        let last = self.last_tick.swap(tick, Ordering::Relaxed);
        self.pulse_count.store(0, Ordering::Relaxed);

        let dt = tick_diff(last, tick);
        if dt == 0 {
            return None;
        }
        let rpm = MICROS_PER_MINUTE / f64::from(dt);
        self.rpm_bits.store(rpm.to_bits(), Ordering::Release);
        self.updates.fetch_add(1, Ordering::Release);
        Some(rpm)
    }

    /// Last computed RPM; 0.0 until the first revolution completes.
    /// Never reset when pulses stop.
    #[inline]
    pub fn read_rpm(&self) -> f64 {
        f64::from_bits(self.rpm_bits.load(Ordering::Acquire))
    }

    /// Number of RPM updates so far.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Acquire)
    }
}
