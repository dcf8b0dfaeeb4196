//! Scaled countdown counter
//!
//! Every timer in the MAC layer (NAV, ALLOCATED, SIFS, DIFS, BACKOFF)
//! is a `Counter`. A counter holds a remaining duration in time units and
//! is re-armed in multiples of its `slot` scale: the inter-frame gaps use
//! a scale of one (armed directly in time units) while the backoff timer
//! uses the contention slot duration, so it is armed in slots.

/// Non-negative countdown with a fixed arming scale.
#[derive(Debug, Clone)]
pub struct Counter {
    slot: u64,
    value: u64,
}

impl Counter {
    /// A counter armed in multiples of `slot` time units.
    pub fn new(slot: u64) -> Self {
        Self { slot, value: 0 }
    }

    /// A counter armed directly in time units.
    pub fn unit() -> Self {
        Self::new(1)
    }

    /// Re-arm to `value` slots.
    pub fn reset(&mut self, value: u64) {
        self.value = self.slot * value;
    }

    /// Drop straight to zero.
    pub fn clear(&mut self) {
        self.value = 0;
    }

    /// Count down by `step` time units, saturating at zero.
    pub fn decrease(&mut self, step: u64) {
        self.value = self.value.saturating_sub(step);
    }

    /// True while any time remains.
    pub fn is_left(&self) -> bool {
        self.value > 0
    }

    /// Remaining time in time units.
    pub fn remaining(&self) -> u64 {
        self.value
    }
}
