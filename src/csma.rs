//! CSMA/CA access-control state machine
//!
//! `CsmaState` owns the five countdown timers of the DCF access sequence
//! (NAV, ALLOCATED, SIFS, DIFS, BACKOFF) and the binary-exponential
//! contention window. The decision of whether a station may transmit on a
//! given tick is [`check_and_decrease`](CsmaState::check_and_decrease),
//! which walks the timers in a strict priority order. NAV and ALLOCATED
//! are additionally counted down once per tick by
//! [`nav_decrease`](CsmaState::nav_decrease), independent of whether the
//! access decision runs at all that tick; a station that is busy sending
//! or receiving still ages its overheard reservations.

use rand::Rng;

use crate::config::ProtocolTiming;
use crate::counter::Counter;
use crate::frame::FrameKind;

/// Per-station CSMA/CA timers and contention window.
#[derive(Debug, Clone)]
pub struct CsmaState {
    timing: ProtocolTiming,
    backoff_min: u64,
    backoff_max: u64,
    backoff_range: u64,
    nav: Counter,
    allocated: Counter,
    sifs: Counter,
    difs: Counter,
    backoff: Counter,
}

impl CsmaState {
    pub fn new(timing: ProtocolTiming, backoff_min: u64, backoff_max: u64) -> Self {
        Self {
            backoff: Counter::new(timing.slot_time),
            nav: Counter::unit(),
            allocated: Counter::unit(),
            sifs: Counter::unit(),
            difs: Counter::unit(),
            timing,
            backoff_min,
            backoff_max,
            backoff_range: backoff_min,
        }
    }

    /// Double the contention window, clamped to the configured maximum.
    pub fn collision_occured(&mut self) {
        self.backoff_range = (self.backoff_range * 2).min(self.backoff_max);
    }

    /// Collapse the contention window back to its minimum after a clean
    /// ACK/CTS exchange.
    pub fn reset_backoff_range(&mut self) {
        self.backoff_range = self.backoff_min;
    }

    /// Draw a fresh backoff uniformly from `[0, backoff_range)` slots.
    pub fn set_backoff<R: Rng>(&mut self, rng: &mut R) {
        let slots = rng.gen_range(0..self.backoff_range);
        self.backoff.reset(slots);
    }

    pub fn set_sifs(&mut self) {
        self.sifs.reset(self.timing.sifs);
    }

    pub fn set_difs(&mut self) {
        self.difs.reset(self.timing.difs);
    }

    /// Arm the virtual carrier sense from an overheard reservation.
    pub fn set_nav(&mut self, duration: u64) {
        self.nav.reset(duration);
    }

    /// Arm the own-reservation timer granted by a received CTS.
    pub fn set_allocated(&mut self, duration: u64) {
        self.allocated.reset(duration);
    }

    /// True for the frame type that opens fresh contention and therefore
    /// waits a full DIFS: RTS when the handshake is enabled, DATA
    /// otherwise. Everything else is a SIFS-gapped reply.
    pub fn is_difs(&self, with_rts: bool, kind: FrameKind) -> bool {
        (with_rts && kind == FrameKind::Rts) || (!with_rts && kind == FrameKind::Data)
    }

    /// Age ALLOCATED and NAV. Runs every tick, unconditionally, from the
    /// station ladder, never folded into the access decision below.
    pub fn nav_decrease(&mut self, step: u64) {
        if self.allocated.is_left() {
            self.allocated.decrease(step);
        }
        if self.nav.is_left() {
            self.nav.decrease(step);
        }
    }

    /// The access decision. Walks the timers in priority order; each arm
    /// short-circuits. Returns true only when every timer is exhausted
    /// and the channel reads idle.
    pub fn check_and_decrease<R: Rng>(&mut self, is_busy: bool, step: u64, rng: &mut R) -> bool {
        // Deferring to an overheard reservation: nothing else is touched.
        if self.nav.is_left() {
            return false;
        }

        if self.sifs.is_left() {
            self.sifs.decrease(step);
            return false;
        }

        if self.difs.is_left() {
            self.difs.decrease(step);
            return false;
        }

        if self.backoff.is_left() {
            if !is_busy {
                self.backoff.decrease(step);
            } else {
                // Someone grabbed the channel mid-contention: void the
                // window and start over from DIFS next time.
                self.backoff.clear();
                self.set_difs();
            }
            return false;
        }

        if is_busy {
            self.set_difs();
            self.set_backoff(rng);
            return false;
        }

        true
    }

    pub fn backoff_range(&self) -> u64 {
        self.backoff_range
    }

    pub fn rts_duration(&self) -> u64 {
        self.timing.rts_duration
    }

    pub fn cts_duration(&self) -> u64 {
        self.timing.cts_duration
    }

    pub fn nav(&self) -> &Counter {
        &self.nav
    }

    pub fn allocated(&self) -> &Counter {
        &self.allocated
    }

    pub fn sifs(&self) -> &Counter {
        &self.sifs
    }

    pub fn difs(&self) -> &Counter {
        &self.difs
    }

    pub fn backoff(&self) -> &Counter {
        &self.backoff
    }
}
