//! Stations and the per-tick protocol ladder
//!
//! A [`Station`] is a fixed radio at a point in the world. Each tick it
//! walks a strict ladder: response-timeout check, NAV aging, then exactly
//! one of sending, receiving, originating new traffic, or attempting
//! channel access. The ladder ordering is what keeps a station from ever
//! doing two of those in the same tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ProtocolTiming, SimConfig};
use crate::frame::FrameKind;
use crate::geometry::Point;
use crate::medium::TickContext;
use crate::transmitter::Transmitter;

/// Index into the medium's station roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationId(pub usize);

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "station-{}", self.0)
    }
}

#[derive(Debug)]
pub struct Station {
    id: StationId,
    location: Point,
    detect_range: f64,
    slot_time: u64,
    with_rts: bool,
    /// Response deadline in time units after a frame leaves the air.
    timeout: u64,
    /// Chance of originating a new frame on any given tick.
    origination_probability: f64,
    transmitter: Transmitter,
}

impl Station {
    pub fn new(id: StationId, location: Point, config: &SimConfig, timing: ProtocolTiming) -> Self {
        Self {
            id,
            location,
            detect_range: config.detect_range,
            slot_time: config.slot_time,
            with_rts: config.with_rts,
            timeout: timing.ack_timeout,
            origination_probability: config.origination_probability(),
            transmitter: Transmitter::new(id, config, timing),
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn detect_range(&self) -> f64 {
        self.detect_range
    }

    pub fn transmitter(&self) -> &Transmitter {
        &self.transmitter
    }

    pub fn transmitter_mut(&mut self) -> &mut Transmitter {
        &mut self.transmitter
    }

    /// Whether this station originates a fresh frame this tick. Only
    /// when the send slot is free and no reservation of ours is running.
    fn want_to_push<R: Rng>(&mut self, rng: &mut R) -> bool {
        !self.transmitter.want_to_send()
            && !self.transmitter.csma().allocated().is_left()
            && rng.gen_bool(self.origination_probability)
    }

    /// One tick of protocol work.
    pub fn on_tick(&mut self, ctx: &mut TickContext) {
        if let Some(outstanding) = self.transmitter.outstanding() {
            if outstanding.sent_at + self.timeout < ctx.now {
                self.transmitter.clear_outstanding();
                self.transmitter.on_timeout();
            }
        }

        // Reservations age every tick, whatever else the station does.
        self.transmitter.csma_mut().nav_decrease(ctx.step);

        if self.transmitter.is_sending() {
            self.transmitter.proceed_send(ctx);
            return;
        }

        if self.transmitter.is_receiving() {
            self.transmitter.proceed_recv(ctx);
            return;
        }

        if self.want_to_push(ctx.rng) {
            if let Some(receiver) = ctx.roster.random_receiver(self.id, ctx.rng) {
                let me = ctx.roster.placement(self.id);
                let peer = ctx.roster.placement(receiver);
                let frame = if self.with_rts {
                    let duration = self.transmitter.csma().rts_duration();
                    ctx.air.assemble(FrameKind::Rts, &me, &peer, Some(duration))
                } else {
                    ctx.air.assemble(FrameKind::Data, &me, &peer, None)
                };
                self.transmitter.push(frame);
            }
            return;
        }

        // The access decision must run first so the inter-frame timers
        // advance even on ticks that fall between slot boundaries.
        let okay = self.transmitter.okay_to_send(ctx.step, ctx.rng);
        if okay && ctx.now % self.slot_time == 0 && self.transmitter.want_to_send() {
            self.transmitter.send(ctx);
        }
    }
}
