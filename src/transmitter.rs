//! Per-station radio frontend
//!
//! The [`Transmitter`] owns one send slot and one receive slot, the
//! station's [`CsmaState`], and its traffic counters. It receives the
//! per-tick detection hits from the medium, accumulates bits in and out
//! at the configured data rate, and dispatches protocol reactions when a
//! frame completes: DATA is answered with an ACK, RTS with a CTS, an
//! overheard reservation arms the NAV.

use rand::Rng;

use crate::config::{ProtocolTiming, SimConfig, ONE_SECOND};
use crate::csma::CsmaState;
use crate::frame::{Frame, FrameId, FrameKind};
use crate::medium::TickContext;
use crate::station::StationId;

/// A sent frame still waiting for its response.
#[derive(Debug, Clone, Copy)]
pub struct Outstanding {
    pub id: FrameId,
    pub sent_at: u64,
}

/// Count and volume for one frame kind.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct KindTally {
    pub count: u64,
    pub bits: u64,
}

/// Traffic totals broken down by frame kind.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FrameTally {
    pub data: KindTally,
    pub ack: KindTally,
    pub rts: KindTally,
    pub cts: KindTally,
}

impl FrameTally {
    pub fn record(&mut self, kind: FrameKind, bits: u64) {
        let slot = match kind {
            FrameKind::Data => &mut self.data,
            FrameKind::Ack => &mut self.ack,
            FrameKind::Rts => &mut self.rts,
            FrameKind::Cts => &mut self.cts,
        };
        slot.count += 1;
        slot.bits += bits;
    }

    pub fn get(&self, kind: FrameKind) -> &KindTally {
        match kind {
            FrameKind::Data => &self.data,
            FrameKind::Ack => &self.ack,
            FrameKind::Rts => &self.rts,
            FrameKind::Cts => &self.cts,
        }
    }

    pub fn total_bits(&self) -> u64 {
        self.data.bits + self.ack.bits + self.rts.bits + self.cts.bits
    }
}

#[derive(Debug)]
pub struct Transmitter {
    station_id: StationId,
    data_rate: u64,
    with_rts: bool,
    timeout_count_as_collision: bool,
    ack_timeout: u64,
    csma: CsmaState,
    send_slot: Option<Frame>,
    recv_slot: Option<Frame>,
    /// Frame ids whose wavefront covered this station on the current tick.
    detected: Vec<FrameId>,
    outstanding: Option<Outstanding>,
    sent_current: f64,
    recv_current: f64,
    sent: FrameTally,
    received: FrameTally,
    collisions: u64,
    timeouts: u64,
    /// Time units burnt waiting for responses that never came.
    wasted: u64,
}

impl Transmitter {
    pub fn new(station_id: StationId, config: &SimConfig, timing: ProtocolTiming) -> Self {
        Self {
            station_id,
            data_rate: config.data_rate,
            with_rts: config.with_rts,
            timeout_count_as_collision: config.timeout_count_as_collision,
            ack_timeout: timing.ack_timeout,
            csma: CsmaState::new(timing, config.backoff_min, config.backoff_max),
            send_slot: None,
            recv_slot: None,
            detected: Vec::new(),
            outstanding: None,
            sent_current: 0.0,
            recv_current: 0.0,
            sent: FrameTally::default(),
            received: FrameTally::default(),
            collisions: 0,
            timeouts: 0,
            wasted: 0,
        }
    }

    /// Forget last tick's detections before the medium reports new ones.
    pub fn begin_tick(&mut self) {
        self.detected.clear();
    }

    /// One frame's wavefront covers this station right now. Returns the
    /// id of a frame the caller must mark collided on the air, if the
    /// arrival garbled an in-progress reception.
    pub fn on_detect(&mut self, frame: &Frame) -> Option<FrameId> {
        if !self.detected.contains(&frame.id) {
            self.detected.push(frame.id);
        }
        match &mut self.recv_slot {
            Some(slot) if slot.id != frame.id => {
                slot.collide();
                Some(slot.id)
            }
            Some(_) => None,
            None => {
                let addressed = frame.receiver == self.station_id;
                let control = matches!(frame.kind, FrameKind::Rts | FrameKind::Cts);
                if addressed || control {
                    self.recv_slot = Some(frame.clone());
                }
                None
            }
        }
    }

    pub fn talkover_detected(&self) -> bool {
        self.detected.len() > 1
    }

    pub fn is_medium_busy(&self) -> bool {
        !self.detected.is_empty()
    }

    pub fn is_receiving(&self) -> bool {
        self.recv_slot.is_some()
    }

    pub fn is_sending(&self) -> bool {
        self.sent_current != 0.0
    }

    /// Accumulate one tick of an in-progress reception. On completion the
    /// collision verdict comes from the frame's on-air copy, which has
    /// seen every receiver's talkover reports, not just ours.
    pub fn proceed_recv(&mut self, ctx: &mut TickContext) {
        if self.detected.is_empty() {
            // The wavefront left us before the payload completed.
            self.on_receive_failure();
            return;
        }
        let (size, id, slot_collided) = match &self.recv_slot {
            Some(slot) => (slot.size, slot.id, slot.collided),
            None => return,
        };
        self.recv_current += (ctx.step * self.data_rate) as f64 / ONE_SECOND as f64;
        if self.recv_current >= size as f64 {
            let collided = ctx
                .air
                .get(id)
                .map(|frame| frame.collided)
                .unwrap_or(slot_collided);
            if collided {
                self.collisions += 1;
                self.on_receive_failure();
            } else {
                self.on_receive_success(ctx);
            }
        }
    }

    fn on_receive_success(&mut self, ctx: &mut TickContext) {
        let frame = match self.recv_slot.take() {
            Some(frame) => frame,
            None => return,
        };
        self.recv_current = 0.0;
        self.received.record(frame.kind, frame.size);
        match frame.kind {
            FrameKind::Data => self.on_data(&frame, ctx),
            FrameKind::Ack => self.on_ack(),
            FrameKind::Rts => self.on_rts(&frame, ctx),
            FrameKind::Cts => self.on_cts(&frame, ctx),
        }
    }

    fn on_receive_failure(&mut self) {
        self.recv_slot = None;
        self.recv_current = 0.0;
    }

    /// Queue a frame for transmission, arming the inter-frame space its
    /// kind calls for. A SIFS-gapped reply preempts a contention frame
    /// that has not left the slot yet.
    pub fn push(&mut self, frame: Frame) {
        if self.csma.is_difs(self.with_rts, frame.kind) {
            self.csma.set_difs();
        } else {
            self.csma.set_sifs();
        }
        match &self.send_slot {
            Some(queued) if self.csma.is_difs(self.with_rts, queued.kind) => {
                self.send_slot = Some(frame);
            }
            Some(_) => {}
            None => self.send_slot = Some(frame),
        }
    }

    /// Put the queued frame on the air and start clocking its bits out.
    pub fn send(&mut self, ctx: &mut TickContext) {
        if let Some(frame) = &mut self.send_slot {
            frame.depart(ctx.now);
            ctx.air.activate(frame.clone());
            if frame.kind != FrameKind::Ack {
                self.outstanding = Some(Outstanding {
                    id: frame.id,
                    sent_at: ctx.now,
                });
            }
            tracing::trace!(station = %self.station_id, frame = %frame.id, kind = %frame.kind, "frame on air");
        }
        self.proceed_send(ctx);
    }

    pub fn proceed_send(&mut self, ctx: &mut TickContext) {
        let (size, id) = match &self.send_slot {
            Some(slot) => (slot.size, slot.id),
            None => return,
        };
        self.sent_current += (ctx.step * self.data_rate) as f64 / ONE_SECOND as f64;
        if self.sent_current >= size as f64 {
            ctx.air.set_done(id, ctx.now);
            if let Some(mut frame) = self.send_slot.take() {
                frame.done(ctx.now);
                self.sent.record(frame.kind, frame.size);
            }
            self.sent_current = 0.0;
        }
    }

    fn on_data(&mut self, frame: &Frame, ctx: &mut TickContext) {
        let me = ctx.roster.placement(self.station_id);
        let peer = ctx.roster.placement(frame.sender);
        let ack = ctx.air.assemble(FrameKind::Ack, &me, &peer, None);
        self.push(ack);
        self.outstanding = None;
    }

    fn on_ack(&mut self) {
        self.csma.set_difs();
        self.csma.reset_backoff_range();
        self.outstanding = None;
        tracing::debug!(station = %self.station_id, "transaction acknowledged");
    }

    fn on_rts(&mut self, frame: &Frame, ctx: &mut TickContext) {
        if frame.receiver == self.station_id {
            let me = ctx.roster.placement(self.station_id);
            let peer = ctx.roster.placement(frame.sender);
            let duration = self.csma.cts_duration();
            let cts = ctx.air.assemble(FrameKind::Cts, &me, &peer, Some(duration));
            self.push(cts);
        } else if let Some(duration) = frame.duration {
            self.csma.set_nav(duration);
        }
    }

    fn on_cts(&mut self, frame: &Frame, ctx: &mut TickContext) {
        if frame.receiver == self.station_id {
            let me = ctx.roster.placement(self.station_id);
            let peer = ctx.roster.placement(frame.sender);
            let data = ctx.air.assemble(FrameKind::Data, &me, &peer, None);
            self.push(data);
            if let Some(duration) = frame.duration {
                self.csma.set_allocated(duration);
            }
            self.csma.reset_backoff_range();
            self.outstanding = None;
        } else if let Some(duration) = frame.duration {
            self.csma.set_nav(duration);
        }
    }

    /// The expected response never arrived. Widen the contention window
    /// and give the frame up.
    pub fn on_timeout(&mut self) {
        self.timeouts += 1;
        if self.timeout_count_as_collision {
            self.collisions += 1;
        }
        self.wasted += self.ack_timeout;
        self.csma.collision_occured();
        tracing::debug!(station = %self.station_id, "response timed out, widening contention window");
    }

    /// Run the access decision for this tick. Called every idle tick so
    /// the inter-frame timers keep aging even when nothing is queued.
    pub fn okay_to_send<R: Rng>(&mut self, step: u64, rng: &mut R) -> bool {
        let busy = self.is_medium_busy();
        let csma_ok = self.csma.check_and_decrease(busy, step, rng);
        let acked = self.outstanding.is_none();
        !busy && csma_ok && acked
    }

    pub fn want_to_send(&self) -> bool {
        self.send_slot.is_some()
    }

    pub fn csma(&self) -> &CsmaState {
        &self.csma
    }

    pub fn csma_mut(&mut self) -> &mut CsmaState {
        &mut self.csma
    }

    pub fn outstanding(&self) -> Option<&Outstanding> {
        self.outstanding.as_ref()
    }

    pub fn clear_outstanding(&mut self) {
        self.outstanding = None;
    }

    pub fn detected(&self) -> &[FrameId] {
        &self.detected
    }

    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    pub fn wasted(&self) -> u64 {
        self.wasted
    }

    pub fn sent(&self) -> &FrameTally {
        &self.sent
    }

    pub fn received(&self) -> &FrameTally {
        &self.received
    }
}
