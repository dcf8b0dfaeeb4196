//! Frames and the on-air arena
//!
//! A [`Frame`] is a burst of bits expanding outward from its sender as a
//! circular wavefront. While the sender is still emitting, the frame is a
//! growing disc; once emission finishes the trailing edge lifts off and
//! the frame becomes an annulus that eventually outruns the sender's
//! radio range and vanishes. The [`FrameArena`] owns every frame
//! currently on air and is the single authority for collision marks.

use serde::Serialize;

use crate::config::{ACK_FRAME_SIZE, CTS_FRAME_SIZE, RTS_FRAME_SIZE};
use crate::geometry::Point;
use crate::medium::Placement;
use crate::station::StationId;

/// Arena-wide frame handle. Unique for the lifetime of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameId(pub u64);

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameKind {
    Data,
    Ack,
    Rts,
    Cts,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameKind::Data => "DATA",
            FrameKind::Ack => "ACK",
            FrameKind::Rts => "RTS",
            FrameKind::Cts => "CTS",
        };
        f.write_str(name)
    }
}

/// One frame, either queued in a station slot or active on the air.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: FrameId,
    pub kind: FrameKind,
    pub sender: StationId,
    pub receiver: StationId,
    pub sender_location: Point,
    pub receiver_location: Point,
    /// Payload size in bits.
    pub size: u64,
    /// Channel reservation this frame advertises, if any.
    pub duration: Option<u64>,
    /// Radius at which the wavefront dies out.
    pub max_range: f64,
    pub propagation_speed: f64,
    /// When the sender started emitting.
    pub sent: Option<u64>,
    /// When the sender finished emitting the last bit.
    pub done_sending: Option<u64>,
    /// When the trailing edge cleared `max_range`.
    pub vanished: Option<u64>,
    pub collided: bool,
}

impl Frame {
    /// Leading-edge radius at `now`, capped at the radio range.
    pub fn moved(&self, now: u64) -> f64 {
        match self.sent {
            Some(sent) => (now.saturating_sub(sent) as f64 * self.propagation_speed)
                .min(self.max_range),
            None => 0.0,
        }
    }

    /// Trailing-edge radius at `now`. Zero while the sender is still
    /// emitting; lags one tick behind completion so the last bits are
    /// still detectable on the tick after `done_sending`.
    pub fn moved_tail(&self, now: u64, step: u64) -> f64 {
        match self.done_sending {
            Some(done) => now.saturating_sub(done + step) as f64 * self.propagation_speed,
            None => 0.0,
        }
    }

    /// Interpolated position along the sender-receiver segment after
    /// covering `distance` of it.
    pub fn location(&self, now: u64) -> Point {
        let total = self.distance();
        if total == 0.0 {
            return self.sender_location;
        }
        let travelled = self.moved(now).min(total);
        let t = travelled / total;
        Point {
            x: self.sender_location.x + (self.receiver_location.x - self.sender_location.x) * t,
            y: self.sender_location.y + (self.receiver_location.y - self.sender_location.y) * t,
        }
    }

    pub fn distance(&self) -> f64 {
        self.sender_location.distance_to(&self.receiver_location)
    }

    pub fn collide(&mut self) {
        self.collided = true;
    }

    pub fn depart(&mut self, now: u64) {
        self.sent = Some(now);
    }

    pub fn done(&mut self, now: u64) {
        self.done_sending = Some(now);
    }

    pub fn vanish(&mut self, now: u64) {
        self.vanished = Some(now);
    }
}

/// Owner of every frame currently on the air.
#[derive(Debug)]
pub struct FrameArena {
    frames: Vec<Frame>,
    next_id: u64,
    propagation_speed: f64,
    data_frame_size: u64,
}

impl FrameArena {
    pub fn new(propagation_speed: f64, data_frame_size: u64) -> Self {
        Self {
            frames: Vec::new(),
            next_id: 0,
            propagation_speed,
            data_frame_size,
        }
    }

    /// Build a frame addressed from one placement to another. The frame
    /// is not on the air until [`activate`](Self::activate) is called
    /// with it; until then it lives in a station slot.
    pub fn assemble(
        &mut self,
        kind: FrameKind,
        sender: &Placement,
        receiver: &Placement,
        duration: Option<u64>,
    ) -> Frame {
        let size = match kind {
            FrameKind::Data => self.data_frame_size,
            FrameKind::Rts => RTS_FRAME_SIZE,
            FrameKind::Cts => CTS_FRAME_SIZE,
            FrameKind::Ack => ACK_FRAME_SIZE,
        };
        let id = FrameId(self.next_id);
        self.next_id += 1;
        Frame {
            id,
            kind,
            sender: sender.id,
            receiver: receiver.id,
            sender_location: sender.location,
            receiver_location: receiver.location,
            size,
            duration,
            max_range: sender.detect_range,
            propagation_speed: self.propagation_speed,
            sent: None,
            done_sending: None,
            vanished: None,
            collided: false,
        }
    }

    /// Put a departed frame on the air.
    pub fn activate(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn mark_collided(&mut self, id: FrameId) {
        if let Some(frame) = self.frames.iter_mut().find(|f| f.id == id) {
            frame.collide();
        }
    }

    pub fn set_done(&mut self, id: FrameId, now: u64) {
        if let Some(frame) = self.frames.iter_mut().find(|f| f.id == id) {
            frame.done(now);
        }
    }

    /// Drop frames whose trailing edge has outrun the radio range.
    /// Returns how many vanished this tick.
    pub fn expire(&mut self, now: u64, step: u64) -> usize {
        let mut vanished = 0;
        for frame in &mut self.frames {
            if frame.moved_tail(now, step) >= frame.max_range {
                frame.vanish(now);
                vanished += 1;
            }
        }
        self.frames.retain(|f| f.vanished.is_none());
        vanished
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
