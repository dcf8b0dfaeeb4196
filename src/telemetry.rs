//! Run statistics
//!
//! A [`Telemetry`] snapshot can be taken at any point of a run and
//! serializes to JSON for offline analysis.

use serde::Serialize;

use crate::geometry::Point;
use crate::station::StationId;
use crate::transmitter::FrameTally;

/// One station's traffic totals.
#[derive(Debug, Clone, Serialize)]
pub struct StationTelemetry {
    pub id: StationId,
    pub location: Point,
    pub sent: FrameTally,
    pub received: FrameTally,
    pub collisions: u64,
    pub timeouts: u64,
    pub wasted: u64,
}

/// Whole-world snapshot at a point in simulated time.
#[derive(Debug, Clone, Serialize)]
pub struct Telemetry {
    pub time: u64,
    pub frames_on_air: usize,
    pub stations: Vec<StationTelemetry>,
}

impl Telemetry {
    pub fn total_collisions(&self) -> u64 {
        self.stations.iter().map(|s| s.collisions).sum()
    }

    pub fn total_timeouts(&self) -> u64 {
        self.stations.iter().map(|s| s.timeouts).sum()
    }

    pub fn total_wasted(&self) -> u64 {
        self.stations.iter().map(|s| s.wasted).sum()
    }

    pub fn data_frames_sent(&self) -> u64 {
        self.stations.iter().map(|s| s.sent.data.count).sum()
    }

    pub fn data_bits_received(&self) -> u64 {
        self.stations.iter().map(|s| s.received.data.bits).sum()
    }

    /// Collisions per DATA frame sent. Zero when nothing was sent.
    pub fn collision_rate(&self) -> f64 {
        let sent = self.data_frames_sent();
        if sent == 0 {
            return 0.0;
        }
        self.total_collisions() as f64 / sent as f64
    }

    /// Goodput in bits per second of simulated time.
    pub fn throughput_bps(&self) -> f64 {
        if self.time == 0 {
            return 0.0;
        }
        self.data_bits_received() as f64 * crate::config::ONE_SECOND as f64 / self.time as f64
    }
}
