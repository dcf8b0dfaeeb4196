//! Simulation parameters and derived protocol timing
//!
//! `SimConfig` carries everything the engine consumes at construction:
//! world geometry, per-station rates, CSMA windows and the tick grid.
//! `ProtocolTiming` holds the quantities derived from it (DIFS, frame
//! time, RTS/CTS reservation durations, the ACK timeout). All parameter
//! validation happens here, once, before a run starts; the run loop
//! itself is infallible.

use serde::{Deserialize, Serialize};

/// Time units per second. All times in the engine are abstract integer
/// units; with the default parameters one unit reads as a microsecond.
pub const ONE_SECOND: u64 = 1_000_000;

/// RTS frame size in bits (20 octets).
pub const RTS_FRAME_SIZE: u64 = 160;
/// CTS frame size in bits (14 octets).
pub const CTS_FRAME_SIZE: u64 = 112;
/// ACK frame size in bits (14 octets).
pub const ACK_FRAME_SIZE: u64 = 112;

/// Construction parameters for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of stations placed at setup.
    pub station_count: usize,
    /// Link data rate in bits per second.
    pub data_rate: u64,
    /// Mean frame origination rate per station, frames per second.
    pub frame_rate: u64,
    /// Carrier-sense range in kilometres.
    pub detect_range: f64,
    /// Contention slot duration in time units.
    pub slot_time: u64,
    /// Minimum backoff window, in slots.
    pub backoff_min: u64,
    /// Maximum backoff window, in slots.
    pub backoff_max: u64,
    /// DATA frame size in bits.
    pub frame_size: u64,
    /// Enable the RTS/CTS handshake before DATA.
    pub with_rts: bool,
    /// Route all traffic through a central hub station.
    pub star_topology: bool,
    /// Signal propagation speed in kilometres per time unit.
    pub propagation_speed: f64,
    /// Side length of the square world in kilometres.
    pub area_size: f64,
    /// Simulated time at which the run terminates.
    pub max_time: u64,
    /// Tick length in time units.
    pub step: u64,
    /// Short Inter-Frame Space in time units.
    pub sifs: u64,
    /// RNG seed; equal seeds reproduce runs exactly.
    pub seed: u64,
    /// Count an ACK/CTS timeout in the collision statistic, as the
    /// classic model does. Timeouts are tallied separately either way.
    pub timeout_count_as_collision: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            station_count: 5,
            data_rate: 11_000_000, // 802.11b
            frame_rate: 500,
            detect_range: 25.0,
            slot_time: 20,
            backoff_min: 2,
            backoff_max: 1024,
            frame_size: 8 * 1500, // one MTU-sized payload
            with_rts: true,
            star_topology: true,
            propagation_speed: 0.1,
            area_size: 50.0,
            max_time: 1_000,
            step: 10,
            sifs: 10,
            seed: 42,
            timeout_count_as_collision: true,
        }
    }
}

impl SimConfig {
    /// Reject parameter sets the engine cannot run with. Called by
    /// [`Simulation::new`](crate::sim::Simulation::new); fatal, never
    /// recoverable mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.station_count == 0 {
            return Err(ConfigError::NoStations);
        }
        if self.data_rate == 0 {
            return Err(ConfigError::NonPositive("data_rate"));
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::NonPositive("frame_rate"));
        }
        if self.frame_size == 0 {
            return Err(ConfigError::NonPositive("frame_size"));
        }
        if self.slot_time == 0 {
            return Err(ConfigError::NonPositive("slot_time"));
        }
        if self.step == 0 {
            return Err(ConfigError::NonPositive("step"));
        }
        if self.max_time == 0 {
            return Err(ConfigError::NonPositive("max_time"));
        }
        if !(self.detect_range > 0.0) {
            return Err(ConfigError::NonPositive("detect_range"));
        }
        if !(self.propagation_speed > 0.0) {
            return Err(ConfigError::NonPositive("propagation_speed"));
        }
        if !(self.area_size > 0.0) {
            return Err(ConfigError::NonPositive("area_size"));
        }
        if self.backoff_min < 1 || self.backoff_min > self.backoff_max {
            return Err(ConfigError::BackoffWindow {
                min: self.backoff_min,
                max: self.backoff_max,
            });
        }
        if self.slot_time % self.step != 0 {
            // Transmissions start on slot boundaries; the tick grid must
            // be able to land on them.
            return Err(ConfigError::SlotStepMismatch {
                slot_time: self.slot_time,
                step: self.step,
            });
        }
        Ok(())
    }

    /// Derive the inter-frame gaps and reservation durations.
    pub fn timing(&self) -> ProtocolTiming {
        let sifs = self.sifs;
        let difs = sifs + 2 * self.slot_time;
        // Nominal time between originations, padded by a contention slot
        // on each side.
        let frame_time = ONE_SECOND / self.frame_rate + 2 * self.slot_time;
        ProtocolTiming {
            slot_time: self.slot_time,
            sifs,
            difs,
            frame_time,
            // RTS reserves CTS + DATA + ACK; CTS reserves DATA + ACK.
            rts_duration: 3 * (sifs + frame_time),
            cts_duration: 2 * (sifs + frame_time),
            ack_timeout: sifs + 2 * frame_time,
        }
    }

    /// Per-tick probability of a station originating a frame: a
    /// Bernoulli trial approximating Poisson arrivals at `frame_rate`.
    pub fn origination_probability(&self) -> f64 {
        ((self.step * self.frame_rate) as f64 / ONE_SECOND as f64).min(1.0)
    }
}

/// Gap and reservation durations derived from a [`SimConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolTiming {
    /// Contention slot duration.
    pub slot_time: u64,
    /// Short Inter-Frame Space.
    pub sifs: u64,
    /// Distributed Inter-Frame Space: SIFS plus two slots.
    pub difs: u64,
    /// Nominal airtime between originations, padded by two slots.
    pub frame_time: u64,
    /// Channel reservation advertised by an RTS.
    pub rts_duration: u64,
    /// Channel reservation advertised by a CTS.
    pub cts_duration: u64,
    /// How long a sender waits for an ACK or CTS before giving up.
    pub ack_timeout: u64,
}

/// Result alias for construction-time operations.
pub type SimResult<T> = Result<T, ConfigError>;

/// Parameter sets rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one station is required")]
    NoStations,

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("backoff window must satisfy 1 <= min <= max (got {min}..{max})")]
    BackoffWindow { min: u64, max: u64 },

    #[error("slot_time ({slot_time}) must be a multiple of step ({step})")]
    SlotStepMismatch { slot_time: u64, step: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_derived_timing() {
        let config = SimConfig::default();
        let timing = config.timing();
        assert_eq!(timing.difs, 50);
        assert_eq!(timing.frame_time, 2_040);
        assert_eq!(timing.rts_duration, 3 * (10 + 2_040));
        assert_eq!(timing.cts_duration, 2 * (10 + 2_040));
        assert_eq!(timing.ack_timeout, 10 + 2 * 2_040);
    }

    #[test]
    fn test_zero_stations_rejected() {
        let config = SimConfig {
            station_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoStations));
    }

    #[test]
    fn test_zero_rates_rejected() {
        let config = SimConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive("frame_rate"))
        );

        let config = SimConfig {
            data_rate: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NonPositive("data_rate")));
    }

    #[test]
    fn test_backoff_window_rejected() {
        let config = SimConfig {
            backoff_min: 64,
            backoff_max: 8,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BackoffWindow { .. })
        ));
    }

    #[test]
    fn test_slot_step_mismatch_rejected() {
        let config = SimConfig {
            slot_time: 25,
            step: 10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SlotStepMismatch { .. })
        ));
    }

    #[test]
    fn test_origination_probability() {
        let config = SimConfig::default();
        let p = config.origination_probability();
        assert!((p - 0.005).abs() < 1e-12);

        let saturated = SimConfig {
            frame_rate: 1_000_000,
            ..Default::default()
        };
        assert_eq!(saturated.origination_probability(), 1.0);
    }
}
