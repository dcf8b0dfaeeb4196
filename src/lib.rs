//! # dcfsim
//!
//! Discrete-event simulator for a CSMA/CA MAC layer in the style of
//! 802.11 DCF. Stations sit at fixed points in a square world, frames
//! propagate outward as circular wavefronts at finite speed, and each
//! station runs the full access sequence: carrier sense, NAV, SIFS/DIFS
//! gaps, binary-exponential backoff and the optional RTS/CTS handshake.
//!
//! Runs are deterministic for a given [`SimConfig`] seed.
//!
//! ## Example
//!
//! ```rust
//! use dcfsim::{SimConfig, Simulation};
//!
//! let config = SimConfig {
//!     station_count: 3,
//!     max_time: 2_000,
//!     ..SimConfig::default()
//! };
//! let mut sim = Simulation::new(config).unwrap();
//! sim.run();
//!
//! let telemetry = sim.telemetry();
//! assert_eq!(telemetry.time, 2_000);
//! ```

pub mod clock;
pub mod config;
pub mod counter;
pub mod csma;
pub mod frame;
pub mod geometry;
pub mod logging;
pub mod medium;
pub mod sim;
pub mod station;
pub mod telemetry;
pub mod transmitter;

pub use clock::Clock;
pub use config::{
    ConfigError, ProtocolTiming, SimConfig, SimResult, ACK_FRAME_SIZE, CTS_FRAME_SIZE, ONE_SECOND,
    RTS_FRAME_SIZE,
};
pub use counter::Counter;
pub use csma::CsmaState;
pub use frame::{Frame, FrameArena, FrameId, FrameKind};
pub use geometry::Point;
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use medium::{Medium, Placement, Roster, TickContext};
pub use sim::Simulation;
pub use station::{Station, StationId};
pub use telemetry::{StationTelemetry, Telemetry};
pub use transmitter::{FrameTally, KindTally, Outstanding, Transmitter};
