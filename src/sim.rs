//! Top-level simulation driver
//!
//! Wires the clock, the medium and the RNG together and runs the
//! two-phase tick loop. Runs are deterministic: the same [`SimConfig`]
//! (including its seed) always produces the same [`Telemetry`].

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::Clock;
use crate::config::{ProtocolTiming, SimConfig, SimResult};
use crate::geometry::Point;
use crate::medium::Medium;
use crate::telemetry::{StationTelemetry, Telemetry};

pub struct Simulation {
    config: SimConfig,
    timing: ProtocolTiming,
    clock: Clock,
    medium: Medium,
    rng: StdRng,
}

impl Simulation {
    /// Build a simulation with randomly placed stations.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let timing = config.timing();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut medium = Medium::new(&config);
        medium.init_stations(&config, timing, &mut rng);
        Ok(Self {
            clock: Clock::new(config.step, config.max_time),
            config,
            timing,
            medium,
            rng,
        })
    }

    /// Build a simulation with stations at explicit locations. In a star
    /// topology the first location is the hub.
    pub fn with_layout(config: SimConfig, locations: &[Point]) -> SimResult<Self> {
        let config = SimConfig {
            station_count: locations.len(),
            ..config
        };
        config.validate()?;
        let timing = config.timing();
        let rng = StdRng::seed_from_u64(config.seed);
        let mut medium = Medium::new(&config);
        medium.init_stations_at(locations, &config, timing);
        Ok(Self {
            clock: Clock::new(config.step, config.max_time),
            config,
            timing,
            medium,
            rng,
        })
    }

    /// Advance one tick: detection first, transitions second.
    pub fn tick(&mut self) {
        let now = self.clock.advance();
        let step = self.clock.step();
        self.medium.detection_phase(now, step);
        self.medium.transition_phase(now, step, &mut self.rng);
    }

    /// Run to `max_time`.
    pub fn run(&mut self) {
        while !self.clock.is_finished() {
            self.tick();
        }
        let telemetry = self.telemetry();
        tracing::info!(
            time = telemetry.time,
            data_frames = telemetry.data_frames_sent(),
            collisions = telemetry.total_collisions(),
            "run finished"
        );
    }

    /// Run to `max_time`, calling `observe` after every tick.
    pub fn run_with<F: FnMut(&Simulation)>(&mut self, mut observe: F) {
        while !self.clock.is_finished() {
            self.tick();
            observe(self);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn telemetry(&self) -> Telemetry {
        let stations = self
            .medium
            .stations()
            .iter()
            .map(|station| {
                let tx = station.transmitter();
                StationTelemetry {
                    id: station.id(),
                    location: station.location(),
                    sent: tx.sent().clone(),
                    received: tx.received().clone(),
                    collisions: tx.collisions(),
                    timeouts: tx.timeouts(),
                    wasted: tx.wasted(),
                }
            })
            .collect();
        Telemetry {
            time: self.clock.now(),
            frames_on_air: self.medium.frame_count(),
            stations,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn timing(&self) -> ProtocolTiming {
        self.timing
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn medium(&self) -> &Medium {
        &self.medium
    }

    pub fn medium_mut(&mut self) -> &mut Medium {
        &mut self.medium
    }
}
