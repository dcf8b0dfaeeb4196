//! The shared radio medium
//!
//! The [`Medium`] owns the station roster, the stations themselves and
//! the on-air [`FrameArena`]. Each simulation tick runs in two phases:
//! a detection phase that intersects every active wavefront annulus with
//! every station against a frozen snapshot, and a transition phase that
//! gives each station one tick of protocol work. Splitting the tick this
//! way means no station ever reacts to a frame launched earlier in the
//! same tick.

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{ProtocolTiming, SimConfig};
use crate::frame::{Frame, FrameArena, FrameId, FrameKind};
use crate::geometry::{random_point, random_point_within, Point};
use crate::station::{Station, StationId};

/// Immutable whereabouts of one station, shared with every frame it
/// originates.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub id: StationId,
    pub location: Point,
    pub detect_range: f64,
}

/// Who is where, and who may talk to whom.
#[derive(Debug, Clone)]
pub struct Roster {
    placements: Vec<Placement>,
    star_topology: bool,
    center: Option<StationId>,
}

impl Roster {
    pub fn new(placements: Vec<Placement>, star_topology: bool) -> Self {
        Self {
            placements,
            star_topology,
            center: None,
        }
    }

    pub fn placement(&self, id: StationId) -> Placement {
        self.placements[id.0]
    }

    pub fn set_center(&mut self, id: StationId) {
        self.center = Some(id);
    }

    pub fn center(&self) -> Option<StationId> {
        self.center
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Pick a receiver for a fresh frame. In a star topology everything
    /// goes through the hub, and the hub itself originates nothing. In a
    /// mesh, any station within radio range is fair game.
    pub fn random_receiver<R: Rng>(&self, sender: StationId, rng: &mut R) -> Option<StationId> {
        if self.star_topology {
            let center = self.center?;
            if sender == center {
                return None;
            }
            return Some(center);
        }
        let from = self.placement(sender);
        let candidates: Vec<StationId> = self
            .placements
            .iter()
            .filter(|p| p.id != sender && from.location.distance_to(&p.location) < from.detect_range)
            .map(|p| p.id)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

/// Everything a station may touch during its tick.
pub struct TickContext<'a> {
    pub air: &'a mut FrameArena,
    pub roster: &'a Roster,
    pub now: u64,
    pub step: u64,
    pub rng: &'a mut StdRng,
}

pub struct Medium {
    roster: Roster,
    stations: Vec<Station>,
    air: FrameArena,
    with_rts: bool,
}

impl Medium {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            roster: Roster::new(Vec::new(), config.star_topology),
            stations: Vec::new(),
            air: FrameArena::new(config.propagation_speed, config.frame_size),
            with_rts: config.with_rts,
        }
    }

    pub fn add_station(
        &mut self,
        location: Point,
        config: &SimConfig,
        timing: ProtocolTiming,
    ) -> StationId {
        let id = StationId(self.stations.len());
        self.roster.placements.push(Placement {
            id,
            location,
            detect_range: config.detect_range,
        });
        self.stations.push(Station::new(id, location, config, timing));
        id
    }

    pub fn set_center(&mut self, id: StationId) {
        self.roster.set_center(id);
    }

    /// Place `station_count` stations at random. In a star topology the
    /// hub is pinned to the middle of the world and the leaves land
    /// inside its radio range, so every leaf can always reach the hub.
    pub fn init_stations(&mut self, config: &SimConfig, timing: ProtocolTiming, rng: &mut StdRng) {
        if config.star_topology {
            let hub = Point {
                x: config.area_size / 2.0,
                y: config.area_size / 2.0,
            };
            let center = self.add_station(hub, config, timing);
            self.set_center(center);
            for _ in 1..config.station_count {
                let location =
                    random_point_within(config.area_size, hub, config.detect_range, rng);
                self.add_station(location, config, timing);
            }
        } else {
            for _ in 0..config.station_count {
                let location = random_point(config.area_size, rng);
                self.add_station(location, config, timing);
            }
        }
    }

    /// Place stations at explicit locations. In a star topology the
    /// first location is the hub.
    pub fn init_stations_at(
        &mut self,
        locations: &[Point],
        config: &SimConfig,
        timing: ProtocolTiming,
    ) {
        for (i, location) in locations.iter().enumerate() {
            let id = self.add_station(*location, config, timing);
            if config.star_topology && i == 0 {
                self.set_center(id);
            }
        }
    }

    pub fn random_receiver<R: Rng>(&self, sender: StationId, rng: &mut R) -> Option<StationId> {
        self.roster.random_receiver(sender, rng)
    }

    /// Hand a station a fresh frame to contend for, exactly as if its
    /// own traffic source had fired this tick.
    pub fn originate(&mut self, sender: StationId, receiver: StationId) {
        let me = self.roster.placement(sender);
        let peer = self.roster.placement(receiver);
        let tx = self.stations[sender.0].transmitter_mut();
        let frame = if self.with_rts {
            let duration = tx.csma().rts_duration();
            self.air.assemble(FrameKind::Rts, &me, &peer, Some(duration))
        } else {
            self.air.assemble(FrameKind::Data, &me, &peer, None)
        };
        tx.push(frame);
    }

    /// Phase one: intersect every active wavefront with every station
    /// against a snapshot, report the hits, then drop spent frames.
    pub fn detection_phase(&mut self, now: u64, step: u64) {
        for station in &mut self.stations {
            station.transmitter_mut().begin_tick();
        }

        let mut hits: Vec<(usize, Frame)> = Vec::new();
        for frame in self.air.frames() {
            let lead = frame.moved(now);
            if lead <= 0.0 {
                continue;
            }
            let tail = frame.moved_tail(now, step);
            for station in &self.stations {
                if station.id() == frame.sender {
                    continue;
                }
                let d = station.location().distance_to(&frame.sender_location);
                if d >= tail && d <= lead {
                    hits.push((station.id().0, frame.clone()));
                }
            }
        }

        let mut garbled: Vec<FrameId> = Vec::new();
        for (idx, frame) in &hits {
            if let Some(victim) = self.stations[*idx].transmitter_mut().on_detect(frame) {
                garbled.push(victim);
            }
        }
        if !garbled.is_empty() {
            tracing::debug!(count = garbled.len(), now, "talkover garbled receptions");
        }
        for id in garbled {
            self.air.mark_collided(id);
        }

        let vanished = self.air.expire(now, step);
        if vanished > 0 {
            tracing::trace!(vanished, now, "wavefronts left the world");
        }
    }

    /// Phase two: one tick of protocol work per station, in roster order.
    pub fn transition_phase(&mut self, now: u64, step: u64, rng: &mut StdRng) {
        let Medium {
            roster,
            stations,
            air,
            ..
        } = self;
        for station in stations.iter_mut() {
            let mut ctx = TickContext {
                air: &mut *air,
                roster: &*roster,
                now,
                step,
                rng: &mut *rng,
            };
            station.on_tick(&mut ctx);
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id.0]
    }

    pub fn station_mut(&mut self, id: StationId) -> &mut Station {
        &mut self.stations[id.0]
    }

    pub fn frames(&self) -> &[Frame] {
        self.air.frames()
    }

    pub fn frame_count(&self) -> usize {
        self.air.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn mesh_config() -> SimConfig {
        SimConfig {
            star_topology: false,
            with_rts: false,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_star_routing_goes_through_the_hub() {
        let config = SimConfig::default();
        let timing = config.timing();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut medium = Medium::new(&config);
        medium.init_stations(&config, timing, &mut rng);

        let hub = medium.roster().center().unwrap();
        for station in medium.stations() {
            let pick = medium.random_receiver(station.id(), &mut rng);
            if station.id() == hub {
                assert_eq!(pick, None);
            } else {
                assert_eq!(pick, Some(hub));
            }
        }
    }

    #[test]
    fn test_star_leaves_land_inside_hub_range() {
        let config = SimConfig::default();
        let timing = config.timing();
        let mut rng = StdRng::seed_from_u64(7);
        let mut medium = Medium::new(&config);
        medium.init_stations(&config, timing, &mut rng);

        let hub = medium.roster().placement(medium.roster().center().unwrap());
        for station in medium.stations() {
            let d = hub.location.distance_to(&station.location());
            assert!(d <= config.detect_range);
        }
    }

    #[test]
    fn test_mesh_receiver_is_in_range_and_not_self() {
        let config = mesh_config();
        let timing = config.timing();
        let mut rng = StdRng::seed_from_u64(3);
        let mut medium = Medium::new(&config);
        medium.init_stations(&config, timing, &mut rng);

        for station in medium.stations() {
            for _ in 0..20 {
                if let Some(receiver) = medium.random_receiver(station.id(), &mut rng) {
                    assert_ne!(receiver, station.id());
                    let d = station
                        .location()
                        .distance_to(&medium.roster().placement(receiver).location);
                    assert!(d < config.detect_range);
                }
            }
        }
    }

    #[test]
    fn test_detection_reaches_in_range_station_only() {
        let config = mesh_config();
        let timing = config.timing();
        let mut medium = Medium::new(&config);
        let locations = [
            Point { x: 0.0, y: 0.0 },
            Point { x: 10.0, y: 0.0 },
            Point { x: 40.0, y: 0.0 },
        ];
        medium.init_stations_at(&locations, &config, timing);

        medium.originate(StationId(0), StationId(1));
        let mut rng = StdRng::seed_from_u64(0);

        // Let station 0 win the channel and start sending, then advance
        // far enough for the wavefront to cover station 1.
        let mut now = 0;
        for _ in 0..400 {
            now += config.step;
            medium.detection_phase(now, config.step);
            medium.transition_phase(now, config.step, &mut rng);
            if medium
                .station(StationId(1))
                .transmitter()
                .is_medium_busy()
            {
                break;
            }
        }
        assert!(medium.station(StationId(1)).transmitter().is_medium_busy());
        // Station 2 sits beyond the 25 km radio range and never hears it.
        assert!(!medium.station(StationId(2)).transmitter().is_medium_busy());
    }
}
