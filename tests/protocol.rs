//! End-to-end protocol exchanges on small scripted layouts.
//!
//! These tests pin stations at known coordinates, hand-feed frames into
//! the medium while the world is quiet, and check the handshakes and
//! collision accounting that come out the other side.

use dcfsim::{FrameKind, Point, SimConfig, Simulation, StationId};

fn p(x: f64, y: f64) -> Point {
    Point { x, y }
}

/// Nothing queued, nothing on air, nobody waiting for a response.
fn is_quiet(sim: &Simulation) -> bool {
    sim.medium().frame_count() == 0
        && sim.medium().stations().iter().all(|s| {
            let tx = s.transmitter();
            !tx.is_sending()
                && !tx.is_receiving()
                && !tx.want_to_send()
                && tx.outstanding().is_none()
        })
}

/// Background traffic quiet enough that scripted frames own the medium.
fn scripted(with_rts: bool, max_time: u64) -> SimConfig {
    SimConfig {
        star_topology: false,
        with_rts,
        frame_rate: 1,
        max_time,
        ..SimConfig::default()
    }
}

#[test]
fn alternating_data_exchanges_complete_without_collisions() {
    let config = scripted(false, 60_000);
    let mut sim = Simulation::with_layout(config, &[p(20.0, 25.0), p(30.0, 25.0)]).unwrap();

    let senders = [0usize, 1, 0];
    let mut injected = 0;
    while !sim.is_finished() {
        if injected < senders.len() && is_quiet(&sim) {
            let s = senders[injected];
            sim.medium_mut()
                .originate(StationId(s), StationId(1 - s));
            injected += 1;
        }
        sim.tick();
    }

    assert_eq!(injected, 3, "world never went quiet between exchanges");
    let t = sim.telemetry();
    assert_eq!(t.total_collisions(), 0);
    assert_eq!(t.collision_rate(), 0.0);
    assert_eq!(t.total_timeouts(), 0);
    // Station 1 took two frames, station 0 one, each answered with an ACK.
    assert!(t.stations[1].received.data.count >= 2);
    assert!(t.stations[0].received.data.count >= 1);
    assert!(t.stations[0].received.ack.count >= 2);
    assert!(t.stations[1].received.ack.count >= 1);
}

#[test]
fn data_frame_is_answered_with_a_single_ack() {
    let config = scripted(false, 20_000);
    let mut sim = Simulation::with_layout(config, &[p(20.0, 25.0), p(30.0, 25.0)]).unwrap();

    let mut injected = false;
    let mut ack_seen_on_air = false;
    while !sim.is_finished() {
        if !injected && is_quiet(&sim) {
            sim.medium_mut().originate(StationId(0), StationId(1));
            injected = true;
        }
        sim.tick();
        ack_seen_on_air |= sim
            .medium()
            .frames()
            .iter()
            .any(|f| f.kind == FrameKind::Ack);
    }

    assert!(ack_seen_on_air);
    let t = sim.telemetry();
    assert_eq!(t.stations[1].received.data.count, 1);
    assert_eq!(t.stations[1].sent.ack.count, 1);
    assert_eq!(t.stations[0].received.ack.count, 1);
    // The ACK closed the transaction.
    assert!(sim
        .medium()
        .station(StationId(0))
        .transmitter()
        .outstanding()
        .is_none());
    assert_eq!(t.total_timeouts(), 0);
}

#[test]
fn rts_cts_handshake_delivers_data_and_arms_bystander_nav() {
    let config = scripted(true, 30_000);
    // A and B exchange; C sits in range of both and only listens.
    let mut sim = Simulation::with_layout(
        config,
        &[p(20.0, 25.0), p(30.0, 25.0), p(25.0, 20.0)],
    )
    .unwrap();

    let mut injected = false;
    while !sim.is_finished() {
        if !injected && is_quiet(&sim) {
            sim.medium_mut().originate(StationId(0), StationId(1));
            injected = true;
        }
        sim.tick();
    }

    let t = sim.telemetry();
    assert_eq!(t.total_collisions(), 0);
    assert_eq!(t.stations[1].received.rts.count, 1);
    assert_eq!(t.stations[1].sent.cts.count, 1);
    assert_eq!(t.stations[0].received.cts.count, 1);
    assert_eq!(t.stations[1].received.data.count, 1);
    assert_eq!(t.stations[0].received.ack.count, 1);
    // The bystander overheard the reservation and deferred.
    let c = sim.medium().station(StationId(2)).transmitter();
    assert!(c.csma().nav().is_left());
    assert_eq!(t.stations[2].sent.data.count, 0);
}

#[test]
fn simultaneous_senders_garble_the_receiver() {
    let config = scripted(false, 10_000);
    // A and C flank B; both fire at the same instant.
    let mut sim = Simulation::with_layout(
        config,
        &[p(20.0, 25.0), p(25.0, 25.0), p(30.0, 25.0)],
    )
    .unwrap();

    let mut injected = false;
    let mut collided_on_air = false;
    while !sim.is_finished() {
        if !injected && is_quiet(&sim) {
            sim.medium_mut().originate(StationId(0), StationId(1));
            sim.medium_mut().originate(StationId(2), StationId(1));
            injected = true;
        }
        sim.tick();
        collided_on_air |= sim.medium().frames().iter().any(|f| f.collided);
    }

    assert!(collided_on_air);
    let t = sim.telemetry();
    // Both transmissions reached B in the same window; neither survived.
    assert_eq!(t.stations[1].received.data.count, 0);
    assert!(t.stations[1].collisions >= 1);
}

#[test]
fn hub_in_a_star_only_ever_responds() {
    let config = SimConfig {
        max_time: 200_000,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.run();

    let t = sim.telemetry();
    let hub = sim.medium().roster().center().unwrap();
    let hub_stats = &t.stations[hub.0];
    // Leaves originate, the hub only answers with CTS and ACK.
    assert_eq!(hub_stats.sent.data.count, 0);
    assert_eq!(hub_stats.sent.rts.count, 0);
    assert!(hub_stats.received.total_bits() > 0);
}

#[test]
fn contention_raises_the_collision_rate() {
    let rate = |station_count: usize| {
        let config = SimConfig {
            station_count,
            star_topology: false,
            with_rts: false,
            frame_rate: 2_000,
            max_time: 100_000,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.run();
        sim.telemetry().collision_rate()
    };

    let sparse = rate(3);
    let dense = rate(30);
    assert!(dense > 0.0);
    assert!(dense >= sparse);
}

#[test]
fn telemetry_snapshot_serializes() {
    let config = SimConfig {
        station_count: 3,
        max_time: 5_000,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.run();

    let t = sim.telemetry();
    assert_eq!(t.time, 5_000);
    let json = serde_json::to_string_pretty(&t).unwrap();
    assert!(json.contains("\"stations\""));
    assert!(json.contains("\"collisions\""));
}
