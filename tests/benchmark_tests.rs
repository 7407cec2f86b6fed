//! Performance benchmarks for the wire codec and the shared game state

use server::player::outbound;
use server::GameState;
use shared::{ClientMessage, LocationParcel, Position, ServerMessage, MAX_PLAYERS};
use std::time::Instant;

fn full_snapshot() -> ServerMessage {
    ServerMessage::Locations(
        (0..MAX_PLAYERS as u8)
            .map(|id| LocationParcel {
                id,
                position: Position::new(id as i8, -(id as i8), 100),
            })
            .collect(),
    )
}

/// Benchmarks encoding of a six-player location snapshot
#[test]
fn benchmark_snapshot_encoding() {
    let snapshot = full_snapshot();
    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let frame = snapshot.encode().unwrap();
        assert_eq!(frame.len(), 1 + MAX_PLAYERS * 4);
    }

    let duration = start.elapsed();
    println!(
        "Snapshot encoding: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks decoding of a six-player location snapshot
#[test]
fn benchmark_snapshot_decoding() {
    let frame = full_snapshot().encode().unwrap();
    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        match ServerMessage::decode(&frame).unwrap() {
            ServerMessage::Locations(parcels) => assert_eq!(parcels.len(), MAX_PLAYERS),
            other => panic!("unexpected message {:?}", other),
        }
    }

    let duration = start.elapsed();
    println!(
        "Snapshot decoding: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks decoding of the client message mix seen during a round
#[test]
fn benchmark_client_message_decoding() {
    let frames = [
        ClientMessage::Location(Position::new(12, 0, -40)).encode().unwrap(),
        ClientMessage::Shot.encode().unwrap(),
        ClientMessage::Hit { target: 4, damage: 1 }.encode().unwrap(),
    ];

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let _ = ClientMessage::decode(&frames[i % frames.len()]).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Client message decoding: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 500);
}

/// Benchmarks hit processing and fan-out with a full lobby
#[test]
fn benchmark_hit_fan_out() {
    let mut state = GameState::new(MAX_PLAYERS);
    let mut inboxes = Vec::new();
    for id in 0..MAX_PLAYERS as u8 {
        let (tx, rx) = outbound();
        state.admit(&[id], tx).unwrap();
        inboxes.push(rx);
    }

    let iterations = 10_000;
    let mut queued = 0;
    let start = Instant::now();

    for i in 0..iterations {
        // Zero damage keeps everyone alive so the round never resolves
        state.apply_hit(0, (i % MAX_PLAYERS) as u8, 0);
        state.apply_shot(1);
        state.broadcast_snapshot();

        // Readers keep up, so no frame is dropped
        for rx in inboxes.iter_mut() {
            while rx.try_recv().is_ok() {
                queued += 1;
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Hit fan-out: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(queued >= iterations * MAX_PLAYERS * 2);

    assert!(duration.as_millis() < 2000);
}
