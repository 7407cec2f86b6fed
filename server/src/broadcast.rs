//! Outbound fan-out: event broadcasts, unicasts and the periodic location snapshot
//!
//! Everything here runs while the caller holds the game state lock. Frames are
//! only pushed onto per-connection queues; the actual socket writes happen in
//! each connection's writer task, so a slow client never stalls the lock.

use crate::game::GameState;
use crate::player::Player;
use crate::registry::ConnectionRegistry;
use log::{debug, error};
use shared::{LocationParcel, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};

fn encode(message: &ServerMessage) -> Option<Vec<u8>> {
    match message.encode() {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("Failed to encode {:?}: {}", message, e);
            None
        }
    }
}

/// Sends one message to every occupied slot, in id order.
///
/// Returns the number of connections the frame was queued for.
pub fn broadcast(registry: &ConnectionRegistry, message: &ServerMessage) -> usize {
    let Some(frame) = encode(message) else {
        return 0;
    };

    registry
        .players()
        .filter(|player| player.connection().send(frame.clone()))
        .count()
}

pub fn unicast(player: &Player, message: &ServerMessage) -> bool {
    match encode(message) {
        Some(frame) => player.connection().send(frame),
        None => false,
    }
}

/// Latest known position of every occupied slot
pub fn location_snapshot(registry: &ConnectionRegistry) -> ServerMessage {
    ServerMessage::Locations(
        registry
            .players()
            .map(|player| LocationParcel {
                id: player.id,
                position: player.position,
            })
            .collect(),
    )
}

/// Broadcasts a location snapshot every `period` until shutdown
///
/// Snapshots are skipped entirely while the lobby is still filling.
pub async fn run_snapshot_loop(
    state: Arc<Mutex<GameState>>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let stopped = crate::network::shutdown_signal(shutdown);
    tokio::pin!(stopped);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = state.lock().await;
                state.broadcast_snapshot();
            }
            _ = &mut stopped => {
                debug!("Snapshot loop stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{outbound, Connection, OutboundReceiver};
    use shared::{Position, Team};

    fn join(registry: &mut ConnectionRegistry, id: u8) -> OutboundReceiver {
        let (tx, rx) = outbound();
        registry.occupy(id, Connection::new(id as u64, tx)).unwrap();
        rx
    }

    #[test]
    fn test_broadcast_reaches_every_occupied_slot() {
        let mut registry = ConnectionRegistry::new(6);
        let mut rx0 = join(&mut registry, 0);
        let mut rx4 = join(&mut registry, 4);

        let sent = broadcast(&registry, &ServerMessage::TeamPoint(Team::B));
        assert_eq!(sent, 2);
        assert_eq!(rx0.try_recv().unwrap(), vec![5, 1]);
        assert_eq!(rx4.try_recv().unwrap(), vec![5, 1]);
    }

    #[test]
    fn test_broadcast_preserves_enqueue_order() {
        let mut registry = ConnectionRegistry::new(6);
        let mut rx = join(&mut registry, 2);

        broadcast(&registry, &ServerMessage::NextRound);
        broadcast(&registry, &ServerMessage::Shot { shooter: 2 });
        broadcast(&registry, &ServerMessage::Play);

        assert_eq!(rx.try_recv().unwrap(), vec![0]);
        assert_eq!(rx.try_recv().unwrap(), vec![3, 2]);
        assert_eq!(rx.try_recv().unwrap(), vec![1]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_skips_closed_connections() {
        let mut registry = ConnectionRegistry::new(6);
        let rx0 = join(&mut registry, 0);
        let mut rx1 = join(&mut registry, 1);
        drop(rx0);

        assert_eq!(broadcast(&registry, &ServerMessage::Play), 1);
        assert_eq!(rx1.try_recv().unwrap(), vec![1]);
    }

    #[test]
    fn test_unicast() {
        let mut registry = ConnectionRegistry::new(6);
        let mut rx0 = join(&mut registry, 0);
        let mut rx1 = join(&mut registry, 1);

        assert!(unicast(registry.get(1).unwrap(), &ServerMessage::LoseHealth(2)));
        assert_eq!(rx1.try_recv().unwrap(), vec![6, 2]);
        assert!(rx0.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_contains_only_occupied_slots() {
        let mut registry = ConnectionRegistry::new(6);
        let _rx1 = join(&mut registry, 1);
        let _rx5 = join(&mut registry, 5);
        registry.get_mut(5).unwrap().position = Position::new(-4, 0, 9);

        assert_eq!(
            location_snapshot(&registry),
            ServerMessage::Locations(vec![
                LocationParcel {
                    id: 1,
                    position: Position::default(),
                },
                LocationParcel {
                    id: 5,
                    position: Position::new(-4, 0, 9),
                },
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_loop_waits_for_first_round() {
        let state = Arc::new(Mutex::new(GameState::new(2)));
        let (tx, mut rx) = outbound();
        state.lock().await.admit(&[0], tx).unwrap();
        assert_eq!(rx.try_recv().unwrap(), vec![shared::HANDSHAKE_SUCCESS]);

        let (stop_tx, stop_rx) = watch::channel(false);
        let period = Duration::from_millis(100);
        let task = tokio::spawn(run_snapshot_loop(state.clone(), period, stop_rx));

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(rx.try_recv().is_err(), "no snapshots while in the lobby");

        let (tx1, _rx1) = outbound();
        state.lock().await.admit(&[3], tx1).unwrap();
        assert_eq!(rx.try_recv().unwrap(), vec![shared::server_header::NEXT_ROUND]);

        tokio::time::sleep(Duration::from_millis(250)).await;
        let mut snapshots = 0;
        while let Ok(frame) = rx.try_recv() {
            assert_eq!(
                ServerMessage::decode(&frame).unwrap(),
                ServerMessage::Locations(vec![
                    LocationParcel {
                        id: 0,
                        position: Position::default(),
                    },
                    LocationParcel {
                        id: 3,
                        position: Position::default(),
                    },
                ])
            );
            snapshots += 1;
        }
        assert!(snapshots >= 2);

        stop_tx.send_replace(true);
        task.await.unwrap();
    }
}
