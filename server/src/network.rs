//! Server network layer: WebSocket endpoint, per-connection tasks and timers

use crate::broadcast::run_snapshot_loop;
use crate::config::ServerConfig;
use crate::game::GameState;
use crate::player::{outbound, OutboundReceiver};
use crate::round::Deferred;
use crate::router::route;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::HandshakeResponse;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};

/// Cloneable handle to the running match
///
/// Every connection task, the snapshot task and each timer holds a clone; all
/// of them go through the same state lock.
#[derive(Clone)]
pub struct GameServer {
    state: Arc<Mutex<GameState>>,
    config: Arc<ServerConfig>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl GameServer {
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(GameState::new(config.num_players))),
            config: Arc::new(config),
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn state(&self) -> Arc<Mutex<GameState>> {
        Arc::clone(&self.state)
    }

    /// Flips to true once the match is over and the server is stopping
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Runs a timed transition, and any follow-up it produces, in the background
    pub fn schedule(&self, deferred: Deferred) {
        let server = self.clone();
        tokio::spawn(async move {
            let mut next = Some(deferred);
            while let Some(deferred) = next {
                tokio::time::sleep(deferred.delay(&server.config)).await;
                next = server.state.lock().await.fire(deferred);

                if deferred == Deferred::Shutdown {
                    info!("Match finished, shutting down");
                    server.shutdown.send_replace(true);
                }
            }
        });
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(self.clone())
    }

    /// Accepts players on `listener` until the match ends
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(
                "Server listening on ws://{}/ws, waiting for {} players",
                addr, self.config.num_players
            );
        }

        let snapshots = tokio::spawn(run_snapshot_loop(
            self.state(),
            self.config.snapshot_interval(),
            self.subscribe_shutdown(),
        ));

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.subscribe_shutdown()))
            .await?;

        if let Err(e) = snapshots.await {
            warn!("Snapshot task failed: {}", e);
        }
        info!("Server stopped");
        Ok(())
    }
}

/// Resolves once the shutdown flag is set or its sender is gone
pub(crate) async fn shutdown_signal(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}

async fn ws_handler(ws: WebSocketUpgrade, State(server): State<GameServer>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, server))
}

async fn handle_socket(mut socket: WebSocket, server: GameServer) {
    // The first data frame is the handshake; control frames may come before it
    let requested = loop {
        match socket.recv().await {
            Some(Ok(Message::Binary(bytes))) => break bytes,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => {
                debug!("Connection closed before handshake");
                return;
            }
            Some(Ok(other)) => {
                warn!("Expected a binary handshake, got {:?}", other);
                reject(socket).await;
                return;
            }
            Some(Err(e)) => {
                debug!("Connection failed before handshake: {}", e);
                return;
            }
        }
    };

    let (tx, rx) = outbound();
    let admission = server.state.lock().await.admit(&requested, tx);
    let admission = match admission {
        Ok(admission) => admission,
        Err(e) => {
            warn!("Rejected connection: {}", e);
            reject(socket).await;
            return;
        }
    };
    if let Some(deferred) = admission.deferred {
        server.schedule(deferred);
    }

    let id = admission.id;
    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_outbound(sink, rx));

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Binary(bytes)) => {
                let deferred = route(&mut *server.state.lock().await, id, &bytes);
                if let Some(deferred) = deferred {
                    server.schedule(deferred);
                }
            }
            Ok(Message::Text(_)) => warn!("Dropping text frame from player {}", id),
            Ok(Message::Close(_)) => {
                info!("Player {} closed the connection", id);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Connection error for player {}: {}", id, e);
                break;
            }
        }
    }

    server.state.lock().await.disconnect(id, admission.serial);
    if let Err(e) = writer.await {
        warn!("Writer task for player {} failed: {}", id, e);
    }
}

/// Drains a connection's outbound queue to its socket
///
/// The socket is closed once the queue's sender is dropped, which happens when
/// the slot is released or every connection is closed at the end of the match.
async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: OutboundReceiver,
) {
    while let Some(frame) = queue.recv().await {
        if let Err(e) = sink.send(Message::Binary(frame.into())).await {
            debug!("Stopped writing to closed socket: {}", e);
            return;
        }
    }
    let _ = sink.close().await;
}

async fn reject(mut socket: WebSocket) {
    let failure = vec![HandshakeResponse::Failure.to_byte()];
    if socket.send(Message::Binary(failure.into())).await.is_ok() {
        let _ = socket.send(Message::Close(None)).await;
    }
}
