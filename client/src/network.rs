use crate::bot::Bot;
use crate::game::{ClientGameState, PlayerState};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    ClientMessage, HandshakeResponse, PlayerId, ProtocolError, ServerMessage,
    LOCATION_UPDATE_FREQUENCY,
};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server rejected player id {0}")]
    Rejected(PlayerId),
    #[error("connection closed during handshake")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// A connected, admitted player
pub struct Client<R: Rng> {
    ws: WsStream,
    game: ClientGameState,
    bot: Bot<R>,
    update_interval: Duration,
}

impl Client<StdRng> {
    pub async fn connect(url: &str, id: PlayerId) -> Result<Self, ClientError> {
        Self::connect_with(url, id, Bot::new(StdRng::from_entropy())).await
    }
}

impl<R: Rng> Client<R> {
    /// Opens the connection and performs the id handshake
    pub async fn connect_with(url: &str, id: PlayerId, bot: Bot<R>) -> Result<Self, ClientError> {
        info!("Connecting to {} as player {}", url, id);
        let (mut ws, _response) = connect_async(url).await?;
        ws.send(Message::Binary(vec![id].into())).await?;

        loop {
            match ws.next().await {
                Some(Ok(Message::Binary(bytes))) => match HandshakeResponse::from_bytes(&bytes) {
                    HandshakeResponse::Success => break,
                    HandshakeResponse::Failure => {
                        let _ = ws.close(None).await;
                        return Err(ClientError::Rejected(id));
                    }
                },
                Some(Ok(Message::Close(_))) | None => return Err(ClientError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }

        info!("Joined as player {}, waiting for the lobby to fill", id);
        Ok(Self {
            ws,
            game: ClientGameState::new(id),
            bot,
            update_interval: Duration::from_secs(1) / LOCATION_UPDATE_FREQUENCY,
        })
    }

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    /// Plays until the match ends or the server goes away
    pub async fn run(mut self) -> Result<ClientGameState, ClientError> {
        let mut ticker = interval(self.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                incoming = self.ws.next() => match incoming {
                    Some(Ok(Message::Binary(bytes))) => match ServerMessage::decode(&bytes) {
                        Ok(message) => {
                            debug!("Received {:?}", message);
                            self.game.apply(message);
                            if self.game.game_over {
                                info!("Match over");
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping server message: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Connection error: {}", e);
                        break;
                    }
                },
                _ = ticker.tick(), if self.game.has_started() => {
                    self.tick().await?;
                }
            }
        }

        let _ = self.ws.close(None).await;
        Ok(self.game)
    }

    async fn tick(&mut self) -> Result<(), ClientError> {
        let position = if self.game.state == PlayerState::Limbo {
            self.bot.position()
        } else {
            self.bot.wander()
        };

        let mut outgoing = vec![ClientMessage::Location(position)];
        outgoing.extend(self.bot.act(&self.game));
        for message in outgoing {
            self.ws.send(Message::Binary(message.encode()?.into())).await?;
        }
        Ok(())
    }
}
