//! WebSocket Server
//!
//! Thin transport adapter. Connection tasks parse JSON client messages and
//! forward them through an mpsc channel; a single simulation task drains
//! that channel at the top of each tick, steps the game, and fans outbound
//! messages through a broadcast channel back to every connection. Transport
//! tasks never touch game state.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::game::player::{HeroKind, PlayerId, PlayerRegistry};
use crate::game::round::{Outbound, RoundCoordinator};
use crate::game::world::{EntityWorld, NetRole, ProximityQuery};
use crate::network::bus::SyncQueue;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::TICK_RATE;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Players required before the match starts.
    pub min_players: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            min_players: 2,
        }
    }
}

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Could not bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that failed.
        addr: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Messages marshaled from connection tasks onto the simulation step.
enum Inbound {
    Joined { player: PlayerId, hero: HeroKind },
    Message { player: PlayerId, msg: ClientMessage },
    Disconnected { player: PlayerId },
}

/// The WebSocket front end and its simulation task.
pub struct GameServer {
    config: ServerConfig,
}

impl GameServer {
    /// Create a server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Accept connections forever. The simulation runs on its own task.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener =
            TcpListener::bind(&self.config.bind_addr)
                .await
                .map_err(|source| ServerError::Bind {
                    addr: self.config.bind_addr.clone(),
                    source,
                })?;
        info!(addr = %self.config.bind_addr, "listening");

        let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(256);
        let (outbound_tx, _) = broadcast::channel::<ServerMessage>(256);

        tokio::spawn(simulation_loop(
            inbound_rx,
            outbound_tx.clone(),
            self.config.min_players,
        ));

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "connection accepted");
                    tokio::spawn(handle_connection(
                        stream,
                        inbound_tx.clone(),
                        outbound_tx.clone(),
                    ));
                }
                Err(error) => warn!(%error, "accept failed"),
            }
        }
    }
}

/// Per-connection task: handshake, join, then relay both directions.
async fn handle_connection(
    stream: TcpStream,
    inbound: mpsc::Sender<Inbound>,
    outbound: broadcast::Sender<ServerMessage>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(error) => {
            warn!(%error, "websocket handshake failed");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // The first message must introduce the player.
    let (player, hero) = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => match ClientMessage::from_json(&text) {
                Ok(ClientMessage::Join(join)) => match join.player_id() {
                    Some(player) => break (player, join.hero),
                    None => {
                        warn!(raw = %join.player_id, "join with invalid player id");
                        return;
                    }
                },
                Ok(_) => {
                    warn!("message before join, closing");
                    return;
                }
                Err(error) => {
                    warn!(%error, "unparseable join");
                    return;
                }
            },
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => continue,
            Some(Err(error)) => {
                warn!(%error, "websocket read failed");
                return;
            }
        }
    };

    let mut rx = outbound.subscribe();
    if let Ok(json) = (ServerMessage::JoinAccepted { player_id: player }).to_json() {
        let _ = write.send(Message::Text(json)).await;
    }
    if inbound
        .send(Inbound::Joined { player, hero })
        .await
        .is_err()
    {
        return;
    }
    info!(player = %player.short(), hero = hero.name(), "player joined");

    let writer = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            let Ok(json) = msg.to_json() else { continue };
            if write.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = read.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMessage::from_json(&text) {
                Ok(msg) => {
                    if inbound
                        .send(Inbound::Message { player, msg })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(error) => {
                    warn!(player = %player.short(), %error, "unparseable message")
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                warn!(player = %player.short(), %error, "websocket read failed");
                break;
            }
        }
    }

    let _ = inbound.send(Inbound::Disconnected { player }).await;
    writer.abort();
    info!(player = %player.short(), "connection closed");
}

/// The single simulation task. All game state lives here; inbound traffic
/// is drained at the top of every tick.
async fn simulation_loop(
    mut inbound: mpsc::Receiver<Inbound>,
    outbound: broadcast::Sender<ServerMessage>,
    min_players: usize,
) {
    let mut round = RoundCoordinator::new(NetRole::Server);
    let mut players = PlayerRegistry::new();
    let mut world = EntityWorld::new(NetRole::Server);
    let mut sync = SyncQueue::new();
    let spatial = ProximityQuery;
    let mut started = false;
    let mut reported_over = false;

    let tpf = 1.0 / TICK_RATE as f32;
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / TICK_RATE as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        loop {
            match inbound.try_recv() {
                Ok(Inbound::Joined { player, hero }) => {
                    if players.register(player, hero) {
                        info!(player = %player.short(), players = players.len(), "registered");
                    } else {
                        warn!(player = %player.short(), "already registered");
                    }
                }
                Ok(Inbound::Message { player, msg }) => match msg {
                    ClientMessage::WorldCreated | ClientMessage::ReadyForRound => {
                        round.handle_client_message(player, &msg, &mut players);
                    }
                    ClientMessage::CastInput(cmd) => {
                        if round.is_round_running() {
                            if let Some(entity) = players.entity_of(&player) {
                                world.attempt_cast(entity, cmd.key, cmd.target, &mut sync);
                            }
                        }
                    }
                    ClientMessage::Leave => {
                        info!(player = %player.short(), "player leaving");
                    }
                    ClientMessage::Join(_) => {}
                },
                Ok(Inbound::Disconnected { player }) => {
                    // No reconnect handling: a vanished client stalls the
                    // next acknowledgment barrier.
                    warn!(player = %player.short(), "client disconnected");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if !started && players.len() >= min_players {
            started = true;
            round.server_start_game(&mut players);
        }

        round.update(tpf, &mut players, &mut world, &mut sync);
        world.update(tpf, &spatial);

        for out in round.take_outbox() {
            if let Outbound::ToAll(msg) = out {
                let _ = outbound.send(msg);
            }
        }
        for msg in sync.take() {
            let _ = outbound.send(msg);
        }

        if round.is_match_over() && !reported_over {
            reported_over = true;
            info!("match over, server idle");
        }
    }
}
