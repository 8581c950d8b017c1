//! Message Bus
//!
//! The simulation never talks to sockets. Entity-scoped sync commands are
//! pushed into a [`SyncQueue`] and drained once per tick by whatever owns
//! the transport; the round coordinator keeps its own outbox the same way.
//! [`Loopback`] is an in-memory reliable-ordered link used by the offline
//! demo and the round-protocol tests.

use std::collections::{BTreeMap, VecDeque};

use crate::game::player::PlayerId;
use crate::network::protocol::{ClientMessage, ServerMessage};

/// Buffer of outbound entity sync commands (cooldowns, cast starts).
///
/// Broadcasting can be disabled across round boundaries; pushes while
/// disabled are dropped.
#[derive(Debug, Default)]
pub struct SyncQueue {
    queue: Vec<ServerMessage>,
    enabled: bool,
}

impl SyncQueue {
    /// Create a queue with broadcasting disabled (enabled when a round
    /// cycle begins).
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            enabled: false,
        }
    }

    /// Enable or disable broadcasting.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether broadcasting is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queue a command for broadcast. Dropped while disabled.
    pub fn push(&mut self, msg: ServerMessage) {
        if self.enabled {
            self.queue.push(msg);
        }
    }

    /// Take every queued command, leaving the queue empty.
    pub fn take(&mut self) -> Vec<ServerMessage> {
        std::mem::take(&mut self.queue)
    }

    /// Drop queued commands without sending them (round cleanup).
    pub fn reset(&mut self) {
        self.queue.clear();
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// In-memory reliable-ordered link between one server and its clients.
///
/// Messages are delivered in push order, per direction, exactly once,
/// matching the contract the real transport provides.
#[derive(Debug, Default)]
pub struct Loopback {
    to_clients: BTreeMap<PlayerId, VecDeque<ServerMessage>>,
    to_server: VecDeque<(PlayerId, ClientMessage)>,
}

impl Loopback {
    /// Create a link with no clients attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a client endpoint.
    pub fn register_client(&mut self, player: PlayerId) {
        self.to_clients.entry(player).or_default();
    }

    /// Queue a server broadcast to every attached client.
    pub fn broadcast(&mut self, msg: ServerMessage) {
        for queue in self.to_clients.values_mut() {
            queue.push_back(msg.clone());
        }
    }

    /// Queue a client-to-server message.
    pub fn send_to_server(&mut self, player: PlayerId, msg: ClientMessage) {
        self.to_server.push_back((player, msg));
    }

    /// Drain everything queued for one client, in order.
    pub fn drain_client(&mut self, player: PlayerId) -> Vec<ServerMessage> {
        self.to_clients
            .get_mut(&player)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Drain everything queued for the server, in order.
    pub fn drain_server(&mut self) -> Vec<(PlayerId, ClientMessage)> {
        self.to_server.drain(..).collect()
    }
}
