//! Round Lifecycle
//!
//! Drives match progression on both sides of the wire:
//!
//! ```text
//! Idle -> WorldCreation -> AwaitingClientsReady -> CharacterSetup
//!      -> Countdown -> RoundActive -> RoundEnding
//!      -> (WorldCreation | MatchOver)
//! ```
//!
//! The server is authoritative for every transition; clients mirror state
//! exclusively from received messages. Work triggered by a message is
//! deferred to the next simulation step so transport threads never touch
//! game state. Waiting (for acknowledgments, for the countdown) is state
//! held across ticks, never a blocking call.

use tracing::{debug, error, info, warn};

use crate::game::player::{PlayerId, PlayerRegistry};
use crate::game::world::{EntityWorld, NetRole, SPAWN_HEIGHT, STARTING_LOCATIONS};
use crate::core::vec3::Vec3;
use crate::network::bus::SyncQueue;
use crate::network::protocol::{ClientMessage, ServerMessage};

/// Rounds played per match.
pub const TOTAL_ROUNDS: u32 = 3;

/// Countdown broadcast before each round goes live, in seconds.
pub const COUNTDOWN_SECONDS: f32 = 5.0;

/// Ack-barrier stall time before a warning is logged. The barrier itself
/// waits indefinitely: a missing acknowledgment blocks round progression
/// for everyone (known limitation, observable but not recoverable).
const STALL_WARN_SECONDS: f32 = 30.0;

/// Client display surface for the countdown and round transitions.
/// The real HUD lives in the engine; [`NullHud`] is the headless default.
pub trait HudFeed {
    /// Show the remaining countdown.
    fn set_countdown(&mut self, seconds: f32);
    /// The round went live.
    fn round_started(&mut self);
    /// Wipe round-scoped widgets during cleanup.
    fn clear(&mut self);
}

/// HUD that ignores everything.
#[derive(Debug, Default)]
pub struct NullHud;

impl HudFeed for NullHud {
    fn set_countdown(&mut self, _seconds: f32) {}
    fn round_started(&mut self) {}
    fn clear(&mut self) {}
}

/// Observable lifecycle state, derived from the coordinator's fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    /// Match not started.
    Idle,
    /// World creation scheduled for the next simulation step.
    WorldCreation,
    /// Server: collecting `WorldCreated` acks. Client: waiting on the
    /// server to advance.
    AwaitingClientsReady,
    /// Counting down to the round going live.
    Countdown,
    /// Round is live.
    RoundActive,
    /// Terminal: all rounds played.
    MatchOver,
}

/// Round-protocol message leaving this coordinator.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Server broadcast to every client.
    ToAll(ServerMessage),
    /// Client reply to the server.
    ToServer(ClientMessage),
}

/// Work scheduled onto the next simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    CreateWorld,
    CreateCharacters,
}

/// The round lifecycle state machine. One instance per process; `role`
/// decides which transitions it drives and which it mirrors.
pub struct RoundCoordinator {
    role: NetRole,
    current_round: u32,
    total_rounds: u32,
    round_running: bool,
    start_countdown: f32,
    match_over: bool,
    awaiting_acks: bool,
    input_enabled: bool,
    ack_stall: f32,
    stall_warned: bool,
    deferred: Vec<Deferred>,
    outbox: Vec<Outbound>,
    hud: Box<dyn HudFeed + Send>,
}

impl RoundCoordinator {
    /// Create a coordinator for the default number of rounds.
    pub fn new(role: NetRole) -> Self {
        Self::with_rounds(role, TOTAL_ROUNDS)
    }

    /// Create a coordinator playing `total_rounds` rounds.
    pub fn with_rounds(role: NetRole, total_rounds: u32) -> Self {
        Self {
            role,
            current_round: 0,
            total_rounds,
            round_running: false,
            start_countdown: 0.0,
            match_over: false,
            awaiting_acks: false,
            input_enabled: false,
            ack_stall: 0.0,
            stall_warned: false,
            deferred: Vec::new(),
            outbox: Vec::new(),
            hud: Box::new(NullHud),
        }
    }

    /// Install the client HUD surface.
    pub fn set_hud(&mut self, hud: Box<dyn HudFeed + Send>) {
        self.hud = hud;
    }

    /// This coordinator's role.
    pub fn role(&self) -> NetRole {
        self.role
    }

    /// Completed-or-current round number, starting at 0 before the match.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Rounds played per match.
    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Whether a round is live.
    pub fn is_round_running(&self) -> bool {
        self.round_running
    }

    /// Remaining start countdown; 0 when inactive.
    pub fn countdown_remaining(&self) -> f32 {
        self.start_countdown.max(0.0)
    }

    /// Whether the match reached its terminal state.
    pub fn is_match_over(&self) -> bool {
        self.match_over
    }

    /// Client-side: whether player input is enabled.
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Seconds spent stalled on the acknowledgment barrier.
    pub fn ack_stall_seconds(&self) -> f32 {
        self.ack_stall
    }

    /// Derived lifecycle phase.
    pub fn phase(&self) -> RoundPhase {
        if self.match_over {
            RoundPhase::MatchOver
        } else if self.round_running {
            RoundPhase::RoundActive
        } else if self.start_countdown > 0.0 {
            RoundPhase::Countdown
        } else if self.deferred.contains(&Deferred::CreateWorld) {
            RoundPhase::WorldCreation
        } else if self.awaiting_acks || self.current_round > 0 {
            RoundPhase::AwaitingClientsReady
        } else {
            RoundPhase::Idle
        }
    }

    /// Drain the protocol messages produced since the last drain.
    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Server only: begin the match. Resets every player's round flags and
    /// schedules the first world creation on the next simulation step.
    pub fn server_start_game(&mut self, players: &mut PlayerRegistry) {
        if !self.assert_role(NetRole::Server, "server_start_game") {
            return;
        }
        info!(players = players.len(), "starting game");
        players.reset_round_flags();

        if self.current_round == 0 {
            self.deferred.push(Deferred::CreateWorld);
        }
    }

    /// Advance the coordinator one simulation step.
    pub fn update(
        &mut self,
        tpf: f32,
        players: &mut PlayerRegistry,
        world: &mut EntityWorld,
        sync: &mut SyncQueue,
    ) {
        for work in std::mem::take(&mut self.deferred) {
            match work {
                Deferred::CreateWorld => self.create_world(world, sync),
                Deferred::CreateCharacters => self.create_characters(players, world),
            }
        }

        if self.awaiting_acks {
            self.ack_stall += tpf;
            if self.ack_stall >= STALL_WARN_SECONDS && !self.stall_warned {
                self.stall_warned = true;
                warn!(
                    stalled_for = self.ack_stall,
                    "still waiting for client world acknowledgments"
                );
            }
        }

        if self.start_countdown > 0.0 {
            self.start_countdown -= tpf;
            if self.role.is_server() {
                if self.start_countdown <= 0.0 {
                    self.start_new_round();
                }
            } else {
                self.hud.set_countdown(self.start_countdown.max(0.0));
            }
        }

        if !self.round_running {
            return;
        }

        if self.role.is_server() {
            let mut alive = 0;
            for record in players.iter() {
                let Some(entity_id) = record.entity else {
                    continue;
                };
                let Some(entity) = world.get(entity_id) else {
                    continue;
                };
                if entity.health().is_some_and(|h| h.current > 0.0) {
                    alive += 1;
                    if alive > 1 {
                        break;
                    }
                }
            }
            if alive == 0 {
                self.end_round(players, world, sync);
            }
        }
    }

    /// Server only: handle a message from `sender`.
    pub fn handle_client_message(
        &mut self,
        sender: PlayerId,
        msg: &ClientMessage,
        players: &mut PlayerRegistry,
    ) {
        if !self.assert_role(NetRole::Server, "handle_client_message") {
            return;
        }
        match msg {
            ClientMessage::WorldCreated => {
                let Some(record) = players.get_mut(&sender) else {
                    warn!(player = %sender.short(), "world ack from unknown player");
                    return;
                };
                record.world_created = true;
                info!(player = %sender.short(), "client world created");

                if self.awaiting_acks && players.all_worlds_created() {
                    info!("all clients ready, setting up characters");
                    self.awaiting_acks = false;
                    self.ack_stall = 0.0;
                    self.deferred.push(Deferred::CreateCharacters);
                }
            }
            ClientMessage::ReadyForRound => {
                if let Some(record) = players.get_mut(&sender) {
                    record.ready_for_round = true;
                }
            }
            // Join and cast input are routed by the session layer.
            _ => {}
        }
    }

    /// Client only: handle a round-protocol message from the server.
    pub fn handle_server_message(
        &mut self,
        msg: &ServerMessage,
        players: &mut PlayerRegistry,
        world: &mut EntityWorld,
        sync: &mut SyncQueue,
    ) {
        if !self.assert_role(NetRole::Client, "handle_server_message") {
            return;
        }
        match msg {
            ServerMessage::CreateWorld => {
                self.deferred.push(Deferred::CreateWorld);
            }
            ServerMessage::NewRound => {
                self.start_new_round();
            }
            ServerMessage::RoundStartCountdown { seconds } => {
                self.start_countdown = *seconds;
            }
            ServerMessage::RoundFinished => {
                self.end_round(players, world, sync);
            }
            ServerMessage::CharacterAssignment {
                entity_id,
                player_id,
            } => match players.get_mut(player_id) {
                Some(record) => {
                    record.entity = Some(*entity_id);
                    debug!(player = %player_id.short(), entity = %entity_id, "character bound");
                }
                None => warn!(player = %player_id.short(), "assignment for unknown player"),
            },
            ServerMessage::SetCooldown { .. } | ServerMessage::StartCasting { .. } => {
                world.apply_sync_command(msg);
            }
            ServerMessage::JoinAccepted { .. } => {}
        }
    }

    /// Build the round's world. Runs on the simulation step. On rounds
    /// after the first, previous-round cleanup completes before any
    /// new-world setup starts.
    fn create_world(&mut self, world: &mut EntityWorld, sync: &mut SyncQueue) {
        self.current_round += 1;
        info!(round = self.current_round, "creating world");

        if self.current_round > 1 {
            self.cleanup_previous_round(world, sync);
        }

        world.set_enabled(true);
        world.load_level();
        world.attach_level();

        match self.role {
            NetRole::Client => {
                self.outbox.push(Outbound::ToServer(ClientMessage::WorldCreated));
            }
            NetRole::Server => {
                info!("broadcasting world creation");
                self.outbox.push(Outbound::ToAll(ServerMessage::CreateWorld));
                sync.set_enabled(true);
                self.awaiting_acks = true;
                self.ack_stall = 0.0;
                self.stall_warned = false;
            }
        }
    }

    /// Drop everything the previous round left behind.
    fn cleanup_previous_round(&mut self, world: &mut EntityWorld, sync: &mut SyncQueue) {
        info!("cleaning up previous round");
        world.clear();
        sync.reset();
        if self.role.is_client() {
            self.hud.clear();
        }
    }

    /// Server only: spawn one character per player at a fixed starting
    /// location, broadcast the bindings, then start the countdown.
    fn create_characters(&mut self, players: &mut PlayerRegistry, world: &mut EntityWorld) {
        if !self.assert_role(NetRole::Server, "create_characters") {
            return;
        }
        info!("creating characters");

        for (index, record) in players.iter_mut().enumerate() {
            let slot = STARTING_LOCATIONS[index % STARTING_LOCATIONS.len()];
            let position = slot.with_y(SPAWN_HEIGHT);
            let facing = Vec3::ZERO.sub(slot).with_y(0.0).normalized();
            let entity = world.spawn_character(record.hero, position, facing);
            record.entity = Some(entity);
        }

        for record in players.iter() {
            if let Some(entity) = record.entity {
                self.outbox.push(Outbound::ToAll(ServerMessage::CharacterAssignment {
                    entity_id: entity,
                    player_id: record.id,
                }));
            }
        }

        self.outbox.push(Outbound::ToAll(ServerMessage::RoundStartCountdown {
            seconds: COUNTDOWN_SECONDS,
        }));
        self.start_countdown = COUNTDOWN_SECONDS;
    }

    /// Go live. Server broadcasts `NewRound`; the client reaches here only
    /// by receiving it (its local countdown display never transitions).
    fn start_new_round(&mut self) {
        info!(round = self.current_round, "starting round");
        if self.role.is_server() {
            self.outbox.push(Outbound::ToAll(ServerMessage::NewRound));
        }
        self.round_running = true;
        self.start_countdown = 0.0;
        if self.role.is_client() {
            self.input_enabled = true;
            self.hud.round_started();
        }
    }

    /// Tear the round down. Server decides whether another round follows.
    fn end_round(
        &mut self,
        players: &mut PlayerRegistry,
        world: &mut EntityWorld,
        sync: &mut SyncQueue,
    ) {
        info!(round = self.current_round, "ending round");
        if self.role.is_server() {
            self.outbox.push(Outbound::ToAll(ServerMessage::RoundFinished));
            players.reset_round_flags();
            sync.set_enabled(false);
        }

        self.round_running = false;
        world.set_enabled(false);
        if self.role.is_client() {
            self.input_enabled = false;
        }

        if self.current_round < self.total_rounds {
            if self.role.is_server() {
                self.deferred.push(Deferred::CreateWorld);
            }
        } else {
            self.match_over = true;
            info!("match over");
        }
    }

    /// Role-confusion is a programming-contract violation: loud in
    /// development, skipped (with an error log) in release.
    fn assert_role(&self, expected: NetRole, operation: &str) -> bool {
        let ok = self.role == expected;
        if !ok {
            error!(operation, ?expected, actual = ?self.role, "wrong role");
            debug_assert!(ok, "{operation} invoked on {:?}", self.role);
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::EntityId;
    use crate::game::player::HeroKind;
    use crate::game::world::ProximityQuery;
    use crate::network::bus::Loopback;

    const TPF: f32 = 0.1;

    /// One simulation endpoint: coordinator plus the state it drives.
    struct Side {
        round: RoundCoordinator,
        players: PlayerRegistry,
        world: EntityWorld,
        sync: SyncQueue,
    }

    impl Side {
        fn new(role: NetRole, roster: &[(PlayerId, HeroKind)], rounds: u32) -> Self {
            let mut players = PlayerRegistry::new();
            for (id, hero) in roster {
                players.register(*id, *hero);
            }
            Side {
                round: RoundCoordinator::with_rounds(role, rounds),
                players,
                world: EntityWorld::new(role),
                sync: SyncQueue::new(),
            }
        }
    }

    /// Authoritative server plus N clients over an in-memory link.
    struct Harness {
        server: Side,
        clients: Vec<(PlayerId, Side)>,
        link: Loopback,
        /// A muted client's replies are dropped (simulates a stalled peer).
        muted: Option<PlayerId>,
    }

    impl Harness {
        fn new(player_count: usize) -> Self {
            let roster: Vec<(PlayerId, HeroKind)> = (0..player_count)
                .map(|i| {
                    let hero = if i % 2 == 0 {
                        HeroKind::Pyromancer
                    } else {
                        HeroKind::Warlord
                    };
                    (PlayerId::new([i as u8 + 1; 16]), hero)
                })
                .collect();

            let mut link = Loopback::new();
            let clients = roster
                .iter()
                .map(|(id, _)| {
                    link.register_client(*id);
                    (*id, Side::new(NetRole::Client, &roster, TOTAL_ROUNDS))
                })
                .collect();

            Harness {
                server: Side::new(NetRole::Server, &roster, TOTAL_ROUNDS),
                clients,
                link,
                muted: None,
            }
        }

        fn start(&mut self) {
            self.server.round.server_start_game(&mut self.server.players);
        }

        /// One full tick: server step, broadcast, client steps, replies.
        fn pump(&mut self) {
            let server = &mut self.server;
            server
                .round
                .update(TPF, &mut server.players, &mut server.world, &mut server.sync);
            server.world.update(TPF, &ProximityQuery);
            for out in server.round.take_outbox() {
                match out {
                    Outbound::ToAll(msg) => self.link.broadcast(msg),
                    Outbound::ToServer(_) => unreachable!("server never replies upstream"),
                }
            }
            for msg in server.sync.take() {
                self.link.broadcast(msg);
            }

            for (player, client) in &mut self.clients {
                for msg in self.link.drain_client(*player) {
                    client.round.handle_server_message(
                        &msg,
                        &mut client.players,
                        &mut client.world,
                        &mut client.sync,
                    );
                }
                client
                    .round
                    .update(TPF, &mut client.players, &mut client.world, &mut client.sync);
                client.world.update(TPF, &ProximityQuery);
                for out in client.round.take_outbox() {
                    match out {
                        Outbound::ToServer(msg) => {
                            if self.muted != Some(*player) {
                                self.link.send_to_server(*player, msg);
                            }
                        }
                        Outbound::ToAll(_) => unreachable!("clients never broadcast"),
                    }
                }
            }

            for (player, msg) in self.link.drain_server() {
                self.server
                    .round
                    .handle_client_message(player, &msg, &mut self.server.players);
            }
        }

        fn kill_everyone(&mut self) {
            let ids: Vec<EntityId> = self
                .server
                .players
                .iter()
                .filter_map(|r| r.entity)
                .collect();
            for id in ids {
                self.server.world.damage_entity(id, f32::MAX);
            }
        }
    }

    #[test]
    fn test_full_match_plays_exactly_three_rounds() {
        let mut h = Harness::new(2);
        h.start();

        for _ in 0..5000 {
            h.pump();
            if h.server.round.is_round_running() {
                h.kill_everyone();
            }
            if h.server.round.is_match_over() {
                break;
            }
        }

        assert!(h.server.round.is_match_over());
        assert_eq!(h.server.round.current_round(), 3);
        assert_eq!(h.server.round.phase(), RoundPhase::MatchOver);
        assert!(!h.server.world.is_enabled());

        for (_, client) in &h.clients {
            assert_eq!(client.round.current_round(), 3);
            assert!(client.round.is_match_over());
            assert!(!client.round.input_enabled());
        }
    }

    #[test]
    fn test_character_setup_one_entity_per_player_distinct_positions() {
        let mut h = Harness::new(3);
        h.start();
        h.pump();
        h.pump();

        let mut positions = Vec::new();
        for record in h.server.players.iter() {
            let entity = record.entity.expect("entity bound after setup");
            let e = h.server.world.get(entity).expect("entity spawned");
            assert_eq!(e.position.y, SPAWN_HEIGHT);
            positions.push(e.position);
        }
        assert_eq!(positions.len(), 3);
        for i in 0..positions.len() {
            for j in i + 1..positions.len() {
                assert!(positions[i].distance(positions[j]) > 1.0);
            }
        }
        assert_eq!(
            h.server
                .world
                .entities()
                .filter(|e| e.is_character())
                .count(),
            3
        );

        // Clients learned their bindings too.
        for (player, client) in &h.clients {
            assert!(client.players.entity_of(player).is_some());
        }
    }

    #[test]
    fn test_missing_ack_stalls_round_progression() {
        let mut h = Harness::new(2);
        h.muted = Some(h.clients[1].0);
        h.start();

        for _ in 0..400 {
            h.pump();
        }

        // The barrier holds: no characters, no countdown, no round.
        assert_eq!(h.server.round.phase(), RoundPhase::AwaitingClientsReady);
        assert!(h.server.world.is_empty());
        assert!(!h.server.round.is_round_running());
        assert!(h.server.round.ack_stall_seconds() > STALL_WARN_SECONDS);
    }

    #[test]
    fn test_round_continues_with_one_survivor_ends_at_zero() {
        let mut h = Harness::new(2);
        h.start();

        for _ in 0..200 {
            h.pump();
            if h.server.round.is_round_running() {
                break;
            }
        }
        assert!(h.server.round.is_round_running());
        for (_, client) in &h.clients {
            assert!(client.round.is_round_running());
            assert!(client.round.input_enabled());
        }

        let ids: Vec<EntityId> = h
            .server
            .players
            .iter()
            .filter_map(|r| r.entity)
            .collect();
        assert_eq!(ids.len(), 2);

        // A drops to zero, B keeps 50 health: the round must continue.
        h.server.world.damage_entity(ids[0], f32::MAX);
        let b_max = h.server.world.get(ids[1]).unwrap().health().unwrap().max;
        h.server.world.damage_entity(ids[1], b_max - 50.0);
        for _ in 0..20 {
            h.pump();
        }
        assert!(h.server.round.is_round_running());

        // B drops too: alive count 0 is the sole end trigger.
        h.server.world.damage_entity(ids[1], f32::MAX);
        h.pump();
        assert!(!h.server.round.is_round_running());
    }

    #[test]
    fn test_client_countdown_is_display_only() {
        let mut h = Harness::new(2);
        h.start();
        h.pump();
        h.pump();

        let (_, client) = &mut h.clients[0];
        assert!(client.round.countdown_remaining() > 0.0);

        // Tick the client far past expiry without delivering NewRound:
        // the server is the sole authority for going live.
        for _ in 0..100 {
            client
                .round
                .update(TPF, &mut client.players, &mut client.world, &mut client.sync);
        }
        assert_eq!(client.round.countdown_remaining(), 0.0);
        assert!(!client.round.is_round_running());
        assert!(!client.round.input_enabled());
    }

    #[test]
    fn test_start_game_resets_player_flags() {
        let mut h = Harness::new(2);
        for record in h.server.players.iter_mut() {
            record.world_created = true;
            record.ready_for_round = true;
        }
        h.start();
        for record in h.server.players.iter() {
            assert!(!record.world_created);
            assert!(!record.ready_for_round);
        }
    }

    #[test]
    fn test_running_and_countdown_phases_mutually_exclusive() {
        let mut h = Harness::new(2);
        h.start();

        for _ in 0..2000 {
            h.pump();
            if h.server.round.is_round_running() {
                h.kill_everyone();
            }
            assert!(
                !(h.server.round.is_round_running()
                    && h.server.round.countdown_remaining() > 0.0)
            );
            for (_, client) in &h.clients {
                assert!(
                    !(client.round.is_round_running()
                        && client.round.countdown_remaining() > 0.0)
                );
            }
            if h.server.round.is_match_over() {
                break;
            }
        }
        assert!(h.server.round.is_match_over());
    }

    #[test]
    fn test_ready_for_round_recorded_but_not_gating() {
        let mut h = Harness::new(2);
        h.start();
        let player = h.clients[0].0;
        h.link.send_to_server(player, ClientMessage::ReadyForRound);
        h.pump();
        assert!(h.server.players.get(&player).unwrap().ready_for_round);
    }

    #[test]
    fn test_second_round_cleanup_precedes_new_world() {
        let mut h = Harness::new(2);
        h.start();

        // Play round 1 to its end.
        for _ in 0..500 {
            h.pump();
            if h.server.round.is_round_running() {
                h.kill_everyone();
            }
            if h.server.round.current_round() == 2 {
                break;
            }
        }
        assert_eq!(h.server.round.current_round(), 2);

        // Cleanup completed before any round-2 setup: round 1 corpses are
        // gone and nothing new has spawned yet.
        assert!(h.server.world.is_empty());

        // The fresh barrier has cleared; the next step spawns round 2.
        h.pump();
        assert_eq!(
            h.server
                .world
                .entities()
                .filter(|e| e.is_character())
                .count(),
            2
        );
    }
}
