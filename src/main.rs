//! Hexrift Arena Server
//!
//! Authoritative round and spell coordination server. Runs the WebSocket
//! front end by default; `--demo` plays a full offline match over an
//! in-memory link instead.

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hexrift::game::round::Outbound;
use hexrift::game::world::{ProximityQuery, SPAWN_HEIGHT, STARTING_LOCATIONS};
use hexrift::network::bus::{Loopback, SyncQueue};
use hexrift::network::server::{GameServer, ServerConfig};
use hexrift::{
    ClientMessage, EntityId, EntityWorld, HeroKind, InputKey, NetRole, PlayerId, PlayerRegistry,
    RoundCoordinator, ServerMessage, Vec3, TICK_RATE, VERSION,
};

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Hexrift Arena Server v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    if std::env::args().any(|arg| arg == "--demo") {
        demo_match();
        return;
    }

    let bind_addr =
        std::env::var("HEXRIFT_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let server = GameServer::new(ServerConfig {
        bind_addr,
        min_players: 2,
    });
    if let Err(error) = server.run().await {
        eprintln!("server failed: {error}");
        std::process::exit(1);
    }
}

/// One endpoint of the offline demo.
struct DemoSide {
    round: RoundCoordinator,
    players: PlayerRegistry,
    world: EntityWorld,
    sync: SyncQueue,
}

impl DemoSide {
    fn new(role: NetRole, roster: &[(PlayerId, HeroKind)]) -> Self {
        let mut players = PlayerRegistry::new();
        for (id, hero) in roster {
            players.register(*id, *hero);
        }
        Self {
            round: RoundCoordinator::new(role),
            players,
            world: EntityWorld::new(role),
            sync: SyncQueue::new(),
        }
    }
}

/// Play a three-round match between two scripted players over the
/// loopback link, logging every protocol step.
fn demo_match() {
    info!("=== Offline Demo Match ===");

    const TPF: f32 = 1.0 / TICK_RATE as f32;

    let roster = vec![
        (PlayerId::new([1; 16]), HeroKind::Pyromancer),
        (PlayerId::new([2; 16]), HeroKind::Warlord),
    ];

    let mut server = DemoSide::new(NetRole::Server, &roster);
    let mut clients: Vec<(PlayerId, DemoSide)> = roster
        .iter()
        .map(|(id, _)| (*id, DemoSide::new(NetRole::Client, &roster)))
        .collect();
    let mut link = Loopback::new();
    for (id, _) in &roster {
        link.register_client(*id);
    }

    server.round.server_start_game(&mut server.players);

    let mut round_time = 0.0f32;
    let mut ticks: u64 = 0;

    while !server.round.is_match_over() && ticks < 60 * 120 {
        ticks += 1;

        server.round.update(
            TPF,
            &mut server.players,
            &mut server.world,
            &mut server.sync,
        );
        server.world.update(TPF, &ProximityQuery);

        if server.round.is_round_running() {
            round_time += TPF;

            // Scripted combat: both players hammer their primary spell at
            // the opponent. Cooldown gating turns most presses into no-ops.
            if ticks % 30 == 0 {
                let bindings: Vec<(EntityId, Vec3)> = server
                    .players
                    .iter()
                    .filter_map(|r| r.entity)
                    .filter_map(|e| server.world.get(e).map(|ent| (e, ent.position)))
                    .collect();
                for (caster, _) in &bindings {
                    if let Some((_, target)) = bindings.iter().find(|(id, _)| id != caster) {
                        server
                            .world
                            .attempt_cast(*caster, InputKey::PRIMARY, *target, &mut server.sync);
                    }
                }
            }

            // Sudden death keeps the demo moving: the arena collapses
            // three seconds into each round.
            if round_time >= 3.0 {
                round_time = 0.0;
                info!("demo: arena collapse");
                let doomed: Vec<EntityId> =
                    server.players.iter().filter_map(|r| r.entity).collect();
                for entity in doomed {
                    server.world.damage_entity(entity, f32::MAX);
                }
            }
        } else {
            round_time = 0.0;
        }

        for out in server.round.take_outbox() {
            if let Outbound::ToAll(msg) = out {
                link.broadcast(msg);
            }
        }
        for msg in server.sync.take() {
            link.broadcast(msg);
        }

        for (player, client) in &mut clients {
            for msg in link.drain_client(*player) {
                // Entity replication is engine-side; the demo mirrors
                // character spawns locally so sync commands land.
                if let ServerMessage::CharacterAssignment {
                    entity_id,
                    player_id,
                } = &msg
                {
                    if client.world.get(*entity_id).is_none() {
                        if let Some(index) =
                            roster.iter().position(|(id, _)| id == player_id)
                        {
                            let hero = roster[index].1;
                            let slot = STARTING_LOCATIONS[index % STARTING_LOCATIONS.len()];
                            client.world.spawn_character(
                                hero,
                                slot.with_y(SPAWN_HEIGHT),
                                Vec3::UNIT_X,
                            );
                        }
                    }
                }
                client.round.handle_server_message(
                    &msg,
                    &mut client.players,
                    &mut client.world,
                    &mut client.sync,
                );
            }
            client.round.update(
                TPF,
                &mut client.players,
                &mut client.world,
                &mut client.sync,
            );
            client.world.update(TPF, &ProximityQuery);
            for out in client.round.take_outbox() {
                if let Outbound::ToServer(msg) = out {
                    link.send_to_server(*player, msg);
                }
            }
        }

        for (player, msg) in link.drain_server() {
            if let ClientMessage::WorldCreated | ClientMessage::ReadyForRound = msg {
                server
                    .round
                    .handle_client_message(player, &msg, &mut server.players);
            }
        }
    }

    info!("=== Demo Results ===");
    info!(
        "rounds played: {} / {}",
        server.round.current_round(),
        server.round.total_rounds()
    );
    info!("match over: {}", server.round.is_match_over());
    for (player, client) in &clients {
        info!(
            "client {}: round {}, input {}",
            hex::encode(&player.0[..4]),
            client.round.current_round(),
            if client.round.input_enabled() { "on" } else { "off" }
        );
    }
}
