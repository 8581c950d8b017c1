//! # Hexrift Arena Server
//!
//! Gameplay logic for a networked multiplayer arena combat game: the round
//! lifecycle protocol between an authoritative server and its clients, and
//! the spell-cast/cooldown coordination that governs combat.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HEXRIFT ARENA SERVER                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Math primitives                           │
//! │  └── vec3.rs     - f32 3D vector                             │
//! │                                                              │
//! │  game/           - Simulation-step gameplay logic            │
//! │  ├── player.rs   - Player records, readiness flags           │
//! │  ├── spell.rs    - Spell catalog, hero spellbooks            │
//! │  ├── action.rs   - Timed action queue per entity             │
//! │  ├── influence.rs- Crowd control and damage over time        │
//! │  ├── entity.rs   - Characters and projectiles                │
//! │  ├── world.rs    - Entity ownership and combat resolution    │
//! │  ├── cast.rs     - Cast gating, cooldowns, interruption      │
//! │  └── round.rs    - Round lifecycle state machine             │
//! │                                                              │
//! │  network/        - Wire protocol and transport adapter       │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── bus.rs      - Sync queue, loopback link                 │
//! │  └── server.rs   - WebSocket server                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Model
//!
//! The server owns every round transition and every cooldown commit.
//! Clients hold mirrors updated exclusively through received messages:
//! a client's local countdown reaching zero displays zero, it does not
//! start the round. Incoming network messages are marshaled onto the
//! single simulation step before touching any state; no operation in
//! this crate blocks or suspends.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::vec3::Vec3;
pub use game::cast::{SpellCaster, GLOBAL_COOLDOWN};
pub use game::entity::{Entity, EntityId};
pub use game::player::{HeroKind, PlayerId, PlayerRegistry};
pub use game::round::{RoundCoordinator, RoundPhase, COUNTDOWN_SECONDS, TOTAL_ROUNDS};
pub use game::spell::{InputKey, SpellId};
pub use game::world::{EntityWorld, NetRole};
pub use network::protocol::{ClientMessage, ServerMessage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Transport adapter tick rate (Hz). The simulation itself is paced by
/// elapsed per-tick time, not a fixed step.
pub const TICK_RATE: u32 = 60;
