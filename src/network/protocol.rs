//! Protocol Messages
//!
//! Wire format for the round protocol and entity sync commands over the
//! reliable-ordered transport. Messages are serialized as JSON for
//! debugging ease; flat input payloads also support binary (bincode).

use serde::{Deserialize, Serialize};

use crate::core::vec3::Vec3;
use crate::game::entity::EntityId;
use crate::game::player::{HeroKind, PlayerId};
use crate::game::spell::{InputKey, SpellId};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Introduce the player and their hero selection.
    Join(JoinRequest),

    /// Local world creation finished for the current round cycle.
    WorldCreated,

    /// Player is ready for the round to begin.
    ReadyForRound,

    /// Cast attempt for the bound spell under `key`.
    CastInput(CastCommand),

    /// Player is leaving the match.
    Leave,
}

/// Join request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Player's unique identifier (UUID string for JSON compatibility).
    pub player_id: String,
    /// Selected hero.
    pub hero: HeroKind,
}

impl JoinRequest {
    /// Parse `player_id` into bytes.
    pub fn player_id(&self) -> Option<PlayerId> {
        PlayerId::from_uuid_str(&self.player_id)
    }
}

/// Cast input relayed to the authoritative coordinator.
///
/// Flat struct: binary-serializable, unlike the tagged message enums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CastCommand {
    /// Input binding pressed.
    pub key: InputKey,
    /// Aimed world location.
    pub target: Vec3,
}

impl CastCommand {
    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted; echoes the registered player id.
    JoinAccepted {
        /// Registered player.
        player_id: PlayerId,
    },

    /// Build the level and reply with `WorldCreated`.
    CreateWorld,

    /// Round start countdown display value.
    RoundStartCountdown {
        /// Seconds until the round goes live.
        seconds: f32,
    },

    /// Round is live: enable input.
    NewRound,

    /// Round is over: disable input.
    RoundFinished,

    /// Authoritative entity-to-player binding.
    CharacterAssignment {
        /// Spawned character entity.
        entity_id: EntityId,
        /// Owning player.
        player_id: PlayerId,
    },

    /// Authoritative cooldown mutation for a remote caster mirror.
    SetCooldown {
        /// Caster entity.
        entity_id: EntityId,
        /// Spell whose cooldown changes.
        spell_id: SpellId,
        /// New cooldown value in seconds.
        cooldown: f32,
        /// Also raise every spell to the global floor on the mirror.
        apply_global: bool,
    },

    /// An observed entity started casting; drive animation/effects locally.
    StartCasting {
        /// Casting entity.
        entity_id: EntityId,
        /// Spell being cast.
        spell_id: SpellId,
        /// Direction from caster towards the target.
        direction: Vec3,
    },
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_json_roundtrip() {
        let msg = ClientMessage::CastInput(CastCommand {
            key: InputKey::PRIMARY,
            target: Vec3::new(10.0, 0.0, -4.0),
        });

        let json = msg.to_json().unwrap();
        let parsed = ClientMessage::from_json(&json).unwrap();

        if let ClientMessage::CastInput(cmd) = parsed {
            assert_eq!(cmd.key, InputKey::PRIMARY);
            assert_eq!(cmd.target, Vec3::new(10.0, 0.0, -4.0));
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_join_request_player_id_parse() {
        let id = PlayerId::new([7; 16]);
        let msg = ClientMessage::Join(JoinRequest {
            player_id: id.to_uuid_string(),
            hero: HeroKind::Warlord,
        });

        let json = msg.to_json().unwrap();
        match ClientMessage::from_json(&json).unwrap() {
            ClientMessage::Join(join) => {
                assert_eq!(join.player_id(), Some(id));
                assert_eq!(join.hero, HeroKind::Warlord);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let msg = ServerMessage::SetCooldown {
            entity_id: EntityId(42),
            spell_id: SpellId(2),
            cooldown: 8.0,
            apply_global: true,
        };

        let json = msg.to_json().unwrap();
        match ServerMessage::from_json(&json).unwrap() {
            ServerMessage::SetCooldown {
                entity_id,
                spell_id,
                cooldown,
                apply_global,
            } => {
                assert_eq!(entity_id, EntityId(42));
                assert_eq!(spell_id, SpellId(2));
                assert_eq!(cooldown, 8.0);
                assert!(apply_global);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_round_protocol_tags() {
        assert!(ServerMessage::CreateWorld
            .to_json()
            .unwrap()
            .contains("create_world"));
        assert!(ServerMessage::NewRound.to_json().unwrap().contains("new_round"));
        assert!(ServerMessage::RoundFinished
            .to_json()
            .unwrap()
            .contains("round_finished"));
        assert!(ClientMessage::WorldCreated
            .to_json()
            .unwrap()
            .contains("world_created"));
    }

    #[test]
    fn test_binary_serialization_cast_command() {
        // Note: Binary serialization only works reliably for flat structs.
        // Tagged enums (#[serde(tag = "type")]) are not supported by
        // bincode; use JSON for ClientMessage/ServerMessage.
        let cmd = CastCommand {
            key: InputKey::HEAVY,
            target: Vec3::new(1.0, 7.0, 3.0),
        };

        let bytes = cmd.to_bytes().unwrap();
        let parsed = CastCommand::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn test_countdown_payload() {
        let msg = ServerMessage::RoundStartCountdown { seconds: 5.0 };
        let json = msg.to_json().unwrap();
        match ServerMessage::from_json(&json).unwrap() {
            ServerMessage::RoundStartCountdown { seconds } => assert_eq!(seconds, 5.0),
            _ => panic!("Wrong message type"),
        }
    }
}
