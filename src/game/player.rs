//! Player Records
//!
//! Persistent per-player match data: hero selection, the entity currently
//! bound to the player, and the round-protocol readiness flags. The registry
//! is the single owner of this data; only the round coordinator mutates the
//! flags (in response to local round progress or inbound acknowledgments).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::entity::EntityId;

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

/// Playable hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroKind {
    /// Ranged caster: bolt, heavy splash, channeled burn.
    Pyromancer,
    /// Bruiser: melee strike and a thrown javelin.
    Warlord,
}

impl HeroKind {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            HeroKind::Pyromancer => "Pyromancer",
            HeroKind::Warlord => "Warlord",
        }
    }

    /// Maximum health when spawned.
    pub fn max_health(self) -> f32 {
        match self {
            HeroKind::Pyromancer => 1700.0,
            HeroKind::Warlord => 2200.0,
        }
    }
}

/// Per-player persistent match data.
#[derive(Clone, Debug)]
pub struct PlayerRecord {
    /// Player identifier.
    pub id: PlayerId,
    /// Selected hero.
    pub hero: HeroKind,
    /// Entity currently bound to the player, if a round is set up.
    pub entity: Option<EntityId>,
    /// Player has acknowledged local world creation this round cycle.
    pub world_created: bool,
    /// Player has signaled readiness for the round. Tracked and reset at
    /// round boundaries; not used for gating.
    pub ready_for_round: bool,
}

impl PlayerRecord {
    fn new(id: PlayerId, hero: HeroKind) -> Self {
        Self {
            id,
            hero,
            entity: None,
            world_created: false,
            ready_for_round: false,
        }
    }
}

/// Owner of all player records. One record per connected player.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    records: BTreeMap<PlayerId, PlayerRecord>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player. Returns false (and leaves the existing record
    /// untouched) if the player is already registered.
    pub fn register(&mut self, id: PlayerId, hero: HeroKind) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }
        self.records.insert(id, PlayerRecord::new(id, hero));
        true
    }

    /// Remove a player's record.
    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerRecord> {
        self.records.remove(id)
    }

    /// Get a record.
    pub fn get(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.records.get(id)
    }

    /// Get a record mutably.
    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerRecord> {
        self.records.get_mut(id)
    }

    /// Iterate records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.records.values()
    }

    /// Iterate records mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerRecord> {
        self.records.values_mut()
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no players are registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reset both readiness flags for every player. Called at the start of
    /// each round-creation cycle and when a round ends.
    pub fn reset_round_flags(&mut self) {
        for record in self.records.values_mut() {
            record.world_created = false;
            record.ready_for_round = false;
        }
    }

    /// All-acknowledged barrier: every registered player has confirmed
    /// local world creation.
    pub fn all_worlds_created(&self) -> bool {
        self.records.values().all(|r| r.world_created)
    }

    /// Entity bound to the player, if any.
    pub fn entity_of(&self, id: &PlayerId) -> Option<EntityId> {
        self.records.get(id).and_then(|r| r.entity)
    }

    /// Reverse lookup: the player an entity is bound to.
    pub fn player_by_entity(&self, entity: EntityId) -> Option<PlayerId> {
        self.records
            .values()
            .find(|r| r.entity == Some(entity))
            .map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_unique_per_player() {
        let mut registry = PlayerRegistry::new();
        let id = PlayerId::new([1; 16]);

        assert!(registry.register(id, HeroKind::Pyromancer));
        assert!(!registry.register(id, HeroKind::Warlord));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().hero, HeroKind::Pyromancer);
    }

    #[test]
    fn test_reset_round_flags() {
        let mut registry = PlayerRegistry::new();
        let a = PlayerId::new([1; 16]);
        let b = PlayerId::new([2; 16]);
        registry.register(a, HeroKind::Pyromancer);
        registry.register(b, HeroKind::Warlord);

        registry.get_mut(&a).unwrap().world_created = true;
        registry.get_mut(&b).unwrap().ready_for_round = true;

        registry.reset_round_flags();
        for record in registry.iter() {
            assert!(!record.world_created);
            assert!(!record.ready_for_round);
        }
    }

    #[test]
    fn test_all_worlds_created_barrier() {
        let mut registry = PlayerRegistry::new();
        let a = PlayerId::new([1; 16]);
        let b = PlayerId::new([2; 16]);
        registry.register(a, HeroKind::Pyromancer);
        registry.register(b, HeroKind::Warlord);

        assert!(!registry.all_worlds_created());
        registry.get_mut(&a).unwrap().world_created = true;
        assert!(!registry.all_worlds_created());
        registry.get_mut(&b).unwrap().world_created = true;
        assert!(registry.all_worlds_created());
    }

    #[test]
    fn test_entity_binding_lookup() {
        let mut registry = PlayerRegistry::new();
        let a = PlayerId::new([1; 16]);
        registry.register(a, HeroKind::Warlord);

        let entity = EntityId(7);
        registry.get_mut(&a).unwrap().entity = Some(entity);

        assert_eq!(registry.entity_of(&a), Some(entity));
        assert_eq!(registry.player_by_entity(entity), Some(a));
        assert_eq!(registry.player_by_entity(EntityId(8)), None);
    }

    #[test]
    fn test_player_id_uuid_roundtrip() {
        let id = PlayerId::new([0xab; 16]);
        let s = id.to_uuid_string();
        assert_eq!(PlayerId::from_uuid_str(&s), Some(id));
        assert_eq!(PlayerId::from_uuid_str("not-a-uuid"), None);
    }
}
