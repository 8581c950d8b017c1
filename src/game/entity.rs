//! Entities
//!
//! Characters and projectiles, identified by process-unique ids. Instead of
//! reflective component lookup, each entity carries a closed table of owned
//! components behind typed accessors; call sites re-resolve entities by id
//! every tick and never cache references across ticks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::vec3::Vec3;
use crate::game::action::ActionQueue;
use crate::game::cast::SpellCaster;
use crate::game::influence::InfluenceState;
use crate::game::player::HeroKind;
use crate::game::spell::{self, SpellId};

/// Process-unique entity identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an entity is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// Player-controlled character.
    Character(HeroKind),
    /// In-flight spell projectile.
    Projectile(SpellId),
}

/// Why an entity is being removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestroyReason {
    /// Health reached zero.
    Death,
    /// Lifetime ran out.
    Expired,
    /// Projectile struck something.
    Collision,
    /// Round boundary cleanup.
    RoundCleanup,
}

/// Hit points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    /// Current hit points; 0 means down.
    pub current: f32,
    /// Spawn-time maximum.
    pub max: f32,
}

impl Health {
    /// Full health at the given maximum.
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Whether the owner still counts as alive.
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Apply damage, saturating at zero. Returns true if this hit was the
    /// killing blow.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.current = (self.current - amount.max(0.0)).max(0.0);
        !self.is_alive()
    }
}

/// Flight state of a projectile entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileState {
    /// Spell that produced the projectile.
    pub spell: SpellId,
    /// Entity that cast it (excluded from its own hits).
    pub owner: EntityId,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Seconds of flight left before expiry.
    pub ttl: f32,
}

/// A live game entity and its owned components.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    /// World position.
    pub position: Vec3,
    /// Facing, set towards the cast target when a spell fires.
    pub view_direction: Vec3,
    health: Option<Health>,
    actions: Option<ActionQueue>,
    caster: Option<SpellCaster>,
    influence: Option<InfluenceState>,
    projectile: Option<ProjectileState>,
}

impl Entity {
    /// Build a character entity with its hero's spellbook bound.
    pub fn character(id: EntityId, hero: HeroKind, position: Vec3, view_direction: Vec3) -> Self {
        let mut caster = SpellCaster::new();
        for (spec, key) in spell::spellbook(hero) {
            caster.bind_spell(*spec, Some(*key));
        }
        Self {
            id,
            kind: EntityKind::Character(hero),
            position,
            view_direction,
            health: Some(Health::full(hero.max_health())),
            actions: Some(ActionQueue::new()),
            caster: Some(caster),
            influence: Some(InfluenceState::new()),
            projectile: None,
        }
    }

    /// Build a projectile entity.
    pub fn new_projectile(
        id: EntityId,
        spell: SpellId,
        owner: EntityId,
        position: Vec3,
        velocity: Vec3,
        ttl: f32,
    ) -> Self {
        Self {
            id,
            kind: EntityKind::Projectile(spell),
            position,
            view_direction: velocity.normalized(),
            health: None,
            actions: None,
            caster: None,
            influence: None,
            projectile: Some(ProjectileState {
                spell,
                owner,
                velocity,
                ttl,
            }),
        }
    }

    /// Entity id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Entity kind.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Whether this is a character.
    pub fn is_character(&self) -> bool {
        matches!(self.kind, EntityKind::Character(_))
    }

    /// Whether this is a projectile.
    pub fn is_projectile(&self) -> bool {
        matches!(self.kind, EntityKind::Projectile(_))
    }

    /// Health component.
    pub fn health(&self) -> Option<&Health> {
        self.health.as_ref()
    }

    /// Health component, mutable.
    pub fn health_mut(&mut self) -> Option<&mut Health> {
        self.health.as_mut()
    }

    /// Action queue component.
    pub fn actions(&self) -> Option<&ActionQueue> {
        self.actions.as_ref()
    }

    /// Action queue component, mutable.
    pub fn actions_mut(&mut self) -> Option<&mut ActionQueue> {
        self.actions.as_mut()
    }

    /// Spell caster component.
    pub fn caster(&self) -> Option<&SpellCaster> {
        self.caster.as_ref()
    }

    /// Spell caster component, mutable.
    pub fn caster_mut(&mut self) -> Option<&mut SpellCaster> {
        self.caster.as_mut()
    }

    /// Influence component.
    pub fn influence(&self) -> Option<&InfluenceState> {
        self.influence.as_ref()
    }

    /// Influence component, mutable.
    pub fn influence_mut(&mut self) -> Option<&mut InfluenceState> {
        self.influence.as_mut()
    }

    /// Projectile component.
    pub fn projectile(&self) -> Option<&ProjectileState> {
        self.projectile.as_ref()
    }

    /// Projectile component, mutable.
    pub fn projectile_mut(&mut self) -> Option<&mut ProjectileState> {
        self.projectile.as_mut()
    }

    /// Split borrow for the cast path: caster and action queue mutably,
    /// influence read-only. None unless all cast components exist.
    pub fn cast_components(
        &mut self,
    ) -> Option<(&mut SpellCaster, &mut ActionQueue, &InfluenceState)> {
        let Entity {
            caster,
            actions,
            influence,
            ..
        } = self;
        Some((
            caster.as_mut()?,
            actions.as_mut()?,
            influence.as_ref()?,
        ))
    }
}
