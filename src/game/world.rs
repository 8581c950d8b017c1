//! Entity World
//!
//! Owner of every live entity. Other components hold ids and re-resolve
//! them through the world each tick; a tick may destroy entities, so raw
//! references must never be cached across ticks. All mutation happens on
//! the simulation step.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::core::vec3::Vec3;
use crate::game::action::ActionEffect;
use crate::game::cast::CastContext;
use crate::game::entity::{DestroyReason, Entity, EntityId};
use crate::game::player::HeroKind;
use crate::game::spell::{self, CastKind, InputKey, SpellId};
use crate::network::bus::SyncQueue;
use crate::network::protocol::ServerMessage;

/// Which side of the wire this simulation runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetRole {
    /// Authoritative simulation.
    Server,
    /// Mirroring simulation driven by received messages.
    Client,
}

impl NetRole {
    /// Whether this is the authoritative side.
    pub fn is_server(self) -> bool {
        matches!(self, NetRole::Server)
    }

    /// Whether this is a mirror.
    pub fn is_client(self) -> bool {
        matches!(self, NetRole::Client)
    }
}

/// Y coordinate characters spawn at.
pub const SPAWN_HEIGHT: f32 = 7.0;

/// Fixed character spawn points, assigned by player iteration order.
pub const STARTING_LOCATIONS: [Vec3; 6] = [
    Vec3::new(-40.0, 0.0, -40.0),
    Vec3::new(40.0, 0.0, 40.0),
    Vec3::new(-40.0, 0.0, 40.0),
    Vec3::new(40.0, 0.0, -40.0),
    Vec3::new(0.0, 0.0, -45.0),
    Vec3::new(0.0, 0.0, 45.0),
];

/// Approximate character body radius used by the proximity query.
const CHARACTER_RADIUS: f32 = 2.5;

/// Projectile contact distance.
const PROJECTILE_HIT_RADIUS: f32 = 3.0;

/// Channel pulse damage radius around the target point.
const CHANNEL_PULSE_RADIUS: f32 = 6.0;

/// Ray-cast-style target resolution. The engine's physics space provides
/// the real implementation; [`ProximityQuery`] is the headless stand-in.
pub trait SpatialQuery {
    /// Character entities intersecting the segment `from`..`to`,
    /// nearest first.
    fn ray_hits(&self, world: &EntityWorld, from: Vec3, to: Vec3) -> Vec<EntityId>;
}

/// Segment-vs-body-radius sweep over live characters.
#[derive(Debug, Default)]
pub struct ProximityQuery;

impl SpatialQuery for ProximityQuery {
    fn ray_hits(&self, world: &EntityWorld, from: Vec3, to: Vec3) -> Vec<EntityId> {
        let mut hits: Vec<(f32, EntityId)> = world
            .entities()
            .filter(|e| e.is_character())
            .filter(|e| e.health().is_some_and(|h| h.is_alive()))
            .filter_map(|e| {
                let distance = Vec3::segment_distance(e.position, from, to);
                (distance <= CHARACTER_RADIUS).then(|| (from.distance(e.position), e.id()))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, id)| id).collect()
    }
}

/// Owner of all active entities and their per-tick behavior.
#[derive(Debug)]
pub struct EntityWorld {
    role: NetRole,
    enabled: bool,
    level_loaded: bool,
    level_attached: bool,
    entities: BTreeMap<EntityId, Entity>,
    next_entity_id: u32,
}

impl EntityWorld {
    /// Create an empty, disabled world.
    pub fn new(role: NetRole) -> Self {
        Self {
            role,
            enabled: false,
            level_loaded: false,
            level_attached: false,
            entities: BTreeMap::new(),
            next_entity_id: 1,
        }
    }

    /// This simulation's role.
    pub fn role(&self) -> NetRole {
        self.role
    }

    /// Whether this is the authoritative world.
    pub fn is_authoritative(&self) -> bool {
        self.role.is_server()
    }

    /// Whether this is a mirror world.
    pub fn is_client(&self) -> bool {
        self.role.is_client()
    }

    /// Enable or disable simulation.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the world simulates.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Load level geometry (engine-side; tracked as a flag here).
    pub fn load_level(&mut self) {
        self.level_loaded = true;
        info!("level loaded");
    }

    /// Attach the loaded level to the scene.
    pub fn attach_level(&mut self) {
        debug_assert!(self.level_loaded, "attach before load");
        self.level_attached = true;
        info!("level attached");
    }

    /// Whether level geometry is in place.
    pub fn has_level(&self) -> bool {
        self.level_loaded && self.level_attached
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Spawn a character entity for a hero.
    pub fn spawn_character(
        &mut self,
        hero: HeroKind,
        position: Vec3,
        view_direction: Vec3,
    ) -> EntityId {
        let id = self.allocate_id();
        self.entities
            .insert(id, Entity::character(id, hero, position, view_direction));
        info!(entity = %id, hero = hero.name(), ?position, "character spawned");
        id
    }

    /// Spawn a projectile entity.
    pub fn spawn_projectile(
        &mut self,
        spell: SpellId,
        owner: EntityId,
        position: Vec3,
        velocity: Vec3,
        ttl: f32,
    ) -> EntityId {
        let id = self.allocate_id();
        self.entities
            .insert(id, Entity::new_projectile(id, spell, owner, position, velocity, ttl));
        debug!(entity = %id, owner = %owner, spell = spell.0, "projectile spawned");
        id
    }

    /// Remove an entity. Returns false if it was already gone.
    pub fn destroy(&mut self, id: EntityId, reason: DestroyReason) -> bool {
        let existed = self.entities.remove(&id).is_some();
        if existed {
            debug!(entity = %id, ?reason, "entity destroyed");
        }
        existed
    }

    /// Resolve an entity by id.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Resolve an entity mutably by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Iterate entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Round-boundary cleanup: drop every entity and detach the level.
    /// Entity ids stay process-unique across rounds.
    pub fn clear(&mut self) {
        let dropped = self.entities.len();
        self.entities.clear();
        self.level_loaded = false;
        self.level_attached = false;
        info!(dropped, "world cleared");
    }

    /// Route a cast attempt to an entity's caster. Invalid attempts are
    /// silent no-ops; a missing entity or caster is logged and skipped.
    pub fn attempt_cast(
        &mut self,
        entity: EntityId,
        key: InputKey,
        target: Vec3,
        sync: &mut SyncQueue,
    ) {
        let authoritative = self.role.is_server();
        let Some(e) = self.entities.get_mut(&entity) else {
            warn!(entity = %entity, "cast attempt for missing entity");
            return;
        };
        let position = e.position;
        let aim = target.sub(position).normalized();
        if aim != Vec3::ZERO {
            e.view_direction = aim;
        }
        let Some((caster, queue, influence)) = e.cast_components() else {
            warn!(entity = %entity, "cast attempt on entity without caster");
            return;
        };
        let ctx = CastContext {
            entity,
            position,
            authoritative,
            influence,
        };
        caster.attempt_cast(key, target, &ctx, queue, sync);
    }

    /// Safe-interrupt an entity's current spell action (crowd control,
    /// death, round end).
    pub fn interrupt_entity(&mut self, entity: EntityId, sync: &mut SyncQueue) {
        if let Some(e) = self.entities.get_mut(&entity) {
            if let Some((caster, queue, _)) = e.cast_components() {
                caster.safe_interrupt(queue, entity, sync);
            }
        }
    }

    /// Apply an authoritative sync command to the local mirror.
    pub fn apply_sync_command(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::SetCooldown {
                entity_id,
                spell_id,
                cooldown,
                apply_global,
            } => match self.entities.get_mut(entity_id).and_then(|e| e.caster_mut()) {
                Some(caster) => caster.apply_remote_cooldown(*spell_id, *cooldown, *apply_global),
                None => warn!(entity = %entity_id, "cooldown command for unknown caster"),
            },
            ServerMessage::StartCasting {
                entity_id,
                spell_id,
                direction,
            } => match self.entities.get_mut(entity_id) {
                Some(e) => {
                    let aim = direction.normalized();
                    if aim != Vec3::ZERO {
                        e.view_direction = aim;
                    }
                    if let Some(caster) = e.caster_mut() {
                        caster.set_casting(true);
                    }
                    debug!(entity = %entity_id, spell = spell_id.0, "remote cast started");
                }
                None => warn!(entity = %entity_id, "cast command for unknown entity"),
            },
            _ => {}
        }
    }

    /// Advance the world one tick: status influence, cooldowns, actions
    /// and projectile flight. No-op while disabled.
    pub fn update(&mut self, tpf: f32, spatial: &dyn SpatialQuery) {
        if !self.enabled {
            return;
        }

        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        let mut pending: Vec<(EntityId, Vec<ActionEffect>)> = Vec::new();

        for id in ids {
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            if !entity.is_character() {
                continue;
            }
            if !entity.health().is_some_and(|h| h.is_alive()) {
                continue;
            }

            let mut dot_damage = 0.0;
            if let Some(influence) = entity.influence_mut() {
                dot_damage = influence.update(tpf);
            }
            if dot_damage > 0.0 {
                self.damage_entity(id, dot_damage);
            }

            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            if let Some(caster) = entity.caster_mut() {
                caster.update(tpf);
            }
            if let Some(queue) = entity.actions_mut() {
                let effects = queue.update(tpf);
                if !effects.is_empty() {
                    pending.push((id, effects));
                }
            }
        }

        for (source, effects) in pending {
            for effect in effects {
                self.apply_effect(source, effect, spatial);
            }
        }

        self.update_projectiles(tpf);
    }

    fn apply_effect(&mut self, source: EntityId, effect: ActionEffect, spatial: &dyn SpatialQuery) {
        match effect {
            ActionEffect::CastFinished { spell } => {
                debug!(entity = %source, spell = spell.0, "cast phase finished");
                if let Some(caster) = self.entities.get_mut(&source).and_then(|e| e.caster_mut()) {
                    caster.set_casting(false);
                }
            }
            ActionEffect::MeleeSwing { damage, range } => {
                let Some(attacker) = self.entities.get(&source) else {
                    return;
                };
                let from = attacker.position;
                let direction = attacker.view_direction.normalized();
                if direction == Vec3::ZERO {
                    return;
                }
                let to = from.add(direction.scale(range));
                for hit in spatial.ray_hits(self, from, to) {
                    if hit == source {
                        continue;
                    }
                    if self.damage_entity(hit, damage) {
                        break;
                    }
                }
            }
            ActionEffect::ProjectileLaunched { spell, target } => {
                let Some(spec) = spell::by_id(spell) else {
                    warn!(spell = spell.0, "launch for unknown spell, skipping");
                    return;
                };
                let CastKind::Projectile { speed, .. } = spec.kind else {
                    warn!(spell = spec.name, "launch for non-projectile spell, skipping");
                    return;
                };
                let Some(owner) = self.entities.get(&source) else {
                    return;
                };
                let origin = owner.position;
                let flight = target.sub(origin);
                let direction = flight.normalized();
                if direction == Vec3::ZERO {
                    return;
                }
                let distance = flight.length().min(spec.range);
                self.spawn_projectile(
                    spell,
                    source,
                    origin,
                    direction.scale(speed),
                    distance / speed,
                );
            }
            ActionEffect::ChannelPulse { spell, target } => {
                let Some(spec) = spell::by_id(spell) else {
                    warn!(spell = spell.0, "pulse for unknown spell, skipping");
                    return;
                };
                let victims: Vec<EntityId> = self
                    .entities
                    .values()
                    .filter(|e| e.id() != source && e.is_character())
                    .filter(|e| e.health().is_some_and(|h| h.is_alive()))
                    .filter(|e| e.position.distance(target) <= CHANNEL_PULSE_RADIUS)
                    .map(|e| e.id())
                    .collect();
                for victim in victims {
                    self.damage_entity(victim, spec.damage);
                }
            }
        }
    }

    fn update_projectiles(&mut self, tpf: f32) {
        let ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.is_projectile())
            .map(|e| e.id())
            .collect();

        for id in ids {
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            let Some(projectile) = entity.projectile_mut().copied() else {
                continue;
            };
            let position = entity.position.add(projectile.velocity.scale(tpf));
            entity.position = position;
            let ttl = projectile.ttl - tpf;
            if let Some(p) = entity.projectile_mut() {
                p.ttl = ttl;
            }

            let victim = self
                .entities
                .values()
                .filter(|e| e.is_character() && e.id() != projectile.owner)
                .filter(|e| e.health().is_some_and(|h| h.is_alive()))
                .map(|e| (e.position.distance(position), e.id()))
                .filter(|(distance, _)| *distance <= PROJECTILE_HIT_RADIUS)
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, id)| id);

            if let Some(victim) = victim {
                self.resolve_impact(id, projectile.spell, projectile.owner, victim, position);
            } else if ttl <= 0.0 {
                self.destroy(id, DestroyReason::Expired);
            }
        }
    }

    fn resolve_impact(
        &mut self,
        projectile: EntityId,
        spell: SpellId,
        owner: EntityId,
        victim: EntityId,
        impact: Vec3,
    ) {
        let Some(spec) = spell::by_id(spell) else {
            warn!(spell = spell.0, "impact for unknown spell, skipping");
            self.destroy(projectile, DestroyReason::Expired);
            return;
        };

        self.damage_entity(victim, spec.damage);
        if let Some(dot) = spec.dot {
            if let Some(influence) = self.entities.get_mut(&victim).and_then(|e| e.influence_mut())
            {
                influence.add_damage_over_time(dot.dps, dot.duration);
            }
        }

        if let CastKind::Projectile { splash_radius, .. } = spec.kind {
            if splash_radius > 0.0 {
                let splashed: Vec<(EntityId, f32)> = self
                    .entities
                    .values()
                    .filter(|e| e.is_character() && e.id() != owner && e.id() != victim)
                    .filter(|e| e.health().is_some_and(|h| h.is_alive()))
                    .filter_map(|e| {
                        let distance = e.position.distance(impact);
                        (distance <= splash_radius)
                            .then(|| (e.id(), spec.damage * (1.0 - distance / splash_radius)))
                    })
                    .collect();
                for (id, damage) in splashed {
                    self.damage_entity(id, damage);
                }
            }
        }

        self.destroy(projectile, DestroyReason::Collision);
    }

    /// Apply damage to an entity's health. Returns true when damage landed
    /// on a living target.
    pub fn damage_entity(&mut self, id: EntityId, amount: f32) -> bool {
        let Some(health) = self.entities.get_mut(&id).and_then(|e| e.health_mut()) else {
            return false;
        };
        if !health.is_alive() {
            return false;
        }
        if health.apply_damage(amount) {
            info!(entity = %id, "character down");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::Action;
    use crate::game::spell::{CINDERFALL, FLAMEBOLT, IMMOLATE, SKEWER};
    use rand::Rng;

    fn server_world() -> (EntityWorld, SyncQueue) {
        let mut world = EntityWorld::new(NetRole::Server);
        world.set_enabled(true);
        let mut sync = SyncQueue::new();
        sync.set_enabled(true);
        (world, sync)
    }

    fn spawn_pair(world: &mut EntityWorld) -> (EntityId, EntityId) {
        let a = world.spawn_character(
            HeroKind::Warlord,
            Vec3::new(0.0, SPAWN_HEIGHT, 0.0),
            Vec3::UNIT_X,
        );
        let b = world.spawn_character(
            HeroKind::Pyromancer,
            Vec3::new(5.0, SPAWN_HEIGHT, 0.0),
            -Vec3::UNIT_X,
        );
        (a, b)
    }

    #[test]
    fn test_spawn_destroy_query() {
        let (mut world, _) = server_world();
        let (a, b) = spawn_pair(&mut world);

        assert_eq!(world.len(), 2);
        assert!(world.get(a).is_some());
        assert!(world.destroy(a, DestroyReason::Death));
        assert!(world.get(a).is_none());
        assert!(!world.destroy(a, DestroyReason::Death));
        assert!(world.get(b).is_some());
    }

    #[test]
    fn test_ids_stay_unique_across_clear() {
        let (mut world, _) = server_world();
        let (a, b) = spawn_pair(&mut world);
        world.clear();
        assert!(world.is_empty());
        assert!(!world.has_level());

        let c = world.spawn_character(HeroKind::Warlord, Vec3::ZERO, Vec3::UNIT_X);
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn test_spawned_ids_distinct_at_random_positions() {
        let (mut world, _) = server_world();
        let mut rng = rand::thread_rng();
        let mut ids = Vec::new();
        for _ in 0..32 {
            let position = Vec3::new(
                rng.gen_range(-50.0..50.0),
                SPAWN_HEIGHT,
                rng.gen_range(-50.0..50.0),
            );
            ids.push(world.spawn_character(HeroKind::Pyromancer, position, Vec3::UNIT_X));
        }
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_melee_swing_hits_first_target_in_reach() {
        let (mut world, _) = server_world();
        let (attacker, target) = spawn_pair(&mut world);
        let before = world.get(target).unwrap().health().unwrap().current;

        world
            .get_mut(attacker)
            .unwrap()
            .actions_mut()
            .unwrap()
            .enqueue(Action::Melee {
                damage: SKEWER.damage,
                range: 8.0,
            });
        world.update(0.1, &ProximityQuery);

        let after = world.get(target).unwrap().health().unwrap().current;
        assert_eq!(after, before - SKEWER.damage);
        // Attacker never hits itself.
        let own = world.get(attacker).unwrap().health().unwrap();
        assert_eq!(own.current, own.max);
    }

    #[test]
    fn test_melee_out_of_reach_misses() {
        let (mut world, _) = server_world();
        let attacker =
            world.spawn_character(HeroKind::Warlord, Vec3::new(0.0, 7.0, 0.0), Vec3::UNIT_X);
        let target =
            world.spawn_character(HeroKind::Pyromancer, Vec3::new(30.0, 7.0, 0.0), Vec3::UNIT_X);

        world
            .get_mut(attacker)
            .unwrap()
            .actions_mut()
            .unwrap()
            .enqueue(Action::Melee {
                damage: 100.0,
                range: 8.0,
            });
        world.update(0.1, &ProximityQuery);

        let health = world.get(target).unwrap().health().unwrap();
        assert_eq!(health.current, health.max);
    }

    #[test]
    fn test_cast_through_world_launches_projectile_and_hits() {
        let (mut world, mut sync) = server_world();
        let caster = world.spawn_character(
            HeroKind::Pyromancer,
            Vec3::new(0.0, SPAWN_HEIGHT, 0.0),
            Vec3::UNIT_X,
        );
        let victim = world.spawn_character(
            HeroKind::Warlord,
            Vec3::new(30.0, SPAWN_HEIGHT, 0.0),
            -Vec3::UNIT_X,
        );
        let target = world.get(victim).unwrap().position;

        world.attempt_cast(caster, crate::game::spell::InputKey::PRIMARY, target, &mut sync);
        assert!(sync
            .take()
            .iter()
            .any(|m| matches!(m, ServerMessage::StartCasting { .. })));

        // Cast phase, launch, then flight until impact.
        let mut hit = false;
        for _ in 0..100 {
            world.update(0.1, &ProximityQuery);
            let victim_health = world.get(victim).unwrap().health().unwrap();
            if victim_health.current < victim_health.max {
                hit = true;
                break;
            }
        }
        assert!(hit, "projectile never landed");

        let health = world.get(victim).unwrap().health().unwrap();
        assert_eq!(health.current, health.max - FLAMEBOLT.damage);
        // Projectile consumed on impact.
        assert!(world.entities().all(|e| !e.is_projectile()));
    }

    #[test]
    fn test_projectile_expires_without_hit() {
        let (mut world, _) = server_world();
        let owner = world.spawn_character(HeroKind::Pyromancer, Vec3::ZERO, Vec3::UNIT_X);
        world.spawn_projectile(
            FLAMEBOLT.id,
            owner,
            Vec3::ZERO,
            Vec3::UNIT_X.scale(140.0),
            0.3,
        );

        for _ in 0..5 {
            world.update(0.1, &ProximityQuery);
        }
        assert!(world.entities().all(|e| !e.is_projectile()));
    }

    #[test]
    fn test_impact_applies_ignite_dot() {
        let (mut world, _) = server_world();
        let owner = world.spawn_character(HeroKind::Pyromancer, Vec3::ZERO, Vec3::UNIT_X);
        let victim = world.spawn_character(
            HeroKind::Warlord,
            Vec3::new(4.0, 0.0, 0.0),
            -Vec3::UNIT_X,
        );
        // Drop a slow heavy projectile right next to the victim.
        world.spawn_projectile(
            CINDERFALL.id,
            owner,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::UNIT_X.scale(90.0),
            1.0,
        );

        world.update(0.01, &ProximityQuery);

        let influence = world.get(victim).unwrap().influence().unwrap();
        assert_eq!(influence.dot_count(), 1);
        let health = world.get(victim).unwrap().health().unwrap();
        assert!(health.current < health.max);
    }

    #[test]
    fn test_channel_pulses_damage_near_target() {
        let (mut world, _) = server_world();
        let caster = world.spawn_character(HeroKind::Pyromancer, Vec3::ZERO, Vec3::UNIT_X);
        let victim = world.spawn_character(
            HeroKind::Warlord,
            Vec3::new(10.0, 0.0, 0.0),
            -Vec3::UNIT_X,
        );
        let target = world.get(victim).unwrap().position;

        world
            .get_mut(caster)
            .unwrap()
            .actions_mut()
            .unwrap()
            .enqueue(Action::Channeling {
                spell: IMMOLATE.id,
                remaining: 1.2,
                pulse_interval: 0.5,
                until_pulse: 0.5,
                target,
            });

        for _ in 0..15 {
            world.update(0.1, &ProximityQuery);
        }

        let health = world.get(victim).unwrap().health().unwrap();
        assert_eq!(health.current, health.max - 2.0 * IMMOLATE.damage);
    }

    #[test]
    fn test_disabled_world_does_not_tick() {
        let (mut world, _) = server_world();
        let owner = world.spawn_character(HeroKind::Pyromancer, Vec3::ZERO, Vec3::UNIT_X);
        let projectile =
            world.spawn_projectile(FLAMEBOLT.id, owner, Vec3::ZERO, Vec3::UNIT_X.scale(140.0), 0.1);

        world.set_enabled(false);
        for _ in 0..10 {
            world.update(0.1, &ProximityQuery);
        }
        // Nothing moved, nothing expired.
        assert!(world.get(projectile).is_some());
        assert_eq!(world.get(projectile).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_mirror_applies_cooldown_commands() {
        let mut world = EntityWorld::new(NetRole::Client);
        world.set_enabled(true);
        let entity = world.spawn_character(HeroKind::Pyromancer, Vec3::ZERO, Vec3::UNIT_X);

        world.apply_sync_command(&ServerMessage::SetCooldown {
            entity_id: entity,
            spell_id: FLAMEBOLT.id,
            cooldown: 1.5,
            apply_global: true,
        });

        let caster = world.get(entity).unwrap().caster().unwrap();
        assert_eq!(caster.cooldown(FLAMEBOLT.id), Some(1.5));
        assert_eq!(
            caster.cooldown(CINDERFALL.id),
            Some(crate::game::cast::GLOBAL_COOLDOWN)
        );
    }
}
