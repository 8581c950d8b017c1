//! Spell Cast Coordination
//!
//! Gates, sequences and replicates spell casts for one character entity.
//! The server-side instance is authoritative; remote mirrors apply the
//! replicated `SetCooldown`/`StartCasting` commands instead of validating.
//!
//! Invalid attempts never surface errors: a cast that cannot happen is a
//! silent no-op so input handling stays responsive.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::core::vec3::Vec3;
use crate::game::action::{Action, ActionQueue};
use crate::game::entity::EntityId;
use crate::game::influence::InfluenceState;
use crate::game::spell::{InputKey, SpellId, SpellSpec};
use crate::network::bus::SyncQueue;
use crate::network::protocol::ServerMessage;

/// Shared minimum cooldown floor applied to every spell after any cast.
pub const GLOBAL_COOLDOWN: f32 = 0.2;

/// Pluggable predicate gating whether a spell may currently be cast.
pub trait CastValidator {
    /// Approve or veto the cast. All registered validators must approve.
    fn validate(&self, caster: &SpellCaster, spell: &SpellSpec) -> bool;
}

/// Observer notified synchronously on every successful cast
/// (ammo consumption, stat tracking).
pub trait CastListener {
    /// Called after the cast is committed.
    fn spell_cast(&mut self, spell: &SpellSpec);
}

/// Per-attempt context the caster cannot know on its own: whose entity it
/// is, where it stands, which role is running, and the entity's current
/// status influence.
pub struct CastContext<'a> {
    /// Caster entity id (stamped on replicated commands).
    pub entity: EntityId,
    /// Caster world position.
    pub position: Vec3,
    /// True on the server; capability checks only run authoritatively.
    pub authoritative: bool,
    /// Status influence consulted for `can_cast`.
    pub influence: &'a InfluenceState,
}

/// Spell gate for one character: bindings, cooldowns, interruption,
/// replication.
pub struct SpellCaster {
    enabled: bool,
    spells: BTreeMap<SpellId, SpellSpec>,
    cooldowns: BTreeMap<SpellId, f32>,
    key_bindings: BTreeMap<InputKey, SpellId>,
    casting: bool,
    validators: Vec<Box<dyn CastValidator + Send>>,
    listeners: Vec<Box<dyn CastListener + Send>>,
    saved_cooldowns: Option<BTreeMap<SpellId, f32>>,
}

impl Default for SpellCaster {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellCaster {
    /// Create an enabled caster with no spells bound.
    pub fn new() -> Self {
        Self {
            enabled: true,
            spells: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            key_bindings: BTreeMap::new(),
            casting: false,
            validators: Vec::new(),
            listeners: Vec::new(),
            saved_cooldowns: None,
        }
    }

    /// Enable or disable the caster. Attempts while disabled are no-ops.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the caster accepts attempts.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register a spell, ready immediately, optionally under an input key.
    pub fn bind_spell(&mut self, spec: SpellSpec, key: Option<InputKey>) {
        self.cooldowns.insert(spec.id, 0.0);
        if let Some(key) = key {
            self.key_bindings.insert(key, spec.id);
        }
        self.spells.insert(spec.id, spec);
    }

    /// Spell registered under an id.
    pub fn spell(&self, id: SpellId) -> Option<&SpellSpec> {
        self.spells.get(&id)
    }

    /// Spell bound to an input key.
    pub fn bound_spell(&self, key: InputKey) -> Option<&SpellSpec> {
        self.key_bindings.get(&key).and_then(|id| self.spells.get(id))
    }

    /// Current cooldown for a spell. Negative means ready.
    pub fn cooldown(&self, id: SpellId) -> Option<f32> {
        self.cooldowns.get(&id).copied()
    }

    /// Whether the spell is off cooldown.
    pub fn is_ready(&self, id: SpellId) -> bool {
        self.cooldown(id).is_some_and(|c| c <= 0.0)
    }

    /// Whether a casting phase is in progress.
    pub fn is_casting(&self) -> bool {
        self.casting
    }

    /// Force the casting flag (mirrors set it from `StartCasting`).
    pub fn set_casting(&mut self, casting: bool) {
        self.casting = casting;
    }

    /// Whether the current action is a channel.
    pub fn is_channeling(&self, queue: &ActionQueue) -> bool {
        matches!(queue.current(), Some(Action::Channeling { .. }))
    }

    /// Register a cast validator.
    pub fn add_validator(&mut self, validator: Box<dyn CastValidator + Send>) {
        self.validators.push(validator);
    }

    /// Register a cast listener.
    pub fn add_listener(&mut self, listener: Box<dyn CastListener + Send>) {
        self.listeners.push(listener);
    }

    /// Attempt to cast the spell bound to `key` at `target`.
    ///
    /// Silent no-op when the caster is disabled, the key is unbound or
    /// validation fails. A different in-flight spell is interrupted first;
    /// re-pressing the key of the spell already in flight is dropped so
    /// input spam cannot double-enqueue.
    pub fn attempt_cast(
        &mut self,
        key: InputKey,
        target: Vec3,
        ctx: &CastContext<'_>,
        queue: &mut ActionQueue,
        sync: &mut SyncQueue,
    ) {
        if !self.enabled {
            return;
        }
        let Some(spell) = self.bound_spell(key).copied() else {
            return;
        };
        if !self.validate(&spell, ctx) {
            return;
        }

        let in_flight = match queue.current() {
            Some(Action::Casting { spell, .. }) | Some(Action::Channeling { spell, .. }) => {
                Some(*spell)
            }
            // Busy with a non-spell act: the attempt is dropped.
            Some(_) => return,
            None => None,
        };
        if let Some(current) = in_flight {
            if current == spell.id {
                // Same spell already in flight: idempotent drop.
                return;
            }
            self.safe_interrupt(queue, ctx.entity, sync);
        }

        self.cast(spell, target, ctx, queue, sync);
    }

    /// Interrupt the current spell action without breaking the cooldown
    /// contract: an aborted casting phase refunds its cooldown, an
    /// interrupted channel keeps the full cooldown it already reserved.
    pub fn safe_interrupt(
        &mut self,
        queue: &mut ActionQueue,
        entity: EntityId,
        sync: &mut SyncQueue,
    ) {
        match queue.current().cloned() {
            Some(Action::Casting { spell, .. }) => {
                self.casting = false;
                queue.clear();
                self.set_cooldown(spell, 0.0, entity, sync);
            }
            Some(Action::Channeling { spell, .. }) => {
                if let Some(spec) = self.spells.get(&spell).copied() {
                    self.put_on_cooldown(&spec, entity, sync);
                } else {
                    warn!(spell = spell.0, "interrupted channel for unknown spell");
                }
                queue.clear();
            }
            _ => {}
        }
    }

    fn validate(&self, spell: &SpellSpec, ctx: &CastContext<'_>) -> bool {
        if self.cooldowns.get(&spell.id).copied().unwrap_or(0.0) > 0.0 {
            return false;
        }
        if ctx.authoritative && !ctx.influence.can_cast() {
            return false;
        }
        self.validators.iter().all(|v| v.validate(self, spell))
    }

    /// Commit the cast: enqueue the casting phase and the effect act,
    /// charge cooldowns, replicate, notify listeners.
    fn cast(
        &mut self,
        spell: SpellSpec,
        target: Vec3,
        ctx: &CastContext<'_>,
        queue: &mut ActionQueue,
        sync: &mut SyncQueue,
    ) {
        debug!(entity = %ctx.entity, spell = spell.name, "cast committed");

        self.casting = true;
        queue.enqueue(Action::Casting {
            spell: spell.id,
            remaining: spell.cast_time,
        });
        queue.enqueue(spell.effect_action(target));

        let direction = target.sub(ctx.position);
        sync.push(ServerMessage::StartCasting {
            entity_id: ctx.entity,
            spell_id: spell.id,
            direction,
        });

        self.global_cooldown();
        self.put_on_cooldown(&spell, ctx.entity, sync);

        for listener in &mut self.listeners {
            listener.spell_cast(&spell);
        }
    }

    /// Set one spell's cooldown, replicated without the global floor.
    pub fn set_cooldown(
        &mut self,
        spell: SpellId,
        value: f32,
        entity: EntityId,
        sync: &mut SyncQueue,
    ) {
        self.cooldowns.insert(spell, value);
        sync.push(ServerMessage::SetCooldown {
            entity_id: entity,
            spell_id: spell,
            cooldown: value,
            apply_global: false,
        });
    }

    /// Commit a spell's full cooldown, replicated with the global floor.
    pub fn put_on_cooldown(&mut self, spec: &SpellSpec, entity: EntityId, sync: &mut SyncQueue) {
        self.cooldowns.insert(spec.id, spec.cooldown);
        sync.push(ServerMessage::SetCooldown {
            entity_id: entity,
            spell_id: spec.id,
            cooldown: spec.cooldown,
            apply_global: true,
        });
    }

    /// Apply an authoritative `SetCooldown` command on a mirror. Never
    /// re-replicates.
    pub fn apply_remote_cooldown(&mut self, spell: SpellId, cooldown: f32, apply_global: bool) {
        self.cooldowns.insert(spell, cooldown);
        if apply_global {
            self.global_cooldown();
        }
    }

    /// Raise every spell below the shared floor up to it. Never lowers a
    /// cooldown.
    pub fn global_cooldown(&mut self) {
        for cooldown in self.cooldowns.values_mut() {
            if *cooldown < GLOBAL_COOLDOWN {
                *cooldown = GLOBAL_COOLDOWN;
            }
        }
    }

    /// Per-tick cooldown decay. Values go negative; only the sign matters.
    pub fn update(&mut self, tpf: f32) {
        for cooldown in self.cooldowns.values_mut() {
            *cooldown -= tpf;
        }
    }

    /// Snapshot the live cooldown map.
    pub fn snapshot_cooldowns(&self) -> BTreeMap<SpellId, f32> {
        self.cooldowns.clone()
    }

    /// Replace the live cooldown map wholesale (ownership transfer: the
    /// local player takes control of this entity). The replaced map is
    /// saved aside so it can be restored without information loss.
    pub fn adopt_cooldowns(&mut self, cooldowns: BTreeMap<SpellId, f32>) {
        self.saved_cooldowns = Some(std::mem::replace(&mut self.cooldowns, cooldowns));
    }

    /// Restore the previously saved (server-origin) cooldown map.
    pub fn restore_saved_cooldowns(&mut self) {
        match self.saved_cooldowns.take() {
            Some(saved) => self.cooldowns = saved,
            None => warn!("no saved cooldown map to restore"),
        }
    }
}

impl fmt::Debug for SpellCaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellCaster")
            .field("enabled", &self.enabled)
            .field("casting", &self.casting)
            .field("spells", &self.spells.len())
            .field("cooldowns", &self.cooldowns)
            .field("validators", &self.validators.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
