//! Timed Entity Actions
//!
//! Each entity runs at most one action at a time, drawn from a FIFO queue.
//! The variants are a closed set: the interrupt logic in the cast
//! coordinator matches on them exhaustively. Updating the queue never
//! touches other entities; completed actions yield [`ActionEffect`]s the
//! world applies afterwards.

use std::collections::VecDeque;

use crate::core::vec3::Vec3;
use crate::game::spell::SpellId;

/// A timed action occupying an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Casting phase of a spell; interruptible without cooldown penalty.
    Casting {
        /// Spell being cast.
        spell: SpellId,
        /// Seconds of cast time left.
        remaining: f32,
    },
    /// Sustained channel; its cooldown was reserved when the channel began.
    Channeling {
        /// Spell being channeled.
        spell: SpellId,
        /// Seconds of channel left.
        remaining: f32,
        /// Seconds between pulses.
        pulse_interval: f32,
        /// Seconds until the next pulse.
        until_pulse: f32,
        /// Ground location the channel is aimed at.
        target: Vec3,
    },
    /// Instant strike along the entity's view direction.
    Melee {
        /// Damage on hit.
        damage: f32,
        /// Strike reach.
        range: f32,
    },
    /// Instant effect act: release a projectile towards the target.
    Launch {
        /// Spell that produced the projectile.
        spell: SpellId,
        /// Aimed location.
        target: Vec3,
    },
}

impl Action {
    /// The spell this action belongs to, if any.
    pub fn spell(&self) -> Option<SpellId> {
        match self {
            Action::Casting { spell, .. }
            | Action::Channeling { spell, .. }
            | Action::Launch { spell, .. } => Some(*spell),
            Action::Melee { .. } => None,
        }
    }
}

/// Effect produced by a completed (or pulsing) action, applied by the world.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionEffect {
    /// Casting phase finished; the queued effect act follows.
    CastFinished {
        /// Spell whose cast completed.
        spell: SpellId,
    },
    /// Resolve a melee strike along the view direction.
    MeleeSwing {
        /// Damage on hit.
        damage: f32,
        /// Strike reach.
        range: f32,
    },
    /// Spawn a projectile towards the target.
    ProjectileLaunched {
        /// Source spell.
        spell: SpellId,
        /// Aimed location.
        target: Vec3,
    },
    /// One channel damage pulse at the target location.
    ChannelPulse {
        /// Source spell.
        spell: SpellId,
        /// Pulse location.
        target: Vec3,
    },
}

/// FIFO queue of timed actions with exactly one current action.
#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    queue: VecDeque<Action>,
}

impl ActionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The action currently occupying the entity.
    pub fn current(&self) -> Option<&Action> {
        self.queue.front()
    }

    /// Append an action.
    pub fn enqueue(&mut self, action: Action) {
        self.queue.push_back(action);
    }

    /// Drop every queued action. Interruption clears wholesale.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued actions (including the current one).
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Advance the current action by `tpf` seconds, consuming follow-up
    /// actions if time remains. Instant acts resolve the tick they become
    /// current.
    pub fn update(&mut self, tpf: f32) -> Vec<ActionEffect> {
        let mut effects = Vec::new();
        let mut budget = tpf.max(0.0);

        while let Some(front) = self.queue.front_mut() {
            match front {
                Action::Casting { spell, remaining } => {
                    let spell = *spell;
                    if *remaining > budget {
                        *remaining -= budget;
                        break;
                    }
                    budget -= *remaining;
                    effects.push(ActionEffect::CastFinished { spell });
                    self.queue.pop_front();
                }
                Action::Channeling {
                    spell,
                    remaining,
                    pulse_interval,
                    until_pulse,
                    target,
                } => {
                    let spell = *spell;
                    let target = *target;
                    let step = budget.min(*remaining);
                    *remaining -= step;
                    *until_pulse -= step;
                    while *until_pulse <= 0.0 {
                        effects.push(ActionEffect::ChannelPulse { spell, target });
                        *until_pulse += *pulse_interval;
                    }
                    if *remaining > 0.0 {
                        break;
                    }
                    budget -= step;
                    self.queue.pop_front();
                }
                Action::Melee { damage, range } => {
                    effects.push(ActionEffect::MeleeSwing {
                        damage: *damage,
                        range: *range,
                    });
                    self.queue.pop_front();
                }
                Action::Launch { spell, target } => {
                    effects.push(ActionEffect::ProjectileLaunched {
                        spell: *spell,
                        target: *target,
                    });
                    self.queue.pop_front();
                }
            }
        }

        effects
    }
}
