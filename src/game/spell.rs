//! Spell Catalog
//!
//! Static definitions for every castable spell: timing, range, damage and
//! the shape of the effect the cast produces. Specs are plain data; the
//! cast coordinator and the world interpret them.

use serde::{Deserialize, Serialize};

use crate::core::vec3::Vec3;
use crate::game::action::Action;
use crate::game::player::HeroKind;

/// Unique spell identifier (unique per caster, stable on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpellId(pub u16);

/// Input binding a spell is registered under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputKey(pub u8);

impl InputKey {
    /// Primary attack binding.
    pub const PRIMARY: InputKey = InputKey(1);
    /// Secondary binding.
    pub const SECONDARY: InputKey = InputKey(2);
    /// Heavy/ultimate binding.
    pub const HEAVY: InputKey = InputKey(3);
}

/// Lingering damage applied to the direct-hit target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotEffect {
    /// Damage per second.
    pub dps: f32,
    /// Duration in seconds.
    pub duration: f32,
}

/// What the spell does once the casting phase completes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CastKind {
    /// Launches a projectile towards the target location.
    Projectile {
        /// Flight speed in units per second.
        speed: f32,
        /// Splash radius on impact (0 = direct hit only).
        splash_radius: f32,
    },
    /// Instant strike along the caster's view direction.
    Melee {
        /// Strike reach in units.
        range: f32,
    },
    /// Sustained channel pulsing damage at the target location.
    Channel {
        /// Total channel duration in seconds.
        duration: f32,
        /// Seconds between damage pulses.
        pulse_interval: f32,
    },
}

/// Static spell definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpellSpec {
    /// Stable identifier.
    pub id: SpellId,
    /// Display name.
    pub name: &'static str,
    /// Full cooldown committed on cast, in seconds.
    pub cooldown: f32,
    /// Maximum cast range in units.
    pub range: f32,
    /// Casting-phase duration in seconds.
    pub cast_time: f32,
    /// Damage on hit (per pulse for channels).
    pub damage: f32,
    /// Effect shape.
    pub kind: CastKind,
    /// Optional burn applied to the direct-hit target.
    pub dot: Option<DotEffect>,
}

impl SpellSpec {
    /// Whether the cast reserves its cooldown up front (channels do).
    pub fn is_channel(&self) -> bool {
        matches!(self.kind, CastKind::Channel { .. })
    }

    /// Build the effect action enqueued after the casting phase.
    pub fn effect_action(&self, target: Vec3) -> Action {
        match self.kind {
            CastKind::Projectile { .. } => Action::Launch {
                spell: self.id,
                target,
            },
            CastKind::Melee { range } => Action::Melee {
                damage: self.damage,
                range,
            },
            CastKind::Channel {
                duration,
                pulse_interval,
            } => Action::Channeling {
                spell: self.id,
                remaining: duration,
                pulse_interval,
                until_pulse: pulse_interval,
                target,
            },
        }
    }
}

/// Pyromancer's bread-and-butter projectile.
pub const FLAMEBOLT: SpellSpec = SpellSpec {
    id: SpellId(1),
    name: "Flamebolt",
    cooldown: 1.5,
    range: 80.0,
    cast_time: 0.4,
    damage: 210.0,
    kind: CastKind::Projectile {
        speed: 140.0,
        splash_radius: 25.0,
    },
    dot: None,
};

/// Pyromancer's heavy splash nuke; ignites the direct-hit target.
pub const CINDERFALL: SpellSpec = SpellSpec {
    id: SpellId(2),
    name: "Cinderfall",
    cooldown: 8.0,
    range: 90.0,
    cast_time: 0.4,
    damage: 340.0,
    kind: CastKind::Projectile {
        speed: 90.0,
        splash_radius: 25.0,
    },
    dot: Some(DotEffect {
        dps: 40.0,
        duration: 3.0,
    }),
};

/// Pyromancer's channeled burn.
pub const IMMOLATE: SpellSpec = SpellSpec {
    id: SpellId(3),
    name: "Immolate",
    cooldown: 6.0,
    range: 25.0,
    cast_time: 0.2,
    damage: 35.0,
    kind: CastKind::Channel {
        duration: 3.0,
        pulse_interval: 0.5,
    },
    dot: None,
};

/// Warlord's melee strike.
pub const SKEWER: SpellSpec = SpellSpec {
    id: SpellId(10),
    name: "Skewer",
    cooldown: 0.8,
    range: 8.0,
    cast_time: 0.2,
    damage: 120.0,
    kind: CastKind::Melee { range: 8.0 },
    dot: None,
};

/// Warlord's thrown javelin.
pub const JAVELIN: SpellSpec = SpellSpec {
    id: SpellId(11),
    name: "Javelin",
    cooldown: 3.0,
    range: 70.0,
    cast_time: 0.3,
    damage: 180.0,
    kind: CastKind::Projectile {
        speed: 120.0,
        splash_radius: 0.0,
    },
    dot: None,
};

/// Look up a spell by id. Unknown ids resolve to None; callers log and
/// skip (missing spell metadata is recoverable).
pub fn by_id(id: SpellId) -> Option<&'static SpellSpec> {
    match id {
        SpellId(1) => Some(&FLAMEBOLT),
        SpellId(2) => Some(&CINDERFALL),
        SpellId(3) => Some(&IMMOLATE),
        SpellId(10) => Some(&SKEWER),
        SpellId(11) => Some(&JAVELIN),
        _ => None,
    }
}

/// Default input bindings for a hero's spellbook.
pub fn spellbook(hero: HeroKind) -> &'static [(SpellSpec, InputKey)] {
    match hero {
        HeroKind::Pyromancer => &[
            (FLAMEBOLT, InputKey::PRIMARY),
            (CINDERFALL, InputKey::HEAVY),
            (IMMOLATE, InputKey::SECONDARY),
        ],
        HeroKind::Warlord => &[
            (SKEWER, InputKey::PRIMARY),
            (JAVELIN, InputKey::SECONDARY),
        ],
    }
}
