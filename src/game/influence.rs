//! Status Influence
//!
//! Crowd-control timers and damage-over-time stacks for a character. The
//! cast coordinator consults `can_cast` before validating a cast on the
//! authoritative side; movement code consults `can_move`. Timers are plain
//! seconds decremented each tick.

use tracing::debug;

/// One lingering damage stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOverTime {
    /// Damage per second.
    pub dps: f32,
    /// Seconds left.
    pub remaining: f32,
}

/// Per-character capability and buff state.
#[derive(Clone, Debug, Default)]
pub struct InfluenceState {
    stun_remaining: f32,
    silence_remaining: f32,
    root_remaining: f32,
    dots: Vec<DamageOverTime>,
}

impl InfluenceState {
    /// Create a clean state: nothing applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the character may start a cast.
    pub fn can_cast(&self) -> bool {
        self.stun_remaining <= 0.0 && self.silence_remaining <= 0.0
    }

    /// Whether the character may move.
    pub fn can_move(&self) -> bool {
        self.stun_remaining <= 0.0 && self.root_remaining <= 0.0
    }

    /// Stun: blocks casting and movement. Longer application wins.
    pub fn apply_stun(&mut self, duration: f32) {
        self.stun_remaining = self.stun_remaining.max(duration);
    }

    /// Silence: blocks casting only.
    pub fn apply_silence(&mut self, duration: f32) {
        self.silence_remaining = self.silence_remaining.max(duration);
    }

    /// Root: blocks movement only.
    pub fn apply_root(&mut self, duration: f32) {
        self.root_remaining = self.root_remaining.max(duration);
    }

    /// Attach a damage-over-time stack.
    pub fn add_damage_over_time(&mut self, dps: f32, duration: f32) {
        debug!(dps, duration, "dot applied");
        self.dots.push(DamageOverTime {
            dps,
            remaining: duration,
        });
    }

    /// Number of live dot stacks.
    pub fn dot_count(&self) -> usize {
        self.dots.len()
    }

    /// Advance timers by `tpf` seconds and return the damage to apply to
    /// the owner this tick. Expired stacks are dropped after their final
    /// partial tick so total damage stays dps * duration.
    pub fn update(&mut self, tpf: f32) -> f32 {
        self.stun_remaining -= tpf;
        self.silence_remaining -= tpf;
        self.root_remaining -= tpf;

        let mut damage = 0.0;
        for dot in &mut self.dots {
            let step = tpf.min(dot.remaining).max(0.0);
            damage += dot.dps * step;
            dot.remaining -= tpf;
        }
        self.dots.retain(|dot| dot.remaining > 0.0);
        damage
    }
}
