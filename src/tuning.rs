//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives in [`Tuning`]. The
//! defaults reproduce the classic feel; a JSON file can override any subset.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;
use crate::sim::PowerUpKind;

/// Upper bound on extra enemies per spawn event
pub const MAX_BURST_EXTRA: u32 = 8;

/// What happens when an enemy slips past the trailing (left) edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeakPolicy {
    /// Silently despawn, no score and no penalty
    #[default]
    Despawn,
    /// Cost the player a life (shield does not help)
    LoseLife,
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,

    // === Player ===
    pub player_radius: f32,
    /// Pixels per tick
    pub player_speed: f32,
    /// Movement multiplier while rapid-fire is active
    pub rapid_fire_speed_boost: f32,
    /// Seconds between shots
    pub shot_cooldown: f32,
    /// Seconds between shots under rapid-fire
    pub rapid_fire_cooldown: f32,
    /// Pixels per tick
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    /// Angle (radians) between multi-shot projectiles
    pub multi_shot_spread: f32,

    // === Enemy spawning ===
    /// Seconds between enemy spawns at score 0
    pub enemy_interval_base: f32,
    /// Interval never shrinks below this
    pub enemy_interval_floor: f32,
    /// Seconds removed from the interval per point of score
    pub enemy_interval_ramp: f32,
    /// One extra enemy per burst for every this many points
    pub burst_points: u64,
    pub max_burst_extra: u32,
    pub elite_chance: f32,
    pub bonus_chance: f32,
    pub weave_chance: f32,

    // === Enemy motion ===
    /// Pixels per tick at level 1
    pub enemy_speed_base: f32,
    pub enemy_speed_per_level: f32,
    pub enemy_speed_jitter: f32,
    pub enemy_speed_max: f32,
    pub enemy_speed_floor: f32,
    pub elite_speed_factor: f32,
    /// Vertical weave amplitude range (pixels per tick)
    pub weave_amplitude_min: f32,
    pub weave_amplitude_max: f32,
    /// Weave angular frequency range (radians per second)
    pub weave_frequency_min: f32,
    pub weave_frequency_max: f32,

    // === Enemy shape/health ===
    pub enemy_radius_min: f32,
    pub enemy_radius_max: f32,
    pub bonus_radius: f32,
    pub elite_radius: f32,
    pub elite_hp: u8,
    /// Seconds between elite shots
    pub elite_attack_cooldown: f32,
    /// Pixels per tick
    pub elite_projectile_speed: f32,

    // === Power-ups ===
    pub powerup_interval_base: f32,
    pub powerup_interval_floor: f32,
    pub powerup_interval_ramp: f32,
    /// Pixels per tick (drifts left)
    pub powerup_speed: f32,
    /// Side length of the square pickup box
    pub powerup_size: f32,
    pub rapid_fire_duration: f32,
    pub multi_shot_duration: f32,
    pub shield_duration: f32,
    /// Chance that a kill drops a pickup where the enemy died (0 = timer spawns only)
    pub kill_drop_chance: f32,

    // === Scoring ===
    pub score_normal: u64,
    pub score_bonus: u64,
    pub score_elite: u64,
    pub leak_policy: LeakPolicy,

    // === Cosmetic ===
    pub max_particles: usize,
    pub particles_per_explosion: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            rapid_fire_speed_boost: 1.1,
            shot_cooldown: 0.22,
            rapid_fire_cooldown: 0.09,
            projectile_speed: 10.0,
            projectile_radius: PROJECTILE_RADIUS,
            multi_shot_spread: 0.12,

            enemy_interval_base: 0.9,
            enemy_interval_floor: 0.42,
            enemy_interval_ramp: 0.004,
            burst_points: 12,
            max_burst_extra: 3,
            elite_chance: 0.05,
            bonus_chance: 0.10,
            weave_chance: 0.35,

            enemy_speed_base: 1.5,
            enemy_speed_per_level: 0.3,
            enemy_speed_jitter: 1.0,
            enemy_speed_max: 6.0,
            enemy_speed_floor: 0.5,
            elite_speed_factor: 0.6,
            weave_amplitude_min: 0.5,
            weave_amplitude_max: 1.5,
            weave_frequency_min: 1.5,
            weave_frequency_max: 4.0,

            enemy_radius_min: 14.0,
            enemy_radius_max: 26.0,
            bonus_radius: 12.0,
            elite_radius: 34.0,
            elite_hp: 5,
            elite_attack_cooldown: 1.6,
            elite_projectile_speed: 4.5,

            powerup_interval_base: 9.0,
            powerup_interval_floor: 5.0,
            powerup_interval_ramp: 0.02,
            powerup_speed: 1.5,
            powerup_size: 22.0,
            rapid_fire_duration: 10.0,
            multi_shot_duration: 8.0,
            shield_duration: 6.0,
            kill_drop_chance: 0.0,

            score_normal: 1,
            score_bonus: 3,
            score_elite: 10,
            leak_policy: LeakPolicy::Despawn,

            max_particles: 256,
            particles_per_explosion: 16,
        }
    }
}

impl Tuning {
    /// Load tuning from a JSON file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = fs::read_to_string(path)?;
        let tuning: Tuning = serde_json::from_str(&json)?;
        Ok(tuning.sanitized())
    }

    /// Like [`Tuning::load`], but falls back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Field dimensions as a vector
    pub fn field_size(&self) -> Vec2 {
        Vec2::new(self.field_width, self.field_height)
    }

    /// Default player position: left side, vertically centered
    pub fn player_start(&self) -> Vec2 {
        Vec2::new(PLAYER_START_X.min(self.field_width / 2.0), self.field_height / 2.0)
    }

    /// Fixed activation length for a power-up kind (seconds)
    pub fn power_up_duration(&self, kind: PowerUpKind) -> f32 {
        match kind {
            PowerUpKind::RapidFire => self.rapid_fire_duration,
            PowerUpKind::MultiShot => self.multi_shot_duration,
            PowerUpKind::Shield => self.shield_duration,
        }
    }

    /// Seconds between enemy spawn events at the given score
    pub fn enemy_interval(&self, score: u64) -> f32 {
        (self.enemy_interval_base - score as f32 * self.enemy_interval_ramp)
            .max(self.enemy_interval_floor)
    }

    /// Seconds between power-up spawns at the given score
    pub fn powerup_interval(&self, score: u64) -> f32 {
        (self.powerup_interval_base - score as f32 * self.powerup_interval_ramp)
            .max(self.powerup_interval_floor)
    }

    /// Number of enemies created by one spawn event
    pub fn burst_size(&self, score: u64) -> u32 {
        let extra = score.checked_div(self.burst_points).unwrap_or(0);
        1 + (extra.min(self.max_burst_extra as u64) as u32)
    }

    /// Enemy speed for a level plus a random jitter in `[0, 1)`
    ///
    /// Monotonic in level, capped at `enemy_speed_max`, never below the floor.
    pub fn enemy_speed(&self, level: u32, jitter01: f32) -> f32 {
        let ramp = level.saturating_sub(1) as f32 * self.enemy_speed_per_level;
        (self.enemy_speed_base + ramp + jitter01 * self.enemy_speed_jitter)
            .min(self.enemy_speed_max)
            .max(self.enemy_speed_floor)
    }

    /// Score for an empowered kill of a normal enemy (midpoint of normal and bonus)
    pub fn score_empowered(&self) -> u64 {
        self.score_normal.saturating_add(self.score_bonus) / 2
    }

    /// Return a copy with every out-of-range value clamped to something safe
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();

        fix_positive("field_width", &mut self.field_width, d.field_width);
        fix_positive("field_height", &mut self.field_height, d.field_height);
        fix_positive("player_radius", &mut self.player_radius, d.player_radius);
        fix_non_negative("player_speed", &mut self.player_speed);
        fix_positive("rapid_fire_speed_boost", &mut self.rapid_fire_speed_boost, 1.0);
        fix_non_negative("shot_cooldown", &mut self.shot_cooldown);
        fix_non_negative("rapid_fire_cooldown", &mut self.rapid_fire_cooldown);
        fix_positive("projectile_speed", &mut self.projectile_speed, d.projectile_speed);
        fix_positive("projectile_radius", &mut self.projectile_radius, d.projectile_radius);
        fix_non_negative("multi_shot_spread", &mut self.multi_shot_spread);

        // Intervals must stay strictly positive or the pools would flood
        fix_positive("enemy_interval_floor", &mut self.enemy_interval_floor, d.enemy_interval_floor);
        fix_positive("enemy_interval_base", &mut self.enemy_interval_base, d.enemy_interval_base);
        fix_non_negative("enemy_interval_ramp", &mut self.enemy_interval_ramp);
        fix_positive(
            "powerup_interval_floor",
            &mut self.powerup_interval_floor,
            d.powerup_interval_floor,
        );
        fix_positive(
            "powerup_interval_base",
            &mut self.powerup_interval_base,
            d.powerup_interval_base,
        );
        fix_non_negative("powerup_interval_ramp", &mut self.powerup_interval_ramp);

        fix_chance("elite_chance", &mut self.elite_chance);
        fix_chance("bonus_chance", &mut self.bonus_chance);
        fix_chance("weave_chance", &mut self.weave_chance);
        fix_chance("kill_drop_chance", &mut self.kill_drop_chance);
        if self.max_burst_extra > MAX_BURST_EXTRA {
            log::warn!(
                "tuning: max_burst_extra {} too large, clamped to {}",
                self.max_burst_extra,
                MAX_BURST_EXTRA
            );
            self.max_burst_extra = MAX_BURST_EXTRA;
        }

        fix_positive("enemy_speed_floor", &mut self.enemy_speed_floor, d.enemy_speed_floor);
        fix_non_negative("enemy_speed_base", &mut self.enemy_speed_base);
        fix_non_negative("enemy_speed_per_level", &mut self.enemy_speed_per_level);
        fix_non_negative("enemy_speed_jitter", &mut self.enemy_speed_jitter);
        if self.enemy_speed_max < self.enemy_speed_floor {
            log::warn!(
                "tuning: enemy_speed_max {} below floor, raised to {}",
                self.enemy_speed_max,
                self.enemy_speed_floor
            );
            self.enemy_speed_max = self.enemy_speed_floor;
        }
        fix_positive("elite_speed_factor", &mut self.elite_speed_factor, d.elite_speed_factor);
        fix_range(
            "weave_amplitude",
            &mut self.weave_amplitude_min,
            &mut self.weave_amplitude_max,
        );
        fix_range(
            "weave_frequency",
            &mut self.weave_frequency_min,
            &mut self.weave_frequency_max,
        );
        fix_positive("enemy_radius_min", &mut self.enemy_radius_min, d.enemy_radius_min);
        fix_range("enemy_radius", &mut self.enemy_radius_min, &mut self.enemy_radius_max);
        fix_positive("bonus_radius", &mut self.bonus_radius, d.bonus_radius);
        fix_positive("elite_radius", &mut self.elite_radius, d.elite_radius);
        if self.elite_hp == 0 {
            log::warn!("tuning: elite_hp must be at least 1");
            self.elite_hp = 1;
        }
        fix_positive(
            "elite_attack_cooldown",
            &mut self.elite_attack_cooldown,
            d.elite_attack_cooldown,
        );
        fix_non_negative("elite_projectile_speed", &mut self.elite_projectile_speed);

        fix_non_negative("powerup_speed", &mut self.powerup_speed);
        fix_positive("powerup_size", &mut self.powerup_size, d.powerup_size);
        fix_non_negative("rapid_fire_duration", &mut self.rapid_fire_duration);
        fix_non_negative("multi_shot_duration", &mut self.multi_shot_duration);
        fix_non_negative("shield_duration", &mut self.shield_duration);

        self
    }
}

fn fix_non_negative(name: &str, value: &mut f32) {
    if !value.is_finite() || *value < 0.0 {
        log::warn!("tuning: {} = {} is invalid, clamped to 0", name, value);
        *value = 0.0;
    }
}

fn fix_positive(name: &str, value: &mut f32, fallback: f32) {
    if !value.is_finite() || *value <= 0.0 {
        log::warn!("tuning: {} = {} must be positive, using {}", name, value, fallback);
        *value = fallback;
    }
}

fn fix_chance(name: &str, value: &mut f32) {
    if !value.is_finite() || !(0.0..=1.0).contains(&*value) {
        let clamped = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        log::warn!("tuning: {} = {} outside [0, 1], clamped to {}", name, value, clamped);
        *value = clamped;
    }
}

fn fix_range(name: &str, min: &mut f32, max: &mut f32) {
    fix_non_negative(name, min);
    fix_non_negative(name, max);
    if *max < *min {
        log::warn!("tuning: {} range inverted ({} > {}), swapped", name, min, max);
        std::mem::swap(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_interval_ramps_to_floor() {
        let t = Tuning::default();
        assert!((t.enemy_interval(0) - 0.9).abs() < 1e-6);
        assert!(t.enemy_interval(50) < t.enemy_interval(0));
        assert_eq!(t.enemy_interval(10_000), t.enemy_interval_floor);
    }

    #[test]
    fn test_burst_size_capped() {
        let t = Tuning::default();
        assert_eq!(t.burst_size(0), 1);
        assert_eq!(t.burst_size(12), 2);
        assert_eq!(t.burst_size(1_000), 4);
    }

    #[test]
    fn test_enemy_speed_monotonic_and_capped() {
        let t = Tuning::default();
        let mut last = 0.0;
        for level in 1..40 {
            let s = t.enemy_speed(level, 0.5);
            assert!(s >= last);
            assert!(s <= t.enemy_speed_max);
            last = s;
        }
    }

    #[test]
    fn test_negative_speed_never_propagates() {
        let t = Tuning {
            enemy_speed_base: -10.0,
            ..Tuning::default()
        }
        .sanitized();
        assert!(t.enemy_speed(1, 0.0) >= t.enemy_speed_floor);
        assert!(t.enemy_speed_floor > 0.0);
    }

    #[test]
    fn test_sanitize_fixes_bad_values() {
        let t = Tuning {
            enemy_interval_floor: 0.0,
            elite_chance: 3.0,
            weave_amplitude_min: 2.0,
            weave_amplitude_max: 1.0,
            elite_hp: 0,
            ..Tuning::default()
        }
        .sanitized();
        assert!(t.enemy_interval_floor > 0.0);
        assert_eq!(t.elite_chance, 1.0);
        assert!(t.weave_amplitude_min <= t.weave_amplitude_max);
        assert_eq!(t.elite_hp, 1);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t: Tuning = serde_json::from_str(r#"{ "elite_hp": 8, "leak_policy": "LoseLife" }"#)
            .expect("valid tuning json");
        assert_eq!(t.elite_hp, 8);
        assert_eq!(t.leak_policy, LeakPolicy::LoseLife);
        assert_eq!(t.field_width, FIELD_WIDTH);
    }

    #[test]
    fn test_burst_extra_bounded() {
        let t = Tuning {
            max_burst_extra: 10_000,
            burst_points: 1,
            ..Tuning::default()
        }
        .sanitized();
        assert_eq!(t.max_burst_extra, MAX_BURST_EXTRA);
        assert_eq!(t.burst_size(u64::MAX), 1 + MAX_BURST_EXTRA);
    }

    #[test]
    fn test_empowered_score_saturates() {
        let t = Tuning {
            score_normal: u64::MAX,
            score_bonus: u64::MAX,
            ..Tuning::default()
        };
        assert_eq!(t.score_empowered(), u64::MAX / 2);
    }

    #[test]
    fn test_kill_drop_chance_clamped() {
        let t = Tuning {
            kill_drop_chance: -0.5,
            ..Tuning::default()
        }
        .sanitized();
        assert_eq!(t.kill_drop_chance, 0.0);
    }

    #[test]
    fn test_empowered_score_is_midpoint() {
        let t = Tuning::default();
        assert_eq!(t.score_empowered(), 2);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let t = Tuning::load_or_default("/definitely/not/here.json");
        assert_eq!(t, Tuning::default());
    }
}
