//! Time-driven spawn policy for enemies and power-ups
//!
//! Each class accumulates elapsed seconds and spawns once its interval is
//! exceeded. Intervals shrink with score but never below the tuned floor.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{EnemyKind, GameState, Motion, PowerUpKind};

/// Spawn accumulators (seconds since the last spawn of each class)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    pub enemy_timer: f32,
    pub powerup_timer: f32,
}

impl Spawner {
    /// Start counting from zero again (used by reset)
    pub fn restart(&mut self) {
        self.enemy_timer = 0.0;
        self.powerup_timer = 0.0;
    }
}

/// Advance both spawn timers by `dt` seconds and emit whatever is due
pub fn update(state: &mut GameState, dt: f32) {
    let dt = dt.max(0.0);

    state.spawner.enemy_timer += dt;
    if state.spawner.enemy_timer > state.tuning.enemy_interval(state.score) {
        state.spawner.enemy_timer = 0.0;
        let burst = state.tuning.burst_size(state.score);
        for _ in 0..burst {
            spawn_enemy(state);
        }
    }

    state.spawner.powerup_timer += dt;
    if state.spawner.powerup_timer > state.tuning.powerup_interval(state.score) {
        state.spawner.powerup_timer = 0.0;
        spawn_power_up(state);
    }
}

/// Weighted variant roll: elite (only if none alive), then bonus, else normal
pub fn choose_enemy_kind(state: &mut GameState) -> EnemyKind {
    let roll: f32 = state.rng.random();
    let elite_chance = state.tuning.elite_chance;
    let bonus_chance = state.tuning.bonus_chance;

    if roll < elite_chance && !state.has_elite() {
        EnemyKind::Elite
    } else if roll >= elite_chance && roll < elite_chance + bonus_chance {
        EnemyKind::Bonus
    } else {
        EnemyKind::Normal
    }
}

/// Create one enemy at the right edge with randomized lane, speed and weave
pub fn spawn_enemy(state: &mut GameState) -> u32 {
    let kind = choose_enemy_kind(state);
    let t = &state.tuning;

    let radius = match kind {
        EnemyKind::Normal => {
            let (lo, hi) = (t.enemy_radius_min, t.enemy_radius_max);
            lo + state.rng.random::<f32>() * (hi - lo)
        }
        EnemyKind::Bonus => t.bonus_radius,
        EnemyKind::Elite => t.elite_radius,
    };
    let field = t.field_size();
    let lane_max = (field.y - radius).max(radius);
    let y = radius + state.rng.random::<f32>() * (lane_max - radius);

    let mut speed = t.enemy_speed(state.level, state.rng.random::<f32>());
    if kind == EnemyKind::Elite {
        speed = (speed * t.elite_speed_factor).max(t.enemy_speed_floor);
    }

    let weaves = kind == EnemyKind::Elite || state.rng.random::<f32>() < t.weave_chance;
    let motion = if weaves {
        let (amp_lo, amp_hi) = (t.weave_amplitude_min, t.weave_amplitude_max);
        let (freq_lo, freq_hi) = (t.weave_frequency_min, t.weave_frequency_max);
        Motion::Weave {
            amplitude: amp_lo + state.rng.random::<f32>() * (amp_hi - amp_lo),
            frequency: freq_lo + state.rng.random::<f32>() * (freq_hi - freq_lo),
            phase: state.rng.random::<f32>() * std::f32::consts::TAU,
        }
    } else {
        Motion::Linear
    };

    let pos = Vec2::new(field.x, y);
    let id = state.add_enemy(kind, pos, Vec2::new(-speed, 0.0), radius, motion);
    log::debug!(
        "Spawned {:?} enemy {} at y={:.0} speed={:.2}",
        kind,
        id,
        y,
        speed
    );
    id
}

/// Create one power-up of a uniformly chosen kind at the right edge
pub fn spawn_power_up(state: &mut GameState) -> u32 {
    let kind = roll_power_up_kind(state);
    let field = state.field();
    let half = state.tuning.powerup_size / 2.0;
    let lane_max = (field.y - half).max(half);
    let y = half + state.rng.random::<f32>() * (lane_max - half);

    let id = state.add_power_up(kind, Vec2::new(field.x, y));
    log::debug!("Spawned {} power-up {} at y={:.0}", kind.as_str(), id, y);
    id
}

/// Drop a pickup of a uniformly chosen kind where an enemy died
pub fn drop_power_up(state: &mut GameState, pos: Vec2) -> u32 {
    let kind = roll_power_up_kind(state);
    let id = state.add_power_up(kind, pos);
    log::debug!("Kill dropped {} power-up {}", kind.as_str(), id);
    id
}

fn roll_power_up_kind(state: &mut GameState) -> PowerUpKind {
    let idx = state.rng.random_range(0..PowerUpKind::ALL.len());
    PowerUpKind::ALL[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_no_spawn_before_interval() {
        let mut state = GameState::new(11);
        update(&mut state, 0.5);
        assert!(state.enemies.is_empty());
        assert!(state.power_ups.is_empty());
        assert!((state.spawner.enemy_timer - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_enemy_spawns_after_interval() {
        let mut state = GameState::new(11);
        update(&mut state, 0.5);
        update(&mut state, 0.5);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.spawner.enemy_timer, 0.0);

        let e = &state.enemies[0];
        assert_eq!(e.pos.x, state.tuning.field_width);
        assert!(e.vel.x < 0.0);
        assert!(e.pos.y >= e.radius && e.pos.y <= state.tuning.field_height - e.radius);
    }

    #[test]
    fn test_burst_grows_with_score() {
        let mut state = GameState::new(11);
        state.score = 40;
        update(&mut state, 1.0);
        assert_eq!(state.enemies.len(), 4);
    }

    #[test]
    fn test_power_up_spawns_on_its_own_timer() {
        let mut state = GameState::new(11);
        for _ in 0..10 {
            update(&mut state, 1.0);
        }
        assert_eq!(state.power_ups.len(), 1);
        assert!(state.power_ups[0].vel.x < 0.0);
    }

    #[test]
    fn test_at_most_one_elite() {
        let tuning = Tuning {
            elite_chance: 1.0,
            ..Tuning::default()
        };
        let mut state = GameState::with_tuning(3, tuning);
        for _ in 0..20 {
            spawn_enemy(&mut state);
        }
        let elites = state.enemies.iter().filter(|e| e.is_elite()).count();
        assert_eq!(elites, 1);
        assert_eq!(state.enemies.len(), 20);
    }

    #[test]
    fn test_elite_always_weaves() {
        let tuning = Tuning {
            elite_chance: 1.0,
            weave_chance: 0.0,
            ..Tuning::default()
        };
        let mut state = GameState::with_tuning(3, tuning);
        spawn_enemy(&mut state);
        assert!(matches!(state.enemies[0].motion, Motion::Weave { .. }));
    }

    #[test]
    fn test_speed_never_negative_with_bad_tuning() {
        let tuning = Tuning {
            enemy_speed_base: -50.0,
            enemy_speed_jitter: 0.0,
            ..Tuning::default()
        };
        let mut state = GameState::with_tuning(9, tuning);
        for _ in 0..10 {
            spawn_enemy(&mut state);
        }
        assert!(state.enemies.iter().all(|e| e.vel.x < 0.0));
    }

    #[test]
    fn test_power_up_kinds_cover_all_types() {
        let mut state = GameState::new(21);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..60 {
            spawn_power_up(&mut state);
        }
        for p in &state.power_ups {
            seen.insert(p.kind);
        }
        assert_eq!(seen.len(), 3);
    }
}
