//! Per-frame simulation step
//!
//! Core game loop that advances the simulation by one tick. Motion is measured
//! in pixels per tick; spawn, cooldown and power-up timers consume the elapsed
//! seconds passed in as `dt`, so frame-rate jitter does not change pacing.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{hitboxes_overlap, outside_field};
use super::spawner;
use super::state::{EnemyKind, GameEvent, GamePhase, GameState, ParticleKind, PowerUpKind};
use crate::consts::*;
use crate::tuning::LeakPolicy;
use crate::{aim_direction, clamp_to_field, level_for_score};

const COLOR_NORMAL: u32 = 0xff6b6b;
const COLOR_BONUS: u32 = 0x22d3ee;
const COLOR_ELITE: u32 = 0xffd166;
const COLOR_PLAYER: u32 = 0xffffff;
const COLOR_SPARK: u32 = 0xe2e8f0;

/// Player intent for a single tick (held-button state, not edges)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Attempt to shoot, subject to the shot cooldown
    pub fire: bool,
}

impl InputIntent {
    /// Unit-length movement direction (diagonals are normalized)
    pub fn direction(&self) -> Vec2 {
        let mut d = Vec2::ZERO;
        if self.left {
            d.x -= 1.0;
        }
        if self.right {
            d.x += 1.0;
        }
        if self.up {
            d.y -= 1.0;
        }
        if self.down {
            d.y += 1.0;
        }
        d.normalize_or_zero()
    }
}

/// Advance the game state by one tick of `dt` elapsed seconds
pub fn tick(state: &mut GameState, input: &InputIntent, dt: f32) {
    // Don't tick if paused or game over
    if state.phase != GamePhase::Running {
        return;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    state.time_ticks += 1;

    // 1. Player movement and shooting
    move_player(state, input);
    let wants_fire = input.fire || std::mem::take(&mut state.fire_requested);
    fire_player(state, wants_fire, dt);
    spawner::update(state, dt);

    // 2. Elite attacks
    elite_attacks(state, dt);

    // 3. Projectiles, pickups and particles
    advance_projectiles(state);
    advance_power_ups(state);
    advance_particles(state, dt);

    // 4. Enemies (leaks)
    advance_enemies(state, dt);

    // 5-8. Collisions, skipped once the run has ended
    let mut fresh = Vec::new();
    if state.phase == GamePhase::Running {
        player_vs_enemies(state);
    }
    if state.phase == GamePhase::Running {
        player_vs_enemy_projectiles(state);
    }
    if state.phase == GamePhase::Running {
        projectiles_vs_enemies(state);
        fresh = player_vs_power_ups(state);
    }

    // 9. Power-up countdowns
    for kind in state.effects.tick(dt, &fresh) {
        log::debug!("{} expired", kind.as_str());
        state.emit(GameEvent::PowerUpExpired(kind));
    }

    // 10. Level and best score
    state.level = level_for_score(state.score);
    if state.score > state.best_score {
        state.best_score = state.score;
        state.emit(GameEvent::NewHighScore(state.score));
    }

    // Owned shots never outlive their enemy
    cull_orphaned_projectiles(state);

    // Ensure deterministic ordering
    state.normalize_order();
}

fn cull_orphaned_projectiles(state: &mut GameState) {
    let alive: Vec<u32> = state.enemies.iter().map(|e| e.id).collect();
    state
        .projectiles
        .retain(|p| p.owner.is_none_or(|owner| alive.contains(&owner)));
}

fn move_player(state: &mut GameState, input: &InputIntent) {
    let boost = if state.effects.rapid_fire() {
        state.tuning.rapid_fire_speed_boost
    } else {
        1.0
    };
    let field = state.field();
    let player = &mut state.player;
    player.pos += input.direction() * player.speed * boost;
    player.pos = clamp_to_field(player.pos, player.radius, PLAYER_EDGE_MARGIN, field);
}

fn fire_player(state: &mut GameState, wants_fire: bool, dt: f32) {
    state.player.shot_cooldown = (state.player.shot_cooldown - dt).max(0.0);
    if !wants_fire || state.player.shot_cooldown > 0.0 {
        return;
    }

    let rapid = state.effects.rapid_fire();
    state.player.shot_cooldown = if rapid {
        state.tuning.rapid_fire_cooldown
    } else {
        state.tuning.shot_cooldown
    };

    let count: u32 = if state.effects.multi_shot() { 3 } else { 1 };
    let spread = state.tuning.multi_shot_spread;
    let speed = state.tuning.projectile_speed;
    let origin = state.player.pos + Vec2::new(state.player.radius + 2.0, 0.0);
    let empowered_slot = (count - 1) / 2;
    let empowered = std::mem::take(&mut state.player.empowered_next);

    for i in 0..count {
        let angle = (i as f32 - (count - 1) as f32 / 2.0) * spread;
        let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
        state.add_projectile(origin, vel, true, empowered && i == empowered_slot, None);
    }
    state.emit(GameEvent::Shoot);
}

fn elite_attacks(state: &mut GameState, dt: f32) {
    let target = state.player.pos;
    let speed = state.tuning.elite_projectile_speed;
    let reload = state.tuning.elite_attack_cooldown;

    let mut shots = Vec::new();
    for enemy in state.enemies.iter_mut().filter(|e| e.is_elite()) {
        enemy.attack_cooldown -= dt;
        if enemy.attack_cooldown <= 0.0 {
            enemy.attack_cooldown = reload;
            shots.push((enemy.id, enemy.pos));
        }
    }

    for (owner, pos) in shots {
        let vel = aim_direction(pos, target) * speed;
        state.add_projectile(pos, vel, false, false, Some(owner));
        log::debug!("Elite {} fired at {:?}", owner, target);
    }
}

fn advance_projectiles(state: &mut GameState) {
    let field = state.field();
    for p in &mut state.projectiles {
        p.pos += p.vel;
    }
    state
        .projectiles
        .retain(|p| !outside_field(p.pos, &p.hitbox(), field, OFFSCREEN_MARGIN));
}

fn advance_power_ups(state: &mut GameState) {
    let field = state.field();
    for p in &mut state.power_ups {
        p.pos += p.vel;
    }
    state
        .power_ups
        .retain(|p| !outside_field(p.pos, &p.hitbox(), field, 0.0));
}

fn advance_particles(state: &mut GameState, dt: f32) {
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel;
        particle.vel *= 0.985;
        particle.life -= dt * 1.5;
    }
    state.particles.retain(|p| p.life > 0.0);
}

fn advance_enemies(state: &mut GameState, dt: f32) {
    let field_h = state.tuning.field_height;
    let mut leaked = Vec::new();
    for enemy in &mut state.enemies {
        enemy.advance(dt);
        let lo = enemy.radius;
        let hi = (field_h - enemy.radius).max(lo);
        enemy.pos.y = enemy.pos.y.clamp(lo, hi);
        if enemy.leaked() {
            leaked.push(enemy.id);
        }
    }

    for id in leaked {
        if state.remove_enemy(id).is_none() {
            continue;
        }
        log::debug!("Enemy {} leaked past the trailing edge", id);
        if state.tuning.leak_policy == LeakPolicy::LoseLife && state.phase == GamePhase::Running {
            lose_life(state);
        }
    }
}

/// Take one life; at zero the run ends on this tick
fn lose_life(state: &mut GameState) {
    state.player.lives = state.player.lives.saturating_sub(1);
    state.emit(GameEvent::PlayerHit {
        lives_left: state.player.lives,
    });
    let pos = state.player.pos;
    state.spawn_explosion(pos, COLOR_PLAYER, ParticleKind::Debris);

    if state.player.lives == 0 {
        state.phase = GamePhase::GameOver;
        state.emit(GameEvent::GameOver { score: state.score });
        log::info!("Game over with score {}", state.score);
    }
}

fn player_vs_enemies(state: &mut GameState) {
    let (ppos, pbox) = (state.player.pos, state.player.hitbox());
    let hits: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| hitboxes_overlap(ppos, &pbox, e.pos, &e.hitbox()))
        .map(|e| e.id)
        .collect();

    for id in hits {
        let Some(enemy) = state.remove_enemy(id) else {
            continue;
        };
        state.spawn_explosion(enemy.pos, enemy_color(enemy.kind), ParticleKind::Debris);
        if !state.effects.shielded() {
            lose_life(state);
            if state.phase != GamePhase::Running {
                break;
            }
        }
    }
}

fn player_vs_enemy_projectiles(state: &mut GameState) {
    let (ppos, pbox) = (state.player.pos, state.player.hitbox());
    let hits: Vec<u32> = state
        .projectiles
        .iter()
        .filter(|p| !p.friendly && hitboxes_overlap(ppos, &pbox, p.pos, &p.hitbox()))
        .map(|p| p.id)
        .collect();

    for id in hits {
        let Some(proj) = state.remove_projectile(id) else {
            continue;
        };
        state.spawn_explosion(proj.pos, COLOR_SPARK, ParticleKind::Spark);
        if !state.effects.shielded() {
            lose_life(state);
            if state.phase != GamePhase::Running {
                break;
            }
        }
    }
}

/// Projectile-outer / enemy-inner; each projectile damages at most one enemy
fn projectiles_vs_enemies(state: &mut GameState) {
    let friendly: Vec<u32> = state
        .projectiles
        .iter()
        .filter(|p| p.friendly)
        .map(|p| p.id)
        .collect();

    for pid in friendly {
        let Some(proj) = state.projectiles.iter().find(|p| p.id == pid) else {
            continue;
        };
        let (ppos, pbox) = (proj.pos, proj.hitbox());
        let Some(eid) = state
            .enemies
            .iter()
            .find(|e| hitboxes_overlap(ppos, &pbox, e.pos, &e.hitbox()))
            .map(|e| e.id)
        else {
            continue;
        };

        let Some(proj) = state.remove_projectile(pid) else {
            continue;
        };
        let Some(enemy) = state.enemies.iter_mut().find(|e| e.id == eid) else {
            continue;
        };

        if enemy.is_elite() {
            enemy.hp = enemy.hp.saturating_sub(proj.damage());
            let hp_left = enemy.hp;
            if hp_left > 0 {
                state.emit(GameEvent::EnemyHit { id: eid, hp_left });
                state.spawn_explosion(proj.pos, COLOR_SPARK, ParticleKind::Spark);
                continue;
            }
            let points = state.tuning.score_elite;
            kill_enemy(state, eid, points);
        } else {
            let kind = enemy.kind;
            let points = match kind {
                EnemyKind::Bonus => state.tuning.score_bonus,
                _ if proj.empowered => state.tuning.score_empowered(),
                _ => state.tuning.score_normal,
            };
            kill_enemy(state, eid, points);
            if kind == EnemyKind::Bonus {
                state.player.empowered_next = true;
            }
        }
    }
}

fn kill_enemy(state: &mut GameState, id: u32, points: u64) {
    let Some(enemy) = state.remove_enemy(id) else {
        return;
    };
    state.score += points;
    state.emit(GameEvent::EnemyKilled {
        id,
        kind: enemy.kind,
        points,
    });
    state.spawn_explosion(enemy.pos, enemy_color(enemy.kind), ParticleKind::Debris);
    log::debug!("Killed {:?} enemy {} (+{})", enemy.kind, id, points);

    // No roll at zero chance, so the timer-only RNG stream is unchanged
    let chance = state.tuning.kill_drop_chance;
    if chance > 0.0 && state.rng.random::<f32>() < chance {
        spawner::drop_power_up(state, enemy.pos);
    }
}

/// Returns the kinds activated this tick
fn player_vs_power_ups(state: &mut GameState) -> Vec<PowerUpKind> {
    let (ppos, pbox) = (state.player.pos, state.player.hitbox());
    let hits: Vec<u32> = state
        .power_ups
        .iter()
        .filter(|p| hitboxes_overlap(ppos, &pbox, p.pos, &p.hitbox()))
        .map(|p| p.id)
        .collect();

    let mut fresh = Vec::new();
    for id in hits {
        let Some(power_up) = state.remove_power_up(id) else {
            continue;
        };
        let duration = state.tuning.power_up_duration(power_up.kind);
        state.effects.activate(power_up.kind, duration);
        state.emit(GameEvent::PowerUpCollected(power_up.kind));
        log::debug!("Collected {} ({}s)", power_up.kind.as_str(), duration);
        fresh.push(power_up.kind);
    }
    fresh
}

fn enemy_color(kind: EnemyKind) -> u32 {
    match kind {
        EnemyKind::Normal => COLOR_NORMAL,
        EnemyKind::Bonus => COLOR_BONUS,
        EnemyKind::Elite => COLOR_ELITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Motion;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    /// Tuning with spawning effectively disabled
    fn quiet_tuning() -> Tuning {
        Tuning {
            enemy_interval_base: 1.0e9,
            enemy_interval_floor: 1.0e9,
            powerup_interval_base: 1.0e9,
            powerup_interval_floor: 1.0e9,
            ..Tuning::default()
        }
    }

    fn quiet_state() -> GameState {
        GameState::with_tuning(1234, quiet_tuning())
    }

    fn center(state: &GameState) -> Vec2 {
        state.field() / 2.0
    }

    fn fire() -> InputIntent {
        InputIntent {
            fire: true,
            ..Default::default()
        }
    }

    fn kills(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyKilled { .. }))
            .count()
    }

    #[test]
    fn test_tick_skipped_unless_running() {
        let mut state = quiet_state();
        state.phase = GamePhase::Paused;
        let before = state.player.pos;
        let input = InputIntent {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.player.pos, before);

        state.phase = GamePhase::GameOver;
        tick(&mut state, &input, DT);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_player_clamped_to_field() {
        let mut state = quiet_state();
        let input = InputIntent {
            up: true,
            left: true,
            ..Default::default()
        };
        for _ in 0..500 {
            tick(&mut state, &input, DT);
        }
        let inset = state.player.radius + PLAYER_EDGE_MARGIN;
        assert_eq!(state.player.pos, Vec2::new(inset, inset));
    }

    #[test]
    fn test_diagonal_movement_is_normalized() {
        let mut state = quiet_state();
        state.player.pos = center(&state);
        let input = InputIntent {
            down: true,
            right: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        let moved = state.player.pos - center(&state);
        assert!((moved.length() - state.tuning.player_speed).abs() < 1e-4);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut state = quiet_state();
        // 0.22s cooldown at 60 Hz: shots on ticks 1 and 15
        let mut shots = 0;
        for _ in 0..14 {
            tick(&mut state, &fire(), DT);
            shots += state
                .drain_events()
                .iter()
                .filter(|e| **e == GameEvent::Shoot)
                .count();
        }
        assert_eq!(shots, 1);
        tick(&mut state, &fire(), DT);
        assert!(state.drain_events().contains(&GameEvent::Shoot));
    }

    #[test]
    fn test_shoot_command_fires_once() {
        let mut state = quiet_state();
        state.fire_requested = true;
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.projectiles.len(), 1);
        assert!(!state.fire_requested);
        tick(&mut state, &InputIntent::default(), 1.0);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn test_multi_shot_fires_three() {
        let mut state = quiet_state();
        state.effects.activate(PowerUpKind::MultiShot, 5.0);
        tick(&mut state, &fire(), DT);
        assert_eq!(state.projectiles.len(), 3);
        assert!(state.projectiles.iter().all(|p| p.friendly && p.vel.x > 0.0));
    }

    #[test]
    fn test_rapid_fire_shortens_cooldown_and_boosts_speed() {
        let mut state = quiet_state();
        state.effects.activate(PowerUpKind::RapidFire, 5.0);
        state.player.pos = center(&state);
        let input = InputIntent {
            right: true,
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert!((state.player.shot_cooldown - state.tuning.rapid_fire_cooldown).abs() < 1e-6);
        let moved = state.player.pos.x - center(&state).x;
        assert!((moved - state.tuning.player_speed * 1.1).abs() < 1e-4);
    }

    #[test]
    fn test_projectile_meets_oncoming_enemy() {
        let mut state = quiet_state();
        let c = center(&state);
        state.player.pos = c;
        let field_w = state.tuning.field_width;
        state.add_enemy(
            EnemyKind::Normal,
            Vec2::new(field_w, c.y),
            Vec2::new(-2.0, 0.0),
            20.0,
            Motion::Linear,
        );

        // Projectile spawns at c.x + radius + 2 and closes 12px per tick
        let muzzle = c.x + state.player.radius + 2.0;
        let gap = field_w - muzzle - (20.0 + state.tuning.projectile_radius);
        let ticks_needed = (gap / 12.0).ceil() as u32;

        tick(&mut state, &fire(), DT);
        for _ in 1..ticks_needed - 1 {
            tick(&mut state, &InputIntent::default(), DT);
        }
        assert_eq!(state.enemies.len(), 1, "enemy still alive one tick early");

        tick(&mut state, &InputIntent::default(), DT);
        assert!(state.enemies.is_empty());
        assert!(state.projectiles.is_empty());
        assert_eq!(state.score, state.tuning.score_normal);
        assert_eq!(state.lives(), 3);
    }

    #[test]
    fn test_elite_takes_five_hits() {
        let mut state = quiet_state();
        let pos = Vec2::new(600.0, center(&state).y);
        let id = state.add_enemy(EnemyKind::Elite, pos, Vec2::ZERO, 34.0, Motion::Linear);

        for hit in 1..=5 {
            state.add_projectile(pos - Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
            tick(&mut state, &InputIntent::default(), DT);
            if hit < 5 {
                let elite = state.enemies.iter().find(|e| e.id == id).expect("elite alive");
                assert_eq!(elite.hp, 5 - hit);
                assert_eq!(state.score, 0);
            }
        }
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, state.tuning.score_elite);
        let events = state.drain_events();
        let hits = events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyHit { .. }))
            .count();
        assert_eq!(hits, 4);
        assert_eq!(kills(&events), 1);
    }

    #[test]
    fn test_empowered_hit_deals_two() {
        let mut state = quiet_state();
        let pos = Vec2::new(600.0, center(&state).y);
        let id = state.add_enemy(EnemyKind::Elite, pos, Vec2::ZERO, 34.0, Motion::Linear);
        state.add_projectile(pos - Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), true, true, None);
        tick(&mut state, &InputIntent::default(), DT);
        let elite = state.enemies.iter().find(|e| e.id == id).expect("elite alive");
        assert_eq!(elite.hp, 3);
    }

    #[test]
    fn test_elite_death_culls_its_projectiles() {
        let mut state = quiet_state();
        let pos = Vec2::new(600.0, 60.0);
        let id = state.add_enemy(EnemyKind::Elite, pos, Vec2::ZERO, 34.0, Motion::Linear);
        state.enemies[0].hp = 1;
        state.add_projectile(Vec2::new(400.0, 60.0), Vec2::new(-1.0, 0.0), false, false, Some(id));
        state.add_projectile(pos - Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert!(state.enemies.is_empty());
        assert!(state.projectiles.iter().all(|p| p.owner != Some(id)));
    }

    #[test]
    fn test_elite_fires_at_player() {
        let mut state = quiet_state();
        state.player.pos = Vec2::new(100.0, 400.0);
        let id = state.add_enemy(
            EnemyKind::Elite,
            Vec2::new(700.0, 100.0),
            Vec2::ZERO,
            34.0,
            Motion::Linear,
        );
        state.enemies[0].attack_cooldown = 0.01;
        tick(&mut state, &InputIntent::default(), 0.02);

        let shot = state
            .projectiles
            .iter()
            .find(|p| p.owner == Some(id))
            .expect("elite fired");
        assert!(!shot.friendly);
        assert!(shot.vel.x < 0.0 && shot.vel.y > 0.0);
        assert!((shot.vel.length() - state.tuning.elite_projectile_speed).abs() < 1e-4);
        assert!((state.enemies[0].attack_cooldown - state.tuning.elite_attack_cooldown).abs() < 1e-6);
    }

    #[test]
    fn test_bonus_kill_empowers_next_shot() {
        let mut state = quiet_state();
        let pos = Vec2::new(600.0, 100.0);
        state.add_enemy(EnemyKind::Bonus, pos, Vec2::ZERO, 12.0, Motion::Linear);
        state.add_projectile(pos - Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.score, state.tuning.score_bonus);
        assert!(state.player.empowered_next);

        tick(&mut state, &fire(), DT);
        assert!(!state.player.empowered_next);
        assert!(state.projectiles.iter().any(|p| p.empowered));
    }

    #[test]
    fn test_empowered_kill_awards_midpoint() {
        let mut state = quiet_state();
        let pos = Vec2::new(600.0, 100.0);
        state.add_enemy(EnemyKind::Normal, pos, Vec2::ZERO, 20.0, Motion::Linear);
        state.add_projectile(pos - Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), true, true, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.score, state.tuning.score_empowered());
    }

    #[test]
    fn test_kill_drops_power_up_when_enabled() {
        let tuning = Tuning {
            kill_drop_chance: 1.0,
            ..quiet_tuning()
        };
        let mut state = GameState::with_tuning(77, tuning);
        let pos = Vec2::new(600.0, 100.0);
        state.add_enemy(EnemyKind::Normal, pos, Vec2::ZERO, 20.0, Motion::Linear);
        state.add_projectile(pos - Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert!(state.enemies.is_empty());
        assert_eq!(state.power_ups.len(), 1);
        assert_eq!(state.power_ups[0].pos, pos);
    }

    #[test]
    fn test_kill_drop_off_by_default() {
        let mut state = quiet_state();
        let rng_before = state.rng.clone();
        let pos = Vec2::new(600.0, 100.0);
        state.add_enemy(EnemyKind::Normal, pos, Vec2::ZERO, 20.0, Motion::Linear);
        state.add_projectile(pos - Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.score, 1);
        assert!(state.power_ups.is_empty());
        assert_eq!(
            serde_json::to_string(&state.rng).unwrap(),
            serde_json::to_string(&rng_before).unwrap()
        );
    }

    #[test]
    fn test_one_projectile_one_enemy() {
        let mut state = quiet_state();
        let pos = Vec2::new(600.0, 100.0);
        let first = state.add_enemy(EnemyKind::Normal, pos, Vec2::ZERO, 20.0, Motion::Linear);
        let second = state.add_enemy(EnemyKind::Normal, pos, Vec2::ZERO, 20.0, Motion::Linear);
        state.add_projectile(pos - Vec2::new(10.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].id, second);
        assert_ne!(state.enemies[0].id, first);
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_two_projectiles_same_enemy_no_double_kill() {
        let mut state = quiet_state();
        let pos = Vec2::new(600.0, 100.0);
        state.add_enemy(EnemyKind::Normal, pos, Vec2::ZERO, 20.0, Motion::Linear);
        state.add_projectile(pos - Vec2::new(10.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
        state.add_projectile(pos - Vec2::new(12.0, 0.0), Vec2::new(10.0, 0.0), true, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.score, 1);
        // The second projectile found nothing and keeps flying
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(kills(&state.drain_events()), 1);
    }

    #[test]
    fn test_enemy_collision_costs_life() {
        let mut state = quiet_state();
        let p = state.player.pos;
        state.add_enemy(EnemyKind::Normal, p, Vec2::ZERO, 20.0, Motion::Linear);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.lives(), 2);
        assert!(state.enemies.is_empty());
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::PlayerHit { lives_left: 2 })
        );
    }

    #[test]
    fn test_enemy_projectile_costs_life() {
        let mut state = quiet_state();
        let p = state.player.pos;
        state.add_projectile(p, Vec2::ZERO, false, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.lives(), 2);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.phase, GamePhase::Running);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::PlayerHit { lives_left: 2 })
        );
    }

    #[test]
    fn test_enemy_projectile_on_last_life_ends_game() {
        let mut state = quiet_state();
        state.player.lives = 1;
        let p = state.player.pos;
        state.add_projectile(p, Vec2::ZERO, false, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.lives(), 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerHit { lives_left: 0 }));
        assert!(events.contains(&GameEvent::GameOver { score: 0 }));
    }

    #[test]
    fn test_shield_absorbs_enemy_and_projectile() {
        let mut state = quiet_state();
        state.effects.activate(PowerUpKind::Shield, 5.0);
        let p = state.player.pos;
        state.add_enemy(EnemyKind::Normal, p, Vec2::ZERO, 20.0, Motion::Linear);
        state.add_projectile(p, Vec2::ZERO, false, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.lives(), 3);
        assert!(state.enemies.is_empty());
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_last_life_ends_game_same_tick() {
        let mut state = quiet_state();
        state.player.lives = 1;
        let p = state.player.pos;
        state.add_enemy(EnemyKind::Normal, p, Vec2::ZERO, 20.0, Motion::Linear);
        state.add_enemy(EnemyKind::Normal, p, Vec2::ZERO, 20.0, Motion::Linear);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.lives(), 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        let events = state.drain_events();
        let game_overs = events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);

        let ticks = state.time_ticks;
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_leak_is_silent_despawn() {
        let mut state = quiet_state();
        state.add_enemy(
            EnemyKind::Normal,
            Vec2::new(-15.0, 40.0),
            Vec2::new(-2.0, 0.0),
            14.0,
            Motion::Linear,
        );
        tick(&mut state, &InputIntent::default(), DT);
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.lives(), 3);
    }

    #[test]
    fn test_leak_policy_lose_life() {
        let tuning = Tuning {
            leak_policy: LeakPolicy::LoseLife,
            ..quiet_tuning()
        };
        let mut state = GameState::with_tuning(5, tuning);
        state.add_enemy(
            EnemyKind::Normal,
            Vec2::new(-15.0, 40.0),
            Vec2::new(-2.0, 0.0),
            14.0,
            Motion::Linear,
        );
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.lives(), 2);
    }

    #[test]
    fn test_leaked_elite_culls_projectiles() {
        let mut state = quiet_state();
        state.player.pos = Vec2::new(800.0, 500.0);
        let id = state.add_enemy(
            EnemyKind::Elite,
            Vec2::new(-33.0, 40.0),
            Vec2::new(-2.0, 0.0),
            34.0,
            Motion::Linear,
        );
        state.add_projectile(Vec2::new(300.0, 300.0), Vec2::new(1.0, 1.0), false, false, Some(id));
        tick(&mut state, &InputIntent::default(), DT);
        assert!(state.enemies.is_empty());
        assert!(state.projectiles.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_orphaned_projectiles_swept() {
        let mut state = quiet_state();
        state.add_projectile(Vec2::new(500.0, 40.0), Vec2::new(-1.0, 0.0), false, false, Some(999));
        state.add_projectile(Vec2::new(500.0, 80.0), Vec2::new(-1.0, 0.0), false, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].owner, None);
    }

    #[test]
    fn test_shield_lasts_exactly_its_duration() {
        let mut state = quiet_state();
        let dt = 0.25;
        let duration = state.tuning.shield_duration;
        let p = state.player.pos;
        state.add_power_up(PowerUpKind::Shield, p);
        state.power_ups[0].vel = Vec2::ZERO;

        // Tick T: pickup
        tick(&mut state, &InputIntent::default(), dt);
        assert!(state.effects.shielded());
        assert_eq!(state.effects.shield, duration);

        // T + D - dt
        let steps = (duration / dt) as u32;
        for _ in 0..steps - 1 {
            tick(&mut state, &InputIntent::default(), dt);
        }
        assert!(state.effects.shielded());

        // T + D + dt
        tick(&mut state, &InputIntent::default(), dt);
        tick(&mut state, &InputIntent::default(), dt);
        assert!(!state.effects.shielded());
        assert_eq!(state.effects.shield, 0.0);
        let expired = state
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::PowerUpExpired(PowerUpKind::Shield))
            .count();
        assert_eq!(expired, 1);
    }

    #[test]
    fn test_pickup_refreshes_active_power_up() {
        let mut state = quiet_state();
        state.effects.activate(PowerUpKind::RapidFire, 1.0);
        let p = state.player.pos;
        state.add_power_up(PowerUpKind::RapidFire, p);
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.effects.rapid_fire, state.tuning.rapid_fire_duration);
        assert!(state.power_ups.is_empty());
    }

    #[test]
    fn test_power_up_drifts_off_field() {
        let mut state = quiet_state();
        state.add_power_up(PowerUpKind::MultiShot, Vec2::new(-10.0, 40.0));
        tick(&mut state, &InputIntent::default(), DT);
        assert!(state.power_ups.is_empty());
        assert!(!state.effects.any_active());
    }

    #[test]
    fn test_projectiles_removed_off_field() {
        let mut state = quiet_state();
        let w = state.tuning.field_width;
        state.add_projectile(Vec2::new(w + 5.0, 100.0), Vec2::new(10.0, 0.0), true, false, None);
        tick(&mut state, &InputIntent::default(), DT);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_level_and_best_score_follow_score() {
        let mut state = quiet_state();
        state.score = 23;
        tick(&mut state, &InputIntent::default(), DT);
        assert_eq!(state.level, 3);
        assert_eq!(state.best_score, 23);
        assert!(state.drain_events().contains(&GameEvent::NewHighScore(23)));

        // No repeat event while the score stands still
        tick(&mut state, &InputIntent::default(), DT);
        assert!(!state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::NewHighScore(_))));
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);

        for i in 0..1500u32 {
            let input = InputIntent {
                up: i % 90 < 30,
                down: i % 90 >= 60,
                fire: i % 3 == 0,
                ..Default::default()
            };
            tick(&mut state1, &input, DT);
            tick(&mut state2, &input, DT);
        }

        let a = serde_json::to_string(&state1).expect("serialize state1");
        let b = serde_json::to_string(&state2).expect("serialize state2");
        assert_eq!(a, b);
        assert_eq!(state1.time_ticks, state2.time_ticks);
    }

    fn intent_from_bits(bits: u8) -> InputIntent {
        InputIntent {
            up: bits & 1 != 0,
            down: bits & 2 != 0,
            left: bits & 4 != 0,
            right: bits & 8 != 0,
            fire: bits & 16 != 0,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_core_invariants_hold(
            seed in any::<u64>(),
            inputs in prop::collection::vec(any::<u8>(), 1..600),
        ) {
            let tuning = Tuning {
                elite_chance: 0.2,
                leak_policy: LeakPolicy::LoseLife,
                ..Tuning::default()
            };
            let mut state = GameState::with_tuning(seed, tuning);
            let mut last_score = 0;
            let mut ended = false;

            for bits in inputs {
                tick(&mut state, &intent_from_bits(bits), 0.05);

                prop_assert!(state.lives() <= PLAYER_LIVES);
                prop_assert!(state.score >= last_score);
                prop_assert_eq!(state.level, level_for_score(state.score));
                prop_assert!(state.enemies.iter().filter(|e| e.is_elite()).count() <= 1);
                if state.lives() == 0 {
                    prop_assert_eq!(state.phase, GamePhase::GameOver);
                }
                if ended {
                    prop_assert_eq!(state.phase, GamePhase::GameOver);
                }
                let enemy_ids: Vec<u32> = state.enemies.iter().map(|e| e.id).collect();
                for p in state.projectiles.iter().filter(|p| !p.friendly) {
                    if let Some(owner) = p.owner {
                        prop_assert!(enemy_ids.contains(&owner));
                    }
                }
                let field = state.field();
                let inset = state.player.radius + PLAYER_EDGE_MARGIN;
                prop_assert!(state.player.pos.x >= inset && state.player.pos.x <= field.x - inset);
                prop_assert!(state.player.pos.y >= inset && state.player.pos.y <= field.y - inset);

                last_score = state.score;
                ended = state.phase == GamePhase::GameOver;
            }
        }
    }
}
