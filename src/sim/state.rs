//! Game state and core simulation types
//!
//! Everything the simulation step reads or writes lives in [`GameState`]. It is
//! owned by the session and passed explicitly into `tick`; there is no ambient
//! global state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::spawner::Spawner;
use crate::consts::*;
use crate::level_for_score;
use crate::tuning::Tuning;

/// Session phase; the simulation only advances while `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Frozen; every timer holds its value
    Paused,
    /// Lives exhausted, waiting for reset
    GameOver,
}

/// Fire-and-forget notifications for audio and HUD collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Shoot,
    /// Elite took damage but survived
    EnemyHit { id: u32, hp_left: u8 },
    EnemyKilled { id: u32, kind: EnemyKind, points: u64 },
    PlayerHit { lives_left: u8 },
    PowerUpCollected(PowerUpKind),
    PowerUpExpired(PowerUpKind),
    Pause,
    Resume,
    GameOver { score: u64 },
    NewHighScore(u64),
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    /// Pixels per tick
    pub speed: f32,
    pub lives: u8,
    /// Seconds until the next shot is allowed
    pub shot_cooldown: f32,
    /// The next projectile fired is empowered (reward for a bonus kill)
    pub empowered_next: bool,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: tuning.player_start(),
            radius: tuning.player_radius,
            speed: tuning.player_speed,
            lives: PLAYER_LIVES,
            shot_cooldown: 0.0,
            empowered_next: false,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::circle(self.radius)
    }
}

/// A projectile, fired by the player (`friendly`) or by an elite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Pixels per tick
    pub vel: Vec2,
    pub radius: f32,
    pub friendly: bool,
    /// Deals double damage to elites and earns the empowered kill bonus
    pub empowered: bool,
    /// Firing enemy for hostile projectiles
    pub owner: Option<u32>,
}

impl Projectile {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::circle(self.radius)
    }

    /// Damage dealt to an elite
    pub fn damage(&self) -> u8 {
        if self.empowered { 2 } else { 1 }
    }
}

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyKind {
    #[default]
    Normal,
    /// Worth more points and empowers the next shot
    Bonus,
    /// Multi-hp boss with an aimed ranged attack; at most one alive
    Elite,
}

/// How an enemy moves on top of its base velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Linear,
    /// Vertical sinusoidal sway added each tick
    Weave {
        /// Pixels per tick at the peak of the sway
        amplitude: f32,
        /// Radians per second
        frequency: f32,
        phase: f32,
    },
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Pixels per tick
    pub vel: Vec2,
    pub radius: f32,
    pub hp: u8,
    pub motion: Motion,
    /// Seconds alive (drives the weave)
    pub age: f32,
    /// Seconds until the next attack (elites only)
    pub attack_cooldown: f32,
}

impl Enemy {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::circle(self.radius)
    }

    pub fn is_elite(&self) -> bool {
        self.kind == EnemyKind::Elite
    }

    /// Integrate one tick of motion
    pub fn advance(&mut self, dt: f32) {
        self.age += dt;
        self.pos += self.vel;
        if let Motion::Weave {
            amplitude,
            frequency,
            phase,
        } = self.motion
        {
            self.pos.y += amplitude * (self.age * frequency + phase).sin();
        }
    }

    /// Fully past the trailing (left) edge
    pub fn leaked(&self) -> bool {
        self.pos.x + self.radius < 0.0
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    RapidFire,
    MultiShot,
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::RapidFire,
        PowerUpKind::MultiShot,
        PowerUpKind::Shield,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::RapidFire => "Rapid Fire",
            PowerUpKind::MultiShot => "Multi Shot",
            PowerUpKind::Shield => "Shield",
        }
    }
}

/// A pickup drifting toward the player's side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Side length of the square pickup box
    pub size: f32,
}

impl PowerUp {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::square(self.size)
    }
}

/// Remaining seconds per power-up type (0 = inactive)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub rapid_fire: f32,
    pub multi_shot: f32,
    pub shield: f32,
}

impl ActiveEffects {
    fn slot_mut(&mut self, kind: PowerUpKind) -> &mut f32 {
        match kind {
            PowerUpKind::RapidFire => &mut self.rapid_fire,
            PowerUpKind::MultiShot => &mut self.multi_shot,
            PowerUpKind::Shield => &mut self.shield,
        }
    }

    pub fn remaining(&self, kind: PowerUpKind) -> f32 {
        match kind {
            PowerUpKind::RapidFire => self.rapid_fire,
            PowerUpKind::MultiShot => self.multi_shot,
            PowerUpKind::Shield => self.shield,
        }
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.remaining(kind) > 0.0
    }

    pub fn shielded(&self) -> bool {
        self.is_active(PowerUpKind::Shield)
    }

    pub fn rapid_fire(&self) -> bool {
        self.is_active(PowerUpKind::RapidFire)
    }

    pub fn multi_shot(&self) -> bool {
        self.is_active(PowerUpKind::MultiShot)
    }

    /// Start (or restart) a modifier; an active one is refreshed, not stacked
    pub fn activate(&mut self, kind: PowerUpKind, duration: f32) {
        *self.slot_mut(kind) = duration.max(0.0);
    }

    /// Count down every active timer, returning the kinds that just expired.
    ///
    /// Kinds listed in `fresh` were activated this tick and keep their full
    /// duration until the next one.
    pub fn tick(&mut self, dt: f32, fresh: &[PowerUpKind]) -> Vec<PowerUpKind> {
        let dt = dt.max(0.0);
        let mut expired = Vec::new();
        for kind in PowerUpKind::ALL {
            if fresh.contains(&kind) {
                continue;
            }
            let slot = self.slot_mut(kind);
            if *slot > 0.0 {
                *slot = (*slot - dt).max(0.0);
                if *slot == 0.0 {
                    expired.push(kind);
                }
            }
        }
        expired
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn any_active(&self) -> bool {
        PowerUpKind::ALL.iter().any(|&k| self.is_active(k))
    }
}

/// Visual flavour of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Short bright flash where a projectile struck
    Spark,
    /// Slower fragments from a destroyed ship
    Debris,
}

/// A particle for visual effects (never affects gameplay)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32, // 0xRRGGBB
    pub life: f32,  // 0-1, decreases over time
    pub size: f32,
}

/// Read-only view handed to the renderer once per tick
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub score: u64,
    pub best_score: u64,
    pub level: u32,
    pub lives: u8,
    pub time_ticks: u64,
    pub field: Vec2,
    pub player: &'a Player,
    pub projectiles: &'a [Projectile],
    pub enemies: &'a [Enemy],
    pub power_ups: &'a [PowerUp],
    pub particles: &'a [Particle],
    pub effects: &'a ActiveEffects,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Gameplay RNG; particles never draw from it
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub score: u64,
    /// Always `score / 10 + 1`
    pub level: u32,
    /// Best score seen, seeded from the scoreboard at session start
    pub best_score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    /// Friendly and hostile projectiles (sorted by id for determinism)
    pub projectiles: Vec<Projectile>,
    /// Active enemies (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    /// Active pickups (sorted by id for determinism)
    pub power_ups: Vec<PowerUp>,
    pub effects: ActiveEffects,
    pub spawner: Spawner,
    /// A `shoot()` command waiting for the next tick
    pub fire_requested: bool,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    /// Events raised since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new running game with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Create a new running game with the given balance
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let tuning = tuning.sanitized();
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::new(&tuning),
            tuning,
            phase: GamePhase::Running,
            score: 0,
            level: 1,
            best_score: 0,
            time_ticks: 0,
            projectiles: Vec::new(),
            enemies: Vec::new(),
            power_ups: Vec::new(),
            effects: ActiveEffects::default(),
            spawner: Spawner::default(),
            fire_requested: false,
            particles: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Back to a fresh run: empty pools, score 0, full lives, no modifiers.
    /// The best score and RNG stream carry over.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Running;
        self.score = 0;
        self.level = level_for_score(0);
        self.time_ticks = 0;
        self.player = Player::new(&self.tuning);
        self.projectiles.clear();
        self.enemies.clear();
        self.power_ups.clear();
        self.particles.clear();
        self.effects.clear();
        self.spawner.restart();
        self.fire_requested = false;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn lives(&self) -> u8 {
        self.player.lives
    }

    pub fn field(&self) -> Vec2 {
        self.tuning.field_size()
    }

    pub fn has_elite(&self) -> bool {
        self.enemies.iter().any(Enemy::is_elite)
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Insert an enemy, filling hp and attack timer from tuning
    pub fn add_enemy(
        &mut self,
        kind: EnemyKind,
        pos: Vec2,
        vel: Vec2,
        radius: f32,
        motion: Motion,
    ) -> u32 {
        let id = self.next_entity_id();
        let (hp, attack_cooldown) = match kind {
            EnemyKind::Elite => (self.tuning.elite_hp, self.tuning.elite_attack_cooldown),
            _ => (1, 0.0),
        };
        self.enemies.push(Enemy {
            id,
            kind,
            pos,
            vel,
            radius,
            hp,
            motion,
            age: 0.0,
            attack_cooldown,
        });
        id
    }

    /// Insert a projectile
    pub fn add_projectile(
        &mut self,
        pos: Vec2,
        vel: Vec2,
        friendly: bool,
        empowered: bool,
        owner: Option<u32>,
    ) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile {
            id,
            pos,
            vel,
            radius: self.tuning.projectile_radius,
            friendly,
            empowered,
            owner,
        });
        id
    }

    /// Insert a power-up drifting left at the tuned speed
    pub fn add_power_up(&mut self, kind: PowerUpKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp {
            id,
            kind,
            pos,
            vel: Vec2::new(-self.tuning.powerup_speed, 0.0),
            size: self.tuning.powerup_size,
        });
        id
    }

    /// Remove an enemy by id along with every projectile it fired.
    ///
    /// Returns `None` if the enemy was already gone, so a second removal in the
    /// same tick is harmless.
    pub fn remove_enemy(&mut self, id: u32) -> Option<Enemy> {
        let idx = self.enemies.iter().position(|e| e.id == id)?;
        let enemy = self.enemies.remove(idx);
        self.projectiles.retain(|p| p.owner != Some(id));
        Some(enemy)
    }

    /// Remove a projectile by id; `None` if it was already consumed
    pub fn remove_projectile(&mut self, id: u32) -> Option<Projectile> {
        let idx = self.projectiles.iter().position(|p| p.id == id)?;
        Some(self.projectiles.remove(idx))
    }

    /// Remove a power-up by id
    pub fn remove_power_up(&mut self, id: u32) -> Option<PowerUp> {
        let idx = self.power_ups.iter().position(|p| p.id == id)?;
        Some(self.power_ups.remove(idx))
    }

    /// Burst of particles at `pos` (deterministic spread, no RNG draw)
    pub fn spawn_explosion(&mut self, pos: Vec2, color: u32, kind: ParticleKind) {
        let cap = self.tuning.max_particles;
        if cap == 0 {
            return;
        }
        let count = match kind {
            ParticleKind::Spark => (self.tuning.particles_per_explosion / 2).max(1),
            ParticleKind::Debris => self.tuning.particles_per_explosion,
        };
        let particle_seed = (self.time_ticks as u32).wrapping_add(pos.x as u32);

        for i in 0..count {
            if self.particles.len() >= cap {
                // Remove oldest particles to make room
                self.particles.remove(0);
            }
            let hash = particle_seed
                .wrapping_mul(2654435761)
                .wrapping_add(i * 7919);
            let angle = (hash % 1000) as f32 / 1000.0 * std::f32::consts::TAU;
            let speed = 1.5 + ((hash >> 10) % 1000) as f32 / 1000.0 * 3.0;
            let life = 0.6 + ((hash >> 20) % 400) as f32 / 1000.0;

            self.particles.push(Particle {
                kind,
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                color,
                life,
                size: match kind {
                    ParticleKind::Spark => 2.0,
                    ParticleKind::Debris => 3.0,
                },
            });
        }
    }

    /// Ensure pools are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.projectiles.sort_by_key(|p| p.id);
        self.enemies.sort_by_key(|e| e.id);
        self.power_ups.sort_by_key(|p| p.id);
    }

    /// Read-only view for the renderer
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            score: self.score,
            best_score: self.best_score,
            level: self.level,
            lives: self.player.lives,
            time_ticks: self.time_ticks,
            field: self.field(),
            player: &self.player,
            projectiles: &self.projectiles,
            enemies: &self.enemies,
            power_ups: &self.power_ups,
            particles: &self.particles,
            effects: &self.effects,
        }
    }
}
