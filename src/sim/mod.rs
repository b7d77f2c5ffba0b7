//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Elapsed time comes in as an argument, never read from a clock
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No audio, storage or platform dependencies

pub mod collision;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Hitbox, circles_overlap, hitboxes_overlap, rects_overlap};
pub use spawner::Spawner;
pub use state::{
    ActiveEffects, Enemy, EnemyKind, GameEvent, GamePhase, GameState, Motion, Particle,
    ParticleKind, Player, PowerUp, PowerUpKind, Projectile, Snapshot,
};
pub use tick::{InputIntent, tick};
