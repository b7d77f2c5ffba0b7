//! Glass Shooter - A side-scrolling arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, motion, collisions, power-ups)
//! - `session`: Pause/resume/reset state machine and frame clock
//! - `highscores`: Scoreboard bridge and leaderboard
//! - `persistence`: Key-value stores (memory, JSON file, LocalStorage)
//! - `tuning`: Data-driven game balance
//! - `audio`: Event-keyed sound effects
//! - `autopilot`: Demo-mode player

pub mod audio;
pub mod autopilot;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::{HighScoreBridge, HighScores, Scoreboard};
pub use session::Session;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Play field dimensions
    pub const FIELD_WIDTH: f32 = 900.0;
    pub const FIELD_HEIGHT: f32 = 550.0;

    /// Keep the player this far from the field edge
    pub const PLAYER_EDGE_MARGIN: f32 = 6.0;
    pub const PLAYER_RADIUS: f32 = 16.0;
    /// Pixels per tick
    pub const PLAYER_SPEED: f32 = 4.0;
    /// Default spawn x position (y is vertically centered)
    pub const PLAYER_START_X: f32 = 100.0;
    pub const PLAYER_LIVES: u8 = 3;

    pub const PROJECTILE_RADIUS: f32 = 4.0;
    /// Projectiles this far outside the field are dropped
    pub const OFFSCREEN_MARGIN: f32 = 10.0;

    /// Score per level step
    pub const POINTS_PER_LEVEL: u64 = 10;

    /// Longest frame the session clock will hand to the simulation (ms)
    pub const MAX_FRAME_MS: f64 = 33.0;
}

/// Level for a given score: one level every `POINTS_PER_LEVEL` points, starting at 1
#[inline]
pub fn level_for_score(score: u64) -> u32 {
    (score / consts::POINTS_PER_LEVEL) as u32 + 1
}

/// Clamp a point so a circle of `radius` (plus `margin`) stays inside the field
#[inline]
pub fn clamp_to_field(pos: Vec2, radius: f32, margin: f32, field: Vec2) -> Vec2 {
    let inset = radius + margin;
    Vec2::new(
        pos.x.clamp(inset, (field.x - inset).max(inset)),
        pos.y.clamp(inset, (field.y - inset).max(inset)),
    )
}

/// Unit direction from `from` toward `to` (zero if they coincide)
#[inline]
pub fn aim_direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}
