//! Demo-mode autopilot
//!
//! Reads a render snapshot and produces the input a reasonable player would
//! hold this tick: dodge whatever is about to hit, grab power-ups when it is
//! safe, otherwise line up with the nearest enemy and keep firing.

use glam::Vec2;

use crate::sim::{InputIntent, Snapshot};

/// Tunable behaviour for the demo player
#[derive(Debug, Clone)]
pub struct Autopilot {
    /// How far ahead (px) a threat in the lane triggers a dodge
    pub danger_distance: f32,
    /// Extra vertical clearance (px) kept around the ship when dodging
    pub clearance: f32,
    /// Vertical slack (px) accepted when lining up a shot
    pub aim_tolerance: f32,
    /// Column (fraction of field width) the ship drifts back to
    pub home_column: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            danger_distance: 170.0,
            clearance: 10.0,
            aim_tolerance: 6.0,
            home_column: 0.15,
        }
    }
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for the current tick
    pub fn intent(&self, snap: &Snapshot<'_>) -> InputIntent {
        let player = snap.player.pos;
        let reach = snap.player.radius + self.clearance;
        let mut input = InputIntent {
            fire: !snap.enemies.is_empty(),
            ..Default::default()
        };

        // Anything heading at the ship: enemies and hostile shots
        let threats = snap
            .enemies
            .iter()
            .map(|e| (e.pos, e.radius))
            .chain(
                snap.projectiles
                    .iter()
                    .filter(|p| !p.friendly)
                    .map(|p| (p.pos, p.radius)),
            )
            .filter(|(pos, radius)| {
                let ahead = pos.x - player.x;
                ahead > -(radius + reach)
                    && ahead < self.danger_distance
                    && (pos.y - player.y).abs() < radius + reach
            })
            .min_by(|a, b| {
                a.0.distance_squared(player)
                    .partial_cmp(&b.0.distance_squared(player))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        if let Some((pos, _)) = threats {
            // Dodge away from the threat, unless the wall is in the way
            let go_up = if pos.y >= player.y {
                player.y - reach > reach
            } else {
                player.y + reach >= snap.field.y - reach
            };
            input.up = go_up;
            input.down = !go_up;
            input.left = pos.x > player.x;
            return input;
        }

        let all_far = snap
            .enemies
            .iter()
            .all(|e| e.pos.distance(player) > self.danger_distance * 1.5);

        // If safe, go grab the nearest pickup
        let pickup = if all_far {
            snap.power_ups
                .iter()
                .min_by(|a, b| {
                    a.pos
                        .distance_squared(player)
                        .partial_cmp(&b.pos.distance_squared(player))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|p| p.pos)
        } else {
            None
        };

        let target = if let Some(pos) = pickup {
            Some(pos)
        } else {
            // Line up with the closest enemy still in front of the ship
            snap.enemies
                .iter()
                .filter(|e| e.pos.x > player.x)
                .min_by(|a, b| {
                    a.pos
                        .x
                        .partial_cmp(&b.pos.x)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|e| {
                    // Small oscillating offset so the demo does not look robotic
                    let t = snap.time_ticks as f32 * 0.02;
                    let wobble = t.sin() * self.aim_tolerance * 0.5;
                    Vec2::new(snap.field.x * self.home_column, e.pos.y + wobble)
                })
        };

        let home = Vec2::new(snap.field.x * self.home_column, player.y);
        let goal = target.unwrap_or(home);
        steer(&mut input, player, goal, self.aim_tolerance);
        input
    }
}

fn steer(input: &mut InputIntent, from: Vec2, to: Vec2, slack: f32) {
    let d = to - from;
    input.up = d.y < -slack;
    input.down = d.y > slack;
    input.left = d.x < -slack;
    input.right = d.x > slack;
}
