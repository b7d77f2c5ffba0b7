//! Overlap tests for every pairwise interaction
//!
//! Entities carry either a circle or an axis-aligned box. Touching edges count
//! as overlap, matching the `<=` comparisons of the classic game.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision shape, centered on the owning entity's position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Hitbox {
    Circle { radius: f32 },
    /// Axis-aligned box given by half extents
    Rect { half: Vec2 },
}

impl Hitbox {
    pub fn circle(radius: f32) -> Self {
        Hitbox::Circle { radius }
    }

    /// Square box with the given side length
    pub fn square(side: f32) -> Self {
        Hitbox::Rect {
            half: Vec2::splat(side / 2.0),
        }
    }

    /// Smallest half extents containing the shape
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Hitbox::Circle { radius } => Vec2::splat(radius),
            Hitbox::Rect { half } => half,
        }
    }
}

/// Circle-circle overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// AABB-AABB overlap (positions are box centers)
#[inline]
pub fn rects_overlap(a: Vec2, half_a: Vec2, b: Vec2, half_b: Vec2) -> bool {
    let d = (a - b).abs();
    d.x <= half_a.x + half_b.x && d.y <= half_a.y + half_b.y
}

/// Circle-AABB overlap via the closest point on the box
#[inline]
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: Vec2, half: Vec2) -> bool {
    let closest = center.clamp(rect - half, rect + half);
    center.distance_squared(closest) <= radius * radius
}

/// Overlap test for any pair of hitboxes
pub fn hitboxes_overlap(a_pos: Vec2, a: &Hitbox, b_pos: Vec2, b: &Hitbox) -> bool {
    match (*a, *b) {
        (Hitbox::Circle { radius: ra }, Hitbox::Circle { radius: rb }) => {
            circles_overlap(a_pos, ra, b_pos, rb)
        }
        (Hitbox::Rect { half: ha }, Hitbox::Rect { half: hb }) => {
            rects_overlap(a_pos, ha, b_pos, hb)
        }
        (Hitbox::Circle { radius }, Hitbox::Rect { half }) => {
            circle_rect_overlap(a_pos, radius, b_pos, half)
        }
        (Hitbox::Rect { half }, Hitbox::Circle { radius }) => {
            circle_rect_overlap(b_pos, radius, a_pos, half)
        }
    }
}

/// True once a shape has fully left the field rectangle `[0, field]`,
/// with an extra `margin` of grace on every side
pub fn outside_field(pos: Vec2, hitbox: &Hitbox, field: Vec2, margin: f32) -> bool {
    let half = hitbox.half_extents();
    pos.x + half.x < -margin
        || pos.x - half.x > field.x + margin
        || pos.y + half.y < -margin
        || pos.y - half.y > field.y + margin
}
