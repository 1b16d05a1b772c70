//! Hit tests and platform resolution
//!
//! Hit tests are proximity only: circles compare center distance against the
//! sum of radii, boxes compare per-axis overlap. Platform resolution is the
//! platformer's AABB landing logic.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::Body;
use super::geom::{Rect, Vector};

/// Which proximity test a pairing uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitShape {
    #[default]
    Circle,
    Box,
}

/// Whether two bodies touch under the given test
#[inline]
pub fn bodies_touch<V: Vector>(a: &Body<V>, b: &Body<V>, shape: HitShape) -> bool {
    match shape {
        HitShape::Circle => a.pos.distance_to(b.pos) < a.radius + b.radius,
        HitShape::Box => V::boxes_overlap(a.pos, a.half_extents, b.pos, b.half_extents),
    }
}

/// Whether a point lies strictly inside a blast radius
#[inline]
pub fn within_radius<V: Vector>(center: V, radius: f32, point: V) -> bool {
    center.distance_to(point) < radius
}

/// Result of resolving a box against static platforms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformResolution {
    /// Corrected box
    pub rect: Rect,
    /// Corrected velocity
    pub vel: Vec2,
    /// Landed on top of a platform this frame
    pub grounded: bool,
}

/// Resolve a moving box against platforms (screen space, +y down).
///
/// `prev_y` is the box top before this frame's movement. A landing only counts
/// when the previous bottom was at or above the platform top, so a box that
/// was already below a ledge's surface can't snap up onto it.
pub fn resolve_platforms(mut rect: Rect, mut vel: Vec2, prev_y: f32, platforms: &[Rect]) -> PlatformResolution {
    let mut grounded = false;

    for platform in platforms {
        if !rect.overlaps(platform) {
            continue;
        }

        let prev_bottom = prev_y + rect.height;
        if prev_bottom <= platform.top() {
            // Landed
            rect.y = platform.top() - rect.height;
            vel.y = 0.0;
            grounded = true;
        } else if prev_y >= platform.bottom() {
            // Bonked head
            rect.y = platform.bottom();
            vel.y = 0.0;
        } else if vel.x > 0.0 {
            rect.x = platform.left() - rect.width;
            vel.x = 0.0;
        } else if vel.x < 0.0 {
            rect.x = platform.right();
            vel.x = 0.0;
        }
    }

    PlatformResolution { rect, vel, grounded }
}
