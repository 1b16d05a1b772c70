//! Vector math shared by the 2D and 3D games
//!
//! The platformer runs on `Vec2` (screen space, +y down), the arena on `Vec3`
//! (+y up). `Vector` lets the shared state machines and hit tests be written once.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Sub};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::MIN_DISTANCE;

pub trait Vector:
    Copy
    + Debug
    + PartialEq
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + AddAssign
{
    const ORIGIN: Self;

    fn len(self) -> f32;

    /// Per-axis overlap of two boxes given centers and half extents
    fn boxes_overlap(a: Self, a_half: Self, b: Self, b_half: Self) -> bool;

    #[inline]
    fn distance_to(self, other: Self) -> f32 {
        (other - self).len()
    }

    /// Unit vector from `self` toward `target`, or None when the two are
    /// closer than `MIN_DISTANCE` (no defined direction).
    #[inline]
    fn direction_to(self, target: Self) -> Option<Self> {
        let delta = target - self;
        let len = delta.len();
        if len.is_finite() && len >= MIN_DISTANCE {
            Some(delta * (1.0 / len))
        } else {
            None
        }
    }

    #[inline]
    fn lerp_toward(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
}

impl Vector for Vec2 {
    const ORIGIN: Self = Vec2::ZERO;

    #[inline]
    fn len(self) -> f32 {
        self.length()
    }

    #[inline]
    fn boxes_overlap(a: Self, a_half: Self, b: Self, b_half: Self) -> bool {
        (a - b).abs().cmplt(a_half + b_half).all()
    }
}

impl Vector for Vec3 {
    const ORIGIN: Self = Vec3::ZERO;

    #[inline]
    fn len(self) -> f32 {
        self.length()
    }

    #[inline]
    fn boxes_overlap(a: Self, a_half: Self, b: Self, b_half: Self) -> bool {
        (a - b).abs().cmplt(a_half + b_half).all()
    }
}

/// Direction on the ground plane (y ignored), for arena walkers
#[inline]
pub fn flat_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    let mut delta = to - from;
    delta.y = 0.0;
    Vec3::ORIGIN.direction_to(delta)
}

/// Facing vector for a yaw angle (yaw 0 faces +z)
#[inline]
pub fn yaw_forward(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Static platform bounds, top-left anchored (platformer screen space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Strict overlap (touching edges don't count)
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self::new(center.x - half.x, center.y - half.y, half.x * 2.0, half.y * 2.0)
    }
}

/// Arena room limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    /// Walls clamp x/z to ±this (None = open level)
    pub wall_half_extent: Option<f32>,
    /// Solid floor covers x/z within ±this (None = infinite floor)
    pub floor_half_extent: Option<f32>,
}

impl ArenaBounds {
    pub const fn walled(half_extent: f32) -> Self {
        Self {
            wall_half_extent: Some(half_extent),
            floor_half_extent: None,
        }
    }

    pub const fn open_floor(half_extent: f32) -> Self {
        Self {
            wall_half_extent: None,
            floor_half_extent: Some(half_extent),
        }
    }

    /// Push a position back inside the walls
    pub fn clamp(&self, mut pos: Vec3) -> Vec3 {
        if let Some(limit) = self.wall_half_extent {
            pos.x = pos.x.clamp(-limit, limit);
            pos.z = pos.z.clamp(-limit, limit);
        }
        pos
    }

    /// Whether there is floor under this x/z
    pub fn has_floor(&self, pos: Vec3) -> bool {
        match self.floor_half_extent {
            Some(limit) => pos.x.abs() <= limit && pos.z.abs() <= limit,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_to_degenerate() {
        let p = Vec2::new(3.0, 4.0);
        assert_eq!(p.direction_to(p), None);
        let d = Vec2::ZERO.direction_to(Vec2::new(3.0, 4.0)).unwrap();
        assert!((d - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_flat_direction_ignores_height() {
        let d = flat_direction(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 0.0, 5.0)).unwrap();
        assert!((d - Vec3::Z).length() < 1e-6);
        assert_eq!(flat_direction(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0)), None);
    }

    #[test]
    fn test_boxes_overlap() {
        let half = Vec2::splat(10.0);
        assert!(Vec2::boxes_overlap(Vec2::ZERO, half, Vec2::new(15.0, 0.0), half));
        assert!(!Vec2::boxes_overlap(Vec2::ZERO, half, Vec2::new(20.0, 0.0), half));
    }

    #[test]
    fn test_rect_overlap_and_center() {
        let a = Rect::new(0.0, 0.0, 40.0, 60.0);
        let b = Rect::new(30.0, 50.0, 20.0, 20.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&Rect::new(40.0, 0.0, 10.0, 10.0)));
        assert_eq!(a.center(), Vec2::new(20.0, 30.0));
        assert_eq!(Rect::from_center(a.center(), a.half_extents()), a);
    }

    #[test]
    fn test_arena_bounds() {
        let walled = ArenaBounds::walled(24.0);
        assert_eq!(walled.clamp(Vec3::new(30.0, 1.0, -30.0)), Vec3::new(24.0, 1.0, -24.0));
        assert!(walled.has_floor(Vec3::new(500.0, 0.0, 0.0)));

        let open = ArenaBounds::open_floor(100.0);
        assert_eq!(open.clamp(Vec3::new(150.0, 0.0, 0.0)).x, 150.0);
        assert!(!open.has_floor(Vec3::new(150.0, 0.0, 0.0)));
    }
}
