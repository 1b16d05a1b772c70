//! Outbound events and the render feed
//!
//! The UI and renderer never poll simulation internals. Each frame the game
//! pushes discrete `GameEvent`s (drained by the host) and exposes a
//! `RenderItem` per visible actor.

use serde::{Deserialize, Serialize};

use super::actor::{ActorId, ActorKind};
use super::session::{Resource, SessionPhase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: u64, delta: u64 },
    HealthChanged { health: i32 },
    ResourceChanged { resource: Resource, count: u32 },
    /// Spear charge in `[0, 1]`, or None when the charge bar should hide
    ChargeChanged { percent: Option<f32> },
    /// HUD banner text
    Announcement { text: String },
    PhaseChanged { phase: SessionPhase },
    ActorSpawned { id: ActorId, kind: ActorKind },
    ActorRemoved { id: ActorId, kind: ActorKind },
    PlayerDamaged { amount: i32, health: i32 },
    BossSpawned { kind: ActorKind },
    /// One-shot level-advance trigger
    BossDefeated { kind: ActorKind },
    /// One-shot game-over trigger
    PlayerDied,
    Blast { x: f32, y: f32, z: f32, radius: f32 },
}

/// Coarse state for choosing a draw routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualState {
    Idle,
    Moving,
    /// Wind-up before a damaging action
    Telegraph,
    Attacking,
    Recovering,
    /// Fuse lit
    Arming,
    Exploding,
    Coiling,
    Airborne,
    Flashing,
    Dead,
}

/// What the renderer needs for one actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderItem<V> {
    pub id: ActorId,
    pub kind: ActorKind,
    pub position: V,
    pub rotation: f32,
    pub visual: VisualState,
}
