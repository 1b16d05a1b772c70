//! Shared simulation core
//!
//! Everything both games have in common. This module must be pure and
//! deterministic:
//! - Caller-supplied `dt` only, no clocks
//! - Seeded RNG only
//! - Stable iteration order (roster order, which is id order)
//! - No rendering or platform dependencies

pub mod actor;
pub mod behavior;
pub mod collision;
pub mod combat;
pub mod events;
pub mod geom;
pub mod roster;
pub mod schedule;
pub mod session;
pub mod tick;

pub use actor::{ActorId, ActorKind, Body, DamageOutcome, Health, Vitals, tick_timer};
pub use behavior::{
    BossState, FuseState, HealerState, HealerTiming, LungeState, LungeTiming, Pacer, Targetable,
    nearest,
};
pub use collision::{HitShape, PlatformResolution, bodies_touch, resolve_platforms, within_radius};
pub use combat::{BlastLedger, Candidate, ContactGuard, blast_targets, first_hit};
pub use events::{GameEvent, RenderItem, VisualState};
pub use geom::{ArenaBounds, Rect, Vector, flat_direction, yaw_forward};
pub use roster::{Roster, RosterEntry};
pub use schedule::Scheduler;
pub use session::{Counters, GateSource, PhaseGate, Resource, SessionPhase, Threshold};
pub use tick::{Simulation, TickInput};
