//! Per-frame input and the common game driver interface

use serde::Serialize;

use super::events::{GameEvent, RenderItem};
use super::session::SessionPhase;

/// Normalized input snapshot for one frame (deterministic).
///
/// Edge flags (`jump`, `attack`, `bomb`) are true only on the frame the key
/// went down; the host is responsible for edge detection.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Left/right (platformer run, arena turn), in `[-1, 1]`
    pub move_axis: f32,
    /// Forward/back (arena only), in `[-1, 1]`
    pub forward_axis: f32,
    pub jump: bool,
    /// Punch/kick (platformer), pickle (arena)
    pub attack: bool,
    /// Egg bomb (arena)
    pub bomb: bool,
    /// Spear charge key held (arena)
    pub special_held: bool,
    /// Mouse yaw delta in radians (arena)
    pub look_delta: f32,
    /// Start from the menu
    pub start: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

impl TickInput {
    /// Clamp axes into range and drop non-finite values
    pub fn sanitized(&self) -> Self {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            move_axis: axis(self.move_axis),
            forward_axis: axis(self.forward_axis),
            look_delta: if self.look_delta.is_finite() { self.look_delta } else { 0.0 },
            ..self.clone()
        }
    }
}

/// What a host needs to run either game
pub trait Simulation {
    type Vector: Copy + Serialize;

    /// Advance one frame
    fn step(&mut self, input: &TickInput, dt: f32);

    fn phase(&self) -> SessionPhase;

    fn score(&self) -> u64;

    /// Per-actor draw data for this frame
    fn render_feed(&self) -> Vec<RenderItem<Self::Vector>>;

    /// Take the events emitted since the last drain
    fn drain_events(&mut self) -> Vec<GameEvent>;
}
