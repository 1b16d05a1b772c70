//! Timed hazard state machines
//!
//! Each machine only moves forward through its phases; the only way back to an
//! earlier phase is the explicit reset edge (lunge recovery back to idle,
//! healer losing its target). Movement that depends on the phase is applied
//! through the position passed in, so the same machine drives a `Vec2` biscuit
//! and a `Vec3` chocolate.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::actor::{ActorId, Health, tick_timer};
use super::geom::Vector;

/// Lunge timings and speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LungeTiming {
    pub ready: f32,
    pub lunge: f32,
    pub recover: f32,
    /// Idle delay is drawn uniformly from `[rearm_min, rearm_max)`
    pub rearm_min: f32,
    pub rearm_max: f32,
    pub speed: f32,
}

impl Default for LungeTiming {
    fn default() -> Self {
        Self {
            ready: 0.5,
            lunge: 0.4,
            recover: 1.0,
            rearm_min: 3.0,
            rearm_max: 8.0,
            speed: 600.0,
        }
    }
}

impl LungeTiming {
    fn rearm_delay(&self, rng: &mut impl Rng) -> f32 {
        if self.rearm_max > self.rearm_min {
            rng.random_range(self.rearm_min..self.rearm_max)
        } else {
            self.rearm_min
        }
    }
}

/// Idle → Readying → Lunging → Recovering → Idle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LungeState<V> {
    /// Pacing; counts down to the next lunge
    Idle { rearm: f32 },
    /// Telegraph
    Readying { remaining: f32 },
    /// Flying along a velocity fixed at entry
    Lunging { remaining: f32, velocity: V },
    Recovering { remaining: f32 },
}

impl<V: Vector> LungeState<V> {
    pub fn new(timing: &LungeTiming, rng: &mut impl Rng) -> Self {
        LungeState::Idle {
            rearm: timing.rearm_delay(rng),
        }
    }

    /// Whether the actor should run its normal pacing this frame
    pub fn is_idle(&self) -> bool {
        matches!(self, LungeState::Idle { .. })
    }

    /// Advance one frame. `target` is only read on the Readying → Lunging edge;
    /// the lunge is never re-aimed mid-flight. A target closer than the
    /// minimum distance gives a zero velocity lunge.
    pub fn step(&mut self, pos: &mut V, target: V, timing: &LungeTiming, rng: &mut impl Rng, dt: f32) {
        match self {
            LungeState::Idle { rearm } => {
                if tick_timer(rearm, dt) {
                    *self = LungeState::Readying { remaining: timing.ready };
                }
            }
            LungeState::Readying { remaining } => {
                if tick_timer(remaining, dt) {
                    let velocity = pos
                        .direction_to(target)
                        .map(|dir| dir * timing.speed)
                        .unwrap_or(V::ORIGIN);
                    *self = LungeState::Lunging {
                        remaining: timing.lunge,
                        velocity,
                    };
                }
            }
            LungeState::Lunging { remaining, velocity } => {
                *pos += *velocity * dt;
                if tick_timer(remaining, dt) {
                    *self = LungeState::Recovering {
                        remaining: timing.recover,
                    };
                }
            }
            LungeState::Recovering { remaining } => {
                if tick_timer(remaining, dt) {
                    *self = LungeState::Idle {
                        rearm: timing.rearm_delay(rng),
                    };
                }
            }
        }
    }
}

/// Back-and-forth patrol along x around a start point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pacer {
    pub origin_x: f32,
    pub range: f32,
    pub speed: f32,
    /// +1 or -1
    pub direction: f32,
}

impl Pacer {
    pub fn new(origin_x: f32, range: f32, speed: f32) -> Self {
        Self {
            origin_x,
            range,
            speed,
            direction: 1.0,
        }
    }

    /// Move `x` one frame; turns around once past the range
    pub fn step(&mut self, x: &mut f32, dt: f32) {
        *x += self.speed * self.direction * dt;
        if (*x - self.origin_x).abs() > self.range {
            self.direction = -self.direction;
        }
    }
}

/// Patrol → Countdown → Exploded, or Defused when killed first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FuseState {
    Patrol,
    /// Armed; detonates when this runs out
    Countdown { remaining: f32 },
    /// Detonated (terminal)
    Exploded,
    /// Taken out before detonating (terminal)
    Defused,
}

impl FuseState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FuseState::Exploded | FuseState::Defused)
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, FuseState::Countdown { .. })
    }

    /// Light the fuse. Only works from Patrol.
    pub fn arm(&mut self, duration: f32) -> bool {
        if *self != FuseState::Patrol {
            return false;
        }
        *self = FuseState::Countdown { remaining: duration };
        true
    }

    /// Body contact: cut the countdown to at most `remaining`, arming first if
    /// still on patrol. True when the countdown got shorter.
    pub fn fast_forward(&mut self, remaining: f32) -> bool {
        match *self {
            FuseState::Patrol => self.arm(remaining),
            FuseState::Countdown { remaining: left } if left > remaining => {
                *self = FuseState::Countdown { remaining };
                true
            }
            _ => false,
        }
    }

    /// Skip the countdown entirely (blown up by a projectile). True when this
    /// call caused the detonation.
    pub fn detonate(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = FuseState::Exploded;
        true
    }

    pub fn defuse(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = FuseState::Defused;
        true
    }

    /// Advance the countdown; true on the frame it detonates
    pub fn tick(&mut self, dt: f32) -> bool {
        if let FuseState::Countdown { remaining } = self {
            if tick_timer(remaining, dt) {
                *self = FuseState::Exploded;
                return true;
            }
        }
        false
    }
}

/// Idle → Approach → Dead
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossState {
    /// Entrance pause before chasing
    Idle { remaining: f32 },
    Approach,
    Dead,
}

impl BossState {
    pub fn new(entrance: f32) -> Self {
        if entrance > 0.0 {
            BossState::Idle { remaining: entrance }
        } else {
            BossState::Approach
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if let BossState::Idle { remaining } = self {
            if tick_timer(remaining, dt) {
                *self = BossState::Approach;
            }
        }
    }

    pub fn is_chasing(&self) -> bool {
        *self == BossState::Approach
    }

    /// Enter Dead. True exactly once, which is when the completion callback
    /// should fire.
    pub fn kill(&mut self) -> bool {
        if *self == BossState::Dead {
            return false;
        }
        *self = BossState::Dead;
        true
    }
}

/// Uniform view of anything a healer can latch onto
pub trait Targetable<V> {
    fn position(&self) -> V;

    fn health(&self) -> Option<Health>;

    /// Returns the amount actually restored
    fn apply_heal(&mut self, amount: i32) -> i32;

    fn is_valid_target(&self) -> bool {
        self.health().is_some_and(|h| !h.is_dead())
    }
}

/// Healer tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealerTiming {
    pub speed: f32,
    /// Start coiling inside this distance
    pub coil_distance: f32,
    pub orbit_radius: f32,
    /// Radians per second
    pub orbit_rate: f32,
    /// Fraction of the gap to the orbit point closed per frame
    pub orbit_lerp: f32,
    pub heal_interval: f32,
    pub heal_amount: i32,
}

impl Default for HealerTiming {
    fn default() -> Self {
        Self {
            speed: 5.0,
            coil_distance: 2.0,
            orbit_radius: 1.5,
            orbit_rate: 2.0,
            orbit_lerp: 0.1,
            heal_interval: 8.0,
            heal_amount: 1,
        }
    }
}

/// Searching → Coiling → Searching
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HealerState {
    /// Heading for `target` (if any)
    Searching { target: Option<ActorId> },
    /// Orbiting `target`, healing it every `heal_in` seconds
    Coiling { target: ActorId, angle: f32, heal_in: f32 },
}

impl Default for HealerState {
    fn default() -> Self {
        HealerState::Searching { target: None }
    }
}

impl HealerState {
    pub fn is_coiling(&self) -> bool {
        matches!(self, HealerState::Coiling { .. })
    }
}

/// Closest candidate; ties go to the earliest in iteration order
pub fn nearest<V: Vector>(from: V, candidates: impl IntoIterator<Item = (ActorId, V)>) -> Option<ActorId> {
    let mut best: Option<(ActorId, f32)> = None;
    for (id, pos) in candidates {
        let d = from.distance_to(pos);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((id, d));
        }
    }
    best.map(|(id, _)| id)
}
