//! Actor building blocks shared by both games
//!
//! Every simulated entity carries a `Body` (where it is and how big), an
//! optional `Health`, and a variant-specific state machine owned by the game
//! module. Cross-actor relations go through `ActorId` lookups, never references.

use serde::{Deserialize, Serialize};

use super::geom::Vector;
use crate::consts::TIMER_EPSILON;

/// Roster handle. Ids are handed out monotonically and never reused, so an id
/// that outlives its actor simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every actor variant in either game
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Player,

    // Platformer
    /// Pacing biscuit enemy, defeated by an attack
    PacingEnemy,
    /// Lunging biscuit, collected by an attack
    Biscuit,
    /// Proximity-fused chocolate square
    ChocolateBomb,

    // Arena
    /// Chases the player, spawned on a timer
    Carrot,
    /// Stationary peanut spawner
    PeanutJar,
    Peanut,
    /// Orbits and heals jars or cupcakes
    LollySnake,
    /// Hops toward the player
    Cupcake,
    /// Chasing chocolate with a proximity fuse
    Chocolate,
    RoastChicken,
    FlourBag,
    Pickle,
    BoneSpear,
    /// Thrown egg bomb in flight
    Egg,
    EggPickup,

    /// Area-effect burst (egg, shockwave, chocolate)
    Blast,
}

impl ActorKind {
    pub fn is_boss(self) -> bool {
        matches!(self, ActorKind::RoastChicken | ActorKind::FlourBag)
    }

    pub fn is_projectile(self) -> bool {
        matches!(self, ActorKind::Pickle | ActorKind::BoneSpear)
    }
}

/// Tick a countdown; true once it has run out
#[inline]
pub fn tick_timer(remaining: &mut f32, dt: f32) -> bool {
    *remaining -= dt;
    *remaining <= TIMER_EPSILON
}

/// Outcome of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Nothing changed (invulnerable, already dead, zero damage)
    Ignored,
    /// Health went down but is still above zero
    Hurt,
    /// This application took health to zero
    Killed,
}

impl DamageOutcome {
    pub fn landed(self) -> bool {
        self != DamageOutcome::Ignored
    }
}

/// Integer hit points clamped to `[0, max]`. Zero is terminal: no heal brings
/// it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    /// Start below max (a wounded jar, a test fixture)
    pub fn with_current(current: i32, max: i32) -> Self {
        let max = max.max(1);
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    #[inline]
    pub fn current(&self) -> i32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> i32 {
        self.max
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.current == 0
    }

    pub fn damage(&mut self, amount: i32) -> DamageOutcome {
        if self.is_dead() || amount <= 0 {
            return DamageOutcome::Ignored;
        }
        self.current = (self.current - amount).max(0);
        if self.current == 0 {
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt
        }
    }

    /// Returns the amount actually restored
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.is_dead() || amount <= 0 {
            return 0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Drop straight to zero (fall-off, boss wipe)
    pub fn kill(&mut self) -> DamageOutcome {
        if self.is_dead() {
            DamageOutcome::Ignored
        } else {
            self.current = 0;
            DamageOutcome::Killed
        }
    }
}

/// Spatial part of an actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body<V> {
    pub pos: V,
    pub vel: V,
    /// Circle hit radius
    pub radius: f32,
    /// Box hit half extents
    pub half_extents: V,
    /// Facing angle (radians) for the render feed
    pub yaw: f32,
    /// Cosmetic damage flash, cleared by a deferred event
    pub flash: bool,
}

impl<V: Vector> Body<V> {
    pub fn new(pos: V, radius: f32, half_extents: V) -> Self {
        Self {
            pos,
            vel: V::ORIGIN,
            radius,
            half_extents,
            yaw: 0.0,
            flash: false,
        }
    }

    pub fn circle(pos: V, radius: f32) -> Self {
        Self::new(pos, radius, V::ORIGIN)
    }

    /// Integrate velocity
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }
}

/// Player combat status: health, invulnerability window, attack overlay, death.
///
/// Movement lives in the game-specific controller; this part is identical in
/// both games.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub health: Health,
    /// Seconds of invulnerability left
    pub invuln: f32,
    /// Seconds left on the current attack (0 = not attacking)
    pub attack_timer: f32,
    /// Alternates every attack (punch/kick, cosmetic)
    pub attack_alternate: bool,
    /// Seconds since death, drives the death animation
    pub dead_for: Option<f32>,
}

impl Vitals {
    pub fn new(max_health: i32) -> Self {
        Self {
            health: Health::new(max_health),
            invuln: 0.0,
            attack_timer: 0.0,
            attack_alternate: false,
            dead_for: None,
        }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead_for.is_some()
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invuln > 0.0
    }

    #[inline]
    pub fn is_attacking(&self) -> bool {
        self.attack_timer > 0.0
    }

    /// Start an attack on the key edge. Ignored while one is running.
    pub fn start_attack(&mut self, duration: f32) -> bool {
        if self.is_dead() || self.is_attacking() {
            return false;
        }
        self.attack_timer = duration;
        self.attack_alternate = !self.attack_alternate;
        true
    }

    /// Advance overlay timers
    pub fn tick(&mut self, dt: f32) {
        if let Some(t) = self.dead_for.as_mut() {
            *t += dt;
            return;
        }
        if self.invuln > 0.0 {
            self.invuln = (self.invuln - dt).max(0.0);
        }
        if self.attack_timer > 0.0 && tick_timer(&mut self.attack_timer, dt) {
            self.attack_timer = 0.0;
        }
    }

    /// Damage entry point. No-op while invulnerable or dead; otherwise
    /// subtracts, opens the invulnerability window, and reports death.
    pub fn take_damage(&mut self, amount: i32, invuln_window: f32) -> DamageOutcome {
        if self.is_dead() || self.is_invulnerable() {
            return DamageOutcome::Ignored;
        }
        let outcome = self.health.damage(amount);
        if outcome.landed() {
            self.invuln = invuln_window;
        }
        if outcome == DamageOutcome::Killed {
            self.die();
        }
        outcome
    }

    /// Lethal hazard that isn't a collision (falling off the level)
    pub fn kill(&mut self) -> DamageOutcome {
        let outcome = self.health.kill();
        if outcome == DamageOutcome::Killed {
            self.die();
        }
        outcome
    }

    fn die(&mut self) {
        self.attack_timer = 0.0;
        self.invuln = 0.0;
        self.dead_for = Some(0.0);
    }
}
