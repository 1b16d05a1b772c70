//! Snack Attack - simulation core for two small action games
//!
//! Core modules:
//! - `sim`: Shared deterministic core (actors, roster, combat, session, events)
//! - `platformer`: Gingerbread side-scroller (2D, `Vec2`)
//! - `arena`: Burger arena shooter (3D, `Vec3`)
//! - `settings`: Runtime options (explosion policy, frame time clamps)
//! - `tuning`: Data-driven game balance

pub mod arena;
pub mod platformer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{ExplosionPolicy, Settings};
pub use tuning::{ArenaTuning, PlatformerTuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Frame time used when the host can't report one (first frame)
    pub const DEFAULT_DT: f32 = 1.0 / 60.0;
    /// Longest frame we simulate in one step (tab switches, debugger pauses)
    pub const MAX_DT: f32 = 0.1;

    /// Countdown timers expire once they are within this of zero
    pub const TIMER_EPSILON: f32 = 1e-4;
    /// Minimum separation before a direction is considered defined
    pub const MIN_DISTANCE: f32 = 1e-4;
}

/// Clamp a host-reported frame time to something the simulation can digest.
///
/// Missing, non-finite or non-positive values fall back to `default_dt`.
#[inline]
pub fn clamp_dt(raw: Option<f32>, default_dt: f32, max_dt: f32) -> f32 {
    match raw {
        Some(dt) if dt.is_finite() && dt > 0.0 => dt.min(max_dt),
        _ => default_dt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consts::*;

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(None, DEFAULT_DT, MAX_DT), DEFAULT_DT);
        assert_eq!(clamp_dt(Some(f32::NAN), DEFAULT_DT, MAX_DT), DEFAULT_DT);
        assert_eq!(clamp_dt(Some(-1.0), DEFAULT_DT, MAX_DT), DEFAULT_DT);
        assert_eq!(clamp_dt(Some(5.0), DEFAULT_DT, MAX_DT), MAX_DT);
        assert_eq!(clamp_dt(Some(0.02), DEFAULT_DT, MAX_DT), 0.02);
    }
}
