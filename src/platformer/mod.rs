//! Side-scrolling platformer
//!
//! A gingerbread runner crosses a fixed course of platforms, beating pacing
//! enemies, collecting lunging biscuits and dodging (or defusing) chocolate
//! bombs. Collecting every biscuit wins; falling off or running out of health
//! ends the run.

pub mod state;
pub mod tick;

pub use state::{Actor, Deferred, PlatformerState, Role, Runner};
pub use tick::{demo_input, tick};
