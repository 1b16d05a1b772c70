//! Burger arena shooter
//!
//! Three kitchen levels seen from behind a burger with tank controls. Pickles,
//! egg bombs and (after the first boss) a chargeable bone spear against
//! carrots, peanut jars, lolly snakes, cupcakes, chocolates and two bosses.
//! Kill thresholds open each level's gate.

pub mod state;
pub mod tick;

pub use state::{Actor, ArenaState, BlastSource, Deferred, Role, RingSlot, Tank};
pub use tick::{demo_input, tick};
