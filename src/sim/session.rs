//! Session bookkeeping shared by both games
//!
//! Phase enum, aggregate counters and the one-shot phase gates that turn those
//! counters into transitions (boss spawn, victory).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::actor::ActorKind;
use super::events::GameEvent;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting on the menu
    Menu,
    /// Active gameplay on a level (1-based)
    Playing { level: u8 },
    /// Boss down, next level loads after a pause
    LevelClear { next_level: u8 },
    /// Final level won
    Victory,
    /// Player health reached zero
    GameOver,
}

impl SessionPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionPhase::Playing { .. } | SessionPhase::LevelClear { .. })
    }

    pub fn level(&self) -> Option<u8> {
        match self {
            SessionPhase::Playing { level } => Some(*level),
            _ => None,
        }
    }
}

/// Countable player resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// Egg bombs carried (arena)
    Eggs,
    /// Biscuits collected (platformer)
    Biscuits,
}

/// Score, kill tallies and resources. Every mutation goes through here so the
/// matching UI event is never forgotten.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub score: u64,
    kills: BTreeMap<ActorKind, u32>,
    level_kills: BTreeMap<ActorKind, u32>,
    resources: BTreeMap<Resource, u32>,
    ceilings: BTreeMap<Resource, u32>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_score(&mut self, delta: u64, events: &mut Vec<GameEvent>) {
        if delta == 0 {
            return;
        }
        self.score = self.score.saturating_add(delta);
        events.push(GameEvent::ScoreChanged {
            score: self.score,
            delta,
        });
    }

    /// Record a defeat of `kind` (total and this level)
    pub fn record_kill(&mut self, kind: ActorKind) {
        *self.kills.entry(kind).or_default() += 1;
        *self.level_kills.entry(kind).or_default() += 1;
    }

    pub fn kills(&self, kind: ActorKind) -> u32 {
        self.kills.get(&kind).copied().unwrap_or(0)
    }

    pub fn level_kills(&self, kind: ActorKind) -> u32 {
        self.level_kills.get(&kind).copied().unwrap_or(0)
    }

    /// Per-level tallies restart when a new level loads
    pub fn start_level(&mut self) {
        self.level_kills.clear();
    }

    pub fn set_ceiling(&mut self, resource: Resource, max: u32) {
        self.ceilings.insert(resource, max);
        let current = self.resource(resource);
        if current > max {
            self.resources.insert(resource, max);
        }
    }

    pub fn resource(&self, resource: Resource) -> u32 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }

    /// Set a resource directly (clamped), emitting the change
    pub fn set_resource(&mut self, resource: Resource, value: u32, events: &mut Vec<GameEvent>) {
        let ceiling = self.ceilings.get(&resource).copied().unwrap_or(u32::MAX);
        let count = value.min(ceiling);
        self.resources.insert(resource, count);
        events.push(GameEvent::ResourceChanged { resource, count });
    }

    /// Add (positive) or spend (negative) a resource, clamped to `[0, ceiling]`.
    /// Returns false when spending more than is available (nothing changes).
    pub fn adjust_resource(&mut self, resource: Resource, delta: i64, events: &mut Vec<GameEvent>) -> bool {
        let current = self.resource(resource) as i64;
        if current + delta < 0 {
            return false;
        }
        self.set_resource(resource, (current + delta) as u32, events);
        true
    }
}

/// One kill-count requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    pub kind: ActorKind,
    pub at_least: u32,
}

/// What a phase gate counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateSource {
    /// Kills on the current level
    #[default]
    LevelKills,
    /// A collected resource (biscuits)
    Resource(Resource),
}

/// Threshold-based one-shot transition. Fires when every threshold holds in
/// the same evaluation, and never again after that.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhaseGate {
    thresholds: Vec<Threshold>,
    source: GateSource,
    fired: bool,
}

impl PhaseGate {
    pub fn new(thresholds: Vec<Threshold>) -> Self {
        Self {
            thresholds,
            source: GateSource::LevelKills,
            fired: false,
        }
    }

    /// Gate on a single resource count instead of kills
    pub fn on_resource(resource: Resource, at_least: u32) -> Self {
        Self {
            thresholds: vec![Threshold {
                kind: ActorKind::Player,
                at_least,
            }],
            source: GateSource::Resource(resource),
            fired: false,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    fn satisfied(&self, counters: &Counters) -> bool {
        if self.thresholds.is_empty() {
            return false;
        }
        self.thresholds.iter().all(|t| {
            let have = match self.source {
                GateSource::LevelKills => counters.level_kills(t.kind),
                GateSource::Resource(r) => counters.resource(r),
            };
            have >= t.at_least
        })
    }

    /// Evaluate the gate; true exactly once, on the first satisfying call
    pub fn check(&mut self, counters: &Counters) -> bool {
        if self.fired || !self.satisfied(counters) {
            return false;
        }
        self.fired = true;
        true
    }
}
