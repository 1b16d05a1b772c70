//! Platformer session state
//!
//! Screen space, +y down. Actor positions are box/circle centers; the
//! course layout stores platform rects top-left anchored.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::settings::Settings;
use crate::sim::behavior::{FuseState, LungeState, Pacer};
use crate::sim::events::{GameEvent, RenderItem, VisualState};
use crate::sim::geom::Rect;
use crate::sim::{
    ActorId, ActorKind, Body, Counters, DamageOutcome, PhaseGate, Resource, Roster, RosterEntry,
    Scheduler, SessionPhase, Vitals,
};
use crate::tuning::PlatformerTuning;

/// Variant-specific state
#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    /// Paces; beaten by an attack, hurts on touch otherwise
    Enemy { pacer: Pacer },
    /// Paces and lunges; collected by an attack
    Biscuit { pacer: Pacer, lunge: LungeState<Vec2> },
    /// Patrols until the player comes close, then counts down
    Bomb { pacer: Pacer, fuse: FuseState },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub body: Body<Vec2>,
    pub role: Role,
    /// Beaten, collected or defused
    pub done: bool,
}

impl RosterEntry for Actor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn is_terminal(&self) -> bool {
        self.done
            || match &self.role {
                Role::Bomb { fuse, .. } => fuse.is_terminal(),
                _ => false,
            }
    }
}

impl Actor {
    pub fn visual(&self) -> VisualState {
        if self.done {
            return VisualState::Dead;
        }
        match &self.role {
            Role::Enemy { .. } => VisualState::Moving,
            Role::Biscuit { lunge, .. } => match lunge {
                LungeState::Idle { .. } => VisualState::Moving,
                LungeState::Readying { .. } => VisualState::Telegraph,
                LungeState::Lunging { .. } => VisualState::Attacking,
                LungeState::Recovering { .. } => VisualState::Recovering,
            },
            Role::Bomb { fuse, .. } => match fuse {
                FuseState::Patrol => VisualState::Moving,
                FuseState::Countdown { .. } => VisualState::Arming,
                FuseState::Exploded => VisualState::Exploding,
                FuseState::Defused => VisualState::Dead,
            },
        }
    }
}

/// The gingerbread player
#[derive(Debug, Clone, PartialEq)]
pub struct Runner {
    pub id: ActorId,
    pub body: Body<Vec2>,
    pub vitals: Vitals,
    pub grounded: bool,
    /// +1 facing right, -1 left
    pub facing: f32,
}

impl Runner {
    /// Top-left anchored box for platform resolution
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.body.pos, self.body.half_extents)
    }

    pub fn visual(&self) -> VisualState {
        if self.vitals.is_dead() {
            VisualState::Dead
        } else if self.vitals.is_attacking() {
            VisualState::Attacking
        } else if self.body.flash {
            VisualState::Flashing
        } else if !self.grounded {
            VisualState::Airborne
        } else if self.body.vel.x != 0.0 {
            VisualState::Moving
        } else {
            VisualState::Idle
        }
    }
}

/// Deferred one-shots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// End of the runner's hit flash. Course actors never flash; they are
    /// beaten in one hit.
    ClearPlayerFlash,
}

/// Whole platformer session
#[derive(Debug, Clone)]
pub struct PlatformerState {
    pub tuning: PlatformerTuning,
    pub settings: Settings,
    pub phase: SessionPhase,
    pub player: Runner,
    pub roster: Roster<Actor>,
    pub counters: Counters,
    /// Opens once every biscuit is collected
    pub gate: PhaseGate,
    pub(crate) scheduler: Scheduler<Deferred>,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    /// Seconds of play
    pub time: f32,
    /// Frames simulated
    pub frame: u64,
}

impl PlatformerState {
    pub fn new(tuning: PlatformerTuning, settings: Settings, seed: u64) -> Self {
        let mut roster = Roster::new();
        let player_id = roster.allocate_id();
        let player = Self::fresh_runner(&tuning, player_id);
        let gate = PhaseGate::on_resource(Resource::Biscuits, tuning.course.biscuits.len().max(1) as u32);
        Self {
            tuning,
            settings,
            phase: SessionPhase::Menu,
            player,
            roster,
            counters: Counters::new(),
            gate,
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            time: 0.0,
            frame: 0,
        }
    }

    fn fresh_runner(tuning: &PlatformerTuning, id: ActorId) -> Runner {
        let stats = tuning.stats.get(ActorKind::Player);
        Runner {
            id,
            body: Body::new(tuning.course.player_spawn, stats.radius, stats.half_extents),
            vitals: Vitals::new(stats.health.unwrap_or(100)),
            grounded: false,
            facing: 1.0,
        }
    }

    /// Menu → Playing: populate the course
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Menu {
            return;
        }
        self.player = Self::fresh_runner(&self.tuning, self.player.id);

        let course = self.tuning.course.clone();
        for pos in &course.biscuits {
            self.spawn_actor(ActorKind::Biscuit, *pos);
        }
        for patrol in &course.enemies {
            let id = self.spawn_actor(ActorKind::PacingEnemy, patrol.pos);
            if let Some(Actor {
                role: Role::Enemy { pacer },
                ..
            }) = self.roster.get_mut(id)
            {
                pacer.range = patrol.range;
            }
        }
        for pos in &course.bombs {
            self.spawn_actor(ActorKind::ChocolateBomb, *pos);
        }

        self.counters.start_level();
        self.counters.set_resource(Resource::Biscuits, 0, &mut self.events);
        self.events.push(GameEvent::HealthChanged {
            health: self.player.vitals.health.current(),
        });
        self.set_phase(SessionPhase::Playing { level: 1 });
        log::info!(
            "Course started: {} biscuits, {} enemies, {} bombs",
            course.biscuits.len(),
            course.enemies.len(),
            course.bombs.len()
        );
    }

    /// Append an actor with its default role at `pos` (center)
    pub fn spawn_actor(&mut self, kind: ActorKind, pos: Vec2) -> ActorId {
        let stats = self.tuning.stats.get(kind);
        let role = match kind {
            ActorKind::Biscuit => Role::Biscuit {
                pacer: Pacer::new(pos.x, self.tuning.biscuit_patrol.range, self.tuning.biscuit_patrol.speed),
                lunge: LungeState::new(&self.tuning.lunge, &mut self.rng),
            },
            ActorKind::ChocolateBomb => Role::Bomb {
                pacer: Pacer::new(pos.x, self.tuning.bomb.patrol.range, self.tuning.bomb.patrol.speed),
                fuse: FuseState::Patrol,
            },
            _ => Role::Enemy {
                pacer: Pacer::new(pos.x, 100.0, self.tuning.enemy_speed),
            },
        };
        let kind = match role {
            Role::Enemy { .. } => ActorKind::PacingEnemy,
            _ => kind,
        };
        let id = self.roster.spawn(|id| Actor {
            id,
            kind,
            body: Body::new(pos, stats.radius, stats.half_extents),
            role,
            done: false,
        });
        log::debug!("Spawned {kind:?} {id} at ({:.0}, {:.0})", pos.x, pos.y);
        self.events.push(GameEvent::ActorSpawned { id, kind });
        id
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase == phase {
            return;
        }
        log::info!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.events.push(GameEvent::PhaseChanged { phase });
    }

    /// Damage entry point for the player. Returns whether damage landed.
    pub fn damage_player(&mut self, amount: i32) -> bool {
        let outcome = self
            .player
            .vitals
            .take_damage(amount, self.tuning.runner.invuln_window);
        self.after_player_hit(outcome, amount)
    }

    /// Falling off the course; not a collision, so invulnerability doesn't help
    pub(crate) fn kill_player(&mut self) {
        let before = self.player.vitals.health.current();
        let outcome = self.player.vitals.kill();
        self.after_player_hit(outcome, before);
    }

    fn after_player_hit(&mut self, outcome: DamageOutcome, amount: i32) -> bool {
        if !outcome.landed() {
            return false;
        }
        let health = self.player.vitals.health.current();
        self.events.push(GameEvent::PlayerDamaged { amount, health });
        self.events.push(GameEvent::HealthChanged { health });
        self.player.body.flash = true;
        self.scheduler
            .schedule(self.tuning.flash_duration, Deferred::ClearPlayerFlash);
        if outcome == DamageOutcome::Killed {
            log::info!("Player died at x={:.0}", self.player.body.pos.x);
            self.events.push(GameEvent::PlayerDied);
            self.set_phase(SessionPhase::GameOver);
        }
        true
    }

    pub(crate) fn apply_deferred(&mut self, effect: Deferred) {
        match effect {
            Deferred::ClearPlayerFlash => self.player.body.flash = false,
        }
    }

    pub fn render_feed(&self) -> Vec<RenderItem<Vec2>> {
        let player = RenderItem {
            id: self.player.id,
            kind: ActorKind::Player,
            position: self.player.body.pos,
            rotation: if self.player.facing < 0.0 { std::f32::consts::PI } else { 0.0 },
            visual: self.player.visual(),
        };
        std::iter::once(player)
            .chain(self.roster.iter_present().map(|a| RenderItem {
                id: a.id,
                kind: a.kind,
                position: a.body.pos,
                rotation: a.body.yaw,
                visual: a.visual(),
            }))
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn biscuits(&self) -> u32 {
        self.counters.resource(Resource::Biscuits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_populates_course() {
        let mut state = PlatformerState::new(PlatformerTuning::default(), Settings::default(), 1);
        assert_eq!(state.phase, SessionPhase::Menu);
        state.start();
        assert_eq!(state.phase, SessionPhase::Playing { level: 1 });
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::Biscuit), 9);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::PacingEnemy), 4);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::ChocolateBomb), 4);

        // Second start is ignored
        state.start();
        assert_eq!(state.roster.len(), 17);
    }

    #[test]
    fn test_damage_player_flash_and_death() {
        let mut state = PlatformerState::new(PlatformerTuning::default(), Settings::default(), 1);
        state.start();
        state.drain_events();

        assert!(state.damage_player(60));
        assert!(state.player.body.flash);
        assert!(!state.damage_player(60));

        state.player.vitals.invuln = 0.0;
        assert!(state.damage_player(60));
        assert_eq!(state.phase, SessionPhase::GameOver);
        let events = state.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::PlayerDied).count(), 1);
    }

    #[test]
    fn test_render_feed_includes_player_first() {
        let mut state = PlatformerState::new(PlatformerTuning::default(), Settings::default(), 1);
        state.start();
        let feed = state.render_feed();
        assert_eq!(feed[0].kind, ActorKind::Player);
        assert_eq!(feed.len(), 18);
    }
}
