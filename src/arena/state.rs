//! Arena session state
//!
//! World space, +y up, the floor at `ground_y`. Every hazard, projectile,
//! pickup and blast lives in one roster; the player is held separately.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::settings::Settings;
use crate::sim::behavior::{BossState, FuseState, HealerState};
use crate::sim::events::{GameEvent, RenderItem, VisualState};
use crate::sim::{
    ActorId, ActorKind, Body, Counters, DamageOutcome, Health, PhaseGate, Resource, Roster,
    RosterEntry, Scheduler, SessionPhase, Targetable, Vitals, yaw_forward,
};
use crate::tuning::{ArenaLevel, ArenaTuning, GateAction};

/// Uniform draw from `[min, max)`, or `min` for an empty range
pub(crate) fn draw(rng: &mut Pcg32, min: f32, max: f32) -> f32 {
    if max > min { rng.random_range(min..max) } else { min }
}

/// Yaw that faces along `dir` (yaw 0 faces +z)
#[inline]
pub(crate) fn yaw_of(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

/// Where a blast came from decides who it can hurt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlastSource {
    /// Thrown egg bursting on the floor
    Egg,
    /// Player landing from a jump
    Shockwave,
    /// Chocolate detonation, hurts the player
    Chocolate,
}

/// Variant-specific state
#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    /// Walks straight at the player (carrots, peanuts)
    Chaser { speed: f32 },
    /// Static peanut spawner. `ring_slot` is its slot in the level's jar ring.
    Jar { peanut_in: f32, ring_slot: Option<usize> },
    Healer(HealerState),
    /// Waits, then hops at the player
    Hopper { hop_in: f32, airborne: bool },
    Chocolate { speed: f32, fuse: FuseState },
    Boss { state: BossState, hover_height: f32, speed: f32 },
    /// Pickle or bone spear in flight
    Projectile { damage: i32 },
    /// Egg bomb in flight
    Egg,
    Pickup,
    /// Area effect. Damage is applied once, then it lingers for the feed.
    Blast {
        source: BlastSource,
        radius: f32,
        damage: i32,
        applied: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub body: Body<Vec3>,
    pub health: Option<Health>,
    pub role: Role,
    /// Consumed, burst or collected
    pub done: bool,
}

impl RosterEntry for Actor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn is_terminal(&self) -> bool {
        if self.done || self.health.is_some_and(|h| h.is_dead()) {
            return true;
        }
        match &self.role {
            Role::Chocolate { fuse, .. } => fuse.is_terminal(),
            Role::Boss { state, .. } => *state == BossState::Dead,
            _ => false,
        }
    }
}

impl Targetable<Vec3> for Actor {
    fn position(&self) -> Vec3 {
        self.body.pos
    }

    fn health(&self) -> Option<Health> {
        self.health
    }

    fn apply_heal(&mut self, amount: i32) -> i32 {
        match self.health.as_mut() {
            Some(h) if !self.done => h.heal(amount),
            _ => 0,
        }
    }

    fn is_valid_target(&self) -> bool {
        !self.is_terminal() && self.health.is_some_and(|h| !h.is_dead())
    }
}

impl Actor {
    /// Anything the player's weapons can hit
    pub fn is_hazard(&self) -> bool {
        self.health.is_some()
            && matches!(
                self.role,
                Role::Chaser { .. }
                    | Role::Jar { .. }
                    | Role::Healer(_)
                    | Role::Hopper { .. }
                    | Role::Chocolate { .. }
                    | Role::Boss { .. }
            )
    }

    pub fn visual(&self) -> VisualState {
        if self.is_terminal() {
            return match self.role {
                Role::Chocolate { .. } => VisualState::Exploding,
                _ => VisualState::Dead,
            };
        }
        if self.body.flash {
            return VisualState::Flashing;
        }
        match &self.role {
            Role::Chaser { .. } | Role::Projectile { .. } | Role::Egg => VisualState::Moving,
            Role::Jar { .. } | Role::Pickup => VisualState::Idle,
            Role::Healer(h) if h.is_coiling() => VisualState::Coiling,
            Role::Healer(_) => VisualState::Moving,
            Role::Hopper { airborne: true, .. } => VisualState::Airborne,
            Role::Hopper { .. } => VisualState::Idle,
            Role::Chocolate { fuse, .. } if fuse.is_armed() => VisualState::Arming,
            Role::Chocolate { .. } => VisualState::Moving,
            Role::Boss { state, .. } if state.is_chasing() => VisualState::Attacking,
            Role::Boss { .. } => VisualState::Telegraph,
            Role::Blast { .. } => VisualState::Exploding,
        }
    }
}

/// The burger
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    pub id: ActorId,
    pub body: Body<Vec3>,
    pub vitals: Vitals,
    pub grounded: bool,
    /// In the air from a jump (landing sends a shockwave)
    pub jumping: bool,
    /// Cleared on a bomb press, restored by a deferred event
    pub bomb_ready: bool,
    /// Seconds of spear charge while the special key is held
    pub charge: Option<f32>,
    pub has_spear: bool,
}

impl Tank {
    pub fn forward(&self) -> Vec3 {
        yaw_forward(self.body.yaw)
    }

    pub fn visual(&self) -> VisualState {
        if self.vitals.is_dead() {
            VisualState::Dead
        } else if self.body.flash {
            VisualState::Flashing
        } else if self.charge.is_some() {
            VisualState::Telegraph
        } else if !self.grounded {
            VisualState::Airborne
        } else {
            VisualState::Idle
        }
    }
}

/// Deferred one-shots. Every payload names its actor by id, so an effect
/// whose actor is gone does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    ClearFlash(ActorId),
    /// Lifetime ran out (projectiles, lingering blasts)
    Despawn(ActorId),
    BombReady,
    LoadLevel(u8),
}

/// Jar ring slot: where it sits and which jar holds it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSlot {
    pub pos: Vec3,
    pub jar: Option<ActorId>,
}

/// Whole arena session
#[derive(Debug, Clone)]
pub struct ArenaState {
    pub tuning: ArenaTuning,
    pub settings: Settings,
    pub phase: SessionPhase,
    /// Level currently loaded (1-based, 0 before the first load)
    pub level: u8,
    pub player: Tank,
    pub roster: Roster<Actor>,
    pub counters: Counters,
    pub gate: PhaseGate,
    pub boss: Option<ActorId>,
    /// Timed hazard spawning (carrots, jar refills)
    pub spawning: bool,
    pub(crate) carrot_in: f32,
    pub(crate) refill_in: f32,
    pub(crate) ring: Vec<RingSlot>,
    pub(crate) scheduler: Scheduler<Deferred>,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    pub time: f32,
    pub frame: u64,
}

impl ArenaState {
    pub fn new(tuning: ArenaTuning, settings: Settings, seed: u64) -> Self {
        let mut roster = Roster::new();
        let player_id = roster.allocate_id();
        let player = Self::fresh_tank(&tuning, player_id);
        let mut counters = Counters::new();
        counters.set_ceiling(Resource::Eggs, tuning.tank.max_eggs);
        Self {
            tuning,
            settings,
            phase: SessionPhase::Menu,
            level: 0,
            player,
            roster,
            counters,
            gate: PhaseGate::default(),
            boss: None,
            spawning: false,
            carrot_in: 0.0,
            refill_in: 0.0,
            ring: Vec::new(),
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            time: 0.0,
            frame: 0,
        }
    }

    fn fresh_tank(tuning: &ArenaTuning, id: ActorId) -> Tank {
        let stats = tuning.stats.get(ActorKind::Player);
        let spawn = tuning.level(1).map(|l| l.player_spawn).unwrap_or(Vec3::ZERO);
        Tank {
            id,
            body: Body::circle(spawn, stats.radius),
            vitals: Vitals::new(stats.health.unwrap_or(100)),
            grounded: spawn.y <= tuning.tank.ground_y,
            jumping: false,
            bomb_ready: true,
            charge: None,
            has_spear: false,
        }
    }

    /// Menu → Playing on level 1
    pub fn start(&mut self) {
        self.start_at_level(1);
    }

    /// Level select. Levels past the first start without the spear, as they
    /// do when picked from the menu.
    pub fn start_at_level(&mut self, level: u8) {
        if self.phase != SessionPhase::Menu || self.tuning.level(level).is_none() {
            return;
        }
        self.player = Self::fresh_tank(&self.tuning, self.player.id);
        self.counters
            .set_resource(Resource::Eggs, self.tuning.tank.start_eggs, &mut self.events);
        self.events.push(GameEvent::HealthChanged {
            health: self.player.vitals.health.current(),
        });
        self.load_level(level);
    }

    /// Tear down the roster and build `level` from its plan
    pub fn load_level(&mut self, level: u8) {
        let Some(plan) = self.tuning.level(level).cloned() else {
            log::warn!("No arena level {level}");
            return;
        };
        self.roster.remove_where(|_| true);
        self.level = level;
        self.boss = None;
        self.gate = PhaseGate::new(plan.gate.clone());
        self.counters.start_level();
        self.spawning = plan.carrot_interval.is_some();
        self.carrot_in = plan.carrot_interval.unwrap_or(0.0);
        self.refill_in = self.tuning.jar.refill_interval;

        let tank = &mut self.player;
        tank.body.pos = plan.player_spawn;
        tank.body.vel = Vec3::ZERO;
        tank.body.yaw = 0.0;
        tank.grounded = plan.player_spawn.y <= self.tuning.tank.ground_y;
        tank.jumping = false;
        tank.charge = None;
        // Pending flash and debounce timers die with the queue
        tank.body.flash = false;
        tank.bomb_ready = true;
        self.scheduler.clear();

        self.populate(&plan);

        self.events.push(GameEvent::Announcement { text: plan.name.clone() });
        self.set_phase(SessionPhase::Playing { level });
        log::info!("Loaded {} ({} actors)", plan.name, self.roster.count_where(|_| true));
    }

    fn populate(&mut self, plan: &ArenaLevel) {
        self.ring.clear();
        if let Some(ring) = plan.jar_ring {
            for i in 0..ring.count {
                let angle = i as f32 / ring.count as f32 * TAU;
                let radius = draw(&mut self.rng, ring.radius_min, ring.radius_max);
                let pos = Vec3::new(angle.sin() * radius, ring.height, angle.cos() * radius);
                let slot = self.ring.len();
                let jar = self.spawn_jar(pos, Some(slot));
                self.ring.push(RingSlot { pos, jar: Some(jar) });
            }
        }
        for _ in 0..plan.snakes {
            let pos = self.scatter(plan.snake_spread, 1.0);
            self.spawn_actor(ActorKind::LollySnake, pos);
        }
        for _ in 0..plan.cupcakes {
            let pos = self.scatter(plan.cupcake_spread, self.tuning.cupcake.rest_height);
            self.spawn_actor(ActorKind::Cupcake, pos);
        }
        for _ in 0..plan.chocolates {
            let pos = self.scatter(plan.chocolate_spread, self.tuning.tank.ground_y);
            self.spawn_actor(ActorKind::Chocolate, pos);
        }
    }

    /// Random point within ±spread/2 on x and z
    fn scatter(&mut self, spread: f32, height: f32) -> Vec3 {
        let half = spread / 2.0;
        let x = draw(&mut self.rng, -half, half);
        let z = draw(&mut self.rng, -half, half);
        Vec3::new(x, height, z)
    }

    /// Random point within `radius` of the center
    pub(crate) fn near_center(&mut self, radius: f32, height: f32) -> Vec3 {
        let angle = draw(&mut self.rng, 0.0, TAU);
        let r = draw(&mut self.rng, 0.0, radius);
        Vec3::new(angle.sin() * r, height, angle.cos() * r)
    }

    pub(crate) fn spawn_jar(&mut self, pos: Vec3, ring_slot: Option<usize>) -> ActorId {
        let id = self.spawn_actor(ActorKind::PeanutJar, pos);
        if let Some(Actor {
            role: Role::Jar { ring_slot: slot, .. },
            ..
        }) = self.roster.get_mut(id)
        {
            *slot = ring_slot;
        }
        id
    }

    /// Append an actor with its default role at `pos`
    pub fn spawn_actor(&mut self, kind: ActorKind, pos: Vec3) -> ActorId {
        let stats = self.tuning.stats.get(kind);
        let role = match kind {
            ActorKind::Carrot => Role::Chaser {
                speed: draw(&mut self.rng, self.tuning.carrot.speed_min, self.tuning.carrot.speed_max),
            },
            ActorKind::Peanut => Role::Chaser { speed: stats.speed },
            ActorKind::PeanutJar => Role::Jar {
                peanut_in: self.tuning.jar.peanut_interval,
                ring_slot: None,
            },
            ActorKind::LollySnake => Role::Healer(HealerState::default()),
            ActorKind::Cupcake => Role::Hopper {
                hop_in: draw(&mut self.rng, 0.0, self.tuning.cupcake.first_delay_max),
                airborne: false,
            },
            ActorKind::Chocolate => Role::Chocolate {
                speed: draw(
                    &mut self.rng,
                    self.tuning.chocolate.speed_min,
                    self.tuning.chocolate.speed_max,
                ),
                fuse: FuseState::Patrol,
            },
            ActorKind::RoastChicken | ActorKind::FlourBag => Role::Boss {
                state: BossState::Approach,
                hover_height: pos.y,
                speed: stats.speed,
            },
            k if k.is_projectile() => Role::Projectile {
                damage: stats.hit_damage,
            },
            ActorKind::Egg => Role::Egg,
            ActorKind::Blast => Role::Blast {
                source: BlastSource::Egg,
                radius: 0.0,
                damage: 0,
                applied: false,
            },
            // Egg pickups; the player and platformer kinds never enter this roster
            _ => Role::Pickup,
        };
        let id = self.roster.spawn(|id| Actor {
            id,
            kind,
            body: Body::circle(pos, stats.radius),
            health: stats.health.map(Health::new),
            role,
            done: false,
        });
        log::debug!("Spawned {kind:?} {id} at ({:.1}, {:.1}, {:.1})", pos.x, pos.y, pos.z);
        self.events.push(GameEvent::ActorSpawned { id, kind });
        id
    }

    /// Launch a projectile from `pos` along `dir`, despawning after `lifetime`
    pub(crate) fn spawn_projectile(&mut self, kind: ActorKind, pos: Vec3, vel: Vec3, lifetime: f32) -> ActorId {
        let id = self.spawn_actor(kind, pos);
        if let Some(actor) = self.roster.get_mut(id) {
            actor.body.vel = vel;
            if let Some(dir) = vel.try_normalize() {
                actor.body.yaw = yaw_of(dir);
            }
        }
        self.scheduler.schedule(lifetime, Deferred::Despawn(id));
        id
    }

    pub(crate) fn spawn_blast(&mut self, source: BlastSource, center: Vec3) -> ActorId {
        let (radius, damage, linger) = match source {
            BlastSource::Egg => (
                self.tuning.egg.blast_radius,
                self.tuning.egg.blast_damage,
                self.tuning.egg.blast_linger,
            ),
            BlastSource::Shockwave => (
                self.tuning.egg.shockwave_radius,
                self.tuning.egg.blast_damage,
                self.tuning.egg.blast_linger,
            ),
            BlastSource::Chocolate => (
                self.tuning.chocolate.blast_radius,
                self.tuning.chocolate.blast_damage,
                self.tuning.chocolate.linger,
            ),
        };
        let id = self.spawn_actor(ActorKind::Blast, center);
        if let Some(actor) = self.roster.get_mut(id) {
            actor.body.radius = radius;
            actor.role = Role::Blast {
                source,
                radius,
                damage,
                applied: false,
            };
        }
        self.scheduler.schedule(linger, Deferred::Despawn(id));
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
            .take_damage(amount, self.tuning.tank.invuln_window);
        self.after_player_hit(outcome, amount)
    }

    /// Fell off the table; bypasses invulnerability
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
            .schedule(self.tuning.flash_duration, Deferred::ClearFlash(self.player.id));
        if outcome == DamageOutcome::Killed {
            log::info!("Player died on level {}", self.level);
            self.player.charge = None;
            self.events.push(GameEvent::PlayerDied);
            self.set_phase(SessionPhase::GameOver);
        }
        true
    }

    /// Damage a hazard. Kill bookkeeping runs once per actor: a second call
    /// on a dead or removed id is ignored.
    pub fn damage_actor(&mut self, id: ActorId, amount: i32) -> DamageOutcome {
        if !self.roster.is_live(id) {
            return DamageOutcome::Ignored;
        }
        let Some(actor) = self.roster.get_mut(id) else {
            return DamageOutcome::Ignored;
        };
        let Some(health) = actor.health.as_mut() else {
            return DamageOutcome::Ignored;
        };
        let kind = actor.kind;
        let outcome = health.damage(amount);
        match outcome {
            DamageOutcome::Hurt => {
                actor.body.flash = true;
                self.scheduler
                    .schedule(self.tuning.flash_duration, Deferred::ClearFlash(id));
                let score = self.tuning.stats.get(kind).hit_score;
                self.counters.add_score(score, &mut self.events);
            }
            DamageOutcome::Killed => self.on_killed(id, kind),
            DamageOutcome::Ignored => {}
        }
        outcome
    }

    fn on_killed(&mut self, id: ActorId, kind: ActorKind) {
        self.counters.record_kill(kind);
        let score = self.tuning.stats.get(kind).kill_score;
        self.counters.add_score(score, &mut self.events);
        log::debug!("{kind:?} {id} destroyed");

        if kind == ActorKind::Chocolate {
            self.detonate_chocolate(id);
        } else if kind.is_boss() {
            self.on_boss_killed(id, kind);
        }
        self.roster.remove(id);
    }

    /// Set a chocolate off early (shot, blown up, bumped into). Returns false
    /// if it had already gone off.
    pub(crate) fn detonate_chocolate(&mut self, id: ActorId) -> bool {
        let Some(actor) = self.roster.get_mut(id) else {
            return false;
        };
        let pos = actor.body.pos;
        let fired = match &mut actor.role {
            Role::Chocolate { fuse, .. } => fuse.detonate(),
            _ => false,
        };
        if fired {
            self.chocolate_burst(id, pos);
        }
        fired
    }

    /// Aftermath of a chocolate going off: the blast, and the chocolate leaves
    pub(crate) fn chocolate_burst(&mut self, id: ActorId, pos: Vec3) {
        log::debug!("Chocolate {id} burst");
        self.spawn_blast(BlastSource::Chocolate, pos);
        self.roster.remove(id);
    }

    fn on_boss_killed(&mut self, id: ActorId, kind: ActorKind) {
        let first = match self.roster.get_mut(id) {
            Some(Actor {
                role: Role::Boss { state, .. },
                ..
            }) => state.kill(),
            _ => false,
        };
        if !first {
            return;
        }
        log::info!("{kind:?} defeated on level {}", self.level);
        self.events.push(GameEvent::BossDefeated { kind });
        self.boss = None;

        let Some(reward) = self.tuning.level(self.level).map(|l| l.reward.clone()) else {
            return;
        };
        if reward.unlock_spear {
            self.player.has_spear = true;
        }
        if !reward.announcement.is_empty() {
            self.events.push(GameEvent::Announcement {
                text: reward.announcement,
            });
        }
        let next = self.level.saturating_add(1);
        if self.tuning.level(next).is_some() {
            self.set_phase(SessionPhase::LevelClear { next_level: next });
            self.scheduler
                .schedule(reward.next_level_delay, Deferred::LoadLevel(next));
        } else {
            self.set_phase(SessionPhase::Victory);
        }
    }

    /// Carry out the current level's gate action
    pub(crate) fn open_gate(&mut self) {
        let Some(action) = self.tuning.level(self.level).map(|l| l.gate_action.clone()) else {
            return;
        };
        match action {
            GateAction::SpawnBoss {
                kind,
                position,
                hover_height,
                entrance,
                clear,
                announcement,
            } => {
                self.spawning = false;
                let cleared = self.roster.remove_where(|a| clear.contains(&a.kind));
                let id = self.spawn_actor(kind, position);
                if let Some(Actor {
                    role: Role::Boss { state, hover_height: hover, .. },
                    ..
                }) = self.roster.get_mut(id)
                {
                    *state = BossState::new(entrance);
                    *hover = hover_height;
                }
                self.boss = Some(id);
                log::info!("Gate open: {kind:?} spawned, {cleared} actors cleared");
                self.events.push(GameEvent::BossSpawned { kind });
                self.events.push(GameEvent::Announcement { text: announcement });
            }
            GateAction::Victory => {
                log::info!("Final gate open on level {}", self.level);
                self.events.push(GameEvent::Announcement {
                    text: "YOU WIN!".into(),
                });
                self.set_phase(SessionPhase::Victory);
            }
        }
    }

    pub(crate) fn apply_deferred(&mut self, effect: Deferred) {
        match effect {
            Deferred::ClearFlash(id) if id == self.player.id => self.player.body.flash = false,
            Deferred::ClearFlash(id) => {
                if let Some(actor) = self.roster.get_mut(id) {
                    actor.body.flash = false;
                }
            }
            Deferred::Despawn(id) => {
                self.roster.remove(id);
            }
            Deferred::BombReady => self.player.bomb_ready = true,
            Deferred::LoadLevel(level) => {
                if self.phase == (SessionPhase::LevelClear { next_level: level }) {
                    self.load_level(level);
                }
            }
        }
    }

    pub fn eggs(&self) -> u32 {
        self.counters.resource(Resource::Eggs)
    }

    pub fn render_feed(&self) -> Vec<RenderItem<Vec3>> {
        let player = RenderItem {
            id: self.player.id,
            kind: ActorKind::Player,
            position: self.player.body.pos,
            rotation: self.player.body.yaw,
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
}
