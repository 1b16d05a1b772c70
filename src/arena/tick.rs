//! Arena frame step
//!
//! Order: deferred effects, spawners, player, actors, heals, then combat in
//! three passes (projectiles by age, contact, blasts), the level gate and
//! finally compaction.

use glam::Vec3;
use rand::Rng;

use super::state::{Actor, ArenaState, BlastSource, Deferred, Role, draw, yaw_of};
use crate::sim::behavior::HealerTiming;
use crate::sim::combat::{BlastLedger, Candidate, ContactGuard, blast_targets, first_hit};
use crate::sim::events::{GameEvent, RenderItem};
use crate::sim::{
    ActorId, ActorKind, HealerState, Resource, SessionPhase, Simulation, Targetable, TickInput,
    Vector, bodies_touch, flat_direction, nearest, tick_timer, within_radius, yaw_forward,
};

/// Per-second rate a boss closes the gap to its hover height on entrance
const BOSS_SETTLE_RATE: f32 = 6.0;

/// Advance the arena by one frame
///
/// `dt` is the host's frame time; non-finite or non-positive values fall back
/// to the configured default and long frames are clamped.
pub fn tick(state: &mut ArenaState, input: &TickInput, dt: f32) {
    let dt = state.settings.frame_dt(Some(dt));
    let mut input = input.sanitized();
    if input.idle_mode {
        input = demo_input(state);
    }

    if state.phase == SessionPhase::Menu {
        if input.start {
            state.start();
        }
        return;
    }
    if !state.phase.is_running() {
        // Only the death animation keeps running
        state.player.vitals.tick(dt);
        return;
    }

    state.time += dt;
    state.frame += 1;

    for effect in state.scheduler.advance(dt) {
        state.apply_deferred(effect);
    }

    run_spawners(state, dt);
    update_player(state, &input, dt);

    if state.phase == SessionPhase::GameOver {
        compact(state);
        return;
    }

    let target = state.player.body.pos;
    update_actors(state, target, dt);
    resolve_projectiles(state);
    resolve_contacts(state);
    resolve_blasts(state);

    if matches!(state.phase, SessionPhase::Playing { .. }) && state.gate.check(&state.counters) {
        state.open_gate();
    }

    compact(state);
}

fn run_spawners(state: &mut ArenaState, dt: f32) {
    if state.spawning {
        let interval = state.tuning.level(state.level).and_then(|l| l.carrot_interval);
        if let Some(interval) = interval
            && tick_timer(&mut state.carrot_in, dt)
        {
            state.carrot_in = interval;
            let pos = state.near_center(state.tuning.carrot.spawn_radius, state.tuning.tank.ground_y);
            state.spawn_actor(ActorKind::Carrot, pos);
        }

        // Replace one missing ring jar per interval
        if !state.ring.is_empty() && tick_timer(&mut state.refill_in, dt) {
            state.refill_in = state.tuning.jar.refill_interval;
            let empty = state
                .ring
                .iter()
                .position(|slot| slot.jar.is_none_or(|id| !state.roster.is_live(id)));
            if let Some(slot) = empty {
                let pos = state.ring[slot].pos;
                let id = state.spawn_jar(pos, Some(slot));
                state.ring[slot].jar = Some(id);
            }
        }
    }

    let egg = state.tuning.egg;
    let pickups = state.roster.count_where(|a| a.kind == ActorKind::EggPickup);
    if pickups < egg.max_pickups && state.rng.random_bool(egg.pickup_chance.clamp(0.0, 1.0)) {
        let pos = state.near_center(egg.pickup_spread, egg.pickup_height);
        state.spawn_actor(ActorKind::EggPickup, pos);
    }
}

fn update_player(state: &mut ArenaState, input: &TickInput, dt: f32) {
    let tank = state.tuning.tank;
    let bounds = state
        .tuning
        .level(state.level)
        .map(|l| l.bounds)
        .unwrap_or_default();

    state.player.vitals.tick(dt);

    // Tank controls: axis turns, mouse adds yaw directly
    let player = &mut state.player;
    player.body.yaw -= input.move_axis * tank.turn_rate * dt + input.look_delta;
    let forward = player.forward();
    player.body.pos += forward * (input.forward_axis * tank.move_speed * dt);

    let mut want_jump = input.jump;
    if input.bomb && player.bomb_ready {
        player.bomb_ready = false;
        state
            .scheduler
            .schedule(tank.bomb_debounce, Deferred::BombReady);
        if state.counters.adjust_resource(Resource::Eggs, -1, &mut state.events) {
            throw_egg(state);
        } else {
            want_jump = true;
        }
    }

    let player = &mut state.player;
    if want_jump && player.grounded {
        player.body.vel.y = tank.jump_speed;
        player.grounded = false;
        player.jumping = true;
    }

    let on_floor = bounds.has_floor(player.body.pos);
    let mut landed = false;
    if !player.grounded || !on_floor {
        player.body.vel.y += tank.gravity * dt;
        player.body.pos.y += player.body.vel.y * dt;
        if on_floor && player.body.pos.y <= tank.ground_y && player.body.vel.y <= 0.0 {
            player.body.pos.y = tank.ground_y;
            player.body.vel.y = 0.0;
            player.grounded = true;
            landed = std::mem::take(&mut player.jumping);
        } else {
            player.grounded = false;
        }
    }
    player.body.pos = bounds.clamp(player.body.pos);

    if landed {
        let pos = state.player.body.pos;
        state.spawn_blast(BlastSource::Shockwave, pos);
    }

    if state.player.body.pos.y < tank.fall_limit {
        log::debug!("Player fell off the table");
        state.kill_player();
        return;
    }

    if input.attack {
        fire_pickle(state);
    }
    if state.player.has_spear {
        charge_spear(state, input.special_held, dt);
    }
}

fn fire_pickle(state: &mut ArenaState) {
    let pickle = state.tuning.pickle;
    let speed = state.tuning.stats.get(ActorKind::Pickle).speed;
    let forward = state.player.forward();
    let pos = state.player.body.pos + forward * pickle.muzzle_offset + Vec3::Y * pickle.muzzle_height;
    state.spawn_projectile(ActorKind::Pickle, pos, forward * speed, pickle.lifetime);
}

fn throw_egg(state: &mut ArenaState) {
    let egg = state.tuning.egg;
    let mut vel = state.player.forward() * egg.throw_speed;
    vel.y = egg.lift;
    let id = state.spawn_actor(ActorKind::Egg, state.player.body.pos);
    if let Some(actor) = state.roster.get_mut(id) {
        actor.body.vel = vel;
    }
}

/// Hold to charge, release to throw
fn charge_spear(state: &mut ArenaState, held: bool, dt: f32) {
    let spear = state.tuning.spear;
    match (held, state.player.charge) {
        (true, charge) => {
            let c = (charge.unwrap_or(0.0) + dt).min(spear.max_charge);
            state.player.charge = Some(c);
            state.events.push(GameEvent::ChargeChanged {
                percent: Some(c / spear.max_charge),
            });
        }
        (false, Some(c)) => {
            state.player.charge = None;
            let (speed, damage) = spear.release(c / spear.max_charge);
            let forward = state.player.forward();
            let pos = state.player.body.pos + Vec3::Y * state.tuning.pickle.muzzle_height;
            let id = state.spawn_projectile(ActorKind::BoneSpear, pos, forward * speed, spear.lifetime);
            if let Some(Actor {
                role: Role::Projectile { damage: d },
                ..
            }) = state.roster.get_mut(id)
            {
                *d = damage;
            }
            log::debug!("Spear thrown at {speed:.0} u/s for {damage}");
            state.events.push(GameEvent::ChargeChanged { percent: None });
        }
        (false, None) => {}
    }
}

/// Per-actor movement and timers. Runs against the player position as it
/// stands after the player moved; spawns and detonations are applied once the
/// pass is over.
fn update_actors(state: &mut ArenaState, target: Vec3, dt: f32) {
    let heal_kind = state
        .tuning
        .level(state.level)
        .map(|l| l.heal_target)
        .unwrap_or(ActorKind::PeanutJar);
    // Frame-start view of what the healers may latch onto
    let heal_targets: Vec<(ActorId, Vec3)> = state
        .roster
        .iter()
        .filter(|a| a.kind == heal_kind && a.is_valid_target())
        .map(|a| (a.id, a.position()))
        .collect();

    let tuning = &state.tuning;
    let healer = tuning.healer;
    let mut peanuts = Vec::new();
    let mut eggs_burst = Vec::new();
    let mut fuses_out = Vec::new();
    let mut heals = Vec::new();

    for actor in state.roster.iter_mut() {
        let Actor { id, body, role, done, .. } = actor;
        match role {
            Role::Chaser { speed } => {
                if let Some(dir) = flat_direction(body.pos, target) {
                    body.pos += dir * (*speed * dt);
                    body.yaw = yaw_of(dir);
                }
            }
            Role::Jar { peanut_in, .. } => {
                if tick_timer(peanut_in, dt) {
                    *peanut_in = tuning.jar.peanut_interval;
                    peanuts.push(Vec3::new(body.pos.x, 0.5, body.pos.z));
                }
            }
            Role::Healer(h) => {
                if let Some(heal) = step_healer(h, &mut body.pos, &heal_targets, &healer, dt) {
                    heals.push(heal);
                }
            }
            Role::Hopper { hop_in, airborne } => {
                let cupcake = tuning.cupcake;
                if !*airborne && tick_timer(hop_in, dt) {
                    *airborne = true;
                    let dir = flat_direction(body.pos, target).unwrap_or(Vec3::ZERO);
                    body.vel = dir * cupcake.hop_forward + Vec3::Y * cupcake.hop_speed;
                }
                if *airborne {
                    body.vel.y -= cupcake.gravity * dt;
                    body.advance(dt);
                    if body.pos.y <= cupcake.rest_height {
                        body.pos.y = cupcake.rest_height;
                        body.vel = Vec3::ZERO;
                        *airborne = false;
                        *hop_in = draw(&mut state.rng, cupcake.delay_min, cupcake.delay_max);
                    }
                }
            }
            Role::Chocolate { speed, fuse } => {
                if let Some(dir) = flat_direction(body.pos, target) {
                    body.pos += dir * (*speed * dt);
                    body.yaw = yaw_of(dir);
                }
                if body.pos.distance_to(target) < tuning.chocolate.trigger_radius {
                    fuse.arm(tuning.chocolate.fuse);
                }
                if fuse.tick(dt) {
                    fuses_out.push((*id, body.pos));
                }
            }
            Role::Boss {
                state: boss,
                hover_height,
                speed,
            } => {
                boss.tick(dt);
                if boss.is_chasing() {
                    body.pos.y = *hover_height;
                    if let Some(dir) = flat_direction(body.pos, target) {
                        body.pos += dir * (*speed * dt);
                        body.yaw = yaw_of(dir);
                    }
                } else {
                    // Settling in from its entrance point
                    let settle = 1.0 - (-BOSS_SETTLE_RATE * dt).exp();
                    body.pos.y += (*hover_height - body.pos.y) * settle;
                }
            }
            Role::Projectile { .. } => body.advance(dt),
            Role::Egg => {
                body.vel.y += tuning.egg.gravity * dt;
                body.advance(dt);
                if body.pos.y <= tuning.tank.ground_y {
                    *done = true;
                    eggs_burst.push(body.pos);
                }
            }
            Role::Pickup | Role::Blast { .. } => {}
        }
    }

    for pos in peanuts {
        state.spawn_actor(ActorKind::Peanut, pos);
    }
    for pos in eggs_burst {
        state.spawn_blast(BlastSource::Egg, pos);
    }
    for (id, pos) in fuses_out {
        state.counters.record_kill(ActorKind::Chocolate);
        state.chocolate_burst(id, pos);
    }
    for (id, amount) in heals {
        if let Some(t) = state.roster.get_mut(id).filter(|t| t.is_valid_target()) {
            let restored = t.apply_heal(amount);
            if restored > 0 {
                log::debug!("{:?} {id} healed by {restored}", t.kind);
            }
        }
    }
}

/// One healer frame. Returns a heal to apply once every actor has moved.
fn step_healer(
    healer: &mut HealerState,
    pos: &mut Vec3,
    targets: &[(ActorId, Vec3)],
    timing: &HealerTiming,
    dt: f32,
) -> Option<(ActorId, i32)> {
    let lookup = |id: ActorId| targets.iter().find(|(t, _)| *t == id).map(|(_, p)| *p);

    match *healer {
        HealerState::Searching { target } => {
            // A target that died or left since last frame is dropped
            let target = target
                .filter(|id| lookup(*id).is_some())
                .or_else(|| nearest(*pos, targets.iter().copied()));
            *healer = HealerState::Searching { target };

            let (id, goal) = target.and_then(|id| Some((id, lookup(id)?)))?;
            if let Some(dir) = pos.direction_to(goal) {
                *pos += dir * (timing.speed * dt);
            }
            if pos.distance_to(goal) < timing.coil_distance {
                *healer = HealerState::Coiling {
                    target: id,
                    angle: 0.0,
                    heal_in: timing.heal_interval,
                };
            }
            None
        }
        HealerState::Coiling {
            target,
            angle,
            mut heal_in,
        } => {
            let Some(goal) = lookup(target) else {
                *healer = HealerState::Searching { target: None };
                return None;
            };
            let angle = angle + timing.orbit_rate * dt;
            let r = timing.orbit_radius;
            let offset = Vec3::new(angle.cos() * r, 0.5 + (angle * 0.5).sin(), angle.sin() * r);
            *pos = pos.lerp_toward(goal + offset, timing.orbit_lerp);

            let mut heal = None;
            if tick_timer(&mut heal_in, dt) {
                heal_in = timing.heal_interval;
                heal = Some((target, timing.heal_amount));
            }
            *healer = HealerState::Coiling {
                target,
                angle,
                heal_in,
            };
            heal
        }
    }
}

/// Everything a weapon can hit, as hit-test candidates in roster order
fn hazard_candidates(state: &ArenaState) -> Vec<Candidate<'_, Vec3>> {
    state
        .roster
        .iter()
        .filter(|a| a.is_hazard())
        .map(|a| Candidate {
            id: a.id,
            body: &a.body,
            shape: state.tuning.stats.get(a.kind).shape,
        })
        .collect()
}

/// Projectiles in age order. Each one resolves against the first live hazard
/// it touches in roster order and is consumed by it; one that touches nothing
/// flies on.
fn resolve_projectiles(state: &mut ArenaState) {
    let projectiles: Vec<ActorId> = state
        .roster
        .iter()
        .filter(|a| matches!(a.role, Role::Projectile { .. }))
        .map(|a| a.id)
        .collect();

    for pid in projectiles {
        let Some((probe, damage)) = state.roster.get(pid).and_then(|a| match a.role {
            Role::Projectile { damage } if !a.done => Some((a.body, damage)),
            _ => None,
        }) else {
            continue;
        };
        let Some(hit) = first_hit(&probe, hazard_candidates(state)) else {
            continue;
        };

        if let Some(projectile) = state.roster.get_mut(pid) {
            projectile.done = true;
        }
        state.roster.remove(pid);
        state.damage_actor(hit, damage);
    }
}

/// Hazards touching the player. At most one contact damage lands per frame;
/// egg pickups are collected on the same pass.
fn resolve_contacts(state: &mut ArenaState) {
    let mut guard = ContactGuard::new();

    for id in state.roster.live_ids() {
        let player = state.player.body;
        let touching = state.roster.get(id).filter(|a| {
            let shape = state.tuning.stats.get(a.kind).shape;
            !a.done && bodies_touch(&player, &a.body, shape)
        });
        let Some((kind, is_pickup, is_hazard)) = touching.map(|a| (a.kind, matches!(a.role, Role::Pickup), a.is_hazard()))
        else {
            continue;
        };

        if is_pickup {
            if let Some(pickup) = state.roster.get_mut(id) {
                pickup.done = true;
            }
            state.roster.remove(id);
            state
                .counters
                .adjust_resource(Resource::Eggs, 1, &mut state.events);
            log::debug!("Egg picked up ({} carried)", state.eggs());
            continue;
        }
        if !is_hazard || guard.is_spent() || state.player.vitals.is_invulnerable() {
            continue;
        }

        let damage = state.tuning.stats.get(kind).contact_damage;
        if kind == ActorKind::Chocolate && state.detonate_chocolate(id) {
            // Bumping into it sets it off
            state.counters.record_kill(kind);
        }
        if damage > 0 {
            guard.try_apply(|| state.damage_player(damage));
        }
    }
}

/// Blasts that haven't applied yet, in roster order. Egg bursts and
/// shockwaves hit vulnerable hazards; chocolate blasts hit the player.
fn resolve_blasts(state: &mut ArenaState) {
    let mut ledger = BlastLedger::new(state.settings.explosion_policy);
    let pending: Vec<ActorId> = state
        .roster
        .iter()
        .filter(|a| matches!(a.role, Role::Blast { applied: false, .. }))
        .map(|a| a.id)
        .collect();

    for bid in pending {
        let Some(actor) = state.roster.get_mut(bid) else {
            continue;
        };
        let center = actor.body.pos;
        let Role::Blast {
            source,
            radius,
            damage,
            applied,
        } = &mut actor.role
        else {
            continue;
        };
        *applied = true;
        let (source, radius, damage) = (*source, *radius, *damage);

        state.events.push(GameEvent::Blast {
            x: center.x,
            y: center.y,
            z: center.z,
            radius,
        });

        match source {
            BlastSource::Chocolate => {
                let player = state.player.id;
                if within_radius(center, radius, state.player.body.pos) && ledger.admit(player) {
                    state.damage_player(damage);
                }
            }
            BlastSource::Egg | BlastSource::Shockwave => {
                let targets = {
                    let candidates = hazard_candidates(state)
                        .into_iter()
                        .filter(|c| {
                            state
                                .roster
                                .get(c.id)
                                .is_some_and(|a| state.tuning.stats.get(a.kind).blast_vulnerable)
                        });
                    blast_targets(center, radius, candidates)
                };
                for id in targets {
                    if ledger.admit(id) {
                        state.damage_actor(id, damage);
                    }
                }
            }
        }
    }
}

fn compact(state: &mut ArenaState) {
    for actor in state.roster.compact() {
        state.events.push(GameEvent::ActorRemoved {
            id: actor.id,
            kind: actor.kind,
        });
    }
}

/// Autopilot: turn toward the nearest hazard and keep the pickles coming,
/// lob eggs at crowds and hold the spear key now and then
pub fn demo_input(state: &ArenaState) -> TickInput {
    let mut input = TickInput {
        idle_mode: true,
        start: state.phase == SessionPhase::Menu,
        ..Default::default()
    };

    let me = state.player.body.pos;
    let targets = state.roster.iter().filter(|a| a.is_hazard()).map(|a| (a.id, a.body.pos));
    let goal = nearest(me, targets).and_then(|id| state.roster.get(id)).map(|a| a.body.pos);

    match goal {
        Some(goal) => {
            let facing = yaw_forward(state.player.body.yaw);
            if let Some(dir) = flat_direction(me, goal) {
                // Positive cross means the goal is to the left (+yaw)
                let cross = facing.z * dir.x - facing.x * dir.z;
                input.move_axis = (-cross * 4.0).clamp(-1.0, 1.0);
                let dist = me.distance_to(goal);
                input.forward_axis = if dist > 8.0 { 1.0 } else if dist < 4.0 { -1.0 } else { 0.0 };
                input.attack = facing.dot(dir) > 0.95 && state.frame % 12 == 0;
            }
            let crowd = state
                .roster
                .iter()
                .filter(|a| a.is_hazard() && a.body.pos.distance_to(goal) < 6.0)
                .count();
            input.bomb = crowd >= 3 && state.eggs() > 0;
        }
        None => {
            // Head back to the middle where things spawn
            input.forward_axis = if me.length() > 6.0 { 1.0 } else { 0.0 };
            if let Some(dir) = flat_direction(me, Vec3::ZERO) {
                let facing = yaw_forward(state.player.body.yaw);
                let cross = facing.z * dir.x - facing.x * dir.z;
                input.move_axis = (-cross * 4.0).clamp(-1.0, 1.0);
            }
        }
    }

    if state.player.has_spear {
        input.special_held = state.frame % 240 < 90;
    }
    input
}

impl Simulation for ArenaState {
    type Vector = Vec3;

    fn step(&mut self, input: &TickInput, dt: f32) {
        tick(self, input, dt);
    }

    fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn score(&self) -> u64 {
        self.counters.score
    }

    fn render_feed(&self) -> Vec<RenderItem<Vec3>> {
        ArenaState::render_feed(self)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        ArenaState::drain_events(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ExplosionPolicy, Settings};
    use crate::sim::behavior::FuseState;
    use crate::sim::{Health, RosterEntry};
    use crate::tuning::ArenaTuning;

    const DT: f32 = 1.0 / 60.0;

    /// Level loaded with timed spawning and egg pickups switched off
    fn quiet(level: u8) -> ArenaState {
        let mut tuning = ArenaTuning::default();
        tuning.egg.pickup_chance = 0.0;
        let mut state = ArenaState::new(tuning, Settings::default(), 99);
        state.start_at_level(level);
        state.spawning = false;
        state.drain_events();
        state
    }

    fn run(state: &mut ArenaState, input: &TickInput, frames: usize) {
        for _ in 0..frames {
            tick(state, input, DT);
        }
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_menu_to_playing() {
        let mut state = ArenaState::new(ArenaTuning::default(), Settings::default(), 5);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, SessionPhase::Menu);
        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.phase, SessionPhase::Playing { level: 1 });
    }

    #[test]
    fn test_two_pickles_one_carrot() {
        let mut state = quiet(1);
        let spot = Vec3::new(-22.0, 0.0, -10.0);
        let carrot = state.spawn_actor(ActorKind::Carrot, spot);
        let first = state.spawn_projectile(ActorKind::Pickle, spot, Vec3::ZERO, 3.0);
        let second = state.spawn_projectile(ActorKind::Pickle, spot, Vec3::ZERO, 3.0);

        tick(&mut state, &TickInput::default(), DT);

        assert!(state.roster.get(carrot).is_none());
        assert!(state.roster.get(first).is_none());
        assert!(state.roster.is_live(second), "second pickle should fly on");
        assert_eq!(state.counters.score, 10);
        assert_eq!(state.counters.kills(ActorKind::Carrot), 1);
    }

    #[test]
    fn test_pickle_hits_first_in_roster_order() {
        let mut state = quiet(1);
        let spot = Vec3::new(0.0, 0.0, 10.0);
        let far = state.spawn_actor(ActorKind::PeanutJar, spot + Vec3::new(1.4, 0.0, 0.0));
        let near = state.spawn_actor(ActorKind::PeanutJar, spot);
        state.spawn_projectile(ActorKind::Pickle, spot, Vec3::ZERO, 3.0);

        tick(&mut state, &TickInput::default(), DT);

        let hp = |id| state.roster.get(id).and_then(|a| a.health).map(|h| h.current());
        assert_eq!(hp(far), Some(2));
        assert_eq!(hp(near), Some(3));
    }

    #[test]
    fn test_gate_spawns_boss_once() {
        let mut state = quiet(1);
        state.spawning = true;
        for _ in 0..20 {
            let id = state.spawn_actor(ActorKind::Carrot, Vec3::new(10.0, 0.0, 10.0));
            state.damage_actor(id, 1);
        }
        state.drain_events();

        run(&mut state, &TickInput::default(), 30);

        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::BossSpawned { .. })), 1);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::RoastChicken), 1);
        assert!(!state.spawning);
        assert!(state.gate.has_fired());
    }

    #[test]
    fn test_boss_defeat_loads_next_level() {
        let mut state = quiet(1);
        for _ in 0..20 {
            let id = state.spawn_actor(ActorKind::Carrot, Vec3::new(10.0, 0.0, 10.0));
            state.damage_actor(id, 1);
        }
        tick(&mut state, &TickInput::default(), DT);
        let boss = state.boss.expect("boss spawned");
        state.drain_events();

        assert_eq!(state.damage_actor(boss, 1000), crate::sim::DamageOutcome::Killed);
        assert_eq!(state.damage_actor(boss, 1000), crate::sim::DamageOutcome::Ignored);
        assert_eq!(state.phase, SessionPhase::LevelClear { next_level: 2 });
        assert!(state.player.has_spear);
        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::BossDefeated { .. })), 1);

        run(&mut state, &TickInput::default(), 130);
        assert_eq!(state.phase, SessionPhase::Playing { level: 2 });
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::PeanutJar), 5);
        assert!(state.player.has_spear);
    }

    #[test]
    fn test_flour_bag_gate_clears_hazards() {
        let mut state = quiet(2);
        for _ in 0..12 {
            let id = state.spawn_actor(ActorKind::PeanutJar, Vec3::new(0.0, 1.0, 5.0));
            state.damage_actor(id, 10);
        }
        for _ in 0..7 {
            let id = state.spawn_actor(ActorKind::Carrot, Vec3::new(5.0, 0.0, 0.0));
            state.damage_actor(id, 1);
        }
        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::PeanutJar), 0);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::LollySnake), 0);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::FlourBag), 1);
    }

    fn overlapping_egg_blasts(policy: ExplosionPolicy) -> i32 {
        let mut state = quiet(1);
        state.settings.explosion_policy = policy;
        state.tuning.egg.blast_damage = 1;
        let center = Vec3::new(10.0, 0.0, 10.0);
        let jar = state.spawn_actor(ActorKind::PeanutJar, center + Vec3::Y);
        state.spawn_blast(BlastSource::Egg, center);
        state.spawn_blast(BlastSource::Egg, center);

        tick(&mut state, &TickInput::default(), DT);

        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Blast { .. })), 2);
        state
            .roster
            .get(jar)
            .and_then(|a| a.health)
            .map(|h| h.current())
            .unwrap_or(0)
    }

    #[test]
    fn test_overlapping_blasts_stack_by_default() {
        assert_eq!(overlapping_egg_blasts(ExplosionPolicy::Stack), 1);
    }

    #[test]
    fn test_overlapping_blasts_dedup() {
        assert_eq!(overlapping_egg_blasts(ExplosionPolicy::Dedup), 2);
    }

    #[test]
    fn test_blast_applies_once() {
        let mut state = quiet(1);
        state.tuning.egg.blast_damage = 1;
        let center = Vec3::new(10.0, 0.0, 10.0);
        let jar = state.spawn_actor(ActorKind::PeanutJar, center);
        state.spawn_blast(BlastSource::Egg, center);

        run(&mut state, &TickInput::default(), 10);
        let hp = state.roster.get(jar).and_then(|a| a.health).map(|h| h.current());
        assert_eq!(hp, Some(2));
    }

    #[test]
    fn test_chocolate_contact() {
        let mut state = quiet(1);
        let player = state.player.body.pos;
        state.spawn_actor(ActorKind::Chocolate, player + Vec3::new(0.0, 0.0, 1.0));

        tick(&mut state, &TickInput::default(), DT);

        // Contact lands; the blast that follows hits the invulnerability window
        assert_eq!(state.player.vitals.health.current(), 80);
        assert_eq!(state.counters.level_kills(ActorKind::Chocolate), 1);
        assert_eq!(state.counters.score, 0);
        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Blast { .. })), 1);
    }

    #[test]
    fn test_chocolate_fuse_blast() {
        let mut state = quiet(1);
        let player = state.player.body.pos;
        let id = state.spawn_actor(ActorKind::Chocolate, player + Vec3::new(0.0, 0.0, 3.0));
        if let Some(Actor {
            role: Role::Chocolate { fuse, .. },
            ..
        }) = state.roster.get_mut(id)
        {
            *fuse = FuseState::Countdown { remaining: DT / 2.0 };
        }

        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.player.vitals.health.current(), 60);
        assert!(state.roster.get(id).is_none());
        let blasts = state.roster.iter().filter(|a| a.kind == ActorKind::Blast).count();
        assert_eq!(blasts, 1, "blast lingers for the feed");
    }

    #[test]
    fn test_one_contact_per_frame() {
        let mut state = quiet(1);
        let player = state.player.body.pos;
        state.spawn_actor(ActorKind::Carrot, player + Vec3::new(0.5, 0.0, 0.0));
        state.spawn_actor(ActorKind::Carrot, player + Vec3::new(-0.5, 0.0, 0.0));
        state.spawn_actor(ActorKind::Peanut, player + Vec3::new(0.0, 0.0, 0.5));

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.player.vitals.health.current(), 80);
    }

    #[test]
    fn test_healer_coils_then_loses_target() {
        let mut state = quiet(1);
        let jar = state.spawn_actor(ActorKind::PeanutJar, Vec3::new(5.0, 1.0, 5.0));
        let snake = state.spawn_actor(ActorKind::LollySnake, Vec3::new(5.0, 1.0, 6.0));

        tick(&mut state, &TickInput::default(), DT);
        let healer = |s: &ArenaState| match s.roster.get(snake).map(|a| &a.role) {
            Some(Role::Healer(h)) => *h,
            other => panic!("unexpected {other:?}"),
        };
        assert!(healer(&state).is_coiling());
        assert!(matches!(healer(&state), HealerState::Coiling { target, .. } if target == jar));

        state.damage_actor(jar, 10);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(healer(&state), HealerState::Searching { target: None });
    }

    #[test]
    fn test_healer_heals_target() {
        let mut state = quiet(1);
        state.tuning.healer.heal_interval = 0.05;
        let jar = state.spawn_actor(ActorKind::PeanutJar, Vec3::new(5.0, 1.0, 5.0));
        if let Some(a) = state.roster.get_mut(jar) {
            a.health = Some(Health::with_current(1, 3));
        }
        state.spawn_actor(ActorKind::LollySnake, Vec3::new(5.0, 1.0, 6.0));

        run(&mut state, &TickInput::default(), 12);
        let hp = state.roster.get(jar).and_then(|a| a.health).map(|h| h.current());
        assert!(hp.is_some_and(|h| h > 1), "jar health {hp:?}");
    }

    #[test]
    fn test_bomb_throws_then_jumps() {
        let mut state = quiet(1);
        let bomb = TickInput {
            bomb: true,
            ..Default::default()
        };
        tick(&mut state, &bomb, DT);
        assert_eq!(state.eggs(), 0);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::Egg), 1);

        // Debounced
        tick(&mut state, &bomb, DT);
        assert!(state.player.grounded);

        run(&mut state, &TickInput::default(), 35);
        tick(&mut state, &bomb, DT);
        assert!(state.player.jumping);
        assert!(!state.player.grounded);
    }

    #[test]
    fn test_landing_sends_shockwave() {
        let mut state = quiet(1);
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut state, &jump, DT);
        state.drain_events();
        run(&mut state, &TickInput::default(), 90);
        assert!(state.player.grounded);
        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Blast { .. })), 1);
    }

    #[test]
    fn test_egg_pickup_collected() {
        let mut state = quiet(1);
        let player = state.player.body.pos;
        state.spawn_actor(ActorKind::EggPickup, player + Vec3::new(0.0, 1.0, 0.5));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.eggs(), 2);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::EggPickup), 0);
    }

    #[test]
    fn test_spear_charge_and_release() {
        let mut state = quiet(1);
        state.player.has_spear = true;
        let hold = TickInput {
            special_held: true,
            ..Default::default()
        };
        run(&mut state, &hold, 60);
        state.drain_events();
        tick(&mut state, &TickInput::default(), DT);

        let spear = state
            .roster
            .iter()
            .find(|a| a.kind == ActorKind::BoneSpear)
            .map(|a| a.role.clone());
        assert_eq!(spear, Some(Role::Projectile { damage: 12 }));
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::ChargeChanged { percent: None }));
    }

    #[test]
    fn test_projectile_despawns_after_lifetime() {
        let mut state = quiet(1);
        let id = state.spawn_projectile(ActorKind::Pickle, Vec3::new(0.0, 30.0, 0.0), Vec3::ZERO, 0.5);
        run(&mut state, &TickInput::default(), 20);
        assert!(state.roster.is_live(id));
        run(&mut state, &TickInput::default(), 20);
        assert!(state.roster.get(id).is_none());
    }

    #[test]
    fn test_ring_jar_refills() {
        let mut state = quiet(2);
        state.spawning = true;
        let Some(jar) = state.ring[0].jar else {
            panic!("ring slot empty");
        };
        state.damage_actor(jar, 10);
        state.refill_in = DT / 2.0;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.roster.count_where(|a| a.kind == ActorKind::PeanutJar), 5);
        assert_ne!(state.ring[0].jar, Some(jar));
    }

    #[test]
    fn test_fall_off_table() {
        let mut state = quiet(3);
        state.player.body.pos = Vec3::new(150.0, 0.0, 0.0);
        run(&mut state, &TickInput::default(), 120);
        assert_eq!(state.phase, SessionPhase::GameOver);
        assert!(state.player.vitals.is_dead());
        assert!(state.drain_events().contains(&GameEvent::PlayerDied));
    }

    #[test]
    fn test_removed_actors_leave_roster() {
        let mut state = quiet(1);
        let id = state.spawn_actor(ActorKind::Carrot, Vec3::new(20.0, 0.0, 20.0));
        state.damage_actor(id, 1);
        assert!(state.roster.get(id).is_none());
        tick(&mut state, &TickInput::default(), DT);
        let events = state.drain_events();
        assert_eq!(
            count(&events, |e| *e
                == GameEvent::ActorRemoved {
                    id,
                    kind: ActorKind::Carrot
                }),
            1
        );
        assert!(state.roster.iter_present().all(|a| !a.is_terminal()));
    }

    #[test]
    fn test_determinism() {
        let mut a = ArenaState::new(ArenaTuning::default(), Settings::default(), 2024);
        let mut b = ArenaState::new(ArenaTuning::default(), Settings::default(), 2024);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..1200 {
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.render_feed(), b.render_feed());
        assert_eq!(a.counters.score, b.counters.score);
        assert_eq!(a.phase, b.phase);
    }

    #[test]
    fn test_bad_frame_time_falls_back_to_default() {
        let mut state = quiet(1);
        let pickle = state.spawn_projectile(ActorKind::Pickle, Vec3::new(0.0, 30.0, 0.0), Vec3::ZERO, 0.5);

        tick(&mut state, &TickInput::default(), f32::NAN);
        assert!(state.time.is_finite());
        assert!(state.player.body.pos.is_finite());

        run(&mut state, &TickInput::default(), 40);
        assert!(state.roster.get(pickle).is_none(), "despawn still fires");
    }

    #[test]
    fn test_negative_frame_time_does_not_rewind() {
        let mut state = quiet(1);
        assert!(state.damage_player(10));
        let before = state.player.vitals.invuln;
        tick(&mut state, &TickInput::default(), -5.0);
        assert!(state.player.vitals.invuln < before);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut state = quiet(1);
        tick(&mut state, &TickInput::default(), 10.0);
        assert!((state.time - state.settings.max_dt).abs() < 1e-6);
    }

    #[test]
    fn test_despawn_after_hit_is_inert() {
        let mut state = quiet(1);
        let spot = Vec3::new(0.0, 1.0, 10.0);
        let jar = state.spawn_actor(ActorKind::PeanutJar, spot);
        let other = state.spawn_projectile(ActorKind::Pickle, Vec3::new(0.0, 30.0, 0.0), Vec3::ZERO, 3.0);
        let pickle = state.spawn_projectile(ActorKind::Pickle, spot, Vec3::ZERO, 0.5);

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.roster.get(pickle).is_none());
        state.drain_events();

        // Well past the consumed pickle's despawn
        run(&mut state, &TickInput::default(), 40);
        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::ActorRemoved { .. })), 0);
        assert!(state.roster.is_live(other));
        let hp = state.roster.get(jar).and_then(|a| a.health).map(|h| h.current());
        assert_eq!(hp, Some(2));
    }

    #[test]
    fn test_flash_clear_after_kill_is_inert() {
        let mut state = quiet(1);
        let jar = state.spawn_actor(ActorKind::PeanutJar, Vec3::new(0.0, 1.0, 10.0));
        assert_eq!(state.damage_actor(jar, 1), crate::sim::DamageOutcome::Hurt);
        assert_eq!(state.damage_actor(jar, 10), crate::sim::DamageOutcome::Killed);
        let score = state.counters.score;

        let survivor = state.spawn_actor(ActorKind::PeanutJar, Vec3::new(10.0, 1.0, 0.0));
        if let Some(a) = state.roster.get_mut(survivor) {
            a.body.flash = true;
        }
        state.player.body.flash = true;

        run(&mut state, &TickInput::default(), 12);
        assert!(state.roster.get(jar).is_none());
        assert!(state.roster.get(survivor).is_some_and(|a| a.body.flash));
        assert!(state.player.body.flash);
        assert_eq!(state.counters.score, score);
    }

    #[test]
    fn test_level_load_drops_pending_effects() {
        let mut state = quiet(1);
        let bomb = TickInput {
            bomb: true,
            ..Default::default()
        };
        tick(&mut state, &bomb, DT);
        assert!(!state.player.bomb_ready);

        state.load_level(2);
        assert!(state.scheduler.is_empty());
        assert!(state.player.bomb_ready);
    }

    fn settle_boss(dt: f32, frames: usize) -> f32 {
        let mut state = quiet(1);
        let boss = state.spawn_actor(ActorKind::RoastChicken, Vec3::new(0.0, 10.0, 0.0));
        if let Some(Actor {
            role: Role::Boss {
                state: entrance,
                hover_height,
                ..
            },
            ..
        }) = state.roster.get_mut(boss)
        {
            *entrance = crate::sim::BossState::new(1.0);
            *hover_height = 3.0;
        }
        run_at(&mut state, dt, frames);
        state.roster.get(boss).map(|a| a.body.pos.y).unwrap_or(f32::NAN)
    }

    fn run_at(state: &mut ArenaState, dt: f32, frames: usize) {
        for _ in 0..frames {
            tick(state, &TickInput::default(), dt);
        }
    }

    #[test]
    fn test_boss_entrance_independent_of_frame_rate() {
        let at_60 = settle_boss(1.0 / 60.0, 30);
        let at_30 = settle_boss(1.0 / 30.0, 15);
        assert!(at_60 < 10.0 && at_60 > 3.0);
        assert!((at_60 - at_30).abs() < 1e-3, "{at_60} vs {at_30}");
    }
}
