//! Platformer frame step
//!
//! Order: deferred effects, player, actors (against the player position as it
//! stands after the player moved), contact, blasts, gate, compaction.

use glam::Vec2;

use super::state::{Actor, PlatformerState, Role};
use crate::sim::behavior::FuseState;
use crate::sim::combat::{BlastLedger, ContactGuard};
use crate::sim::events::{GameEvent, RenderItem};
use crate::sim::{
    ActorId, ActorKind, Resource, SessionPhase, Simulation, TickInput, Vector, bodies_touch, resolve_platforms,
    within_radius,
};

/// Advance the platformer by one frame
///
/// `dt` is the host's frame time; non-finite or non-positive values fall back
/// to the configured default and long frames are clamped.
pub fn tick(state: &mut PlatformerState, input: &TickInput, dt: f32) {
    let dt = state.settings.frame_dt(Some(dt));
    let mut input = input.sanitized();
    if input.idle_mode {
        input = demo_input(state);
    }

    match state.phase {
        SessionPhase::Menu => {
            if input.start {
                state.start();
            }
            return;
        }
        SessionPhase::Playing { .. } => {}
        _ => {
            // Only the death animation keeps running
            state.player.vitals.tick(dt);
            return;
        }
    }

    state.time += dt;
    state.frame += 1;

    for effect in state.scheduler.advance(dt) {
        state.apply_deferred(effect);
    }

    update_player(state, &input, dt);

    if state.phase == SessionPhase::GameOver {
        compact(state);
        return;
    }

    let target = state.player.body.pos;
    let blasts = update_actors(state, target, dt);
    resolve_contacts(state);
    resolve_blasts(state, &blasts);

    if state.phase.is_running() && state.gate.check(&state.counters) {
        log::info!("All {} biscuits collected", state.biscuits());
        state.events.push(GameEvent::Announcement {
            text: "ALL BISCUITS COLLECTED!".into(),
        });
        state.set_phase(SessionPhase::Victory);
    }

    compact(state);
}

fn update_player(state: &mut PlatformerState, input: &TickInput, dt: f32) {
    let runner = state.tuning.runner;
    let player = &mut state.player;

    player.vitals.tick(dt);
    if input.attack {
        player.vitals.start_attack(runner.attack_duration);
    }

    // Horizontal speed is set, not accelerated
    player.body.vel.x = input.move_axis * runner.run_speed;
    if input.move_axis != 0.0 {
        player.facing = input.move_axis.signum();
    }
    if input.jump && player.grounded {
        player.body.vel.y = -runner.jump_impulse;
        player.grounded = false;
    }
    player.body.vel.y += runner.gravity * dt;

    let prev_y = player.rect().y;
    player.body.advance(dt);
    let res = resolve_platforms(player.rect(), player.body.vel, prev_y, &state.tuning.course.platforms);
    player.body.pos = res.rect.center();
    player.body.vel = res.vel;
    player.grounded = res.grounded;

    let half_width = player.body.half_extents.x;
    if player.body.pos.x < half_width {
        player.body.pos.x = half_width;
    }

    if player.rect().top() > state.tuning.course.kill_plane_y {
        log::debug!("Player fell off the course");
        state.kill_player();
    }
}

/// Run every actor's state machine. Returns the centers of bombs that
/// detonated this frame.
fn update_actors(state: &mut PlatformerState, target: Vec2, dt: f32) -> Vec<Vec2> {
    let lunge_timing = state.tuning.lunge;
    let bomb = state.tuning.bomb;
    let mut blasts = Vec::new();

    for actor in state.roster.iter_mut() {
        let Actor { body, role, .. } = actor;
        match role {
            Role::Enemy { pacer } => pacer.step(&mut body.pos.x, dt),
            Role::Biscuit { pacer, lunge } => {
                if lunge.is_idle() {
                    pacer.step(&mut body.pos.x, dt);
                }
                lunge.step(&mut body.pos, target, &lunge_timing, &mut state.rng, dt);
            }
            Role::Bomb { pacer, fuse } => {
                if *fuse == FuseState::Patrol {
                    pacer.step(&mut body.pos.x, dt);
                    if body.pos.distance_to(target) < bomb.trigger_radius {
                        fuse.arm(bomb.countdown);
                    }
                } else if fuse.tick(dt) {
                    blasts.push(body.pos);
                }
            }
        }
    }
    blasts
}

/// Take an actor out through the player's attack. Bookkeeping runs once no
/// matter how many times this is called for the same id.
fn defeat(state: &mut PlatformerState, id: ActorId) {
    if !state.roster.is_live(id) {
        return;
    }
    let Some(actor) = state.roster.get_mut(id) else {
        return;
    };
    let kind = actor.kind;
    match &mut actor.role {
        Role::Bomb { fuse, .. } => {
            fuse.defuse();
        }
        _ => actor.done = true,
    }
    state.roster.remove(id);

    let stats = state.tuning.stats.get(kind);
    state.counters.record_kill(kind);
    state.counters.add_score(stats.kill_score, &mut state.events);
    if kind == ActorKind::Biscuit {
        state
            .counters
            .adjust_resource(Resource::Biscuits, 1, &mut state.events);
    }
    log::debug!("{kind:?} {id} taken out");
}

fn resolve_contacts(state: &mut PlatformerState) {
    let mut guard = ContactGuard::new();
    let attacking = state.player.vitals.is_attacking();
    let contact_countdown = state.tuning.bomb.contact_countdown;

    for id in state.roster.live_ids() {
        let player = state.player.body;
        let touching = match state.roster.get(id) {
            Some(actor) if state.roster.is_live(id) => {
                let shape = state.tuning.stats.get(actor.kind).shape;
                bodies_touch(&player, &actor.body, shape).then_some(actor.kind)
            }
            _ => None,
        };
        let Some(kind) = touching else {
            continue;
        };

        if attacking {
            defeat(state, id);
            continue;
        }

        if kind == ActorKind::ChocolateBomb {
            if let Some(Actor {
                role: Role::Bomb { fuse, .. },
                ..
            }) = state.roster.get_mut(id)
            {
                fuse.fast_forward(contact_countdown);
            }
        } else {
            let damage = state.tuning.stats.get(kind).contact_damage;
            guard.try_apply(|| state.damage_player(damage));
        }
    }
}

fn resolve_blasts(state: &mut PlatformerState, blasts: &[Vec2]) {
    let radius = state.tuning.bomb.blast_radius;
    let damage = state.tuning.bomb.blast_damage;
    let mut ledger = BlastLedger::new(state.settings.explosion_policy);

    for &center in blasts {
        log::debug!("Bomb burst at ({:.0}, {:.0})", center.x, center.y);
        state.events.push(GameEvent::Blast {
            x: center.x,
            y: center.y,
            z: 0.0,
            radius,
        });
        if within_radius(center, radius, state.player.body.pos) && ledger.admit(state.player.id) {
            state.damage_player(damage);
        }
    }
}

fn compact(state: &mut PlatformerState) {
    for actor in state.roster.compact() {
        state.events.push(GameEvent::ActorRemoved {
            id: actor.id,
            kind: actor.kind,
        });
    }
}

/// Autopilot: run right, swing at anything close ahead, hop over ledges
pub fn demo_input(state: &PlatformerState) -> TickInput {
    let mut input = TickInput {
        move_axis: 1.0,
        idle_mode: true,
        start: state.phase == SessionPhase::Menu,
        ..Default::default()
    };

    let p = state.player.body.pos;
    let threat_ahead = state.roster.iter().any(|a| {
        let dx = a.body.pos.x - p.x;
        (-20.0..90.0).contains(&dx) && (a.body.pos.y - p.y).abs() < 120.0
    });
    if threat_ahead && !state.player.vitals.is_attacking() {
        input.attack = true;
    }

    let stalled = state.player.body.vel.x == 0.0;
    if state.player.grounded && (stalled || state.frame % 90 == 0) {
        input.jump = true;
    }
    input
}

impl Simulation for PlatformerState {
    type Vector = Vec2;

    fn step(&mut self, input: &TickInput, dt: f32) {
        tick(self, input, dt);
    }

    fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn score(&self) -> u64 {
        self.counters.score
    }

    fn render_feed(&self) -> Vec<RenderItem<Vec2>> {
        PlatformerState::render_feed(self)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        PlatformerState::drain_events(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ExplosionPolicy, Settings};
    use crate::sim::behavior::LungeState;
    use crate::tuning::PlatformerTuning;

    const DT: f32 = 1.0 / 60.0;

    /// Player standing on the ground at x=500, one far-off biscuit, nothing else
    fn quiet_course() -> PlatformerState {
        let mut tuning = PlatformerTuning::default();
        tuning.course.biscuits = vec![Vec2::new(2900.0, 100.0)];
        tuning.course.enemies.clear();
        tuning.course.bombs.clear();
        tuning.course.player_spawn = Vec2::new(500.0, 520.0);
        let mut state = PlatformerState::new(tuning, Settings::default(), 7);
        state.start();
        tick(&mut state, &TickInput::default(), DT);
        state.drain_events();
        state
    }

    fn armed_bomb(state: &mut PlatformerState, pos: Vec2, remaining: f32) -> ActorId {
        let id = state.spawn_actor(ActorKind::ChocolateBomb, pos);
        if let Some(Actor {
            role: Role::Bomb { fuse, .. },
            ..
        }) = state.roster.get_mut(id)
        {
            *fuse = FuseState::Countdown { remaining };
        }
        id
    }

    #[test]
    fn test_tick_menu_to_playing() {
        let mut state = PlatformerState::new(PlatformerTuning::default(), Settings::default(), 1);
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
    fn test_player_lands_and_stays_grounded() {
        let state = quiet_course();
        assert!(state.player.grounded);
        assert!((state.player.body.pos.y - 520.0).abs() < 1e-3);
    }

    #[test]
    fn test_blast_hits_inside_radius() {
        let mut state = quiet_course();
        armed_bomb(&mut state, Vec2::new(550.0, 520.0), DT / 2.0);
        tick(&mut state, &TickInput::default(), DT);

        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Blast { .. })));
        assert!(events.contains(&GameEvent::PlayerDamaged { amount: 40, health: 60 }));
        assert_eq!(state.player.vitals.health.current(), 60);
    }

    #[test]
    fn test_blast_misses_outside_radius() {
        let mut state = quiet_course();
        armed_bomb(&mut state, Vec2::new(650.0, 520.0), DT / 2.0);
        tick(&mut state, &TickInput::default(), DT);

        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Blast { .. })));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::PlayerDamaged { .. })));
        assert_eq!(state.player.vitals.health.current(), 100);
    }

    #[test]
    fn test_exploded_bomb_removed_same_frame() {
        let mut state = quiet_course();
        let id = armed_bomb(&mut state, Vec2::new(650.0, 520.0), DT / 2.0);
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.roster.get(id).is_none());
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::ActorRemoved {
            id,
            kind: ActorKind::ChocolateBomb
        }));
    }

    #[test]
    fn test_one_contact_damage_per_frame() {
        let mut state = quiet_course();
        state.spawn_actor(ActorKind::PacingEnemy, Vec2::new(510.0, 530.0));
        state.spawn_actor(ActorKind::PacingEnemy, Vec2::new(490.0, 530.0));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.player.vitals.health.current(), 80);

        // Still overlapping, but invulnerable now
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.player.vitals.health.current(), 80);
    }

    #[test]
    fn test_attack_collects_biscuit() {
        let mut state = quiet_course();
        let id = state.spawn_actor(ActorKind::Biscuit, Vec2::new(520.0, 520.0));
        if let Some(Actor {
            role: Role::Biscuit { lunge, pacer },
            ..
        }) = state.roster.get_mut(id)
        {
            *lunge = LungeState::Idle { rearm: 100.0 };
            pacer.speed = 0.0;
        }
        let input = TickInput {
            attack: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert_eq!(state.biscuits(), 1);
        assert_eq!(state.counters.score, 1);
        assert_eq!(state.player.vitals.health.current(), 100);
        assert!(state.roster.get(id).is_none());
    }

    #[test]
    fn test_defeat_is_idempotent() {
        let mut state = quiet_course();
        let id = state.spawn_actor(ActorKind::Biscuit, Vec2::new(900.0, 100.0));
        defeat(&mut state, id);
        defeat(&mut state, id);
        assert_eq!(state.biscuits(), 1);
        assert_eq!(state.counters.kills(ActorKind::Biscuit), 1);
    }

    #[test]
    fn test_contact_fast_forwards_bomb() {
        let mut state = quiet_course();
        let id = state.spawn_actor(ActorKind::ChocolateBomb, Vec2::new(520.0, 535.0));
        if let Some(Actor {
            role: Role::Bomb { pacer, .. },
            ..
        }) = state.roster.get_mut(id)
        {
            pacer.speed = 0.0;
        }
        tick(&mut state, &TickInput::default(), DT);
        let fuse = match state.roster.get(id).map(|a| &a.role) {
            Some(Role::Bomb { fuse, .. }) => *fuse,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(fuse, FuseState::Countdown { remaining: 0.1 });
    }

    #[test]
    fn test_attack_defuses_bomb() {
        let mut state = quiet_course();
        let id = armed_bomb(&mut state, Vec2::new(520.0, 535.0), 0.5);
        let input = TickInput {
            attack: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert!(state.roster.get(id).is_none());
        let events = state.drain_events();
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Blast { .. })));
        assert_eq!(state.counters.kills(ActorKind::ChocolateBomb), 1);
    }

    #[test]
    fn test_falling_off_ends_run() {
        let mut state = quiet_course();
        state.player.vitals.invuln = 10.0;
        state.player.body.pos = Vec2::new(500.0, 900.0);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, SessionPhase::GameOver);
        assert!(state.drain_events().contains(&GameEvent::PlayerDied));

        // Further ticks are inert apart from the death timer
        let x = state.player.body.pos.x;
        tick(&mut state, &TickInput { move_axis: 1.0, ..Default::default() }, DT);
        assert_eq!(state.player.body.pos.x, x);
    }

    #[test]
    fn test_last_biscuit_wins() {
        let mut state = quiet_course();
        let far = state.roster.iter().next().map(|a| a.id);
        if let Some(id) = far {
            defeat(&mut state, id);
        }
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, SessionPhase::Victory);
    }

    #[test]
    fn test_two_blasts_one_frame() {
        for policy in [ExplosionPolicy::Stack, ExplosionPolicy::Dedup] {
            let mut state = quiet_course();
            state.settings.explosion_policy = policy;
            armed_bomb(&mut state, Vec2::new(550.0, 520.0), DT / 2.0);
            armed_bomb(&mut state, Vec2::new(450.0, 520.0), DT / 2.0);
            tick(&mut state, &TickInput::default(), DT);

            // The first blast opens the invulnerability window either way
            assert_eq!(state.player.vitals.health.current(), 60);
            let blasts = state
                .drain_events()
                .into_iter()
                .filter(|e| matches!(e, GameEvent::Blast { .. }))
                .count();
            assert_eq!(blasts, 2);
        }
    }

    #[test]
    fn test_determinism() {
        let mut a = PlatformerState::new(PlatformerTuning::default(), Settings::default(), 4242);
        let mut b = PlatformerState::new(PlatformerTuning::default(), Settings::default(), 4242);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..900 {
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.render_feed(), b.render_feed());
        assert_eq!(a.counters.score, b.counters.score);
        assert_eq!(a.phase, b.phase);
    }

    #[test]
    fn test_nan_frame_time_keeps_timers_running() {
        let mut state = quiet_course();
        assert!(state.damage_player(10));
        assert!(state.player.body.flash);

        tick(&mut state, &TickInput::default(), f32::NAN);
        assert!(state.time.is_finite());
        assert!(state.player.body.pos.is_finite());

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(!state.player.body.flash);
    }

    #[test]
    fn test_negative_frame_time_does_not_extend_invulnerability() {
        let mut state = quiet_course();
        assert!(state.damage_player(10));
        let before = state.player.vitals.invuln;
        tick(&mut state, &TickInput::default(), -3.0);
        assert!(state.player.vitals.invuln < before);
    }
}
