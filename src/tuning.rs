//! Data-driven game balance
//!
//! One `KindStats` row per actor kind replaces the per-call-site radii, damage
//! and score numbers. Behavior timings and level plans sit next to it. Every
//! table has defaults matching the shipped games, and JSON overrides are
//! partial: anything left out keeps its default.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::behavior::{HealerTiming, LungeTiming};
use crate::sim::collision::HitShape;
use crate::sim::geom::{ArenaBounds, Rect};
use crate::sim::{ActorKind, Threshold};

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

fn invalid(reason: impl Into<String>) -> TuningError {
    TuningError::Invalid(reason.into())
}

/// Static per-kind numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindStats {
    /// Circle hit radius
    pub radius: f32,
    /// Box half extents (platformer)
    pub half_extents: Vec2,
    /// None for actors without hit points (pickups, blasts)
    pub health: Option<i32>,
    pub speed: f32,
    /// Damage dealt to the player on touch
    pub contact_damage: i32,
    /// Damage dealt when this kind is the projectile
    pub hit_damage: i32,
    /// Awarded when killed
    pub kill_score: u64,
    /// Awarded per damaging hit that doesn't kill
    pub hit_score: u64,
    pub shape: HitShape,
    /// Egg blasts and shockwaves can hurt it
    pub blast_vulnerable: bool,
}

impl Default for KindStats {
    fn default() -> Self {
        Self {
            radius: 0.5,
            half_extents: Vec2::ZERO,
            health: None,
            speed: 0.0,
            contact_damage: 0,
            hit_damage: 0,
            kill_score: 0,
            hit_score: 0,
            shape: HitShape::Circle,
            blast_vulnerable: false,
        }
    }
}

/// Per-kind lookup. Missing kinds read as `KindStats::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatTable(BTreeMap<ActorKind, KindStats>);

impl StatTable {
    pub fn get(&self, kind: ActorKind) -> KindStats {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    pub fn set(&mut self, kind: ActorKind, stats: KindStats) {
        self.0.insert(kind, stats);
    }

    /// Merge `other` over `self`, row by row
    fn overlay(&mut self, other: StatTable) {
        self.0.extend(other.0);
    }

    fn validate(&self) -> Result<(), TuningError> {
        for (kind, s) in &self.0 {
            if !(s.radius.is_finite() && s.radius >= 0.0) {
                return Err(invalid(format!("{kind:?}: radius {} out of range", s.radius)));
            }
            if !(s.half_extents.is_finite() && s.half_extents.cmpge(Vec2::ZERO).all()) {
                return Err(invalid(format!("{kind:?}: bad half extents")));
            }
            if let Some(hp) = s.health
                && hp <= 0
            {
                return Err(invalid(format!("{kind:?}: health must be positive")));
            }
            if !s.speed.is_finite() || s.contact_damage < 0 || s.hit_damage < 0 {
                return Err(invalid(format!("{kind:?}: negative damage or bad speed")));
            }
        }
        Ok(())
    }
}

fn check_range(name: &str, min: f32, max: f32) -> Result<(), TuningError> {
    if min.is_finite() && max.is_finite() && min >= 0.0 && max >= min {
        Ok(())
    } else {
        Err(invalid(format!("{name}: range [{min}, {max}) is invalid")))
    }
}

fn check_positive(name: &str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn check_lunge(lunge: &LungeTiming) -> Result<(), TuningError> {
    check_range("lunge rearm", lunge.rearm_min, lunge.rearm_max)?;
    check_positive("lunge speed", lunge.speed)
}

// ---------------------------------------------------------------------------
// Platformer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    pub run_speed: f32,
    pub jump_impulse: f32,
    /// Screen space, +y down
    pub gravity: f32,
    pub attack_duration: f32,
    pub invuln_window: f32,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            run_speed: 300.0,
            jump_impulse: 720.0,
            gravity: 2160.0,
            attack_duration: 0.2,
            invuln_window: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolTuning {
    pub range: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BombTuning {
    pub patrol: PatrolTuning,
    /// Arms when the player center is closer than this
    pub trigger_radius: f32,
    pub countdown: f32,
    /// Countdown after body contact
    pub contact_countdown: f32,
    pub blast_radius: f32,
    pub blast_damage: i32,
}

impl Default for BombTuning {
    fn default() -> Self {
        Self {
            patrol: PatrolTuning { range: 80.0, speed: 90.0 },
            trigger_radius: 100.0,
            countdown: 1.0,
            contact_countdown: 0.1,
            blast_radius: 100.0,
            blast_damage: 40,
        }
    }
}

/// A pacing enemy placement: center and patrol half-range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolSpawn {
    pub pos: Vec2,
    pub range: f32,
}

/// Static level layout (screen space, +y down)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseLayout {
    pub platforms: Vec<Rect>,
    /// Player center at start
    pub player_spawn: Vec2,
    /// Falling below this is lethal
    pub kill_plane_y: f32,
    pub biscuits: Vec<Vec2>,
    pub enemies: Vec<PatrolSpawn>,
    pub bombs: Vec<Vec2>,
}

impl Default for CourseLayout {
    fn default() -> Self {
        let platforms = vec![
            Rect::new(0.0, 550.0, 3000.0, 50.0),
            Rect::new(200.0, 450.0, 120.0, 20.0),
            Rect::new(450.0, 380.0, 120.0, 20.0),
            Rect::new(700.0, 300.0, 120.0, 20.0),
            Rect::new(1000.0, 400.0, 200.0, 20.0),
            Rect::new(1300.0, 350.0, 150.0, 20.0),
            Rect::new(1600.0, 450.0, 150.0, 20.0),
            Rect::new(1900.0, 300.0, 200.0, 20.0),
            Rect::new(2200.0, 380.0, 120.0, 20.0),
            Rect::new(2500.0, 300.0, 150.0, 20.0),
            Rect::new(2800.0, 450.0, 200.0, 20.0),
        ];
        let biscuits = [
            (260.0, 420.0),
            (510.0, 350.0),
            (760.0, 270.0),
            (1100.0, 370.0),
            (1400.0, 320.0),
            (1700.0, 420.0),
            (2000.0, 270.0),
            (2300.0, 350.0),
            (2600.0, 270.0),
        ]
        .into_iter()
        .map(|(x, y)| Vec2::new(x, y))
        .collect();
        // Enemies are 40x40 and chocolates 30x30 standing on the ground
        let enemies = [(620.0, 150.0), (1220.0, 200.0), (1820.0, 150.0), (2420.0, 250.0)]
            .into_iter()
            .map(|(x, range)| PatrolSpawn {
                pos: Vec2::new(x, 530.0),
                range,
            })
            .collect();
        let bombs = [915.0, 1615.0, 2115.0, 3115.0]
            .into_iter()
            .map(|x| Vec2::new(x, 535.0))
            .collect();
        Self {
            platforms,
            player_spawn: Vec2::new(120.0, 130.0),
            kill_plane_y: 700.0,
            biscuits,
            enemies,
            bombs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerTuning {
    pub stats: StatTable,
    pub runner: RunnerTuning,
    pub lunge: LungeTiming,
    pub biscuit_patrol: PatrolTuning,
    pub enemy_speed: f32,
    pub bomb: BombTuning,
    pub flash_duration: f32,
    pub course: CourseLayout,
}

impl Default for PlatformerTuning {
    fn default() -> Self {
        let mut stats = StatTable::default();
        stats.set(
            ActorKind::Player,
            KindStats {
                radius: 20.0,
                half_extents: Vec2::new(20.0, 30.0),
                health: Some(100),
                ..Default::default()
            },
        );
        stats.set(
            ActorKind::PacingEnemy,
            KindStats {
                half_extents: Vec2::new(20.0, 20.0),
                contact_damage: 20,
                shape: HitShape::Box,
                ..Default::default()
            },
        );
        stats.set(
            ActorKind::Biscuit,
            KindStats {
                radius: 15.0,
                contact_damage: 10,
                kill_score: 1,
                ..Default::default()
            },
        );
        stats.set(
            ActorKind::ChocolateBomb,
            KindStats {
                half_extents: Vec2::new(15.0, 15.0),
                shape: HitShape::Box,
                ..Default::default()
            },
        );

        Self {
            stats,
            runner: RunnerTuning::default(),
            lunge: LungeTiming::default(),
            biscuit_patrol: PatrolTuning { range: 100.0, speed: 120.0 },
            enemy_speed: 120.0,
            bomb: BombTuning::default(),
            flash_duration: 0.1,
            course: CourseLayout::default(),
        }
    }
}

impl Default for PatrolTuning {
    fn default() -> Self {
        Self { range: 100.0, speed: 120.0 }
    }
}

impl PlatformerTuning {
    /// Parse JSON overrides on top of the defaults, then validate
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let mut tuning: PlatformerTuning = serde_json::from_str(json)?;
        let mut stats = PlatformerTuning::default().stats;
        stats.overlay(std::mem::take(&mut tuning.stats));
        tuning.stats = stats;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        self.stats.validate()?;
        check_lunge(&self.lunge)?;
        check_positive("gravity", self.runner.gravity)?;
        check_positive("attack duration", self.runner.attack_duration)?;
        check_positive("bomb countdown", self.bomb.countdown)?;
        check_positive("bomb blast radius", self.bomb.blast_radius)?;
        if self.course.platforms.is_empty() {
            return Err(invalid("course has no platforms"));
        }
        if self.course.biscuits.is_empty() {
            return Err(invalid("course has no biscuits to collect"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankTuning {
    pub move_speed: f32,
    /// Radians per second at full axis
    pub turn_rate: f32,
    pub jump_speed: f32,
    /// +y up, so negative
    pub gravity: f32,
    pub ground_y: f32,
    /// Falling below this is lethal
    pub fall_limit: f32,
    pub invuln_window: f32,
    pub bomb_debounce: f32,
    pub start_eggs: u32,
    pub max_eggs: u32,
}

impl Default for TankTuning {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            turn_rate: 3.0,
            jump_speed: 15.0,
            gravity: -30.0,
            ground_y: 0.0,
            fall_limit: -5.0,
            invuln_window: 1.5,
            bomb_debounce: 0.5,
            start_eggs: 1,
            max_eggs: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickleTuning {
    pub lifetime: f32,
    /// Spawn this far ahead of the player
    pub muzzle_offset: f32,
    pub muzzle_height: f32,
}

impl Default for PickleTuning {
    fn default() -> Self {
        Self {
            lifetime: 3.0,
            muzzle_offset: 2.0,
            muzzle_height: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpearTuning {
    /// Seconds to full charge
    pub max_charge: f32,
    pub min_speed: f32,
    pub bonus_speed: f32,
    pub min_damage: i32,
    pub bonus_damage: i32,
    pub lifetime: f32,
}

impl Default for SpearTuning {
    fn default() -> Self {
        Self {
            max_charge: 2.0,
            min_speed: 20.0,
            bonus_speed: 30.0,
            min_damage: 5,
            bonus_damage: 15,
            lifetime: 3.0,
        }
    }
}

impl SpearTuning {
    /// Speed and damage for a charge fraction in `[0, 1]`
    pub fn release(&self, percent: f32) -> (f32, i32) {
        let p = percent.clamp(0.0, 1.0);
        let speed = self.min_speed + p * self.bonus_speed;
        let damage = self.min_damage + (p * self.bonus_damage as f32).floor() as i32;
        (speed, damage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EggTuning {
    pub throw_speed: f32,
    pub lift: f32,
    pub gravity: f32,
    pub blast_radius: f32,
    pub shockwave_radius: f32,
    /// Blast damage; large enough to flatten any vulnerable hazard
    pub blast_damage: i32,
    /// How long a blast stays in the render feed
    pub blast_linger: f32,
    /// Per-frame chance of a pickup appearing
    pub pickup_chance: f64,
    pub max_pickups: usize,
    pub pickup_spread: f32,
    pub pickup_height: f32,
}

impl Default for EggTuning {
    fn default() -> Self {
        Self {
            throw_speed: 20.0,
            lift: 10.0,
            gravity: -20.0,
            blast_radius: 8.0,
            shockwave_radius: 6.0,
            blast_damage: 1000,
            blast_linger: 0.5,
            pickup_chance: 0.005,
            max_pickups: 2,
            pickup_spread: 10.0,
            pickup_height: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrotTuning {
    /// Spawns land within this radius of the center
    pub spawn_radius: f32,
    pub speed_min: f32,
    pub speed_max: f32,
}

impl Default for CarrotTuning {
    fn default() -> Self {
        Self {
            spawn_radius: 5.0,
            speed_min: 2.0,
            speed_max: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JarTuning {
    pub peanut_interval: f32,
    /// A missing ring jar is replaced this often while spawning is on
    pub refill_interval: f32,
}

impl Default for JarTuning {
    fn default() -> Self {
        Self {
            peanut_interval: 8.0,
            refill_interval: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CupcakeTuning {
    pub hop_speed: f32,
    pub hop_forward: f32,
    pub gravity: f32,
    pub rest_height: f32,
    /// First hop delay drawn from `[0, first_delay_max)`
    pub first_delay_max: f32,
    pub delay_min: f32,
    pub delay_max: f32,
}

impl Default for CupcakeTuning {
    fn default() -> Self {
        Self {
            hop_speed: 5.0,
            hop_forward: 3.0,
            gravity: 9.8,
            rest_height: 0.6,
            first_delay_max: 2.0,
            delay_min: 1.0,
            delay_max: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChocolateTuning {
    pub speed_min: f32,
    pub speed_max: f32,
    pub trigger_radius: f32,
    pub fuse: f32,
    pub blast_radius: f32,
    pub blast_damage: i32,
    /// Remnant stays in the feed this long after detonating
    pub linger: f32,
}

impl Default for ChocolateTuning {
    fn default() -> Self {
        Self {
            speed_min: 3.0,
            speed_max: 5.0,
            trigger_radius: 4.0,
            fuse: 1.2,
            blast_radius: 5.0,
            blast_damage: 40,
            linger: 0.5,
        }
    }
}

/// Ring of jars around the center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JarRing {
    pub count: u32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub height: f32,
}

/// What happens when a level's gate opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateAction {
    /// Stop spawning, clear the listed kinds and bring in a boss
    SpawnBoss {
        kind: ActorKind,
        position: Vec3,
        /// Height the boss settles at after its entrance
        hover_height: f32,
        /// Entrance pause before it starts chasing
        entrance: f32,
        clear: Vec<ActorKind>,
        announcement: String,
    },
    /// Final level won
    Victory,
}

/// What the boss's death unlocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossReward {
    pub unlock_spear: bool,
    pub announcement: String,
    /// Pause before the next level loads
    pub next_level_delay: f32,
}

impl Default for BossReward {
    fn default() -> Self {
        Self {
            unlock_spear: false,
            announcement: String::new(),
            next_level_delay: 2.0,
        }
    }
}

/// Everything needed to load one arena level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaLevel {
    pub name: String,
    pub bounds: ArenaBounds,
    pub player_spawn: Vec3,
    /// Seconds between carrot spawns (None = no carrots)
    pub carrot_interval: Option<f32>,
    pub jar_ring: Option<JarRing>,
    pub snakes: u32,
    /// Snakes, cupcakes and chocolates spawn within ±spread/2
    pub snake_spread: f32,
    pub cupcakes: u32,
    pub cupcake_spread: f32,
    pub chocolates: u32,
    pub chocolate_spread: f32,
    /// What the healers latch onto here
    pub heal_target: ActorKind,
    pub gate: Vec<Threshold>,
    pub gate_action: GateAction,
    pub reward: BossReward,
}

impl Default for ArenaLevel {
    fn default() -> Self {
        Self {
            name: String::new(),
            bounds: ArenaBounds::walled(24.0),
            player_spawn: Vec3::new(-22.0, 0.0, -22.0),
            carrot_interval: None,
            jar_ring: None,
            snakes: 0,
            snake_spread: 40.0,
            cupcakes: 0,
            cupcake_spread: 100.0,
            chocolates: 0,
            chocolate_spread: 60.0,
            heal_target: ActorKind::PeanutJar,
            gate: Vec::new(),
            gate_action: GateAction::Victory,
            reward: BossReward::default(),
        }
    }
}

fn default_levels() -> Vec<ArenaLevel> {
    let wipe = vec![
        ActorKind::Carrot,
        ActorKind::PeanutJar,
        ActorKind::Peanut,
        ActorKind::LollySnake,
    ];
    vec![
        ArenaLevel {
            name: "LEVEL 1: THE OVEN".into(),
            carrot_interval: Some(3.0),
            gate: vec![Threshold {
                kind: ActorKind::Carrot,
                at_least: 20,
            }],
            gate_action: GateAction::SpawnBoss {
                kind: ActorKind::RoastChicken,
                position: Vec3::new(0.0, 10.0, 0.0),
                hover_height: 3.0,
                entrance: 1.0,
                clear: Vec::new(),
                announcement: "BOSS FIGHT: ROAST CHICKEN!".into(),
            },
            reward: BossReward {
                unlock_spear: true,
                announcement: "BONE SPEAR UNLOCKED! Hold the special key to charge!".into(),
                next_level_delay: 2.0,
            },
            ..Default::default()
        },
        ArenaLevel {
            name: "LEVEL 2: THE CUPBOARD".into(),
            player_spawn: Vec3::new(-22.0, 1.0, -22.0),
            carrot_interval: Some(2.0),
            jar_ring: Some(JarRing {
                count: 5,
                radius_min: 12.0,
                radius_max: 15.0,
                height: 1.0,
            }),
            snakes: 2,
            gate: vec![
                Threshold {
                    kind: ActorKind::PeanutJar,
                    at_least: 12,
                },
                Threshold {
                    kind: ActorKind::Carrot,
                    at_least: 7,
                },
            ],
            gate_action: GateAction::SpawnBoss {
                kind: ActorKind::FlourBag,
                position: Vec3::ZERO,
                hover_height: 0.0,
                entrance: 0.0,
                clear: wipe,
                announcement: "BOSS FIGHT: THE FLOUR BAG!".into(),
            },
            reward: BossReward {
                unlock_spear: false,
                announcement: "LEVEL CLEAR! ENTERING THE DINING ROOM...".into(),
                next_level_delay: 5.0,
            },
            ..Default::default()
        },
        ArenaLevel {
            name: "LEVEL 3: THE TABLE".into(),
            bounds: ArenaBounds::open_floor(100.0),
            player_spawn: Vec3::new(-80.0, 1.0, -80.0),
            carrot_interval: Some(1.5),
            snakes: 3,
            snake_spread: 80.0,
            cupcakes: 6,
            chocolates: 4,
            heal_target: ActorKind::Cupcake,
            gate: vec![
                Threshold {
                    kind: ActorKind::Cupcake,
                    at_least: 6,
                },
                Threshold {
                    kind: ActorKind::Chocolate,
                    at_least: 4,
                },
            ],
            gate_action: GateAction::Victory,
            ..Default::default()
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub stats: StatTable,
    pub tank: TankTuning,
    pub pickle: PickleTuning,
    pub spear: SpearTuning,
    pub egg: EggTuning,
    pub carrot: CarrotTuning,
    pub jar: JarTuning,
    pub healer: HealerTiming,
    pub cupcake: CupcakeTuning,
    pub chocolate: ChocolateTuning,
    pub flash_duration: f32,
    pub levels: Vec<ArenaLevel>,
}

fn circle(radius: f32, health: Option<i32>) -> KindStats {
    KindStats {
        radius,
        health,
        ..Default::default()
    }
}

impl Default for ArenaTuning {
    fn default() -> Self {
        let mut stats = StatTable::default();
        stats.set(ActorKind::Player, circle(1.0, Some(100)));
        stats.set(
            ActorKind::Carrot,
            KindStats {
                contact_damage: 20,
                kill_score: 10,
                blast_vulnerable: true,
                ..circle(1.0, Some(1))
            },
        );
        stats.set(
            ActorKind::PeanutJar,
            KindStats {
                kill_score: 50,
                blast_vulnerable: true,
                ..circle(1.5, Some(3))
            },
        );
        stats.set(
            ActorKind::Peanut,
            KindStats {
                speed: 5.0,
                contact_damage: 5,
                kill_score: 5,
                blast_vulnerable: true,
                ..circle(0.5, Some(1))
            },
        );
        stats.set(
            ActorKind::LollySnake,
            KindStats {
                kill_score: 20,
                ..circle(0.5, Some(2))
            },
        );
        stats.set(
            ActorKind::Cupcake,
            KindStats {
                contact_damage: 15,
                kill_score: 15,
                blast_vulnerable: true,
                ..circle(0.5, Some(2))
            },
        );
        stats.set(
            ActorKind::Chocolate,
            KindStats {
                contact_damage: 20,
                kill_score: 20,
                ..circle(0.7, Some(1))
            },
        );
        stats.set(
            ActorKind::RoastChicken,
            KindStats {
                speed: 1.0,
                contact_damage: 20,
                hit_score: 5,
                ..circle(3.5, Some(50))
            },
        );
        stats.set(
            ActorKind::FlourBag,
            KindStats {
                speed: 1.2,
                contact_damage: 20,
                hit_score: 5,
                kill_score: 1000,
                ..circle(3.5, Some(40))
            },
        );
        stats.set(
            ActorKind::Pickle,
            KindStats {
                speed: 20.0,
                hit_damage: 1,
                ..circle(0.5, None)
            },
        );
        stats.set(
            ActorKind::BoneSpear,
            KindStats {
                hit_damage: 5,
                ..circle(1.0, None)
            },
        );
        stats.set(ActorKind::Egg, circle(0.3, None));
        stats.set(ActorKind::EggPickup, circle(1.0, None));
        stats.set(ActorKind::Blast, circle(0.0, None));

        Self {
            stats,
            tank: TankTuning::default(),
            pickle: PickleTuning::default(),
            spear: SpearTuning::default(),
            egg: EggTuning::default(),
            carrot: CarrotTuning::default(),
            jar: JarTuning::default(),
            healer: HealerTiming::default(),
            cupcake: CupcakeTuning::default(),
            chocolate: ChocolateTuning::default(),
            flash_duration: 0.1,
            levels: default_levels(),
        }
    }
}

impl ArenaTuning {
    /// Parse JSON overrides on top of the defaults, then validate
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let mut tuning: ArenaTuning = serde_json::from_str(json)?;
        let mut stats = ArenaTuning::default().stats;
        stats.overlay(std::mem::take(&mut tuning.stats));
        tuning.stats = stats;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Level plan for a 1-based level number
    pub fn level(&self, level: u8) -> Option<&ArenaLevel> {
        self.levels.get(usize::from(level).checked_sub(1)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        self.stats.validate()?;
        check_positive("spear max charge", self.spear.max_charge)?;
        check_range("carrot speed", self.carrot.speed_min, self.carrot.speed_max)?;
        check_range("chocolate speed", self.chocolate.speed_min, self.chocolate.speed_max)?;
        check_range("cupcake delay", self.cupcake.delay_min, self.cupcake.delay_max)?;
        check_positive("healer interval", self.healer.heal_interval)?;
        check_positive("jar peanut interval", self.jar.peanut_interval)?;
        if !(0.0..=1.0).contains(&self.egg.pickup_chance) {
            return Err(invalid("egg pickup chance must be within [0, 1]"));
        }
        if self.levels.is_empty() {
            return Err(invalid("no arena levels"));
        }
        if self.levels.len() > usize::from(u8::MAX) {
            return Err(invalid("too many arena levels"));
        }
        for (i, level) in self.levels.iter().enumerate() {
            if let Some(interval) = level.carrot_interval {
                check_positive(&format!("level {} carrot interval", i + 1), interval)?;
            }
            if let Some(ring) = level.jar_ring {
                check_range("jar ring radius", ring.radius_min, ring.radius_max)?;
            }
            if level.gate.is_empty() {
                return Err(invalid(format!("level {} has no gate", i + 1)));
            }
        }
        Ok(())
    }
}
