//! Combat resolution helpers
//!
//! Pass order each frame is projectiles, then contact, then area blasts. The
//! game modules drive the passes; this module holds the pieces that make the
//! order and tie-breaks hold: first-hit lookup in roster order, blast target
//! collection under the configured stacking policy, and the one-contact-per-
//! frame guard.

use std::collections::HashSet;

use super::actor::{ActorId, Body};
use super::collision::{HitShape, bodies_touch, within_radius};
use super::geom::Vector;
use crate::settings::ExplosionPolicy;

/// One hit-test candidate: a live actor's id, body and the test it uses
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a, V> {
    pub id: ActorId,
    pub body: &'a Body<V>,
    pub shape: HitShape,
}

/// First candidate (in iteration order, which callers keep as roster order)
/// touching `probe`, not the nearest.
pub fn first_hit<'a, V: Vector + 'a>(
    probe: &Body<V>,
    candidates: impl IntoIterator<Item = Candidate<'a, V>>,
) -> Option<ActorId> {
    candidates
        .into_iter()
        .find(|c| bodies_touch(probe, c.body, c.shape))
        .map(|c| c.id)
}

/// Every candidate whose center lies inside the blast, in iteration order
pub fn blast_targets<'a, V: Vector + 'a>(
    center: V,
    radius: f32,
    candidates: impl IntoIterator<Item = Candidate<'a, V>>,
) -> Vec<ActorId> {
    candidates
        .into_iter()
        .filter(|c| within_radius(center, radius, c.body.pos))
        .map(|c| c.id)
        .collect()
}

/// Per-frame record of who has been caught by a blast
#[derive(Debug, Clone, Default)]
pub struct BlastLedger {
    policy: ExplosionPolicy,
    hit: HashSet<ActorId>,
}

impl BlastLedger {
    pub fn new(policy: ExplosionPolicy) -> Self {
        Self {
            policy,
            hit: HashSet::new(),
        }
    }

    /// Whether `id` may take damage from another blast this frame.
    /// `Stack` always admits; `Dedup` admits each id once per frame.
    pub fn admit(&mut self, id: ActorId) -> bool {
        match self.policy {
            ExplosionPolicy::Stack => true,
            ExplosionPolicy::Dedup => self.hit.insert(id),
        }
    }
}

/// Allows at most one contact-damage application to the player per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactGuard {
    spent: bool,
}

impl ContactGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    /// Run `apply` unless a contact already landed this frame. `apply` returns
    /// whether damage actually landed (it may be absorbed by invulnerability).
    pub fn try_apply(&mut self, apply: impl FnOnce() -> bool) -> bool {
        if self.spent {
            return false;
        }
        self.spent = apply();
        self.spent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn bodies() -> Vec<(ActorId, Body<Vec3>)> {
        vec![
            (ActorId(1), Body::circle(Vec3::new(0.9, 0.0, 0.0), 1.0)),
            (ActorId(2), Body::circle(Vec3::new(0.2, 0.0, 0.0), 1.0)),
            (ActorId(3), Body::circle(Vec3::new(30.0, 0.0, 0.0), 1.0)),
        ]
    }

    fn candidates(list: &[(ActorId, Body<Vec3>)]) -> impl Iterator<Item = Candidate<'_, Vec3>> {
        list.iter().map(|(id, body)| Candidate {
            id: *id,
            body,
            shape: HitShape::Circle,
        })
    }

    #[test]
    fn test_first_hit_is_roster_order_not_nearest() {
        let list = bodies();
        let probe = Body::circle(Vec3::ZERO, 0.5);
        // #2 is nearer but #1 comes first
        assert_eq!(first_hit(&probe, candidates(&list)), Some(ActorId(1)));
    }

    #[test]
    fn test_first_hit_none_out_of_range() {
        let list = bodies();
        let probe = Body::circle(Vec3::new(-20.0, 0.0, 0.0), 0.5);
        assert_eq!(first_hit(&probe, candidates(&list)), None);
    }

    #[test]
    fn test_blast_targets_collects_all_in_radius() {
        let list = bodies();
        assert_eq!(
            blast_targets(Vec3::ZERO, 5.0, candidates(&list)),
            vec![ActorId(1), ActorId(2)]
        );
    }

    #[test]
    fn test_blast_ledger_policies() {
        let mut stack = BlastLedger::new(ExplosionPolicy::Stack);
        assert!(stack.admit(ActorId(1)));
        assert!(stack.admit(ActorId(1)));

        let mut dedup = BlastLedger::new(ExplosionPolicy::Dedup);
        assert!(dedup.admit(ActorId(1)));
        assert!(!dedup.admit(ActorId(1)));
        assert!(dedup.admit(ActorId(2)));
    }

    #[test]
    fn test_contact_guard_single_application() {
        let mut guard = ContactGuard::new();
        let mut applied = 0;
        // Absorbed contact doesn't spend the guard
        assert!(!guard.try_apply(|| false));
        assert!(guard.try_apply(|| {
            applied += 1;
            true
        }));
        assert!(!guard.try_apply(|| {
            applied += 1;
            true
        }));
        assert_eq!(applied, 1);
        assert!(guard.is_spent());
    }
}
