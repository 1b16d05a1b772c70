//! Actor roster
//!
//! The only owner of actors. Keeps insertion order (which is also id order,
//! since ids are monotonic), so "first in roster order" is stable and
//! deterministic. Removal is deferred: `remove` only marks, `compact` deletes.

use super::actor::ActorId;

/// What the roster needs to know about an actor
pub trait RosterEntry {
    fn id(&self) -> ActorId;

    /// Reached a terminal state (dead, exploded, consumed)
    fn is_terminal(&self) -> bool;
}

#[derive(Debug, Clone)]
struct Slot<T> {
    actor: T,
    removed: bool,
}

#[derive(Debug, Clone)]
pub struct Roster<T> {
    slots: Vec<Slot<T>>,
    next_id: u32,
}

impl<T> Default for Roster<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T: RosterEntry> Roster<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out an id without inserting anything (the player, fixtures)
    pub fn allocate_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a new actor built around a fresh id
    pub fn spawn(&mut self, make: impl FnOnce(ActorId) -> T) -> ActorId {
        let id = self.allocate_id();
        let actor = make(id);
        debug_assert_eq!(actor.id(), id);
        self.slots.push(Slot { actor, removed: false });
        id
    }

    fn slot_index(&self, id: ActorId) -> Option<usize> {
        self.slots.binary_search_by_key(&id, |s| s.actor.id()).ok()
    }

    /// Weak lookup: None once removed. Terminal actors still resolve until the
    /// end-of-frame compaction so their final state can be read.
    pub fn get(&self, id: ActorId) -> Option<&T> {
        let idx = self.slot_index(id)?;
        let slot = &self.slots[idx];
        (!slot.removed).then_some(&slot.actor)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut T> {
        let idx = self.slot_index(id)?;
        let slot = &mut self.slots[idx];
        (!slot.removed).then_some(&mut slot.actor)
    }

    /// Present, not removed, not terminal
    pub fn is_live(&self, id: ActorId) -> bool {
        self.get(id).is_some_and(|a| !a.is_terminal())
    }

    /// Mark for removal at the end of the frame. Returns false if the actor
    /// was already removed (or never existed), so callers can gate one-shot
    /// bookkeeping on it.
    pub fn remove(&mut self, id: ActorId) -> bool {
        match self.slot_index(id) {
            Some(idx) if !self.slots[idx].removed => {
                self.slots[idx].removed = true;
                true
            }
            _ => false,
        }
    }

    /// Mark every non-removed actor matching `pred`; returns how many
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let mut count = 0;
        for slot in self.slots.iter_mut().filter(|s| !s.removed) {
            if pred(&slot.actor) {
                slot.removed = true;
                count += 1;
            }
        }
        count
    }

    /// Live actors in roster order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots
            .iter()
            .filter(|s| !s.removed && !s.actor.is_terminal())
            .map(|s| &s.actor)
    }

    /// Live actors, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots
            .iter_mut()
            .filter(|s| !s.removed && !s.actor.is_terminal())
            .map(|s| &mut s.actor)
    }

    /// Everything not yet removed, including terminal actors (render feed)
    pub fn iter_present(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter(|s| !s.removed).map(|s| &s.actor)
    }

    /// Snapshot of live ids, for loops that mutate the roster
    pub fn live_ids(&self) -> Vec<ActorId> {
        self.iter().map(|a| a.id()).collect()
    }

    pub fn count_where(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.iter().filter(|&a| pred(a)).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// End-of-frame compaction: drop removed and terminal actors, returning them
    /// in roster order.
    pub fn compact(&mut self) -> Vec<T> {
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.slots.len());
        for slot in self.slots.drain(..) {
            if slot.removed || slot.actor.is_terminal() {
                dropped.push(slot.actor);
            } else {
                kept.push(slot);
            }
        }
        self.slots = kept;
        dropped
    }
}
