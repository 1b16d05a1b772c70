//! Deferred one-shot effects
//!
//! Stand-in for fire-and-forget timers (flash revert, delayed despawn, level
//! load after a pause). Payloads are plain data naming actors by id; the game
//! drains due entries at the top of its frame and resolves each id against the
//! roster, so an effect whose actor is already gone does nothing.

#[derive(Debug, Clone)]
struct Pending<E> {
    due: f64,
    seq: u64,
    effect: E,
}

#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    /// Seconds since creation; f64 so long sessions keep sub-frame resolution
    now: f64,
    seq: u64,
    pending: Vec<Pending<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            now: 0.0,
            seq: 0,
            pending: Vec::new(),
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `effect` to fire `delay` seconds from now
    pub fn schedule(&mut self, delay: f32, effect: E) {
        let seq = self.seq;
        self.seq += 1;
        self.pending.push(Pending {
            due: self.now + f64::from(delay.max(0.0)),
            seq,
            effect,
        });
    }

    /// Advance the clock and take everything now due, ordered by due time then
    /// scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<E> {
        self.now += f64::from(dt);
        let now = self.now;
        let (mut due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|p| p.effect).collect()
    }

    /// Drop everything queued (level change)
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut sched = Scheduler::new();
        sched.schedule(0.3, "late");
        sched.schedule(0.1, "early");
        sched.schedule(0.1, "early-second");
        assert!(sched.advance(0.05).is_empty());
        assert_eq!(sched.advance(0.1), vec!["early", "early-second"]);
        assert_eq!(sched.advance(0.5), vec!["late"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_zero_delay_fires_next_advance() {
        let mut sched = Scheduler::new();
        sched.schedule(0.0, 1);
        sched.schedule(-3.0, 2);
        assert_eq!(sched.advance(0.0), vec![1, 2]);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut sched = Scheduler::new();
        sched.schedule(1.0, 10);
        sched.schedule(2.0, 11);
        sched.clear();
        assert!(sched.is_empty());
        assert!(sched.advance(5.0).is_empty());
    }

    #[test]
    fn test_short_delays_late_in_session() {
        let mut sched = Scheduler::new();
        sched.advance(100_000.0);
        sched.schedule(0.001, "flash");
        assert!(sched.advance(0.0005).is_empty());
        assert_eq!(sched.advance(0.0005), vec!["flash"]);
    }
}
