//! Per-key delay queue.
//!
//! Holds at most one pending timer per key. Arming a key that already has a
//! timer replaces it (payload and deadline). Time never advances on its own:
//! callers pass `now` explicitly, so the queue can be driven by a real clock
//! or stepped deterministically.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::time::Instant;

struct Pending<T> {
    id: u64,
    deadline: Instant,
    payload: T,
}

pub struct TimerQueue<K, T> {
    pending: HashMap<K, Pending<T>>,
    // Stale heap entries (cancelled or replaced) are skipped when popped.
    heap: BinaryHeap<Reverse<(Instant, u64, K)>>,
    next_id: u64,
}

impl<K, T> Default for TimerQueue<K, T>
where
    K: Copy + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> TimerQueue<K, T>
where
    K: Copy + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self { pending: HashMap::new(), heap: BinaryHeap::new(), next_id: 0 }
    }

    /// Arm the timer for `key`, dropping any payload already pending for it.
    /// Returns the replaced payload, if any.
    pub fn schedule(&mut self, key: K, deadline: Instant, payload: T) -> Option<T> {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((deadline, id, key)));
        let replaced = self.pending.insert(key, Pending { id, deadline, payload }).map(|p| p.payload);
        self.compact();
        replaced
    }

    /// Disarm the timer for `key`. A cancelled timer never fires.
    pub fn cancel(&mut self, key: &K) -> Option<T> {
        let removed = self.pending.remove(key).map(|p| p.payload);
        self.compact();
        removed
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.pending.get(key).map(|p| p.deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline among live timers.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stale();
        self.heap.peek().map(|Reverse((deadline, _, _))| *deadline)
    }

    /// Remove and return the next timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(K, T)> {
        self.discard_stale();
        let Reverse((deadline, _, key)) = *self.heap.peek()?;
        if deadline > now {
            return None;
        }
        self.heap.pop();
        self.pending.remove(&key).map(|p| (key, p.payload))
    }

    /// Remove every live timer regardless of deadline, earliest first.
    pub fn drain(&mut self) -> Vec<(K, T)> {
        let mut out = Vec::with_capacity(self.pending.len());
        while let Some(Reverse((_, id, key))) = self.heap.pop() {
            if self.is_live(id, &key) {
                if let Some(p) = self.pending.remove(&key) {
                    out.push((key, p.payload));
                }
            }
        }
        out
    }

    fn is_live(&self, id: u64, key: &K) -> bool {
        self.pending.get(key).is_some_and(|p| p.id == id)
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((_, id, key))) = self.heap.peek() {
            if self.is_live(*id, key) {
                break;
            }
            self.heap.pop();
        }
    }

    // Keeps the heap from growing without bound under constant retriggering.
    fn compact(&mut self) {
        if self.heap.len() > 2 * self.pending.len() + 64 {
            let pending = &self.pending;
            self.heap.retain(|Reverse((_, id, key))| pending.get(key).is_some_and(|p| p.id == *id));
        }
    }
}
