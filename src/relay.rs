//! Delay/debounce relay.
//!
//! Presses go straight through. Releases are held back for `delay` and only
//! the newest release per key is ever sent. With `debounce` on, a press that
//! arrives while its key still has a release pending is dropped; otherwise
//! the pending release is cancelled and the press is sent.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::event::{Classified, NoteEvent, NoteKey};
use crate::io::output::NoteSink;
use crate::timers::TimerQueue;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub delay: Duration,
    pub debounce: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { delay: DEFAULT_DELAY, debounce: false }
    }
}

pub struct Relay {
    config: RelayConfig,
    pending: TimerQueue<NoteKey, NoteEvent>,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        Self { config, pending: TimerQueue::new() }
    }

    pub fn config(&self) -> RelayConfig {
        self.config
    }

    /// Classify `event` and dispatch it to the press or release path.
    pub fn handle(&mut self, event: NoteEvent, now: Instant, out: &mut impl NoteSink) {
        match event.classify() {
            Classified::NoteOn => self.on_note_on(event, out),
            Classified::FakeNoteOff | Classified::NoteOff => self.on_note_off(event, now),
        }
    }

    /// Only call with a real note on (velocity > 0).
    pub fn on_note_on(&mut self, event: NoteEvent, out: &mut impl NoteSink) {
        let key = event.key();
        if self.config.debounce {
            if self.pending.is_pending(&key) {
                debug!(key = %key, "release pending, dropping retrigger");
                return;
            }
        } else {
            self.cancel_pending(&key);
        }
        emit(event, out);
    }

    /// Arm (or re-arm) the delayed release for this key with `event` as payload.
    pub fn on_note_off(&mut self, event: NoteEvent, now: Instant) {
        let key = event.key();
        let deadline = now + self.config.delay;
        if let Some(replaced) = self.pending.schedule(key, deadline, event) {
            trace!(key = %key, %replaced, "release rescheduled");
        }
    }

    pub fn cancel_pending(&mut self, key: &NoteKey) {
        if let Some(dropped) = self.pending.cancel(key) {
            trace!(key = %key, %dropped, "pending release cancelled");
        }
    }

    /// Send every release whose deadline is `<= now`. Returns how many fired.
    pub fn fire_due(&mut self, now: Instant, out: &mut impl NoteSink) -> usize {
        let mut fired = 0;
        while let Some((_, event)) = self.pending.pop_due(now) {
            emit(event, out);
            fired += 1;
        }
        fired
    }

    /// Send every pending release immediately, e.g. on shutdown.
    pub fn flush(&mut self, out: &mut impl NoteSink) -> usize {
        let drained = self.pending.drain();
        let count = drained.len();
        for (_, event) in drained {
            emit(event, out);
        }
        count
    }

    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.pending.next_deadline()
    }

    pub fn is_pending(&self, key: &NoteKey) -> bool {
        self.pending.is_pending(key)
    }

    pub fn pending_deadline(&self, key: &NoteKey) -> Option<Instant> {
        self.pending.deadline(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn emit(event: NoteEvent, out: &mut impl NoteSink) {
    debug!(
        kind = event.kind.as_str(),
        channel = event.channel,
        note = event.note,
        velocity = event.velocity,
        "send"
    );
    out.send(&event);
}
