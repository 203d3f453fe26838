//! The relay thread.
//!
//! Owns the [`Relay`] and the output sink. Raw messages arrive from the
//! input callback over an mpsc channel; between messages the thread sleeps
//! until the next release is due. Everything happens on this one thread, so
//! a cancelled release can never race with its own firing.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::connect::Shutdown;
use crate::event::NoteEvent;
use crate::io::output::NoteSink;
use crate::relay::Relay;

// Upper bound on one wait so a shutdown request is noticed promptly.
const IDLE_POLL: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Every input sender was dropped.
    InputClosed,
    Shutdown,
}

pub struct Driver<S, C = SystemClock> {
    relay: Relay,
    sink: S,
    clock: C,
    shutdown: Shutdown,
}

impl<S: NoteSink> Driver<S, SystemClock> {
    pub fn new(relay: Relay, sink: S, shutdown: Shutdown) -> Self {
        Self::with_clock(relay, sink, SystemClock, shutdown)
    }
}

impl<S: NoteSink, C: Clock> Driver<S, C> {
    pub fn with_clock(relay: Relay, sink: S, clock: C, shutdown: Shutdown) -> Self {
        Self { relay, sink, clock, shutdown }
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process input until it closes or shutdown is requested. Pending
    /// releases are sent before returning so no note is left hanging.
    pub fn run(&mut self, rx: &Receiver<Vec<u8>>) -> Exit {
        let exit = loop {
            if self.shutdown.is_requested() {
                break Exit::Shutdown;
            }
            let now = self.clock.now();
            self.relay.fire_due(now, &mut self.sink);

            let wait = match self.relay.next_deadline() {
                Some(deadline) => deadline.saturating_duration_since(now).min(IDLE_POLL),
                None => IDLE_POLL,
            };
            match rx.recv_timeout(wait) {
                Ok(raw) => self.dispatch(&raw),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break Exit::InputClosed,
            }
        };

        let flushed = self.relay.flush(&mut self.sink);
        if flushed > 0 {
            debug!(count = flushed, "sent pending releases early");
        }
        info!(?exit, "relay stopped");
        exit
    }

    fn dispatch(&mut self, raw: &[u8]) {
        let Some(event) = NoteEvent::from_bytes(raw) else {
            trace!(?raw, "ignoring non-note message");
            return;
        };
        let now = self.clock.now();
        // Releases that came due while we were blocked go out before this
        // event so that per-key order follows time.
        self.relay.fire_due(now, &mut self.sink);
        self.relay.handle(event, now, &mut self.sink);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;
    use std::time::Instant;

    use super::*;
    use crate::clock::ManualClock;
    use crate::relay::RelayConfig;

    #[test]
    fn closed_input_flushes_pending_releases() {
        let (tx, rx) = channel();
        tx.send(vec![0x90, 60, 100]).unwrap();
        tx.send(vec![0xB0, 1, 2]).unwrap();
        tx.send(vec![0x80, 60, 0]).unwrap();
        drop(tx);

        let clock = ManualClock::new(Instant::now());
        let relay = Relay::new(RelayConfig { delay: Duration::from_secs(3600), debounce: false });
        let mut driver = Driver::with_clock(relay, Vec::<NoteEvent>::new(), &clock, Shutdown::new());
        assert_eq!(driver.run(&rx), Exit::InputClosed);
        assert_eq!(
            driver.into_sink(),
            vec![NoteEvent::note_on(0, 60, 100), NoteEvent::note_off(0, 60, 0)]
        );
    }

    #[test]
    fn due_release_goes_out_before_next_event() {
        let (tx, rx) = channel();
        tx.send(vec![0x80, 60, 0]).unwrap();
        drop(tx);

        let clock = ManualClock::new(Instant::now());
        let relay = Relay::new(RelayConfig { delay: Duration::from_millis(100), debounce: false });
        let mut driver = Driver::with_clock(relay, Vec::<NoteEvent>::new(), &clock, Shutdown::new());
        driver.dispatch(&[0x80, 61, 0]);
        clock.advance(Duration::from_millis(150));
        driver.dispatch(&[0x90, 61, 100]);
        assert_eq!(driver.relay().pending_count(), 0);
        assert_eq!(driver.run(&rx), Exit::InputClosed);
        assert_eq!(
            driver.into_sink(),
            vec![
                NoteEvent::note_off(0, 61, 0),
                NoteEvent::note_on(0, 61, 100),
                NoteEvent::note_off(0, 60, 0),
            ]
        );
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let (_tx, rx) = channel::<Vec<u8>>();
        let shutdown = Shutdown::new();
        shutdown.request();
        let mut driver = Driver::new(Relay::new(RelayConfig::default()), Vec::<NoteEvent>::new(), shutdown);
        assert_eq!(driver.run(&rx), Exit::Shutdown);
        assert!(driver.into_sink().is_empty());
    }
}
