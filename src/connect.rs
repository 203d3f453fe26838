//! Fixed-interval reconnect loop used to wait for the input device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{RelayError, Result};

pub const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

// Longest a sleeping thread goes without looking at the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Shared shutdown request. Cloning hands out another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for `dur`, waking early if shutdown is requested.
    /// Returns `false` when woken by a shutdown request.
    pub fn sleep(&self, dur: Duration) -> bool {
        let until = Instant::now() + dur;
        loop {
            if self.is_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= until {
                return true;
            }
            thread::sleep((until - now).min(SHUTDOWN_POLL));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts. Zero means a failed attempt is final.
    pub interval: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self { interval, max_attempts: None }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = Some(max);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_WAIT)
    }
}

/// Run `attempt` until it succeeds.
///
/// `attempt` receives the 1-based attempt number. The last error is returned
/// when the interval is zero or `max_attempts` is used up, and
/// [`RelayError::Cancelled`] once `shutdown` is requested.
pub fn establish<T, F>(policy: &RetryPolicy, shutdown: &Shutdown, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let mut n = 0u32;
    loop {
        if shutdown.is_requested() {
            return Err(RelayError::Cancelled);
        }
        n = n.saturating_add(1);
        let err = match attempt(n) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if policy.interval.is_zero() || policy.max_attempts.is_some_and(|max| n >= max) {
            return Err(err);
        }
        warn!(attempt = n, "{}, retrying in {} ms", err, policy.interval.as_millis());
        if !shutdown.sleep(policy.interval) {
            return Err(RelayError::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> RelayError {
        RelayError::DeviceNotFound { name: "keys".into() }
    }

    #[test]
    fn retries_until_device_appears() {
        let policy = RetryPolicy::fixed(Duration::from_millis(1));
        let mut calls = Vec::new();
        let got = establish(&policy, &Shutdown::new(), |n| {
            calls.push(n);
            if n < 3 { Err(not_found()) } else { Ok("conn") }
        });
        assert_eq!(got.unwrap(), "conn");
        assert_eq!(calls, vec![1, 2, 3]);
    }

    #[test]
    fn zero_interval_fails_on_first_error() {
        let policy = RetryPolicy::fixed(Duration::ZERO);
        let mut calls = 0;
        let got: Result<()> = establish(&policy, &Shutdown::new(), |_| {
            calls += 1;
            Err(not_found())
        });
        assert!(matches!(got, Err(RelayError::DeviceNotFound { ref name }) if name == "keys"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::fixed(Duration::from_millis(1)).with_max_attempts(4);
        let mut calls = 0;
        let got: Result<()> = establish(&policy, &Shutdown::new(), |_| {
            calls += 1;
            Err(not_found())
        });
        assert!(matches!(got, Err(RelayError::DeviceNotFound { .. })));
        assert_eq!(calls, 4);
    }

    #[test]
    fn shutdown_before_first_attempt() {
        let shutdown = Shutdown::new();
        shutdown.request();
        let got: Result<()> = establish(&RetryPolicy::default(), &shutdown, |_| panic!("must not try"));
        assert!(matches!(got, Err(RelayError::Cancelled)));
    }

    #[test]
    fn shutdown_interrupts_the_wait() {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        let policy = RetryPolicy::fixed(Duration::from_secs(60));
        let started = Instant::now();
        let got: Result<()> = establish(&policy, &shutdown, |_| {
            trigger.request();
            Err(not_found())
        });
        assert!(matches!(got, Err(RelayError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
