//! Polling for asynchronous state transitions.
//!
//! Cloud APIs often accept a request and then provision in the background.
//! [`StateChangeConf`] repeatedly refreshes a resource until its state reaches
//! one of the target states, failing fast on any state it does not expect.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::error::LookupError;

/// First wait between refreshes; doubled after every refresh.
const INITIAL_WAIT: Duration = Duration::from_millis(100);

/// Upper bound of the doubling wait.
const MAX_WAIT: Duration = Duration::from_secs(10);

/// Poll intervals at or above this are ignored.
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Consecutive "not found" refreshes tolerated before giving up.
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// Configuration for waiting on a state transition.
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pub pending: Vec<String>,
    pub target: Vec<String>,
    /// Overall time allowed for the transition.
    pub timeout: Duration,
    /// Smallest wait between refreshes.
    pub min_timeout: Duration,
    /// Wait before the first refresh.
    pub delay: Duration,
    /// Fixed wait between refreshes; zero selects the doubling wait.
    pub poll_interval: Duration,
    pub not_found_checks: u32,
}

impl StateChangeConf {
    pub fn new(pending: &[&str], target: &[&str], timeout: Duration) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            timeout,
            min_timeout: Duration::ZERO,
            delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
        }
    }

    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Refresh until a target state is reached.
    ///
    /// `refresh` returns the current resource and its state, or `None` if the
    /// resource cannot be found yet.
    ///
    /// # Errors
    ///
    /// - `LookupError::Timeout` if `timeout` elapses first
    /// - `LookupError::UnexpectedState` if a state is neither pending nor a target
    /// - `LookupError::NotFound` after too many consecutive `None` refreshes
    /// - any error returned by `refresh`
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> Result<T, LookupError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<(T, String)>, LookupError>>,
    {
        let mut last_state = String::new();
        let outcome =
            tokio::time::timeout(self.timeout, self.poll(&mut refresh, &mut last_state)).await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout {
                expected: self.target.join(", "),
                last_state,
            }),
        }
    }

    async fn poll<T, F, Fut>(
        &self,
        refresh: &mut F,
        last_state: &mut String,
    ) -> Result<T, LookupError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<(T, String)>, LookupError>>,
    {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let mut wait = INITIAL_WAIT;
        let mut not_found = 0u32;

        loop {
            match refresh().await? {
                None => {
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(LookupError::NotFound);
                    }
                    debug!(attempt = not_found, "resource not found yet");
                }
                Some((value, state)) => {
                    not_found = 0;
                    if self.target.contains(&state) {
                        debug!(%state, "target state reached");
                        return Ok(value);
                    }
                    if !self.pending.contains(&state) {
                        return Err(LookupError::UnexpectedState {
                            state,
                            expected: self.target.join(", "),
                        });
                    }
                    debug!(%state, "still pending");
                    *last_state = state;
                }
            }

            wait = self.next_wait(wait);
            sleep(wait).await;
        }
    }

    fn next_wait(&self, previous: Duration) -> Duration {
        if !self.poll_interval.is_zero() && self.poll_interval < MAX_POLL_INTERVAL {
            return self.poll_interval;
        }
        (previous * 2).min(MAX_WAIT).max(self.min_timeout)
    }
}
