use crate::config::{CacheConfig, MAX_DURATION_SECONDS};
use crate::store::{StoreError, StoreResult};
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerSnapshot {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    pub consecutive_failures: u32,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Breaker settings of the remote tier; `None` when the threshold is 0.
    pub fn for_remote_tier(cache: &CacheConfig) -> Option<Self> {
        (cache.remote_breaker_threshold > 0).then(|| Self {
            failure_threshold: cache.remote_breaker_threshold,
            cooldown: Duration::from_millis(cache.remote_breaker_cooldown_ms),
        })
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

#[derive(Debug)]
struct State {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// Consecutive-failure breaker guarding a tier.
///
/// - Counts consecutive failures; any success resets the count
/// - Opens for `cooldown` once the threshold is reached
/// - After the cooldown the next call is let through again
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    state: std::sync::Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg,
            state: std::sync::Mutex::new(State {
                consecutive_failures: 0,
                open_until: None,
            }),
        }
    }

    /// `Err(Unavailable)` while open.
    pub fn allow(&self) -> StoreResult<()> {
        let mut st = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("circuit breaker poisoned".into()))?;
        if let Some(until) = st.open_until {
            if Instant::now() < until {
                return Err(StoreError::Unavailable("circuit breaker open".into()));
            }
            // cooldown expired
            st.open_until = None;
            st.consecutive_failures = 0;
        }
        Ok(())
    }

    pub fn on_success(&self) {
        if let Ok(mut st) = self.state.lock() {
            st.consecutive_failures = 0;
            st.open_until = None;
        }
    }

    pub fn on_failure(&self) {
        if let Ok(mut st) = self.state.lock() {
            st.consecutive_failures = st.consecutive_failures.saturating_add(1);
            if st.consecutive_failures >= self.cfg.failure_threshold && st.open_until.is_none() {
                warn!(
                    failures = st.consecutive_failures,
                    cooldown_ms = self.cfg.cooldown.as_millis() as u64,
                    "circuit breaker opened"
                );
                let now = Instant::now();
                let until = now
                    .checked_add(self.cfg.cooldown)
                    .unwrap_or_else(|| now + Duration::from_secs(MAX_DURATION_SECONDS));
                st.open_until = Some(until);
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.snapshot().open_remaining_ms.is_some()
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let now = Instant::now();
        let (consecutive_failures, open_remaining_ms) = match self.state.lock() {
            Ok(st) => (
                st.consecutive_failures,
                st.open_until
                    .filter(|until| *until > now)
                    .map(|until| (until - now).as_millis() as u64),
            ),
            Err(_) => (0, None),
        };
        CircuitBreakerSnapshot {
            failure_threshold: self.cfg.failure_threshold,
            cooldown_ms: self.cfg.cooldown.as_millis() as u64,
            consecutive_failures,
            open_remaining_ms,
        }
    }
}
