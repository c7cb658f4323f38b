//! Circuit breaker state machine used to protect the embedding service and
//! the shared (L2) cache from cascading failures.
//!
//! States: `CLOSED` (normal operation, counting failures) → `OPEN`
//! (fast-fail until a recovery window elapses) → `HALF_OPEN` (exactly one
//! probe admitted) → back to `CLOSED` on success or `OPEN` on failure.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_probe_in_flight: bool,
}

/// A snapshot of one breaker's health, suitable for the robustness layer's
/// health surface.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub circuit_name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub recovery_timeout_ms: u64,
}

/// A named circuit breaker. Cheap to clone-share via `Arc` at call sites;
/// internal state is a single mutex since transitions are rare relative to
/// the calls they guard.
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                half_open_probe_in_flight: false,
            }),
        }
    }

    /// Preset used for the shared cache layer: threshold 5, recovery 30s.
    pub fn for_cache() -> Self {
        Self::new("shared_cache", 5, Duration::from_secs(30))
    }

    /// Preset used for the embedding service: threshold 3, recovery 60s.
    pub fn for_embedding() -> Self {
        Self::new("embedding_service", 3, Duration::from_secs(60))
    }

    /// Returns `Err(CircuitOpen)` without running `f` if the circuit is open
    /// and the recovery window has not yet elapsed; otherwise runs `f` and
    /// records the outcome. At most one probe is admitted while half-open.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Into<CoreError>,
    {
        if let Some(wait) = self.admit()? {
            return Err(CoreError::CircuitOpen {
                circuit: self.name.clone(),
                recovery_in_ms: wait.as_millis() as u64,
            });
        }

        match f().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err.into())
            }
        }
    }

    /// Synchronous counterpart to [`call`](Self::call), for guarding a call
    /// site that has no `Future` to await (the in-process shared cache).
    /// Same admission and bookkeeping, no `async`.
    pub fn call_sync<F, T, E>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<CoreError>,
    {
        if let Some(wait) = self.admit()? {
            return Err(CoreError::CircuitOpen {
                circuit: self.name.clone(),
                recovery_in_ms: wait.as_millis() as u64,
            });
        }

        match f() {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err.into())
            }
        }
    }

    /// Decides whether a call may proceed. Returns `Ok(None)` to proceed,
    /// `Ok(Some(remaining))` to fast-fail with the remaining recovery wait.
    fn admit(&self) -> Result<Option<Duration>, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => Ok(None),
            CircuitState::Open => {
                let opened_at = inner.opened_at.expect("open state always has opened_at");
                let elapsed = opened_at.elapsed();
                if elapsed >= self.recovery_timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_probe_in_flight = true;
                    info!(circuit = %self.name, "circuit transitioning to half-open");
                    Ok(None)
                } else {
                    Ok(Some(self.recovery_timeout - elapsed))
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_probe_in_flight {
                    // A probe is already in flight; treat as still open.
                    Ok(Some(self.recovery_timeout))
                } else {
                    inner.half_open_probe_in_flight = true;
                    Ok(None)
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != CircuitState::Closed {
            info!(circuit = %self.name, "circuit closed after successful probe");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.half_open_probe_in_flight = false;
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.half_open_probe_in_flight = false;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!(circuit = %self.name, "half-open probe failed, circuit re-opened");
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(
                        circuit = %self.name,
                        failures = inner.consecutive_failures,
                        "circuit opened after consecutive failures"
                    );
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock().unwrap();
        CircuitSnapshot {
            circuit_name: self.name.clone(),
            state: inner.state,
            failure_count: inner.consecutive_failures,
            failure_threshold: self.failure_threshold,
            recovery_timeout_ms: self.recovery_timeout.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boom() -> CoreError {
        CoreError::unavailable("test", "boom")
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new("test", 3, Duration::from_millis(20));
        for _ in 0..3 {
            let _ = breaker.call(|| async { Err::<(), _>(boom()) }).await;
        }
        assert_eq!(breaker.snapshot().state, CircuitState::Open);
    }

    #[tokio::test]
    async fn fast_fails_while_open() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_secs(30));
        let _ = breaker.call(|| async { Err::<(), _>(boom()) }).await;
        let result = breaker.call(|| async { Ok::<_, CoreError>(1) }).await;
        assert!(matches!(result, Err(CoreError::CircuitOpen { .. })));
    }

    #[tokio::test]
    async fn recovers_after_window_on_success() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        let _ = breaker.call(|| async { Err::<(), _>(boom()) }).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = breaker.call(|| async { Ok::<_, CoreError>(1) }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.snapshot().state, CircuitState::Closed);
    }

    /// The inner error's own variant survives the breaker, rather than
    /// being collapsed into a generic wrapper — callers downstream (the
    /// embedding service's degrade-to-`None` path, health reporting) match
    /// on the specific variant.
    #[tokio::test]
    async fn preserves_inner_error_variant() {
        let breaker = CircuitBreaker::new("test", 5, Duration::from_secs(30));
        let result = breaker.call(|| async { Err::<(), _>(CoreError::not_found("chunk", "abc")) }).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }
}
