use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Trips after `trip_threshold` consecutive broker failures land inside a
/// single `trip_window`. A failure outside the window starts a fresh one
/// rather than accumulating against a stale count (§4.4). Mirrors the
/// reject-storm halt in the teacher's risk engine, generalized from a
/// tick-counted window to a wall-clock one and scoped to broker RPCs rather
/// than order rejections.
pub struct CircuitBreaker {
    trip_threshold: u32,
    trip_window: Duration,
    state: Mutex<State>,
}

struct State {
    consecutive_failures: u32,
    window_start: Option<DateTime<Utc>>,
    tripped: bool,
    trip_reason: Option<String>,
}

impl CircuitBreaker {
    pub fn new(trip_threshold: u32, trip_window: Duration) -> Self {
        Self {
            trip_threshold,
            trip_window,
            state: Mutex::new(State {
                consecutive_failures: 0,
                window_start: None,
                tripped: false,
                trip_reason: None,
            }),
        }
    }

    /// Record a failed broker RPC (order submission, status poll, holdings,
    /// funds — any of them count, per §4.4).
    pub fn record_failure(&self, reason: impl Into<String>, now: DateTime<Utc>) {
        let mut st = self.state.lock().expect("circuit breaker mutex poisoned");
        let fresh_window = match st.window_start {
            Some(start) => now - start > self.trip_window,
            None => true,
        };
        if fresh_window {
            st.window_start = Some(now);
            st.consecutive_failures = 0;
        }
        st.consecutive_failures += 1;
        if st.consecutive_failures >= self.trip_threshold {
            st.tripped = true;
            st.trip_reason = Some(reason.into());
        }
    }

    /// Any successful broker call clears the counter (§4.4), which in turn
    /// clears a trip since the threshold is no longer met.
    pub fn record_success(&self) {
        let mut st = self.state.lock().expect("circuit breaker mutex poisoned");
        st.consecutive_failures = 0;
        st.window_start = None;
        st.tripped = false;
        st.trip_reason = None;
    }

    pub fn is_tripped(&self) -> bool {
        self.state.lock().expect("circuit breaker mutex poisoned").tripped
    }

    pub fn trip_reason(&self) -> Option<String> {
        self.state.lock().expect("circuit breaker mutex poisoned").trip_reason.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs)
    }

    #[test]
    fn trips_after_threshold_consecutive_failures() {
        let cb = CircuitBreaker::new(3, Duration::minutes(5));
        cb.record_failure("timeout", t(0));
        cb.record_failure("timeout", t(10));
        assert!(!cb.is_tripped());
        cb.record_failure("timeout", t(20));
        assert!(cb.is_tripped());
        assert_eq!(cb.trip_reason().as_deref(), Some("timeout"));
    }

    #[test]
    fn success_clears_counter_and_trip() {
        let cb = CircuitBreaker::new(2, Duration::minutes(5));
        cb.record_failure("timeout", t(0));
        cb.record_success();
        cb.record_failure("timeout", t(10));
        assert!(!cb.is_tripped());
    }

    #[test]
    fn failures_outside_window_do_not_accumulate() {
        let cb = CircuitBreaker::new(2, Duration::minutes(5));
        cb.record_failure("timeout", t(0));
        cb.record_failure("timeout", t(10_000));
        assert!(!cb.is_tripped());
    }
}
