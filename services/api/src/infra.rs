use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use vehicle_valuation::config::RateLimitSettings;
use vehicle_valuation::valuation::{
    RateLimitError, RateLimiter, RepositoryError, ValuationId, ValuationRepository,
    ValuationResult,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct StoredValuations {
    order: Vec<ValuationId>,
    by_id: HashMap<ValuationId, ValuationResult>,
}

/// Process-local valuation store; `recent` returns newest first.
#[derive(Default, Clone)]
pub(crate) struct InMemoryValuationRepository {
    records: Arc<Mutex<StoredValuations>>,
}

impl InMemoryValuationRepository {
    fn poisoned() -> RepositoryError {
        RepositoryError::Unavailable("valuation store lock poisoned".to_string())
    }
}

impl ValuationRepository for InMemoryValuationRepository {
    fn insert(&self, result: ValuationResult) -> Result<ValuationResult, RepositoryError> {
        let mut guard = self.records.lock().map_err(|_| Self::poisoned())?;
        if guard.by_id.contains_key(&result.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.order.push(result.id.clone());
        guard.by_id.insert(result.id.clone(), result.clone());
        Ok(result)
    }

    fn fetch(&self, id: &ValuationId) -> Result<Option<ValuationResult>, RepositoryError> {
        let guard = self.records.lock().map_err(|_| Self::poisoned())?;
        Ok(guard.by_id.get(id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ValuationResult>, RepositoryError> {
        let guard = self.records.lock().map_err(|_| Self::poisoned())?;
        Ok(guard
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| guard.by_id.get(id).cloned())
            .collect())
    }
}

struct Window {
    started: Instant,
    count: u32,
}

struct Windows {
    by_key: HashMap<String, Window>,
    last_sweep: Instant,
}

impl Windows {
    /// Drops windows that have already rolled over, at most once per window length.
    fn sweep(&mut self, now: Instant, window: Duration) {
        if now.saturating_duration_since(self.last_sweep) < window {
            return;
        }
        self.by_key
            .retain(|_, entry| now.saturating_duration_since(entry.started) < window);
        self.last_sweep = now;
    }
}

/// Fixed-window request counter per client key, for single-instance
/// deployments.
pub(crate) struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<Windows>,
}

impl FixedWindowRateLimiter {
    pub(crate) fn new(settings: RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            window: Duration::from_secs(settings.window_secs),
            windows: Mutex::new(Windows {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut guard = self
            .windows
            .lock()
            .map_err(|_| RateLimitError::Unavailable("rate limiter lock poisoned".to_string()))?;
        guard.sweep(now, self.window);

        let window = guard.by_key.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(RateLimitError::Exceeded {
                retry_after_secs: retry_after_secs.max(1),
            });
        }

        window.count += 1;
        Ok(())
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .map(|guard| guard.by_key.len())
            .unwrap_or_default()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(RateLimitSettings {
            max_requests,
            window_secs: 60,
        })
    }

    #[test]
    fn rejects_requests_over_budget_until_window_rolls() {
        let limiter = limiter(2);
        let start = Instant::now();

        assert!(limiter.check_at("203.0.113.1", start).is_ok());
        assert!(limiter.check_at("203.0.113.1", start).is_ok());
        assert_eq!(
            limiter.check_at("203.0.113.1", start + Duration::from_secs(15)),
            Err(RateLimitError::Exceeded {
                retry_after_secs: 45
            })
        );
        assert!(limiter
            .check_at("203.0.113.1", start + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn budgets_are_tracked_per_key() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.check_at("dealer-a", now).is_ok());
        assert!(limiter.check_at("dealer-b", now).is_ok());
        assert!(limiter.check_at("dealer-a", now).is_err());
    }

    #[test]
    fn expired_windows_are_dropped() {
        let limiter = limiter(1);
        let start = Instant::now();

        for client in 0..10_000 {
            assert!(limiter.check_at(&format!("client-{client}"), start).is_ok());
        }
        assert_eq!(limiter.tracked_keys(), 10_000);

        let later = start + Duration::from_secs(3_590);
        assert!(limiter.check_at("dealer-live", later).is_ok());
        assert!(limiter
            .check_at("dealer-new", later + Duration::from_secs(10))
            .is_ok());
        assert_eq!(limiter.tracked_keys(), 2);
        assert!(limiter
            .check_at("dealer-live", later + Duration::from_secs(15))
            .is_err());
    }
}
