//! Fixed-window per-client rate limiting.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Per-client request window.
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Below the ceiling; the request proceeds.
    Allowed,
    /// Over the ceiling; reject without touching the upstream.
    Limited {
        /// Seconds until the client's window resets.
        retry_after_secs: u64,
    },
}

/// Rolling request counter per client identifier over a fixed window.
///
/// Safe for concurrent read-increment-compare: each check holds the
/// client's shard entry for the duration of the update.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    /// Create a limiter with the given window and per-window ceiling.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            clients: DashMap::new(),
        }
    }

    /// Count a request from `client` and decide whether it may proceed.
    pub fn check(&self, client: &str) -> Decision {
        let mut entry = self
            .clients
            .entry(client.to_string())
            .or_insert_with(|| Window {
                started: Instant::now(),
                count: 0,
            });

        let elapsed = entry.started.elapsed();
        if elapsed >= self.window {
            entry.started = Instant::now();
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count <= self.max_requests {
            Decision::Allowed
        } else {
            let retry_after = self.window.saturating_sub(entry.started.elapsed());
            Decision::Limited {
                retry_after_secs: retry_after.as_secs().max(1),
            }
        }
    }

    /// Drop windows that have fully expired.
    ///
    /// Counting stays correct without this; it only bounds memory for
    /// clients that stopped talking to us.
    pub fn prune(&self) {
        self.clients
            .retain(|_, window| window.started.elapsed() < self.window);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_ceiling() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);

        for _ in 0..3 {
            assert_eq!(limiter.check("10.0.0.1"), Decision::Allowed);
        }
        assert!(matches!(limiter.check("10.0.0.1"), Decision::Limited { .. }));
    }

    #[test]
    fn hundred_and_first_request_is_limited() {
        let limiter = RateLimiter::new(Duration::from_secs(900), 100);

        for _ in 0..100 {
            assert_eq!(limiter.check("10.0.0.1"), Decision::Allowed);
        }
        assert!(matches!(limiter.check("10.0.0.1"), Decision::Limited { .. }));
    }

    #[test]
    fn clients_are_isolated() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);

        assert_eq!(limiter.check("10.0.0.1"), Decision::Allowed);
        assert!(matches!(limiter.check("10.0.0.1"), Decision::Limited { .. }));
        assert_eq!(limiter.check("10.0.0.2"), Decision::Allowed);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(Duration::from_millis(20), 1);

        assert_eq!(limiter.check("10.0.0.1"), Decision::Allowed);
        assert!(matches!(limiter.check("10.0.0.1"), Decision::Limited { .. }));

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(limiter.check("10.0.0.1"), Decision::Allowed);
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let limiter = RateLimiter::new(Duration::from_millis(500), 1);
        limiter.check("10.0.0.1");

        match limiter.check("10.0.0.1") {
            Decision::Limited { retry_after_secs } => assert!(retry_after_secs >= 1),
            other => panic!("expected Limited, got {:?}", other),
        }
    }

    #[test]
    fn prune_drops_expired_windows() {
        let limiter = RateLimiter::new(Duration::from_millis(10), 5);
        limiter.check("10.0.0.1");
        limiter.check("10.0.0.2");
        assert_eq!(limiter.tracked_clients(), 2);

        std::thread::sleep(Duration::from_millis(20));
        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn concurrent_checks_never_exceed_ceiling() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60), 100));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(std::thread::spawn(move || {
                let mut allowed = 0u32;
                for _ in 0..50 {
                    if limiter.check("10.0.0.1") == Decision::Allowed {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
    }
}
