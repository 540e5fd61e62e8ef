//! Per-account posting quota.
//!
//! One limiter instance is shared by every project task mapped to the same
//! account; the check-then-increment runs under a single lock so concurrent
//! tasks cannot double-spend the window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 50,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug)]
struct AccountWindow {
    count: u32,
    window_start: Instant,
}

#[derive(Debug)]
pub struct AccountRateLimiter {
    config: RateLimiterConfig,
    windows: Mutex<HashMap<String, AccountWindow>>,
}

impl AccountRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Takes `permits` requests out of the account's current window, all or
    /// nothing. Refusal is a soft signal: the caller leaves work pending for
    /// a later run.
    pub async fn try_acquire(&self, account_id: &str, permits: u32) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let entry = windows
            .entry(account_id.to_string())
            .or_insert(AccountWindow {
                count: 0,
                window_start: now,
            });
        if now.duration_since(entry.window_start) >= self.config.window {
            entry.count = 0;
            entry.window_start = now;
        }
        if entry.count + permits <= self.config.max_requests {
            entry.count += permits;
            true
        } else {
            false
        }
    }

    pub async fn remaining(&self, account_id: &str) -> u32 {
        let windows = self.windows.lock().await;
        match windows.get(account_id) {
            Some(entry) if Instant::now().duration_since(entry.window_start) < self.config.window => {
                self.config.max_requests.saturating_sub(entry.count)
            }
            _ => self.config.max_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window: Duration) -> AccountRateLimiter {
        AccountRateLimiter::new(RateLimiterConfig {
            max_requests,
            window,
        })
    }

    #[tokio::test]
    async fn test_quota_exhaustion() {
        let limiter = limiter(2, Duration::from_secs(60));
        assert!(limiter.try_acquire("acct", 1).await);
        assert!(limiter.try_acquire("acct", 1).await);
        assert!(!limiter.try_acquire("acct", 1).await);
        assert_eq!(limiter.remaining("acct").await, 0);
    }

    #[tokio::test]
    async fn test_accounts_are_isolated() {
        let limiter = limiter(1, Duration::from_secs(60));
        assert!(limiter.try_acquire("a", 1).await);
        assert!(!limiter.try_acquire("a", 1).await);
        assert!(limiter.try_acquire("b", 1).await);
    }

    #[tokio::test]
    async fn test_multi_permit_acquire_is_all_or_nothing() {
        let limiter = limiter(3, Duration::from_secs(60));
        assert!(!limiter.try_acquire("acct", 4).await);
        assert_eq!(limiter.remaining("acct").await, 3);
        assert!(limiter.try_acquire("acct", 3).await);
        assert!(!limiter.try_acquire("acct", 1).await);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = limiter(1, Duration::from_millis(20));
        assert!(limiter.try_acquire("acct", 1).await);
        assert!(!limiter.try_acquire("acct", 1).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.try_acquire("acct", 1).await);
    }

    #[tokio::test]
    async fn test_concurrent_acquires_never_oversubscribe() {
        use std::sync::Arc;

        let limiter = Arc::new(limiter(10, Duration::from_secs(60)));
        let mut handles = Vec::new();
        for _ in 0..40 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(
                async move { limiter.try_acquire("acct", 1).await },
            ));
        }
        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 10);
    }
}
