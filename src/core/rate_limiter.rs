//! Sliding-window rate limiter.
//!
//! Tracks recent request timestamps per chat and admits at most
//! `max_requests` requests inside any trailing `window`. The store is a
//! `DashMap`, so the check-and-record step serializes per chat (the shard
//! lock is held for the whole read-modify-write) without unrelated chats
//! blocking each other.

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::ChatId;
use tokio::time::{Duration, Instant};

use crate::core::error::AppError;

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<DashMap<ChatId, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    /// Admits or rejects a request from `chat_id` at the current instant.
    ///
    /// Prunes timestamps older than the window, then either records the
    /// request and admits, or rejects with the time until the oldest counted
    /// request leaves the window. A rejected attempt is not recorded, so
    /// hammering the bot while limited does not extend the limit.
    pub fn check_and_record(&self, chat_id: ChatId) -> Result<(), AppError> {
        let now = Instant::now();
        let mut entry = self.requests.entry(chat_id).or_default();
        entry.retain(|&t| now.duration_since(t) < self.window);

        if entry.len() >= self.max_requests {
            // Oldest retained timestamp decides when a slot opens up.
            let retry_after = match entry.first() {
                Some(&oldest) => self.window.saturating_sub(now.duration_since(oldest)),
                None => self.window,
            };
            return Err(AppError::RateLimited {
                retry_after: retry_after.max(Duration::from_secs(1)),
            });
        }

        entry.push(now);
        Ok(())
    }

    /// Drops chats whose entire request log has fallen out of the window.
    ///
    /// Lazy pruning in `check_and_record` only touches chats that come back;
    /// this sweep bounds growth from chats that never do. Intended to run
    /// periodically from a background task.
    pub fn sweep_stale(&self) {
        let now = Instant::now();
        self.requests
            .retain(|_, timestamps| timestamps.iter().any(|&t| now.duration_since(t) < self.window));
    }

    /// Number of chats currently tracked.
    pub fn tracked_chats(&self) -> usize {
        self.requests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = ChatId(100);

    fn limiter(max: usize, window_secs: u64) -> RateLimiter {
        RateLimiter::new(max, Duration::from_secs(window_secs))
    }

    #[tokio::test(start_paused = true)]
    async fn sixth_request_within_window_is_rejected() {
        let limiter = limiter(5, 60);
        for _ in 0..5 {
            assert!(limiter.check_and_record(CHAT).is_ok());
            tokio::time::advance(Duration::from_secs(2)).await;
        }
        // 10 seconds in, the 6th must bounce.
        match limiter.check_and_record(CHAT) {
            Err(AppError::RateLimited { retry_after }) => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after >= Duration::from_secs(1));
            }
            other => panic!("expected RateLimited, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quota_resets_after_window_elapses() {
        let limiter = limiter(5, 60);
        for _ in 0..5 {
            assert!(limiter.check_and_record(CHAT).is_ok());
        }
        assert!(limiter.check_and_record(CHAT).is_err());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check_and_record(CHAT).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn timestamp_just_outside_window_is_not_counted() {
        let limiter = limiter(2, 60);
        assert!(limiter.check_and_record(CHAT).is_ok());
        // This one ages out exactly past the boundary.
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check_and_record(CHAT).is_ok());
        assert!(limiter.check_and_record(CHAT).is_ok());
        // Only the two recent ones count, so the third within the window fails.
        assert!(limiter.check_and_record(CHAT).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_has_no_side_effect() {
        let limiter = limiter(1, 60);
        assert!(limiter.check_and_record(CHAT).is_ok());
        for _ in 0..10 {
            assert!(limiter.check_and_record(CHAT).is_err());
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        // 10 rejected attempts must not have extended the limit: the single
        // recorded request expires on schedule.
        tokio::time::advance(Duration::from_secs(51)).await;
        assert!(limiter.check_and_record(CHAT).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn users_are_limited_independently() {
        let limiter = limiter(1, 60);
        assert!(limiter.check_and_record(ChatId(1)).is_ok());
        assert!(limiter.check_and_record(ChatId(1)).is_err());
        assert!(limiter.check_and_record(ChatId(2)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_fully_expired_chats() {
        let limiter = limiter(5, 60);
        limiter.check_and_record(ChatId(1)).unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.check_and_record(ChatId(2)).unwrap();

        tokio::time::advance(Duration::from_secs(40)).await;
        limiter.sweep_stale();
        // Chat 1 is fully expired, chat 2 still has a live timestamp.
        assert_eq!(limiter.tracked_chats(), 1);
    }
}
