//! In-memory usage counters for the `/stats` command.
//!
//! Process-lifetime only, reset on restart. Counters are atomics; the
//! distinct-user set is the one non-atomic piece and sits behind a mutex.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use teloxide::types::ChatId;

use crate::core::validation::Platform;

#[derive(Default)]
pub struct Stats {
    total: AtomicU64,
    instagram: AtomicU64,
    x: AtomicU64,
    errors: AtomicU64,
    users: Mutex<HashSet<ChatId>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed download.
    pub fn record_success(&self, chat_id: ChatId, platform: Platform) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match platform {
            Platform::Instagram => self.instagram.fetch_add(1, Ordering::Relaxed),
            Platform::X => self.x.fetch_add(1, Ordering::Relaxed),
        };
        if let Ok(mut users) = self.users.lock() {
            users.insert(chat_id);
        }
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Report text for the owner's `/stats` reply.
    pub fn report(&self) -> String {
        let users = self.users.lock().map(|u| u.len()).unwrap_or(0);
        format!(
            "Статистика:\n\n\
             Всего запросов: {}\n\
             Instagram: {}\n\
             X (Twitter): {}\n\
             Ошибок: {}\n\
             Пользователей: {}",
            self.total.load(Ordering::Relaxed),
            self.instagram.load(Ordering::Relaxed),
            self.x.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
            users,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_platform_and_distinct_users() {
        let stats = Stats::new();
        stats.record_success(ChatId(1), Platform::X);
        stats.record_success(ChatId(1), Platform::Instagram);
        stats.record_success(ChatId(2), Platform::Instagram);
        stats.record_error();

        let report = stats.report();
        assert!(report.contains("Всего запросов: 3"));
        assert!(report.contains("Instagram: 2"));
        assert!(report.contains("X (Twitter): 1"));
        assert!(report.contains("Ошибок: 1"));
        assert!(report.contains("Пользователей: 2"));
    }
}
