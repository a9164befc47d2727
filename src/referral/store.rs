//! In-memory per-user counter of added members.

use dashmap::DashMap;

use crate::types::UserId;

/// Counts how many members each user has added.
///
/// Entries are created on first increment and live as long as the store.
/// Increments for one user are serialized by the map's shard lock.
#[derive(Debug, Default)]
pub struct CounterStore {
    counts: DashMap<UserId, u64>,
}

impl CounterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to the user's count and returns the new total.
    pub fn increment(&self, user: UserId) -> u64 {
        let mut entry = self.counts.entry(user).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }

    /// Returns the user's count, or 0 if the user never added anyone.
    #[must_use]
    pub fn get(&self, user: UserId) -> u64 {
        self.counts.get(&user).map_or(0, |count| *count)
    }

    /// Number of users with an entry.
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_unknown_user_reads_zero() {
        let store = CounterStore::new();
        assert_eq!(store.get(UserId(7)), 0);
        assert_eq!(store.tracked_users(), 0);
    }

    #[test]
    fn test_sequential_increments() {
        let store = CounterStore::new();
        for expected in 1..=10 {
            assert_eq!(store.increment(UserId(1)), expected);
        }
        assert_eq!(store.get(UserId(1)), 10);
        assert_eq!(store.get(UserId(2)), 0);
        assert_eq!(store.tracked_users(), 1);
    }

    #[test]
    fn test_users_are_independent() {
        let store = CounterStore::new();
        store.increment(UserId(1));
        store.increment(UserId(2));
        store.increment(UserId(2));
        assert_eq!(store.get(UserId(1)), 1);
        assert_eq!(store.get(UserId(2)), 2);
    }

    #[test]
    fn test_concurrent_increments_lose_nothing() {
        let store = Arc::new(CounterStore::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        store.increment(UserId(99));
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(store.get(UserId(99)), 8_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_from_tasks() {
        let store = Arc::new(CounterStore::new());
        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.increment(UserId(1));
                    store.increment(UserId(i % 4 + 10));
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.get(UserId(1)), 200);
        let others: u64 = (10..14).map(|id| store.get(UserId(id))).sum();
        assert_eq!(others, 200);
    }
}
