//! Same-day visit counters for blocked domains.
//!
//! Counters are reset lazily: any entry whose date is not today is treated as
//! zero and rewritten the next time counters are read or incremented.

use crate::config::DayBoundary;
use crate::store::{Counters, DayCounter, StateKey, StateRecord, StateStore, StoreError};
use chrono::{Local, NaiveDate, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Source of "today" for day-boundary checks.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    boundary: DayBoundary,
}

impl SystemClock {
    pub fn new(boundary: DayBoundary) -> Self {
        Self { boundary }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self.boundary {
            DayBoundary::Utc => Utc::now().date_naive(),
            DayBoundary::Local => Local::now().date_naive(),
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.write().unwrap_or_else(PoisonError::into_inner) = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// ISO calendar date used as the counter's `date` field.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Resets every entry not dated `today`. Returns true if anything changed.
pub fn normalize_counters(counters: &mut Counters, today: &str) -> bool {
    let mut changed = false;
    for counter in counters.values_mut() {
        if counter.date != today {
            *counter = DayCounter::fresh(today);
            changed = true;
        }
    }
    changed
}

pub fn total(counters: &Counters) -> u64 {
    counters.values().map(|c| c.count).sum()
}

/// Badge text for a day's total: empty when nothing was visited.
pub fn badge_text(total: u64) -> String {
    if total > 0 {
        total.to_string()
    } else {
        String::new()
    }
}

pub struct DailyCounterService {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    // Serializes read-modify-write cycles against the store.
    write_lock: Mutex<()>,
}

impl DailyCounterService {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn today(&self) -> String {
        date_key(self.clock.today())
    }

    /// Bumps today's count for `domain` and returns the new value.
    pub async fn increment(&self, domain: &str) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let today = self.today();
        let mut counters = self.load().await?;

        let counter = counters
            .entry(domain.to_string())
            .or_insert_with(|| DayCounter::fresh(&today));
        if counter.date != today {
            *counter = DayCounter::fresh(&today);
        }
        counter.count += 1;
        let count = counter.count;

        self.store.set(StateRecord::with_counters(counters)).await?;
        debug!("Counter for {} is now {} ({})", domain, count, today);
        Ok(count)
    }

    /// All counters for today. Persists the reset when the day rolled over.
    pub async fn get_all(&self) -> Result<Counters, StoreError> {
        let _guard = self.write_lock.lock().await;
        let today = self.today();
        let mut counters = self.load().await?;

        if normalize_counters(&mut counters, &today) {
            info!("Day rolled over to {}, resetting {} counters", today, counters.len());
            self.store
                .set(StateRecord::with_counters(counters.clone()))
                .await?;
        }
        Ok(counters)
    }

    pub async fn get_total(&self) -> Result<u64, StoreError> {
        Ok(total(&self.get_all().await?))
    }

    async fn load(&self) -> Result<Counters, StoreError> {
        Ok(self
            .store
            .get(&[StateKey::Counters])
            .await?
            .counters
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn counter(count: u64, date: &str) -> DayCounter {
        DayCounter {
            count,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_normalize_resets_only_stale_entries() {
        let mut counters = Counters::new();
        counters.insert("a.com".to_string(), counter(5, "2024-01-01"));
        counters.insert("b.com".to_string(), counter(2, "2024-01-02"));

        assert!(normalize_counters(&mut counters, "2024-01-02"));
        assert_eq!(counters["a.com"], counter(0, "2024-01-02"));
        assert_eq!(counters["b.com"], counter(2, "2024-01-02"));

        assert!(!normalize_counters(&mut counters, "2024-01-02"));
    }

    #[test]
    fn test_badge_text() {
        assert_eq!(badge_text(0), "");
        assert_eq!(badge_text(12), "12");
    }

    #[tokio::test]
    async fn test_increment_starts_at_one_and_accumulates() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(day("2024-05-10")));
        let service = DailyCounterService::new(store, clock);

        assert_eq!(service.increment("reddit.com").await.unwrap(), 1);
        assert_eq!(service.increment("reddit.com").await.unwrap(), 2);
        assert_eq!(service.increment("tiktok.com").await.unwrap(), 1);
        assert_eq!(service.get_total().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_increment_resets_stale_entry_first() {
        let mut counters = Counters::new();
        counters.insert("reddit.com".to_string(), counter(9, "2024-05-09"));
        let store = Arc::new(MemoryStore::with_state(StateRecord::with_counters(counters)));
        let clock = Arc::new(FixedClock::new(day("2024-05-10")));
        let service = DailyCounterService::new(store, clock);

        assert_eq!(service.increment("reddit.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_all_persists_rollover() {
        let mut counters = Counters::new();
        counters.insert("reddit.com".to_string(), counter(5, "2024-01-01"));
        let store = Arc::new(MemoryStore::with_state(StateRecord::with_counters(counters)));
        let clock = Arc::new(FixedClock::new(day("2024-01-02")));
        let service = DailyCounterService::new(store.clone(), clock);

        let all = service.get_all().await.unwrap();
        assert_eq!(all["reddit.com"], counter(0, "2024-01-02"));

        let persisted = store.get(&[StateKey::Counters]).await.unwrap();
        assert_eq!(
            persisted.counters.unwrap()["reddit.com"],
            counter(0, "2024-01-02")
        );
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(day("2024-05-10")));
        let service = Arc::new(DailyCounterService::new(store, clock));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.increment("reddit.com").await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(service.get_total().await.unwrap(), 20);
    }
}
