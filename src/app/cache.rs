// ActionBoard - app/cache.rs
//
// Time-bounded cache over SourceFetcher + normalisation.
//
// Architecture:
//   - One slot per source ID, each guarded by its own Mutex.
//   - The slot lock is held across a refetch, so concurrent callers for the
//     same source wait for the in-flight retrieval and then observe its
//     result (single-flight). Different sources never block each other.
//   - An entry is replaced whole; readers get an Arc<RecordSet> snapshot.
//   - Clock and fetcher are injected so TTL behaviour is testable.

use crate::app::source::{SourceFetcher, SourceId};
use crate::core::model::RecordSet;
use crate::core::normalize::normalize;
use crate::util::constants::CACHE_TTL_SECS;
use crate::util::error::FetchError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// One cached, normalised record set.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub source: SourceId,
    /// Monotonic instant of the successful fetch; TTL is measured from here.
    pub fetched_at: Instant,
    /// Wall-clock time of the same fetch, for display.
    pub refreshed_at: DateTime<Utc>,
    pub records: Arc<RecordSet>,
}

impl CacheEntry {
    /// Age is inclusive of the TTL boundary; only strictly older entries expire.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) <= ttl
    }
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

pub struct Cache {
    fetcher: Arc<dyn SourceFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slots: Mutex<HashMap<SourceId, Slot>>,
}

impl Cache {
    /// Cache with the standard 60 s TTL and the system clock.
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self::with_clock(fetcher, Arc::new(SystemClock))
    }

    pub fn with_clock(fetcher: Arc<dyn SourceFetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            clock,
            ttl: Duration::from_secs(CACHE_TTL_SECS),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Normalised record set for `source`, fetching only when the cached
    /// entry is missing or older than the TTL.
    pub fn get(&self, source: &SourceId) -> Result<Arc<RecordSet>, FetchError> {
        self.get_entry(source).map(|e| e.records)
    }

    /// As [`Cache::get`], returning the whole entry.
    pub fn get_entry(&self, source: &SourceId) -> Result<CacheEntry, FetchError> {
        let slot = self.slot(source);
        let mut guard = lock(&slot);

        if let Some(entry) = guard.as_ref() {
            let now = self.clock.now();
            if entry.is_fresh(now, self.ttl) {
                tracing::debug!(
                    source = %source,
                    age_ms = now.saturating_duration_since(entry.fetched_at).as_millis() as u64,
                    "Cache hit"
                );
                return Ok(entry.clone());
            }
            tracing::debug!(source = %source, "Cache entry expired");
        } else {
            tracing::debug!(source = %source, "Cache miss");
        }

        self.fill(source, &mut guard)
    }

    /// Force a retrieval even within the TTL.
    ///
    /// If it fails while an unexpired entry exists, that entry is returned.
    pub fn refresh(&self, source: &SourceId) -> Result<CacheEntry, FetchError> {
        let slot = self.slot(source);
        let mut guard = lock(&slot);
        tracing::debug!(source = %source, "Forced refresh");
        self.fill(source, &mut guard)
    }

    /// Drop the entry for `source`. The next `get` refetches.
    ///
    /// The slot stays in the map so callers already queued on it and new
    /// callers still share one retrieval. Waits for an in-flight fetch.
    pub fn invalidate(&self, source: &SourceId) {
        let slot = lock(&self.slots).get(source).cloned();
        if let Some(slot) = slot {
            *lock(&slot) = None;
            tracing::debug!(source = %source, "Cache entry invalidated");
        }
    }

    /// Number of sources seen so far (populated, in flight or invalidated).
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, source: &SourceId) -> Slot {
        Arc::clone(lock(&self.slots).entry(source.clone()).or_default())
    }

    /// Fetch, normalise and store. Caller holds the slot lock.
    fn fill(
        &self,
        source: &SourceId,
        guard: &mut MutexGuard<'_, Option<CacheEntry>>,
    ) -> Result<CacheEntry, FetchError> {
        match self.fetcher.fetch(source) {
            Ok(raw) => {
                let entry = CacheEntry {
                    source: source.clone(),
                    fetched_at: self.clock.now(),
                    refreshed_at: Utc::now(),
                    records: Arc::new(normalize(raw)),
                };
                tracing::info!(
                    source = %source,
                    rows = entry.records.len(),
                    "Cache refreshed"
                );
                **guard = Some(entry.clone());
                Ok(entry)
            }
            Err(e) => match guard.as_ref() {
                Some(entry) if entry.is_fresh(self.clock.now(), self.ttl) => {
                    tracing::warn!(
                        source = %source,
                        error = %e,
                        "Refresh failed; serving cached copy within TTL"
                    );
                    Ok(entry.clone())
                }
                _ => {
                    tracing::warn!(source = %source, error = %e, "Fetch failed; no usable cached copy");
                    Err(e)
                }
            },
        }
    }
}

/// A poisoned lock only means another caller panicked; stored entries are
/// always whole, so the data is still valid.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse::parse_csv;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;

    struct FakeClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
    }

    impl CountingFetcher {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    impl SourceFetcher for CountingFetcher {
        fn fetch(&self, source: &SourceId) -> Result<RecordSet, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::Status {
                    source_id: source.to_string(),
                    status: 503,
                });
            }
            Ok(parse_csv(&format!("ApprovalStatus,Priority,Call\n approved ,p1,{n}\n")).unwrap())
        }
    }

    fn setup() -> (Arc<CountingFetcher>, Arc<FakeClock>, Cache) {
        let fetcher = Arc::new(CountingFetcher::default());
        let clock = Arc::new(FakeClock::new());
        let cache = Cache::with_clock(fetcher.clone(), clock.clone());
        (fetcher, clock, cache)
    }

    #[test]
    fn test_hit_within_ttl_does_not_refetch() {
        let (fetcher, clock, cache) = setup();
        let id = SourceId::from("https://example.com/q.csv");

        let first = cache.get(&id).unwrap();
        clock.advance(Duration::from_secs(10));
        let second = cache.get(&id).unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_expired_entry_is_refetched() {
        let (fetcher, clock, cache) = setup();
        let id = SourceId::from("https://example.com/q.csv");

        cache.get(&id).unwrap();
        clock.advance(Duration::from_secs(70));
        cache.get(&id).unwrap();

        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_ttl_boundary_is_inclusive() {
        let (fetcher, clock, cache) = setup();
        let id = SourceId::from("q.csv");

        cache.get(&id).unwrap();
        clock.advance(Duration::from_secs(CACHE_TTL_SECS));
        cache.get(&id).unwrap();
        assert_eq!(fetcher.calls(), 1);

        clock.advance(Duration::from_millis(1));
        cache.get(&id).unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_entries_are_normalised() {
        let (_, _, cache) = setup();
        let records = cache.get(&SourceId::from("q.csv")).unwrap();
        let row = &records.rows()[0];
        assert_eq!(records.value(row, "ApprovalStatus").unwrap().to_string(), "approved");
        assert_eq!(records.value(row, "Priority").unwrap().to_string(), "P1");
    }

    #[test]
    fn test_failure_without_cache_is_fetch_error() {
        let (fetcher, _, cache) = setup();
        fetcher.fail.store(true, Ordering::SeqCst);
        let result = cache.get(&SourceId::from("q.csv"));
        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }

    #[test]
    fn test_failure_after_expiry_is_fetch_error() {
        let (fetcher, clock, cache) = setup();
        let id = SourceId::from("q.csv");
        cache.get(&id).unwrap();

        fetcher.fail.store(true, Ordering::SeqCst);
        clock.advance(Duration::from_secs(61));
        assert!(cache.get(&id).is_err());
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_failed_refresh_serves_unexpired_copy() {
        let (fetcher, clock, cache) = setup();
        let id = SourceId::from("q.csv");
        let original = cache.get_entry(&id).unwrap();

        fetcher.fail.store(true, Ordering::SeqCst);
        clock.advance(Duration::from_secs(30));
        let served = cache.refresh(&id).unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert!(Arc::ptr_eq(&original.records, &served.records));
        assert_eq!(served.fetched_at, original.fetched_at);
    }

    #[test]
    fn test_refresh_replaces_whole_entry() {
        let (fetcher, _, cache) = setup();
        let id = SourceId::from("q.csv");
        let first = cache.get(&id).unwrap();
        let refreshed = cache.refresh(&id).unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert!(!Arc::ptr_eq(&first, &refreshed.records));
        // The earlier snapshot is untouched.
        assert_eq!(first.rows()[0].values[2].to_string(), "0");
        assert_eq!(refreshed.records.rows()[0].values[2].to_string(), "1");
    }

    #[test]
    fn test_sources_cached_independently() {
        let (fetcher, _, cache) = setup();
        assert!(cache.is_empty());
        cache.get(&SourceId::from("a.csv")).unwrap();
        cache.get(&SourceId::from("b.csv")).unwrap();
        cache.get(&SourceId::from("a.csv")).unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        let (fetcher, _, cache) = setup();
        let id = SourceId::from("q.csv");
        cache.get(&id).unwrap();
        cache.invalidate(&id);
        cache.get(&id).unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_during_fetch_keeps_single_flight() {
        let fetcher = Arc::new(CountingFetcher {
            delay: Duration::from_millis(150),
            ..Default::default()
        });
        let cache = Cache::with_clock(fetcher.clone(), Arc::new(FakeClock::new()));
        let id = SourceId::from("https://example.com/q.csv");

        std::thread::scope(|s| {
            let first = s.spawn(|| cache.get(&id).unwrap());
            std::thread::sleep(Duration::from_millis(30));
            let invalidator = s.spawn(|| cache.invalidate(&id));
            let second = s.spawn(|| cache.get(&id).unwrap());
            first.join().unwrap();
            invalidator.join().unwrap();
            second.join().unwrap();
        });

        assert_eq!(fetcher.max_in_flight(), 1);
        assert!(fetcher.calls() <= 2);
    }

    #[test]
    fn test_concurrent_misses_share_one_fetch() {
        let fetcher = Arc::new(CountingFetcher {
            delay: Duration::from_millis(100),
            ..Default::default()
        });
        let cache = Cache::with_clock(fetcher.clone(), Arc::new(FakeClock::new()));
        let id = SourceId::from("https://example.com/q.csv");
        let threads = 8;
        let barrier = Barrier::new(threads);

        let results: Vec<Arc<RecordSet>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get(&id).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(fetcher.calls(), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }
}
