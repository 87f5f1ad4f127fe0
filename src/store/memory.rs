//! In-process store implementations.

use super::{CounterStore, KeyValueStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outage and latency switches shared by the memory stores.
#[derive(Default)]
struct FaultInjection {
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
}

impl FaultInjection {
    async fn check(&self, store: &'static str) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable(format!("{} is offline", store)));
        }
        Ok(())
    }
}

fn poisoned(store: &'static str) -> StoreError {
    StoreError::Unavailable(format!("{} lock poisoned", store))
}

/// Writes between two full sweeps of expired entries.
const SWEEP_INTERVAL: u64 = 1024;

/// Counts writes and says when the next full sweep is due.
#[derive(Default)]
struct SweepSchedule {
    writes: AtomicU64,
}

impl SweepSchedule {
    fn due(&self) -> bool {
        (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0
    }
}

/// `None` when `now + ttl` is past what `Instant` can hold; such entries never expire.
fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    now.checked_add(ttl)
}

fn is_expired(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_some_and(|at| now >= at)
}

struct CounterEntry {
    count: u64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn is_expired(&self, now: Instant) -> bool {
        is_expired(self.expires_at, now)
    }
}

/// Counter store for a single process. The increment and the first-expiry happen under
/// one lock, which gives the same atomicity as the Redis script.
///
/// Expired counters are dropped when their key is touched again, and every
/// 1024 increments a full sweep drops the ones that never are.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, CounterEntry>>,
    sweep: SweepSchedule,
    faults: FaultInjection,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.faults.unavailable.store(!available, Ordering::Relaxed);
    }

    /// Delay every operation, e.g. to exercise timeouts.
    pub fn set_latency(&self, latency: Duration) {
        self.faults
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Remaining time to live of a counter, if it exists and has an expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let counters = self.counters.lock().ok()?;
        counters
            .get(key)
            .filter(|e| !e.is_expired(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    /// Counters held, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.counters.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr_with_expire(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        self.faults.check("memory counter store").await?;
        let now = Instant::now();
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| poisoned("memory counter store"))?;
        if self.sweep.due() {
            counters.retain(|_, e| !e.is_expired(now));
        } else if counters.get(key).is_some_and(|e| e.is_expired(now)) {
            counters.remove(key);
        }
        let entry = counters.entry(key.to_string()).or_insert(CounterEntry {
            count: 0,
            expires_at: None,
        });
        entry.count += 1;
        if entry.count == 1 {
            entry.expires_at = deadline(now, ttl);
        }
        Ok(entry.count)
    }

    async fn get_count(&self, key: &str) -> StoreResult<Option<u64>> {
        self.faults.check("memory counter store").await?;
        let now = Instant::now();
        let counters = self
            .counters
            .lock()
            .map_err(|_| poisoned("memory counter store"))?;
        Ok(counters
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.count))
    }

    async fn delete_counter(&self, key: &str) -> StoreResult<bool> {
        self.faults.check("memory counter store").await?;
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| poisoned("memory counter store"))?;
        Ok(counters.remove(key).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct ValueEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl ValueEntry {
    fn is_expired(&self, now: Instant) -> bool {
        is_expired(self.expires_at, now)
    }
}

/// Key-value store for a single process, standing in for the shared remote tier.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, ValueEntry>>,
    sweep: SweepSchedule,
    faults: FaultInjection,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.faults.unavailable.store(!available, Ordering::Relaxed);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.faults
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    /// Entries held, expired ones included until the next sweep.
    pub fn held(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.faults.check("memory kv store").await?;
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| poisoned("memory kv store"))?;
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.data.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        self.faults.check("memory kv store").await?;
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| poisoned("memory kv store"))?;
        if self.sweep.due() {
            entries.retain(|_, e| !e.is_expired(now));
        }
        entries.insert(
            key.to_string(),
            ValueEntry {
                data: value.to_vec(),
                expires_at: deadline(now, ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.faults.check("memory kv store").await?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| poisoned("memory kv store"))?;
        Ok(entries.remove(key).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.faults.check("memory kv store").await
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
