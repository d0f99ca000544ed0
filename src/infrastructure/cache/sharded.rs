//! # Sharded Cache
//!
//! In-memory [`AggregationCache`] split into independently locked shards.
//!
//! Each account hashes to one shard, so readers and writers of unrelated
//! accounts rarely contend on the same lock. Writes are last-write-wins per
//! account. Expired entries are evicted lazily by the `get` that finds them.
//!
//! A poisoned shard lock is reported as [`CacheError::Poisoned`] rather than
//! recovered: the shard may hold a half-written map.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use txn_aggregator::domain::value_objects::AccountId;
//! use txn_aggregator::infrastructure::cache::{AggregationCache, ShardedCache};
//!
//! let cache = ShardedCache::new(16, Some(Duration::from_secs(60)));
//! let account = AccountId::new("033");
//!
//! cache.put(&account, Arc::new(Vec::new())).unwrap();
//! assert!(cache.get(&account).unwrap().is_some());
//! ```

use crate::domain::entities::TransactionList;
use crate::domain::value_objects::AccountId;
use crate::infrastructure::cache::{AggregationCache, CacheEntry, CacheError, CacheResult};
use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 16;

type ShardMap = HashMap<AccountId, CacheEntry>;
type Shard = RwLock<ShardMap>;

/// Sharded in-memory aggregation cache.
#[derive(Debug)]
pub struct ShardedCache {
    shards: Vec<Shard>,
    ttl: Option<Duration>,
    hasher: RandomState,
}

impl ShardedCache {
    /// Creates a cache with `shards` shards (at least one) and an optional TTL.
    ///
    /// `ttl = None` keeps entries until they are replaced or invalidated.
    #[must_use]
    pub fn new(shards: usize, ttl: Option<Duration>) -> Self {
        let count = shards.max(1);
        Self {
            shards: (0..count).map(|_| RwLock::new(HashMap::new())).collect(),
            ttl,
            hasher: RandomState::new(),
        }
    }

    /// Creates a cache with default sharding and no expiry.
    #[must_use]
    pub fn without_expiry() -> Self {
        Self::new(DEFAULT_SHARDS, None)
    }

    /// Returns the configured TTL.
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the number of shards.
    #[inline]
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the number of stored entries, including expired ones not yet
    /// evicted.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Poisoned` if any shard is poisoned.
    pub fn len(&self) -> CacheResult<usize> {
        let mut total = 0;
        for index in 0..self.shards.len() {
            total += self.read_shard(index)?.len();
        }
        Ok(total)
    }

    /// Returns true if no entries are stored.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Poisoned` if any shard is poisoned.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Poisoned` if any shard is poisoned.
    pub fn clear(&self) -> CacheResult<()> {
        for index in 0..self.shards.len() {
            self.write_shard(index)?.clear();
        }
        Ok(())
    }

    fn shard_index(&self, account: &AccountId) -> usize {
        (self.hasher.hash_one(account) % self.shards.len() as u64) as usize
    }

    fn read_shard(&self, index: usize) -> CacheResult<RwLockReadGuard<'_, ShardMap>> {
        self.shards
            .get(index)
            .ok_or(CacheError::Poisoned { shard: index })?
            .read()
            .map_err(|_| CacheError::Poisoned { shard: index })
    }

    fn write_shard(&self, index: usize) -> CacheResult<RwLockWriteGuard<'_, ShardMap>> {
        self.shards
            .get(index)
            .ok_or(CacheError::Poisoned { shard: index })?
            .write()
            .map_err(|_| CacheError::Poisoned { shard: index })
    }
}

impl Default for ShardedCache {
    fn default() -> Self {
        Self::without_expiry()
    }
}

impl AggregationCache for ShardedCache {
    fn get(&self, account: &AccountId) -> CacheResult<Option<TransactionList>> {
        let index = self.shard_index(account);
        let now = Instant::now();

        {
            let shard = self.read_shard(index)?;
            match shard.get(account) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(self.ttl, now) => {
                    return Ok(Some(entry.transactions().clone()));
                }
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer replaced it in the meantime.
        let mut shard = self.write_shard(index)?;
        if shard
            .get(account)
            .is_some_and(|entry| entry.is_expired(self.ttl, now))
        {
            shard.remove(account);
            tracing::debug!(account = %account, "Evicted expired cache entry");
        }
        Ok(None)
    }

    fn put(&self, account: &AccountId, transactions: TransactionList) -> CacheResult<()> {
        let index = self.shard_index(account);
        let mut shard = self.write_shard(index)?;
        shard.insert(account.clone(), CacheEntry::new(transactions));
        Ok(())
    }

    fn invalidate(&self, account: &AccountId) -> CacheResult<bool> {
        let index = self.shard_index(account);
        let mut shard = self.write_shard(index)?;
        Ok(shard.remove(account).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::entities::Transaction;
    use crate::domain::value_objects::{SourceId, Timestamp, TransactionId};
    use std::sync::Arc;
    use std::thread;

    fn list(ids: &[&str]) -> TransactionList {
        let ts = Timestamp::parse("2024-05-01T10:15:30").unwrap();
        Arc::new(
            ids.iter()
                .map(|id| {
                    Transaction::new(
                        TransactionId::new(*id),
                        SourceId::new("server-1"),
                        AccountId::new("033"),
                        "1",
                        ts,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn get_missing_returns_none() {
        let cache = ShardedCache::without_expiry();
        assert!(cache.get(&AccountId::new("033")).unwrap().is_none());
    }

    #[test]
    fn put_then_get_returns_same_list() {
        let cache = ShardedCache::without_expiry();
        let account = AccountId::new("033");
        let stored = list(&["1", "2"]);

        cache.put(&account, Arc::clone(&stored)).unwrap();
        let fetched = cache.get(&account).unwrap().unwrap();

        assert!(Arc::ptr_eq(&stored, &fetched));
    }

    #[test]
    fn put_replaces_whole_entry() {
        let cache = ShardedCache::without_expiry();
        let account = AccountId::new("033");

        cache.put(&account, list(&["1", "2"])).unwrap();
        cache.put(&account, list(&["3"])).unwrap();

        let fetched = cache.get(&account).unwrap().unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched.first().unwrap().id().as_str(), "3");
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ShardedCache::new(4, Some(Duration::from_millis(20)));
        let account = AccountId::new("033");

        cache.put(&account, list(&["1"])).unwrap();
        assert!(cache.get(&account).unwrap().is_some());

        thread::sleep(Duration::from_millis(50));

        assert!(cache.get(&account).unwrap().is_none());
        assert_eq!(cache.len().unwrap(), 0, "expired entry is evicted");
    }

    #[test]
    fn no_ttl_keeps_entries() {
        let cache = ShardedCache::new(4, None);
        let account = AccountId::new("033");

        cache.put(&account, list(&["1"])).unwrap();
        thread::sleep(Duration::from_millis(20));

        assert!(cache.get(&account).unwrap().is_some());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ShardedCache::without_expiry();
        let account = AccountId::new("033");

        cache.put(&account, list(&["1"])).unwrap();

        assert!(cache.invalidate(&account).unwrap());
        assert!(!cache.invalidate(&account).unwrap());
        assert!(cache.get(&account).unwrap().is_none());
    }

    #[test]
    fn clear_empties_all_shards() {
        let cache = ShardedCache::new(8, None);
        for i in 0..32 {
            cache
                .put(&AccountId::new(format!("acct-{i}")), list(&["1"]))
                .unwrap();
        }
        assert_eq!(cache.len().unwrap(), 32);

        cache.clear().unwrap();

        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn zero_shards_is_clamped_to_one() {
        let cache = ShardedCache::new(0, None);
        assert_eq!(cache.shard_count(), 1);
        cache.put(&AccountId::new("a"), list(&["1"])).unwrap();
        assert!(cache.get(&AccountId::new("a")).unwrap().is_some());
    }

    #[test]
    fn concurrent_writers_on_distinct_accounts() {
        let cache = Arc::new(ShardedCache::new(8, None));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..50 {
                        let account = AccountId::new(format!("t{t}-a{i}"));
                        cache.put(&account, list(&["1"])).unwrap();
                        assert!(cache.get(&account).unwrap().is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len().unwrap(), 400);
    }

    #[test]
    fn poisoned_shard_is_reported() {
        let cache = Arc::new(ShardedCache::new(1, None));
        let account = AccountId::new("033");

        let poisoner = Arc::clone(&cache);
        let _ = thread::spawn(move || {
            let _guard = poisoner.write_shard(0).unwrap();
            panic!("writer crashed mid-update");
        })
        .join();

        assert_eq!(
            cache.get(&account).unwrap_err(),
            CacheError::Poisoned { shard: 0 }
        );
        assert!(cache.put(&account, list(&["1"])).is_err());
    }
}
