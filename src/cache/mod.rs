//! # cache
//!
//! A content-addressed disk cache for expensive, pure functions of a record's sequence.
//!
//! Keys are SHA-256 digests of the content (never of the header), so two records that
//! share a sequence share one entry. Entries are written once per key and served on every
//! later call without invoking the wrapped function.
//!
//! ## Failure policy
//!
//! Reads fail open: an entry that cannot be read or decoded is logged, treated as a miss,
//! recomputed and overwritten. Writes fail closed: if a freshly computed value cannot be
//! persisted the error is returned to the caller.
//!
//! There is no locking and no expiry. A well-formed but stale entry is served until an
//! external process removes it.
//!
//! ## Usage
//!
//! ```rust
//! use seqplug::{cache::{CacheKey, CacheStore, ContentCache}, SequenceRecord};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = CacheStore::open(dir.path()).unwrap();
//! let cache = ContentCache::new(store, CacheKey::of_sequence, |record: &SequenceRecord| {
//!     record.sequence().to_lowercase()
//! });
//!
//! let record = SequenceRecord::fasta("s1", "ACGT").unwrap();
//! assert_eq!(cache.get_or_compute(&record).unwrap(), "acgt");
//! assert_eq!(cache.get_or_compute(&record).unwrap(), "acgt");
//! assert_eq!(cache.stats().misses, 1);
//! assert_eq!(cache.stats().hits, 1);
//! ```

mod header;
mod store;

use std::{cell::Cell, fmt, marker::PhantomData};

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

pub use header::{Codec, EntryHeader, SIZE_HEADER};
pub use store::{CacheStore, ENTRY_EXTENSION};

use crate::{Error, Result, SequenceRecord};

/// Length of a hex-encoded SHA-256 digest
const KEY_LEN: usize = 64;

/// Deterministic key of a cache entry: the lowercase hex SHA-256 digest of some content
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(String);
impl CacheKey {
    /// Digests arbitrary bytes
    #[must_use]
    pub fn of_content(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Digests the UTF-8 bytes of the record's sequence; the header is ignored
    #[must_use]
    pub fn of_sequence(record: &SequenceRecord) -> Self {
        Self::of_content(record.sequence().as_bytes())
    }

    /// Parses a key from its hex form, as found in entry file names
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == KEY_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counters describing how a [`ContentCache`] has been used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls served from disk
    pub hits: u64,
    /// Calls that invoked the wrapped function
    pub misses: u64,
    /// Entries written
    pub stores: u64,
    /// Damaged entries that were recomputed (counted in `misses` as well)
    pub recovered: u64,
}

/// A cache client that memoizes `compute` on disk under keys produced by `key_fn`
///
/// `compute` must depend only on the content that `key_fn` digests; the cache cannot
/// detect a function that reads anything else.
pub struct ContentCache<I: ?Sized, V> {
    store: CacheStore,
    key_fn: Box<dyn Fn(&I) -> CacheKey>,
    compute: Box<dyn Fn(&I) -> V>,
    stats: Cell<CacheStats>,
    _value: PhantomData<fn() -> V>,
}
impl<I: ?Sized, V> ContentCache<I, V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn new<K, F>(store: CacheStore, key_fn: K, compute: F) -> Self
    where
        K: Fn(&I) -> CacheKey + 'static,
        F: Fn(&I) -> V + 'static,
    {
        Self {
            store,
            key_fn: Box::new(key_fn),
            compute: Box::new(compute),
            stats: Cell::new(CacheStats::default()),
            _value: PhantomData,
        }
    }

    /// Returns the stored value for `input`, computing and persisting it on a miss
    pub fn get_or_compute(&self, input: &I) -> Result<V> {
        let key = self.key(input);
        let mut stats = self.stats.get();

        match self.store.load(&key) {
            Ok(Some(value)) => {
                log::debug!("Cache hit for {key}");
                stats.hits += 1;
                self.stats.set(stats);
                return Ok(value);
            }
            Ok(None) => {
                log::debug!("Cache miss for {key}");
            }
            Err(Error::CacheError(e)) => {
                log::warn!("Discarding unreadable cache entry {key}: {e}");
                stats.recovered += 1;
            }
            Err(e) => return Err(e),
        }

        let value = (self.compute)(input);
        stats.misses += 1;
        self.stats.set(stats);

        self.store.save(&key, &value)?;
        stats.stores += 1;
        self.stats.set(stats);
        Ok(value)
    }

    /// The key `input` maps to
    pub fn key(&self, input: &I) -> CacheKey {
        (self.key_fn)(input)
    }

    /// Whether an entry for `input` is currently stored
    pub fn contains(&self, input: &I) -> bool {
        self.store.contains(&self.key(input))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.get()
    }

    #[must_use]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}
impl<I: ?Sized, V> fmt::Debug for ContentCache<I, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCache")
            .field("store", &self.store)
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::kmer::{self, KmerTable};
    use std::{fs, rc::Rc};

    type Counted = (ContentCache<SequenceRecord, KmerTable>, Rc<Cell<usize>>);

    fn counting_cache(store: CacheStore) -> Counted {
        let counter = Rc::new(Cell::new(0));
        let calls = Rc::clone(&counter);
        let compute = move |record: &SequenceRecord| {
            calls.set(calls.get() + 1);
            kmer::enumerate(record.sequence())
        };
        (ContentCache::new(store, CacheKey::of_sequence, compute), counter)
    }

    #[test]
    fn test_key_is_sha256_of_sequence() -> anyhow::Result<()> {
        let record = SequenceRecord::fasta("s1", "abc")?;
        assert_eq!(
            CacheKey::of_sequence(&record).as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        Ok(())
    }

    #[test]
    fn test_from_hex() {
        let key = CacheKey::of_content(b"ACGT");
        assert_eq!(CacheKey::from_hex(key.as_str()), Some(key));
        assert!(CacheKey::from_hex("abc").is_none());
        assert!(CacheKey::from_hex(&"G".repeat(KEY_LEN)).is_none());
    }

    #[test]
    fn test_compute_runs_once() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let (cache, counter) = counting_cache(CacheStore::open(tmp.path())?);
        let record = SequenceRecord::fasta("s1", "ATGCATGC")?;

        let first = cache.get_or_compute(&record)?;
        let second = cache.get_or_compute(&record)?;
        assert_eq!(first, second);
        assert_eq!(serde_json::to_vec(&first)?, serde_json::to_vec(&second)?);
        assert_eq!(counter.get(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                stores: 1,
                recovered: 0
            }
        );
        Ok(())
    }

    #[test]
    fn test_shared_entry_for_identical_sequences() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let (cache, counter) = counting_cache(CacheStore::open(tmp.path())?);
        let a = SequenceRecord::fasta("first", "GATTACA")?;
        let b = SequenceRecord::fasta("second", "GATTACA")?;

        assert_eq!(cache.key(&a), cache.key(&b));
        cache.get_or_compute(&a)?;
        cache.get_or_compute(&b)?;
        assert_eq!(counter.get(), 1);
        assert_eq!(fs::read_dir(tmp.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_entries_survive_new_client() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let record = SequenceRecord::fasta("s1", "ACGTT")?;
        {
            let (cache, _) = counting_cache(CacheStore::open(tmp.path())?);
            cache.get_or_compute(&record)?;
        }
        let (cache, counter) = counting_cache(CacheStore::open(tmp.path())?);
        assert!(cache.contains(&record));
        assert_eq!(cache.get_or_compute(&record)?, kmer::enumerate("ACGTT"));
        assert_eq!(counter.get(), 0);
        Ok(())
    }

    #[test]
    fn test_corrupt_entry_is_recomputed() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let (cache, counter) = counting_cache(CacheStore::open(tmp.path())?);
        let record = SequenceRecord::fasta("s1", "ACGTT")?;
        fs::write(cache.store().path_for(&cache.key(&record)), b"not an entry")?;

        assert_eq!(cache.get_or_compute(&record)?, kmer::enumerate("ACGTT"));
        assert_eq!(counter.get(), 1);
        assert_eq!(cache.stats().recovered, 1);

        // the damaged file was replaced by a readable entry
        cache.get_or_compute(&record)?;
        assert_eq!(counter.get(), 1);
        Ok(())
    }

    #[test]
    fn test_non_finite_value_is_computed_once() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let counter = Rc::new(Cell::new(0));
        let calls = Rc::clone(&counter);
        let cache = ContentCache::new(
            CacheStore::open(tmp.path())?,
            CacheKey::of_sequence,
            move |_: &SequenceRecord| {
                calls.set(calls.get() + 1);
                f64::NAN
            },
        );
        let record = SequenceRecord::fasta("s1", "ACGT")?;

        assert!(cache.get_or_compute(&record)?.is_nan());
        assert!(cache.get_or_compute(&record)?.is_nan());
        assert_eq!(counter.get(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                stores: 1,
                recovered: 0
            }
        );
        Ok(())
    }

    #[test]
    fn test_write_failure_is_returned() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let store = CacheStore::open(tmp.path().join("cache"))?;
        let (cache, _) = counting_cache(store);
        fs::remove_dir(tmp.path().join("cache"))?;

        let record = SequenceRecord::fasta("s1", "ACGT")?;
        let err = cache.get_or_compute(&record).unwrap_err();
        assert!(err.is_cache());
        Ok(())
    }
}
