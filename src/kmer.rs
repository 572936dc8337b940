//! # kmer
//!
//! Exhaustive k-mer enumeration: for a sequence of length N, every substring of every
//! length `k` in `1..=N`, in sliding-window order.
//!
//! The output holds O(N²) characters, which is why tables are normally obtained through
//! [`cached_enumerator`] rather than by calling [`enumerate`] directly.

use std::collections::BTreeMap;

use crate::{
    cache::{CacheKey, CacheStore, ContentCache},
    SequenceRecord,
};

/// Mapping from k-mer length to all k-mers of that length, in left-to-right order
pub type KmerTable = BTreeMap<usize, Vec<String>>;

/// Mapping from k-mer length to the number of distinct k-mers of that length
pub type KmerSpectrum = BTreeMap<usize, usize>;

/// Enumerates all k-mers of every length of `sequence`
///
/// Windows are taken over characters, so multi-byte residues are never split.
///
/// # Example
///
/// ```
/// let table = seqplug::kmer::enumerate("ATGC");
/// assert_eq!(table[&2], vec!["AT", "TG", "GC"]);
/// assert_eq!(table[&4], vec!["ATGC"]);
/// ```
#[must_use]
pub fn enumerate(sequence: &str) -> KmerTable {
    // byte offsets of each character boundary, including the end
    let bounds: Vec<usize> = sequence
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(sequence.len()))
        .collect();
    let n = bounds.len() - 1;

    (1..=n)
        .map(|k| {
            let kmers = (0..=n - k)
                .map(|start| sequence[bounds[start]..bounds[start + k]].to_string())
                .collect();
            (k, kmers)
        })
        .collect()
}

/// Counts the distinct k-mers for each length in `table`
#[must_use]
pub fn spectrum(table: &KmerTable) -> KmerSpectrum {
    table
        .iter()
        .map(|(&k, kmers)| {
            let mut distinct: Vec<&str> = kmers.iter().map(String::as_str).collect();
            distinct.sort_unstable();
            distinct.dedup();
            (k, distinct.len())
        })
        .collect()
}

/// Builds a [`ContentCache`] that memoizes [`enumerate`] by sequence content
pub fn cached_enumerator(store: CacheStore) -> ContentCache<SequenceRecord, KmerTable> {
    ContentCache::new(store, CacheKey::of_sequence, |record: &SequenceRecord| {
        enumerate(record.sequence())
    })
}

#[cfg(test)]
mod testing {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_enumerate_atgc() {
        let table = enumerate("ATGC");
        assert_eq!(table.len(), 4);
        assert_eq!(table[&1], vec!["A", "T", "G", "C"]);
        assert_eq!(table[&2], vec!["AT", "TG", "GC"]);
        assert_eq!(table[&3], vec!["ATG", "TGC"]);
        assert_eq!(table[&4], vec!["ATGC"]);
    }

    #[test]
    fn test_enumerate_empty() {
        assert!(enumerate("").is_empty());
    }

    #[test]
    fn test_enumerate_multibyte() {
        let table = enumerate("AµC");
        assert_eq!(table[&1], vec!["A", "µ", "C"]);
        assert_eq!(table[&2], vec!["Aµ", "µC"]);
    }

    #[test]
    fn test_spectrum() {
        let table = enumerate("AAAA");
        let spectrum = spectrum(&table);
        assert_eq!(spectrum[&1], 1);
        assert_eq!(spectrum[&4], 1);

        let spectrum = super::spectrum(&enumerate("ACGT"));
        assert_eq!(spectrum.values().copied().collect::<Vec<_>>(), vec![4, 3, 2, 1]);
    }

    proptest! {
        #[test]
        fn prop_window_counts(seq in "[ACGTN]{1,40}") {
            let table = enumerate(&seq);
            let n = seq.len();
            prop_assert_eq!(table.len(), n);
            for (&k, kmers) in &table {
                prop_assert_eq!(kmers.len(), n - k + 1);
                prop_assert!(kmers.iter().all(|kmer| kmer.len() == k));
            }
        }
    }
}
