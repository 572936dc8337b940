use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use super::{parse_config, Analyzer, AnalysisValue, AnalyzerRegistry, Registered};
use crate::{
    cache::{CacheStore, ContentCache},
    kmer::{self, KmerTable},
    Result, SequenceRecord,
};

/// Default directory for cached k-mer tables
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Reports the number of distinct k-mers per length
///
/// The full k-mer table is obtained through a content-addressed cache, so a sequence
/// seen before (under any header) is never enumerated again.
pub struct KmerSpectrumAnalyzer {
    cache: ContentCache<SequenceRecord, KmerTable>,
    k: Option<usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct KmerSpectrumConfig {
    #[serde(default = "default_cache_dir")]
    cache_dir: PathBuf,
    #[serde(default)]
    k: Option<usize>,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

impl KmerSpectrumAnalyzer {
    /// Creates the analyzer over an existing store
    ///
    /// With `k` set, only that length is reported.
    #[must_use]
    pub fn new(store: CacheStore, k: Option<usize>) -> Self {
        Self {
            cache: kmer::cached_enumerator(store),
            k,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &ContentCache<SequenceRecord, KmerTable> {
        &self.cache
    }
}
impl Analyzer for KmerSpectrumAnalyzer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, record: &SequenceRecord) -> Result<AnalysisValue> {
        let table = self.cache.get_or_compute(record)?;
        let mut spectrum = kmer::spectrum(&table);
        if let Some(k) = self.k {
            spectrum.retain(|&length, _| length == k);
        }
        Ok(AnalysisValue::Spectrum(spectrum))
    }
}
impl Registered for KmerSpectrumAnalyzer {
    const NAME: &'static str = "KmerSpectrum";

    fn from_config(config: &Value) -> Result<Self> {
        let config: KmerSpectrumConfig = parse_config(Self::NAME, config)?;
        let store = CacheStore::open(&config.cache_dir)?;
        Ok(Self::new(store, config.k))
    }
}

pub fn register(registry: &mut AnalyzerRegistry) {
    registry.register_analyzer::<KmerSpectrumAnalyzer>();
}
