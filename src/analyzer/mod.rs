//! # analyzer
//!
//! The analyzer capability and its built-in variants.
//!
//! An [`Analyzer`] turns one [`SequenceRecord`] into one [`AnalysisValue`]. Variants that
//! can be built from a pipeline configuration also implement [`Registered`] and expose a
//! `register` function next to their definition, which adds them to an
//! [`AnalyzerRegistry`].

mod gc_content;
mod kmer_spectrum;
mod motif;
mod registry;

use std::collections::BTreeMap;

use auto_impl::auto_impl;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

pub use gc_content::GcContent;
pub use kmer_spectrum::KmerSpectrumAnalyzer;
pub use motif::MotifSearch;
pub use registry::{AnalyzerRegistry, Constructor};

use crate::{
    error::ConfigError,
    report::{AnalysisFailure, Outcome},
    Result, SequenceRecord,
};

/// The result of running one analyzer on one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisValue {
    /// A fraction in `[0, 1]`
    Fraction(f64),
    /// 1-based positions in the sequence
    Positions(Vec<usize>),
    /// Number of distinct k-mers per k-mer length
    Spectrum(BTreeMap<usize, usize>),
}
impl AnalysisValue {
    #[must_use]
    pub fn as_fraction(&self) -> Option<f64> {
        match self {
            Self::Fraction(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_positions(&self) -> Option<&[usize]> {
        match self {
            Self::Positions(positions) => Some(positions),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_spectrum(&self) -> Option<&BTreeMap<usize, usize>> {
        match self {
            Self::Spectrum(spectrum) => Some(spectrum),
            _ => None,
        }
    }
}

/// Common interface for all sequence analyses
///
/// Implementations must not modify anything observable besides delegating to a cache.
#[auto_impl(&, Box)]
pub trait Analyzer {
    /// The name results are reported under
    fn name(&self) -> &'static str;

    /// Analyze a single record
    fn run(&self, record: &SequenceRecord) -> Result<AnalysisValue>;
}

/// Analyzers that can be constructed from a pipeline configuration
pub trait Registered: Analyzer + Sized + 'static {
    /// The registry key of this analyzer
    const NAME: &'static str;

    /// Builds the analyzer from its JSON configuration
    fn from_config(config: &Value) -> Result<Self>;
}

/// Deserializes an analyzer's configuration, treating `null` as an empty object
pub(crate) fn parse_config<T: DeserializeOwned>(name: &str, config: &Value) -> Result<T> {
    let config = match config {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(config).map_err(|source| {
        ConfigError::InvalidConfig {
            name: name.to_string(),
            source,
        }
        .into()
    })
}

/// Runs `analyzer` on `record`, converting an error into a failure outcome
///
/// The failure is logged and never propagated.
pub fn run_isolated<A: Analyzer>(analyzer: &A, record: &SequenceRecord) -> Outcome {
    match analyzer.run(record) {
        Ok(value) => Outcome::Value(value),
        Err(e) => {
            log::warn!(
                "{} caused an error on {} and won't be analyzed: {e}",
                analyzer.name(),
                record.header()
            );
            Outcome::Error(AnalysisFailure::new(analyzer.name(), &e))
        }
    }
}
