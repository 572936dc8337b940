//! # seqplug
//!
//! Sequence analysis through a configurable pipeline of independent analyzers, backed by a
//! content-addressed disk cache for expensive derived data.
//!
//! - [`analyzer`] defines the [`Analyzer`] capability, the built-in variants and the
//!   [`AnalyzerRegistry`] they register themselves into.
//! - [`pipeline`] builds analyzers from a [`PipelineSpec`] and runs them with per-analyzer
//!   failure isolation.
//! - [`cache`] memoizes pure functions of a record's sequence on disk, keyed by a SHA-256
//!   digest of the sequence.
//! - [`kmer`] enumerates all k-mers of a sequence, the expensive function the cache protects.
//! - [`reader`] yields [`SequenceRecord`]s from FASTA and FASTQ files.

pub mod analyzer;
pub mod cache;
mod error;
pub mod kmer;
pub mod pipeline;
mod policy;
pub mod prelude;
pub mod reader;
mod record;
pub mod report;

pub use analyzer::{
    AnalysisValue, Analyzer, AnalyzerRegistry, GcContent, KmerSpectrumAnalyzer, MotifSearch,
    Registered,
};
pub use error::{AnalysisError, CacheError, ConfigError, Error, RecordError, Result};
pub use pipeline::{Pipeline, PipelineSpec};
pub use policy::InputPolicy;
pub use reader::{RecordReader, SequenceFormat};
pub use record::SequenceRecord;
pub use report::{AnalysisFailure, BatchReport, FailureKind, Outcome, RecordReport};
