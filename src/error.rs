use std::path::PathBuf;

/// Custom Result type for seqplug operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the seqplug library, encompassing all possible error cases
/// that can occur while reading records, configuring pipelines, analyzing, and caching.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Malformed input records
    RecordError(#[from] RecordError),
    /// Errors raised while building analyzers from a pipeline specification
    ConfigError(#[from] ConfigError),
    /// Errors raised by an analyzer while processing a record
    AnalysisError(#[from] AnalysisError),
    /// Errors from the content-addressed cache
    CacheError(#[from] CacheError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// Errors opening a possibly compressed input
    CompressionError(#[from] niffler::Error),
    /// JSON (de)serialization errors outside of the cache
    JsonError(#[from] serde_json::Error),
    /// Generic errors that can occur in any part of the system
    AnyhowError(#[from] anyhow::Error),
}
impl Error {
    /// Returns true if this error originated in the cache layer
    #[must_use]
    pub fn is_cache(&self) -> bool {
        matches!(self, Self::CacheError(_))
    }

    /// Returns true if this error describes a malformed input record
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(self, Self::RecordError(_))
    }
}

/// Errors describing malformed input records
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    /// A record was found with no sequence data
    ///
    /// # Arguments
    /// * `String` - The header of the offending record
    #[error("Sequence is empty for record: {0}")]
    EmptySequence(String),

    /// The record header or sequence is not valid UTF-8
    #[error("Record is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The quality string of a FASTQ record does not cover the sequence
    #[error("Quality length ({qual}) does not match sequence length ({seq}) for record: {header}")]
    QualityLength {
        header: String,
        seq: usize,
        qual: usize,
    },

    /// The input path has an extension that is neither FASTA nor FASTQ
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// Errors surfaced by the FASTA parser
    #[error("FASTA parse error: {0}")]
    Fasta(#[from] seq_io::fasta::Error),

    /// Errors surfaced by the FASTQ parser
    #[error("FASTQ parse error: {0}")]
    Fastq(#[from] seq_io::fastq::Error),
}
impl RecordError {
    /// Returns true if the reader can continue with the next record after this error
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptySequence(_) | Self::InvalidUtf8(_) | Self::QualityLength { .. }
        )
    }
}

/// Errors raised while turning a pipeline specification into analyzer instances
///
/// These are reported as diagnostics; the offending name is skipped.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No analyzer is registered under this name
    #[error("{0} is not a registered analyzer")]
    UnknownAnalyzer(String),

    /// The analyzer is registered but the pipeline carries no config for it
    #[error("There are no configs for {0}")]
    MissingConfig(String),

    /// The config could not be deserialized into the analyzer's parameters
    #[error("Invalid config for {name}: {source}")]
    InvalidConfig {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The motif pattern is not a valid regular expression
    #[error("Invalid motif pattern {motif:?}: {source}")]
    InvalidMotif {
        motif: String,
        #[source]
        source: regex::Error,
    },

    /// The constructor failed for a reason outside the config itself (e.g. cache setup)
    #[error("Unable to construct {name}: {reason}")]
    Construction { name: String, reason: String },
}
/// Errors raised by an analyzer while processing a single record
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    /// The analyzer needs at least one residue to produce a result
    #[error("Cannot analyze an empty sequence")]
    EmptySequence,
}

/// Errors from the content-addressed cache
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The cache directory does not exist and could not be created
    #[error("Unable to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be persisted
    #[error("Unable to write cache entry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An existing entry could not be read
    #[error("Unable to read cache entry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Aged entries could not be written to the archive
    #[error("Unable to archive cache entries into {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The magic number in the entry header does not match the expected value
    ///
    /// # Arguments
    /// * `u32` - The invalid magic number that was found
    #[error("Invalid magic number: {0}")]
    InvalidMagicNumber(u32),

    /// The entry was written with an unsupported format version
    ///
    /// # Arguments
    /// * `u8` - The unsupported version number that was found
    #[error("Invalid format version: {0}")]
    InvalidFormatVersion(u8),

    /// The entry header names an unknown payload codec
    #[error("Invalid payload codec: {0}")]
    InvalidCodec(u8),

    /// The payload is shorter than the header declares
    ///
    /// # Arguments
    /// * First `usize` - The actual number of payload bytes
    /// * Second `usize` - The expected number of payload bytes according to the header
    #[error("Entry payload truncated: {0} bytes. Expected: {1}")]
    Truncated(usize, usize),

    /// The payload could not be decoded into the requested value
    #[error("Unable to decode cache entry: {0}")]
    Decode(String),

    /// The value could not be encoded for storage
    #[error("Unable to encode cache entry: {0}")]
    Encode(String),
}
impl CacheError {
    /// Returns true for errors that indicate a damaged or foreign entry rather than an I/O fault
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagicNumber(_)
                | Self::InvalidFormatVersion(_)
                | Self::InvalidCodec(_)
                | Self::Truncated(..)
                | Self::Decode(_)
        )
    }
}
