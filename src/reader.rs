//! Record sources for FASTA and FASTQ files
//!
//! Inputs are opened through `niffler`, so gzip, bzip2, xz and zstd files are read
//! transparently. Parsing is delegated to `seq_io`.

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use seq_io::{fasta, fastq};

use crate::{error::RecordError, Result, SequenceRecord};

/// File extensions recognized as FASTA
pub const FASTA_EXTENSIONS: &[&str] = &["fasta", "fa", "fna", "ffn", "faa", "frn", "mpfa"];

/// File extensions recognized as FASTQ
pub const FASTQ_EXTENSIONS: &[&str] = &["fastq", "fq"];

/// Compression suffixes ignored when detecting the format
const COMPRESSION_EXTENSIONS: &[&str] = &["gz", "bz2", "xz", "zst"];

/// Sequence file formats understood by [`RecordReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fasta,
    Fastq,
}
impl SequenceFormat {
    /// Determines the format from the path's extension, ignoring a compression suffix
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut stripped = PathBuf::from(path);
        let compressed = extension_of(&stripped)
            .is_some_and(|ext| COMPRESSION_EXTENSIONS.contains(&ext.as_str()));
        if compressed {
            stripped.set_extension("");
        }
        match extension_of(&stripped) {
            Some(ext) if FASTA_EXTENSIONS.contains(&ext.as_str()) => Ok(Self::Fasta),
            Some(ext) if FASTQ_EXTENSIONS.contains(&ext.as_str()) => Ok(Self::Fastq),
            _ => Err(RecordError::UnsupportedExtension(path.display().to_string()).into()),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// An iterator of [`SequenceRecord`]s over a FASTA or FASTQ stream
///
/// Every item is either a valid record or the error that prevented building one.
/// Callers decide whether to skip or stop; see [`crate::InputPolicy`].
pub enum RecordReader<R: Read> {
    Fasta(fasta::Reader<R>),
    Fastq(fastq::Reader<R>),
}
impl RecordReader<Box<dyn Read>> {
    /// Opens `path`, detecting both the compression and the sequence format
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SequenceFormat::from_path(path)?;
        let (handle, compression) = niffler::from_path(path)?;
        log::debug!(
            "Reading {:?} records from {} ({compression:?})",
            format,
            path.display()
        );
        let handle: Box<dyn Read> = handle;
        Ok(Self::with_format(handle, format))
    }
}
impl<R: Read> RecordReader<R> {
    pub fn with_format(inner: R, format: SequenceFormat) -> Self {
        match format {
            SequenceFormat::Fasta => Self::fasta(inner),
            SequenceFormat::Fastq => Self::fastq(inner),
        }
    }

    pub fn fasta(inner: R) -> Self {
        Self::Fasta(fasta::Reader::new(inner))
    }

    pub fn fastq(inner: R) -> Self {
        Self::Fastq(fastq::Reader::new(inner))
    }

    #[must_use]
    pub fn format(&self) -> SequenceFormat {
        match self {
            Self::Fasta(_) => SequenceFormat::Fasta,
            Self::Fastq(_) => SequenceFormat::Fastq,
        }
    }

    fn next_fasta(reader: &mut fasta::Reader<R>) -> Option<Result<SequenceRecord>> {
        Some(match reader.next()? {
            Ok(record) => fasta_record(&record),
            Err(e) => Err(RecordError::from(e).into()),
        })
    }

    fn next_fastq(reader: &mut fastq::Reader<R>) -> Option<Result<SequenceRecord>> {
        Some(match reader.next()? {
            Ok(record) => fastq_record(&record),
            Err(e) => Err(RecordError::from(e).into()),
        })
    }
}

fn fasta_record(record: &fasta::RefRecord) -> Result<SequenceRecord> {
    use seq_io::fasta::Record;

    let header = std::str::from_utf8(record.head()).map_err(RecordError::from)?;
    let sequence = record.full_seq();
    let sequence = std::str::from_utf8(&sequence).map_err(RecordError::from)?;
    SequenceRecord::fasta(header, sequence)
}

fn fastq_record(record: &fastq::RefRecord) -> Result<SequenceRecord> {
    use seq_io::fastq::Record;

    let header = std::str::from_utf8(record.head()).map_err(RecordError::from)?;
    let sequence = std::str::from_utf8(record.seq()).map_err(RecordError::from)?;
    let quality = std::str::from_utf8(record.qual()).map_err(RecordError::from)?;
    SequenceRecord::fastq(header, sequence, quality)
}
impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Fasta(reader) => Self::next_fasta(reader),
            Self::Fastq(reader) => Self::next_fastq(reader),
        }
    }
}
