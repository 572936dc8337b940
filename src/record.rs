use std::fmt;

use serde::Serialize;

use crate::{error::RecordError, Result};

/// A single sequence record as produced by a FASTA or FASTQ source
///
/// The sequence is guaranteed to be non-empty. Records are immutable once built;
/// the alphabet is not validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceRecord {
    header: String,
    sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<String>,
}
impl SequenceRecord {
    /// Creates a new record
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::EmptySequence`] if `sequence` is empty.
    pub fn new(
        header: impl Into<String>,
        sequence: impl Into<String>,
        quality: Option<String>,
    ) -> Result<Self> {
        let header = header.into();
        let sequence = sequence.into();
        if sequence.is_empty() {
            return Err(RecordError::EmptySequence(header).into());
        }
        Ok(Self {
            header,
            sequence,
            quality,
        })
    }

    /// Creates a record without quality scores
    pub fn fasta(header: impl Into<String>, sequence: impl Into<String>) -> Result<Self> {
        Self::new(header, sequence, None)
    }

    /// Creates a record with quality scores
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::QualityLength`] if the quality string does not cover the sequence.
    pub fn fastq(
        header: impl Into<String>,
        sequence: impl Into<String>,
        quality: impl Into<String>,
    ) -> Result<Self> {
        let record = Self::new(header, sequence, Some(quality.into()))?;
        let qual = record.quality().map_or(0, str::len);
        if qual != record.sequence.len() {
            return Err(RecordError::QualityLength {
                header: record.header,
                seq: record.sequence.len(),
                qual,
            }
            .into());
        }
        Ok(record)
    }

    /// The record identifier (header line without its leading marker)
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    #[must_use]
    pub fn quality(&self) -> Option<&str> {
        self.quality.as_deref()
    }

    /// Number of residues in the sequence (counted in characters)
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    /// Always false for a constructed record
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[must_use]
    pub fn has_quality(&self) -> bool {
        self.quality.is_some()
    }
}
impl fmt::Display for SequenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequence header: {}", self.header)?;
        writeln!(f, "Sequence: {}", self.sequence)?;
        writeln!(f, "Length: {}", self.len())
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::Error;

    #[test]
    fn test_record_accessors() -> anyhow::Result<()> {
        let record = SequenceRecord::fastq("s1", "ACGT", "IIII")?;
        assert_eq!(record.header(), "s1");
        assert_eq!(record.sequence(), "ACGT");
        assert_eq!(record.quality(), Some("IIII"));
        assert_eq!(record.len(), 4);
        assert!(!record.is_empty());
        assert!(record.has_quality());
        Ok(())
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let err = SequenceRecord::fasta("empty", "").unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::EmptySequence(ref header)) if header == "empty"
        ));
        assert!(err.is_input());
    }

    #[test]
    fn test_quality_length_mismatch() {
        let err = SequenceRecord::fastq("s1", "ACGT", "II").unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::QualityLength { seq: 4, qual: 2, .. })
        ));
    }

    #[test]
    fn test_display() -> anyhow::Result<()> {
        let record = SequenceRecord::fasta("s1", "GCGT")?;
        let text = record.to_string();
        assert!(text.contains("Sequence header: s1"));
        assert!(text.contains("Length: 4"));
        Ok(())
    }
}
