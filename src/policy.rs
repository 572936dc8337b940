use crate::{Error, Result, SequenceRecord};

/// Policy for handling malformed input records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputPolicy {
    /// Stop at the first malformed record and return its error
    #[default]
    Abort,
    /// Log malformed records and continue with the next one
    Skip,
}
impl InputPolicy {
    /// Applies the policy to one item from a record source
    ///
    /// Returns `Ok(Some(record))` for a valid record and `Ok(None)` for a record that
    /// should be skipped. Input errors are returned under [`InputPolicy::Abort`]; other
    /// errors (I/O, parser failures that cannot be resynchronized) are always returned.
    pub fn handle(&self, item: Result<SequenceRecord>) -> Result<Option<SequenceRecord>> {
        match item {
            Ok(record) => Ok(Some(record)),
            Err(Error::RecordError(e)) if *self == Self::Skip && e.is_recoverable() => {
                log::warn!("Skipping malformed record: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_abort_returns_input_errors() {
        let bad = SequenceRecord::fasta("bad", "");
        assert!(InputPolicy::Abort.handle(bad).is_err());
    }

    #[test]
    fn test_skip_drops_input_errors() -> anyhow::Result<()> {
        let bad = SequenceRecord::fasta("bad", "");
        assert!(InputPolicy::Skip.handle(bad)?.is_none());

        let good = SequenceRecord::fasta("good", "ACGT");
        assert_eq!(
            InputPolicy::Skip.handle(good)?.map(|r| r.header().to_string()),
            Some("good".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_skip_keeps_other_errors() {
        let io: Result<SequenceRecord> = Err(std::io::Error::other("disk gone").into());
        assert!(InputPolicy::Skip.handle(io).is_err());
    }
}
