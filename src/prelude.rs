pub use super::{
    AnalysisValue, Analyzer, AnalyzerRegistry, InputPolicy, Outcome, Pipeline, PipelineSpec,
    RecordReader, Registered, SequenceRecord,
};

pub use crate::cache::{CacheKey, CacheStore, ContentCache};
