use serde::Deserialize;
use serde_json::Value;

use super::{parse_config, Analyzer, AnalysisValue, AnalyzerRegistry, Registered};
use crate::{error::AnalysisError, Result, SequenceRecord};

/// Fraction of residues that are G or C, case-insensitive
#[derive(Debug, Clone, Copy, Default)]
pub struct GcContent;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GcContentConfig {}

/// Calculate the GC fraction of a sequence
///
/// The denominator counts characters, including residues other than A, C, G and T.
#[allow(clippy::cast_precision_loss)]
pub fn gc_fraction(sequence: &str) -> Result<f64> {
    let len = sequence.chars().count();
    if len == 0 {
        return Err(AnalysisError::EmptySequence.into());
    }
    let gc = sequence
        .bytes()
        .filter(|b| matches!(b, b'G' | b'g' | b'C' | b'c'))
        .count();
    Ok(gc as f64 / len as f64)
}

impl Analyzer for GcContent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, record: &SequenceRecord) -> Result<AnalysisValue> {
        gc_fraction(record.sequence()).map(AnalysisValue::Fraction)
    }
}
impl Registered for GcContent {
    const NAME: &'static str = "GCContent";

    fn from_config(config: &Value) -> Result<Self> {
        let GcContentConfig {} = parse_config(Self::NAME, config)?;
        Ok(Self)
    }
}

pub fn register(registry: &mut AnalyzerRegistry) {
    registry.register_analyzer::<GcContent>();
}
