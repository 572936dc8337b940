use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::Value;

use super::{parse_config, Analyzer, AnalysisValue, AnalyzerRegistry, Registered};
use crate::{error::ConfigError, Result, SequenceRecord};

/// Finds every non-overlapping occurrence of a motif
///
/// The motif is a regular expression; plain nucleotide strings match literally.
/// Results are 1-based character offsets in left-to-right order. A sequence without
/// matches yields an empty list.
#[derive(Debug, Clone)]
pub struct MotifSearch {
    pattern: Regex,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MotifSearchConfig {
    motif: String,
    #[serde(default)]
    case_insensitive: bool,
}

impl MotifSearch {
    pub fn new(motif: &str) -> Result<Self> {
        Self::build(motif, false)
    }

    fn build(motif: &str, case_insensitive: bool) -> Result<Self> {
        let pattern = RegexBuilder::new(motif)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| ConfigError::InvalidMotif {
                motif: motif.to_string(),
                source,
            })?;
        Ok(Self { pattern })
    }

    #[must_use]
    pub fn motif(&self) -> &str {
        self.pattern.as_str()
    }

    /// 1-based start offsets of each match in `sequence`
    #[must_use]
    pub fn positions(&self, sequence: &str) -> Vec<usize> {
        let starts = self.pattern.find_iter(sequence).map(|m| m.start());
        if sequence.is_ascii() {
            return starts.map(|start| start + 1).collect();
        }
        // match starts are increasing byte offsets on char boundaries
        let mut chars = sequence.char_indices().enumerate().peekable();
        starts
            .map(|start| {
                while chars.next_if(|(_, (byte, _))| *byte < start).is_some() {}
                chars
                    .peek()
                    .map_or_else(|| sequence.chars().count() + 1, |&(offset, _)| offset + 1)
            })
            .collect()
    }
}
impl Analyzer for MotifSearch {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, record: &SequenceRecord) -> Result<AnalysisValue> {
        Ok(AnalysisValue::Positions(self.positions(record.sequence())))
    }
}
impl Registered for MotifSearch {
    const NAME: &'static str = "MotifSearch";

    fn from_config(config: &Value) -> Result<Self> {
        let config: MotifSearchConfig = parse_config(Self::NAME, config)?;
        Self::build(&config.motif, config.case_insensitive)
    }
}

pub fn register(registry: &mut AnalyzerRegistry) {
    registry.register_analyzer::<MotifSearch>();
}
