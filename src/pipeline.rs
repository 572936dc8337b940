//! # pipeline
//!
//! The pipeline manager: builds analyzer instances from a [`PipelineSpec`] and runs them
//! over one or many records.
//!
//! Setup problems (unknown names, missing or invalid configs) are diagnostics; the
//! affected name is skipped and the rest of the pipeline is built. A failing analyzer
//! never aborts the record or the batch: its entry becomes an [`Outcome::Error`].
//!
//! ## Usage
//!
//! ```rust
//! use seqplug::{prelude::*, MotifSearch};
//! use serde_json::json;
//!
//! let mut pipeline = Pipeline::default();
//! let spec = PipelineSpec::new(["GCContent"]).with_config("GCContent", json!({}));
//! pipeline.configure(spec, true);
//! pipeline.add_analyzer::<MotifSearch>(json!({"motif": "ATG"}), 1);
//! assert_eq!(pipeline.order(), ["GCContent", "MotifSearch"]);
//!
//! let record = SequenceRecord::fasta("s1", "ATGTTGGGCATG").unwrap();
//! let report = pipeline.run_one(&record);
//! assert_eq!(
//!     report.get("MotifSearch").and_then(Outcome::value),
//!     Some(&AnalysisValue::Positions(vec![1, 10]))
//! );
//! ```

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    analyzer::{run_isolated, Analyzer, AnalyzerRegistry, Registered},
    error::ConfigError,
    report::{BatchReport, RecordReport},
    Error, InputPolicy, Result, SequenceRecord,
};

/// Which analyzers to run, in which order, and with which parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Analyzer names in execution order
    #[serde(default)]
    pub order: Vec<String>,
    /// Construction parameters, keyed by analyzer name
    #[serde(default)]
    pub configs: BTreeMap<String, Value>,
}
impl PipelineSpec {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
            configs: BTreeMap::new(),
        }
    }

    /// Adds or replaces the config for `name`
    #[must_use]
    pub fn with_config(mut self, name: impl Into<String>, config: Value) -> Self {
        self.configs.insert(name.into(), config);
        self
    }

    /// Loads a spec from a JSON document of the form `{"order": [...], "configs": {...}}`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = File::open(path).map(BufReader::new)?;
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Ordered set of configured analyzers
///
/// Starts unconfigured; [`Pipeline::configure`] builds the instance list and may be called
/// again at any time to replace it.
pub struct Pipeline {
    registry: AnalyzerRegistry,
    spec: PipelineSpec,
    instances: Vec<Box<dyn Analyzer>>,
    configured: bool,
}
impl Default for Pipeline {
    /// A pipeline over all built-in analyzers
    fn default() -> Self {
        Self::new(AnalyzerRegistry::with_builtins())
    }
}
impl Pipeline {
    #[must_use]
    pub fn new(registry: AnalyzerRegistry) -> Self {
        Self {
            registry,
            spec: PipelineSpec::default(),
            instances: Vec::new(),
            configured: false,
        }
    }

    /// Builds the instance list described by `spec`
    ///
    /// Names that are unknown, lack a config, or fail to construct are skipped. The
    /// skipped names are returned (and logged) as diagnostics. The previous instance list
    /// is replaced only once the new one is complete.
    pub fn configure(&mut self, spec: PipelineSpec, verbose: bool) -> Vec<ConfigError> {
        let mut instances = Vec::with_capacity(spec.order.len());
        let mut diagnostics = Vec::new();

        for name in &spec.order {
            match self.build(name, &spec) {
                Ok(instance) => {
                    if verbose {
                        log::info!("{name} discovered and added");
                    } else {
                        log::debug!("{name} discovered and added");
                    }
                    instances.push(instance);
                }
                Err(diagnostic) => {
                    if verbose {
                        log::warn!("Skipping {name}: {diagnostic}");
                    } else {
                        log::debug!("Skipping {name}: {diagnostic}");
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }

        self.instances = instances;
        self.spec = spec;
        self.configured = true;
        diagnostics
    }

    fn build(
        &self,
        name: &str,
        spec: &PipelineSpec,
    ) -> std::result::Result<Box<dyn Analyzer>, ConfigError> {
        let constructor = self
            .registry
            .get(name)
            .ok_or_else(|| ConfigError::UnknownAnalyzer(name.to_string()))?;
        let config = spec
            .configs
            .get(name)
            .ok_or_else(|| ConfigError::MissingConfig(name.to_string()))?;
        constructor(config).map_err(|e| match e {
            Error::ConfigError(e) => e,
            other => ConfigError::Construction {
                name: name.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Adds analyzer `A` with `config` at `position` and rebuilds the pipeline quietly
    ///
    /// See [`Pipeline::add_analyzer_by_name`].
    pub fn add_analyzer<A: Registered>(
        &mut self,
        config: Value,
        position: usize,
    ) -> Vec<ConfigError> {
        if !self.registry.contains(A::NAME) {
            self.registry.register_analyzer::<A>();
        }
        self.add_analyzer_by_name(A::NAME, config, position)
    }

    /// Adds the analyzer registered as `name` with `config` at `position`
    ///
    /// `position` is 0-based and clamped to the length of the order. If `name` is already
    /// part of the order it is moved rather than duplicated. Configs of other analyzers
    /// are kept, and the pipeline is reconfigured without verbose diagnostics.
    pub fn add_analyzer_by_name(
        &mut self,
        name: &str,
        config: Value,
        position: usize,
    ) -> Vec<ConfigError> {
        let mut spec = self.spec.clone();
        spec.configs.insert(name.to_string(), config.clone());
        spec.order.retain(|existing| existing != name);
        let position = position.min(spec.order.len());
        spec.order.insert(position, name.to_string());
        log::info!("Added {name}({config}) at position {position}; rebuilding pipeline");
        self.configure(spec, false)
    }

    /// Runs every configured analyzer on `record`, in order
    ///
    /// A failing analyzer is recorded as an error outcome and does not stop the others.
    #[must_use]
    pub fn run_one(&self, record: &SequenceRecord) -> RecordReport {
        let mut report = RecordReport::new();
        for instance in &self.instances {
            report.insert(instance.name(), run_isolated(instance, record));
        }
        report
    }

    /// Runs the pipeline over `records` in iteration order
    ///
    /// Records are keyed by header; a later record with the same header replaces the
    /// earlier result.
    pub fn run_many<'a, I>(&self, records: I) -> BatchReport
    where
        I: IntoIterator<Item = &'a SequenceRecord>,
    {
        let mut batch = BatchReport::new();
        for record in records {
            if batch
                .insert(record.header(), self.run_one(record))
                .is_some()
            {
                log::debug!("Duplicate header {} replaced an earlier result", record.header());
            }
        }
        batch
    }

    /// Runs the pipeline over a fallible record source
    ///
    /// Malformed records are handled according to `policy`.
    pub fn run_stream<I>(&self, records: I, policy: InputPolicy) -> Result<BatchReport>
    where
        I: IntoIterator<Item = Result<SequenceRecord>>,
    {
        let mut batch = BatchReport::new();
        for item in records {
            if let Some(record) = policy.handle(item)? {
                batch.insert(record.header(), self.run_one(&record));
            }
        }
        Ok(batch)
    }

    /// Analyzer names in configured order, including names that were skipped
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.spec.order
    }

    #[must_use]
    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Names of the live instances, in execution order
    #[must_use]
    pub fn instance_names(&self) -> Vec<&'static str> {
        self.instances.iter().map(|instance| instance.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    #[must_use]
    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::{error::AnalysisError, report::Outcome, AnalysisValue, GcContent, MotifSearch};
    use serde_json::json;

    struct AlwaysFails;
    impl Analyzer for AlwaysFails {
        fn name(&self) -> &'static str {
            Self::NAME
        }
        fn run(&self, _record: &SequenceRecord) -> Result<AnalysisValue> {
            Err(AnalysisError::EmptySequence.into())
        }
    }
    impl Registered for AlwaysFails {
        const NAME: &'static str = "AlwaysFails";
        fn from_config(_config: &Value) -> Result<Self> {
            Ok(Self)
        }
    }

    fn gc_only() -> Pipeline {
        let mut pipeline = Pipeline::default();
        let spec = PipelineSpec::new(["GCContent"]).with_config("GCContent", json!({}));
        let diagnostics = pipeline.configure(spec, true);
        assert!(diagnostics.is_empty());
        pipeline
    }

    #[test]
    fn test_unconfigured() {
        let pipeline = Pipeline::default();
        assert!(!pipeline.is_configured());
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_configure_skips_unknown_and_unconfigured() {
        let mut pipeline = Pipeline::default();
        let spec = PipelineSpec::new(["Nope", "GCContent", "MotifSearch"])
            .with_config("GCContent", json!({}));
        let diagnostics = pipeline.configure(spec, true);

        assert_eq!(pipeline.instance_names(), vec!["GCContent"]);
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(diagnostics[0], ConfigError::UnknownAnalyzer(ref n) if n == "Nope"));
        assert!(matches!(diagnostics[1], ConfigError::MissingConfig(ref n) if n == "MotifSearch"));
        assert_eq!(pipeline.order().len(), 3);
    }

    #[test]
    fn test_configure_skips_invalid_config() {
        let mut pipeline = Pipeline::default();
        let spec = PipelineSpec::new(["MotifSearch", "GCContent"])
            .with_config("MotifSearch", json!({"motif": "(("}))
            .with_config("GCContent", Value::Null);
        let diagnostics = pipeline.configure(spec, false);
        assert_eq!(pipeline.instance_names(), vec!["GCContent"]);
        assert!(matches!(diagnostics[0], ConfigError::InvalidMotif { .. }));
    }

    #[test]
    fn test_reconfigure_replaces_instances() {
        let mut pipeline = gc_only();
        pipeline.configure(
            PipelineSpec::new(["MotifSearch"]).with_config("MotifSearch", json!({"motif": "A"})),
            false,
        );
        assert_eq!(pipeline.instance_names(), vec!["MotifSearch"]);
    }

    #[test]
    fn test_run_one() -> anyhow::Result<()> {
        let mut pipeline = gc_only();
        pipeline.add_analyzer::<MotifSearch>(json!({"motif": "ATG"}), 1);
        let record = SequenceRecord::fasta("s1", "ATGTTGGGCATG")?;
        let report = pipeline.run_one(&record);

        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["GCContent", "MotifSearch"]);
        assert_eq!(
            report.get("GCContent").and_then(Outcome::value),
            Some(&AnalysisValue::Fraction(0.5))
        );
        assert_eq!(
            report.get("MotifSearch").and_then(Outcome::value),
            Some(&AnalysisValue::Positions(vec![1, 10]))
        );
        Ok(())
    }

    #[test]
    fn test_failure_isolation() -> anyhow::Result<()> {
        let mut registry = AnalyzerRegistry::with_builtins();
        registry.register_analyzer::<AlwaysFails>();
        let mut pipeline = Pipeline::new(registry);
        let spec = PipelineSpec::new(["AlwaysFails", "GCContent"])
            .with_config("AlwaysFails", json!({}))
            .with_config("GCContent", json!({}));
        pipeline.configure(spec, true);

        let record = SequenceRecord::fasta("s1", "GCGT")?;
        let report = pipeline.run_one(&record);
        assert_eq!(report.len(), 2);
        assert_eq!(report.failures(), 1);
        let failure = report.get("AlwaysFails").and_then(Outcome::failure).expect("failure");
        assert_eq!(failure.message, "Cannot analyze an empty sequence");
        assert_eq!(
            report.get("GCContent").and_then(Outcome::value),
            Some(&AnalysisValue::Fraction(0.75))
        );
        Ok(())
    }

    #[test]
    fn test_add_analyzer_extends_order() {
        let mut pipeline = gc_only();
        let diagnostics = pipeline.add_analyzer::<MotifSearch>(json!({"motif": "ATG"}), 1);
        assert!(diagnostics.is_empty());
        assert_eq!(pipeline.order(), ["GCContent", "MotifSearch"]);
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.spec().configs["MotifSearch"], json!({"motif": "ATG"}));
    }

    #[test]
    fn test_add_analyzer_moves_existing_and_clamps() {
        let mut pipeline = gc_only();
        pipeline.add_analyzer::<MotifSearch>(json!({"motif": "ATG"}), 0);
        assert_eq!(pipeline.order(), ["MotifSearch", "GCContent"]);

        pipeline.add_analyzer::<GcContent>(json!({}), 0);
        assert_eq!(pipeline.order(), ["GCContent", "MotifSearch"]);

        pipeline.add_analyzer::<MotifSearch>(json!({"motif": "GG"}), 99);
        assert_eq!(pipeline.order(), ["GCContent", "MotifSearch"]);
        assert_eq!(pipeline.instance_names(), vec!["GCContent", "MotifSearch"]);
    }

    #[test]
    fn test_add_analyzer_registers_unknown_variant() {
        let mut pipeline = Pipeline::new(AnalyzerRegistry::new());
        pipeline.add_analyzer::<AlwaysFails>(json!({}), 0);
        assert!(pipeline.registry().contains("AlwaysFails"));
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn test_run_many_overwrites_duplicate_headers() -> anyhow::Result<()> {
        let pipeline = gc_only();
        let records = vec![
            SequenceRecord::fasta("a", "GGGG")?,
            SequenceRecord::fasta("b", "AAAA")?,
            SequenceRecord::fasta("a", "GCAT")?,
        ];
        let batch = pipeline.run_many(&records);
        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            batch.get("a").and_then(|r| r.get("GCContent")).and_then(Outcome::value),
            Some(&AnalysisValue::Fraction(0.5))
        );
        Ok(())
    }

    #[test]
    fn test_run_stream_policies() {
        let pipeline = gc_only();
        let records = || {
            vec![
                SequenceRecord::fasta("a", "GGGG"),
                SequenceRecord::fasta("bad", ""),
                SequenceRecord::fasta("c", "AAAA"),
            ]
        };

        let err = pipeline.run_stream(records(), InputPolicy::Abort).unwrap_err();
        assert!(err.is_input());

        let batch = pipeline
            .run_stream(records(), InputPolicy::Skip)
            .expect("skip policy");
        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_spec_from_path() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{"order": ["GCContent", "MotifSearch"], "configs": {"GCContent": {}, "MotifSearch": {"motif": "ATG"}}}"#,
        )?;
        let spec = PipelineSpec::from_path(&path)?;
        assert_eq!(spec.order, vec!["GCContent", "MotifSearch"]);

        let mut pipeline = Pipeline::default();
        assert!(pipeline.configure(spec, true).is_empty());
        assert_eq!(pipeline.len(), 2);
        Ok(())
    }
}
