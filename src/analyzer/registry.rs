use std::{collections::BTreeMap, fmt};

use serde_json::Value;

use super::{gc_content, kmer_spectrum, motif, Analyzer, Registered};
use crate::Result;

/// Builds a boxed analyzer from its JSON configuration
pub type Constructor = fn(&Value) -> Result<Box<dyn Analyzer>>;

/// Lookup table from analyzer name to constructor
///
/// The registry carries no variant-specific code: every variant adds itself through the
/// `register` function defined next to it.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    constructors: BTreeMap<String, Constructor>,
}
impl AnalyzerRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every analyzer shipped with this crate
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        gc_content::register(&mut registry);
        motif::register(&mut registry);
        kmer_spectrum::register(&mut registry);
        registry
    }

    /// Adds `constructor` under `name`, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        let name = name.into();
        if self.constructors.insert(name.clone(), constructor).is_some() {
            log::debug!("Replaced registered analyzer {name}");
        }
    }

    /// Adds a [`Registered`] analyzer under its own name
    pub fn register_analyzer<A: Registered>(&mut self) {
        self.register(A::NAME, construct::<A>);
    }

    /// Looks up the constructor for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Constructor> {
        self.constructors.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// All registered names, in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
impl fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

fn construct<A: Registered>(config: &Value) -> Result<Box<dyn Analyzer>> {
    Ok(Box::new(A::from_config(config)?))
}
