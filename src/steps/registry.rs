//! Step registry - string-keyed factory table for step kinds

use crate::core::{ConfigError, ScheduleConfig, StepConfig};
use crate::steps::{AnnotateStep, CrawlStep, IndexRefreshStep, Services, Step, WordCloudStep};
use std::collections::HashMap;

/// Factory that builds a step instance from its spec and shared services
pub type StepFactory =
    Box<dyn Fn(&StepConfig, &Services) -> Result<Box<dyn Step>, ConfigError> + Send + Sync>;

/// Registration table mapping step-kind names to factories
///
/// Factories are registered once at process initialization; the loader
/// looks them up by key and fails with a typed error for unknown kinds.
pub struct StepRegistry {
    factories: HashMap<String, StepFactory>,
}

impl StepRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry seeded with the built-in step kinds
    pub fn with_builtin_steps() -> Self {
        let mut registry = Self::new();
        registry.register("crawl", |config, services| {
            Ok(Box::new(CrawlStep::from_config(config, services)?))
        });
        registry.register("index-refresh", |config, services| {
            Ok(Box::new(IndexRefreshStep::from_config(config, services)?))
        });
        registry.register("word-cloud", |config, services| {
            Ok(Box::new(WordCloudStep::from_config(config, services)?))
        });
        registry.register("annotate", |config, services| {
            Ok(Box::new(AnnotateStep::from_config(config, services)?))
        });
        registry
    }

    /// Register a factory under a kind name, replacing any existing one
    pub fn register<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&StepConfig, &Services) -> Result<Box<dyn Step>, ConfigError> + Send + Sync + 'static,
    {
        self.factories.insert(kind.to_string(), Box::new(factory));
    }

    /// Whether a kind is registered
    pub fn knows(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Instantiate every declared step in ordinal order
    ///
    /// Fails fast on the first unresolvable kind or invalid parameter set;
    /// no step objects of a malformed schedule survive.
    pub fn load_steps(
        &self,
        config: &ScheduleConfig,
        services: &Services,
    ) -> Result<Vec<(u32, Box<dyn Step>)>, ConfigError> {
        let mut steps = Vec::with_capacity(config.steps.len());
        for spec in &config.steps {
            let factory = self
                .factories
                .get(&spec.kind)
                .ok_or_else(|| ConfigError::UnknownStepKind(spec.kind.clone()))?;
            let step = factory(spec, services)?;
            steps.push((spec.ordinal, step));
        }
        Ok(steps)
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::with_builtin_steps()
    }
}

/// Deserialize a step's parameter mapping into its typed param struct
pub(crate) fn parse_params<T: serde::de::DeserializeOwned>(
    config: &StepConfig,
) -> Result<T, ConfigError> {
    serde_yaml::from_value(config.params.clone()).map_err(|source| ConfigError::InvalidParams {
        kind: config.kind.clone(),
        source,
    })
}
