//! Schedule configuration from YAML

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a schedule
///
/// All of these are fatal: a malformed pipeline definition cannot be
/// partially run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read schedule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse schedule YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("schedule declares no steps")]
    EmptySchedule,

    #[error("duplicate step ordinal {0}")]
    DuplicateOrdinal(u32),

    #[error("step ordinals must be declared in ascending order (found {found} after {previous})")]
    OutOfOrderOrdinal { found: u32, previous: u32 },

    #[error("unknown step kind '{0}'")]
    UnknownStepKind(String),

    #[error("step '{kind}' (ordinal {ordinal}) consumes '{target}', which is not produced by an earlier step")]
    UnknownConsumesTarget {
        kind: String,
        ordinal: u32,
        target: String,
    },

    #[error("invalid parameters for step kind '{kind}': {source}")]
    InvalidParams {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level schedule configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Schedule name
    pub name: String,

    /// Schedule version (optional)
    #[serde(default)]
    pub version: Option<String>,

    /// Ordered step specifications
    pub steps: Vec<StepConfig>,
}

/// One step specification as declared in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// 1-based execution order
    pub ordinal: u32,

    /// Name of the registered step kind to instantiate
    pub kind: String,

    /// Kind of an earlier step whose result feeds this step
    #[serde(default)]
    pub consumes: Option<String>,

    /// Kind-specific parameter mapping, deserialized by the step factory
    #[serde(default)]
    pub params: Value,
}

impl ScheduleConfig {
    /// Load a schedule from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a schedule from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ScheduleConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the declared step sequence
    ///
    /// Ordinals must be unique and ascending, and every `consumes`
    /// reference must name the kind of an earlier step. Step kinds and
    /// parameters are checked later by the registry, which owns the
    /// factory table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }

        let mut seen_ordinals = HashSet::new();
        let mut previous: Option<u32> = None;
        for step in &self.steps {
            if !seen_ordinals.insert(step.ordinal) {
                return Err(ConfigError::DuplicateOrdinal(step.ordinal));
            }
            if let Some(prev) = previous {
                if step.ordinal < prev {
                    return Err(ConfigError::OutOfOrderOrdinal {
                        found: step.ordinal,
                        previous: prev,
                    });
                }
            }
            previous = Some(step.ordinal);
        }

        // consumes may only reference kinds declared strictly earlier
        let mut earlier_kinds: HashSet<&str> = HashSet::new();
        for step in &self.steps {
            if let Some(target) = &step.consumes {
                if !earlier_kinds.contains(target.as_str()) {
                    return Err(ConfigError::UnknownConsumesTarget {
                        kind: step.kind.clone(),
                        ordinal: step.ordinal,
                        target: target.clone(),
                    });
                }
            }
            earlier_kinds.insert(step.kind.as_str());
        }

        Ok(())
    }
}
