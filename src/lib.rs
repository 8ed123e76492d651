//! opengov-pipeline - sequential pipeline runner for consultation processing

pub mod cli;
pub mod core;
pub mod engine;
pub mod steps;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, RecordSet, ResultStore, RunContext, RunRecord, RunStatus, ScheduleConfig,
    StepConfig,
};
pub use crate::engine::{EngineError, PipelineEngine};
pub use crate::steps::{Services, Step, StepError, StepRegistry};
pub use crate::store::{StateStore, StoreError};
