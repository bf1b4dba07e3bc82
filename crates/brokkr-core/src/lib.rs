//! # brokkr-core
//!
//! Core library for the brokkr CLI providing:
//! - Configuration loading (config.yaml in the platform config dir)
//! - Shared project types
//! - Progress tracking for long-running operations
//! - The hierarchical task pipeline engine

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod types;

pub use config::BrokkrConfig;
pub use error::{Error, Result};
pub use pipeline::{
    NullObserver, Pipeline, PipelineError, PipelineObserver, ProgressSink, Task, TaskContext,
    TaskNode, TaskOutcome, TaskReport, TaskStatus,
};
pub use progress::ProgressTracker;
pub use types::{ProjectDefinition, TemplateReference};
