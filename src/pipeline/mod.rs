//! Configuration and execution of a full connectivity analysis.

mod config;
mod runner;

pub use config::PipelineConfig;
pub use runner::{Pipeline, RunOutput, Stage};
