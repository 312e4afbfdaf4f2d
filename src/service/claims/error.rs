//! Error types for claim prediction

use thiserror::Error;

use crate::service::llm::ModelError;
use crate::service::prompt::PromptError;
use crate::store::StoreError;

/// Failures that abort a prediction request
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error("Failed to read prompt template: {0}")]
    Template(#[source] StoreError),

    #[error("Failed to assemble prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error("Model invocation failed: {0}")]
    Model(#[from] ModelError),

    #[error("Claim could not be decoded: {0}")]
    Claim(#[from] serde_json::Error),
}
