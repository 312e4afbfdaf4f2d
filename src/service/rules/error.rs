//! Error types for rule extraction

use thiserror::Error;

use crate::service::llm::ModelError;
use crate::store::StoreError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuleExtractionError {
    #[error("LLM extraction failed: {0}")]
    Model(#[from] ModelError),

    #[error("Failed to read source document: {0}")]
    Document(#[source] StoreError),

    #[error("Source document {document_name} has no readable text: {reason}")]
    UnreadableDocument {
        document_name: String,
        reason: String,
    },
}
