//! Rule extraction and retrieval
//!
//! Extraction runs offline against policy documents and populates the rule
//! store; the catalog reads the stored rules back for prompt assembly.

mod catalog;
mod document;
pub mod error;
mod extractor;
pub mod prompts;

pub use catalog::{RuleCatalog, project_contents};
pub use error::RuleExtractionError;
pub use extractor::{ExtractionReport, RuleExtractor};
