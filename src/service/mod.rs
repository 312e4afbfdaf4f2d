pub mod claims;
pub mod llm;
pub mod prediction;
pub mod prompt;
pub mod repair;
pub mod results;
pub mod rules;
pub mod validation;

pub use claims::{ClaimService, TemplateLocation};
pub use llm::{LanguageModel, LlmClient};
pub use prediction::PredictionInvoker;
pub use results::ResultPersister;
pub use rules::{RuleCatalog, RuleExtractor};
