pub mod claim;
pub mod config;
pub mod rule;

pub use claim::{CLAIM_FIELDS, Claim, ClaimResultRecord, PredictionResult};
pub use config::{Config, ModelConfig, StorageBackend, StorageConfig};
pub use rule::{Rule, RuleTree};
