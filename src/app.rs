//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;

use crate::db::repository::{ClaimResultRepository, RuleRepository};
use crate::model::config::is_valid_identifier;
use crate::model::{Config, StorageBackend, StorageConfig};
use crate::service::{
    ClaimService, LanguageModel, LlmClient, PredictionInvoker, ResultPersister, RuleCatalog,
    RuleExtractor, TemplateLocation,
};
use crate::store::{
    FsObjectStore, MemoryResultStore, MemoryRuleStore, ObjectStore, ResultStore, RuleStore,
};

/// Application state containing all services and shared resources
pub struct AppState {
    /// Claim prediction pipeline
    pub claim_service: ClaimService,
    /// Rule extraction from policy documents
    pub rule_extractor: RuleExtractor,
    /// Read access to stored rules
    pub rule_catalog: RuleCatalog,
    /// Read access to stored predictions
    pub result_persister: ResultPersister,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Store initialization for the configured backend
    /// 2. Model client initialization
    /// 3. Service dependency graph construction
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let (rules, results) = Self::build_stores(&config.storage).await?;

        let objects: Arc<dyn ObjectStore> =
            Arc::new(FsObjectStore::new(config.storage.object_store_root.clone()));

        let llm_client = LlmClient::new(config.model).map_err(AppError::InvalidConfig)?;
        tracing::info!(model = %llm_client.model_id(), "Model client initialized");
        let model: Arc<dyn LanguageModel> = Arc::new(llm_client);

        let rule_catalog = RuleCatalog::new(Arc::clone(&rules));
        let result_persister = ResultPersister::new(results);

        let claim_service = ClaimService::new(
            rule_catalog.clone(),
            Arc::clone(&objects),
            TemplateLocation {
                bucket: config.storage.bucket_name.clone(),
                key: config.storage.template_key.clone(),
            },
            PredictionInvoker::new(Arc::clone(&model)),
            result_persister.clone(),
        );

        let rule_extractor =
            RuleExtractor::new(model, rules, objects, config.storage.bucket_name);

        Ok(Self {
            claim_service,
            rule_extractor,
            rule_catalog,
            result_persister,
        })
    }

    /// Build rule and result stores for the configured backend
    async fn build_stores(
        storage: &StorageConfig,
    ) -> Result<(Arc<dyn RuleStore>, Arc<dyn ResultStore>), AppError> {
        match storage.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; rules and results are not persisted");
                Ok((
                    Arc::new(MemoryRuleStore::new()),
                    Arc::new(MemoryResultStore::new()),
                ))
            }
            StorageBackend::Postgres => {
                for name in [
                    &storage.rules_table,
                    &storage.results_table,
                    &storage.results_key,
                ] {
                    if !is_valid_identifier(name) {
                        return Err(AppError::InvalidConfig(format!(
                            "'{}' is not a valid table or column name",
                            name
                        )));
                    }
                }

                let db_pool = crate::db::create_pool()
                    .await
                    .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

                crate::db::init_schema(
                    &db_pool,
                    &storage.rules_table,
                    &storage.results_table,
                    &storage.results_key,
                )
                .await
                .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

                Ok((
                    Arc::new(RuleRepository::new(
                        db_pool.clone(),
                        storage.rules_table.clone(),
                    )),
                    Arc::new(ClaimResultRepository::new(
                        db_pool,
                        storage.results_table.clone(),
                        storage.results_key.clone(),
                    )),
                ))
            }
        }
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
