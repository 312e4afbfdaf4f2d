//! Claim prediction pipeline
//!
//! Validate → load rules → assemble prompt → predict → persist. Stages run
//! strictly in sequence for one request.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::model::{Claim, PredictionResult};
use crate::service::prediction::PredictionInvoker;
use crate::service::prompt::assemble;
use crate::service::results::ResultPersister;
use crate::service::rules::{RuleCatalog, project_contents};
use crate::service::validation::validate_claim;
use crate::store::ObjectStore;

pub mod error;

pub use error::PipelineError;

/// Where the prompt template lives
#[derive(Debug, Clone)]
pub struct TemplateLocation {
    pub bucket: String,
    pub key: String,
}

/// 200 body: the persisted prediction plus whether the write succeeded
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PredictionBody {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub persisted: bool,
}

/// Outcome of a request that did not fail unexpectedly
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// The claim failed shape validation
    Rejected(Vec<String>),
    Predicted(PredictionBody),
}

/// Status code and JSON body for one processed claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimResponse {
    pub status_code: u16,
    pub body: Value,
}

/// Runs one claim through validation, prediction and persistence
pub struct ClaimService {
    catalog: RuleCatalog,
    templates: Arc<dyn ObjectStore>,
    template: TemplateLocation,
    invoker: PredictionInvoker,
    persister: ResultPersister,
}

impl ClaimService {
    pub fn new(
        catalog: RuleCatalog,
        templates: Arc<dyn ObjectStore>,
        template: TemplateLocation,
        invoker: PredictionInvoker,
        persister: ResultPersister,
    ) -> Self {
        Self {
            catalog,
            templates,
            template,
            invoker,
            persister,
        }
    }

    /// Process one claim, catching every failure at this boundary
    ///
    /// 200 with the prediction, 400 with `errors`, or 500 with `error`.
    pub async fn process_claim(&self, claim: &Map<String, Value>) -> ClaimResponse {
        match self.predict_claim(claim).await {
            Ok(ClaimOutcome::Rejected(errors)) => {
                tracing::info!(error_count = errors.len(), "Claim failed validation");
                ClaimResponse {
                    status_code: 400,
                    body: serde_json::json!({ "errors": errors }),
                }
            }
            Ok(ClaimOutcome::Predicted(body)) => match serde_json::to_value(&body) {
                Ok(body) => ClaimResponse {
                    status_code: 200,
                    body,
                },
                Err(e) => internal_error(&e),
            },
            Err(e) => {
                tracing::error!(error = %e, "Error processing claim");
                internal_error(&e)
            }
        }
    }

    /// Run the pipeline, surfacing unexpected failures as errors
    pub async fn predict_claim(
        &self,
        raw_claim: &Map<String, Value>,
    ) -> Result<ClaimOutcome, PipelineError> {
        if let Some(errors) = validate_claim(raw_claim) {
            return Ok(ClaimOutcome::Rejected(errors));
        }
        let claim: Claim = serde_json::from_value(Value::Object(raw_claim.clone()))?;

        // A failed scan degrades to an empty rule set
        let rules = match self.catalog.load_all_rules().await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "Error retrieving rules from store");
                Vec::new()
            }
        };
        let rule_contents = project_contents(&rules);

        let template = self
            .templates
            .get_text(&self.template.bucket, &self.template.key)
            .await
            .map_err(PipelineError::Template)?;
        let prompt = assemble(&template, &claim, &rules, &rule_contents)?;

        tracing::debug!(
            claim_id = %claim.claim_id,
            rule_count = rules.len(),
            prompt_length = prompt.len(),
            "Assembled prediction prompt"
        );

        let verdict = self.invoker.predict(&prompt).await?;

        let result = PredictionResult {
            prediction: verdict.prediction_text(),
            rules_used: verdict.rules_used.ids(),
            claim,
        };

        let persisted = self.persister.save(&result).await.is_ok();

        tracing::info!(
            claim_id = %result.claim.claim_id,
            prediction = ?result.prediction,
            rules_used = result.rules_used.len(),
            persisted = persisted,
            "Claim prediction complete"
        );

        Ok(ClaimOutcome::Predicted(PredictionBody { result, persisted }))
    }
}

fn internal_error(e: &dyn std::error::Error) -> ClaimResponse {
    ClaimResponse {
        status_code: 500,
        body: serde_json::json!({ "error": e.to_string() }),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::service::llm::LanguageModel;
    use crate::store::{
        MemoryObjectStore, MemoryResultStore, MemoryRuleStore, ResultStore, RuleStore,
    };

    pub const BUCKET: &str = "claims";
    pub const TEMPLATE_KEY: &str = "prompt.txt";

    pub struct Fixture {
        pub rules: Arc<MemoryRuleStore>,
        pub results: Arc<MemoryResultStore>,
        pub objects: Arc<MemoryObjectStore>,
    }

    impl Fixture {
        pub async fn new(template: &str) -> Self {
            let objects = Arc::new(MemoryObjectStore::new());
            objects.put_text(BUCKET, TEMPLATE_KEY, template).await;
            Self {
                rules: Arc::new(MemoryRuleStore::new()),
                results: Arc::new(MemoryResultStore::new()),
                objects,
            }
        }

        pub fn service(&self, model: Arc<dyn LanguageModel>) -> ClaimService {
            self.service_with(model, self.rules.clone(), self.results.clone())
        }

        pub fn service_with(
            &self,
            model: Arc<dyn LanguageModel>,
            rules: Arc<dyn RuleStore>,
            results: Arc<dyn ResultStore>,
        ) -> ClaimService {
            ClaimService::new(
                RuleCatalog::new(rules),
                self.objects.clone(),
                TemplateLocation {
                    bucket: BUCKET.to_string(),
                    key: TEMPLATE_KEY.to_string(),
                },
                PredictionInvoker::new(model),
                ResultPersister::new(results),
            )
        }
    }
}
