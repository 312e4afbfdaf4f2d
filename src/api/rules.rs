//! REST API endpoints for rule extraction and listing

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::model::Rule;
use crate::service::rules::ExtractionReport;
use crate::service::{RuleCatalog, RuleExtractor};

/// Rule extraction request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtractRulesRequest {
    /// Source document name; also the object key when `text` is omitted
    pub document_name: String,
    /// Document text supplied inline instead of read from the object store
    pub text: Option<String>,
}

/// Extract rules from a policy document and store them
#[utoipa::path(
    post,
    path = "/v1/rules/extract",
    request_body = ExtractRulesRequest,
    responses(
        (status = 200, description = "Extraction finished", body = ExtractionReport),
        (status = 400, description = "Invalid request", body = crate::api::error::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::api::error::ErrorResponse),
        (status = 502, description = "Model invocation failed", body = crate::api::error::ErrorResponse)
    ),
    tag = "rules"
)]
#[post("/v1/rules/extract")]
pub async fn extract_rules(
    extractor: web::Data<RuleExtractor>,
    request: web::Json<ExtractRulesRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    if request.document_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "document_name must not be empty".to_string(),
        ));
    }

    let report = match request.text {
        Some(text) => {
            extractor
                .extract_and_store(&request.document_name, &text)
                .await?
        }
        None => {
            extractor
                .extract_stored_document(&request.document_name)
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(report))
}

/// List every stored rule
#[utoipa::path(
    get,
    path = "/v1/rules",
    responses(
        (status = 200, description = "Stored rules", body = Vec<Rule>),
        (status = 500, description = "Rule store unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "rules"
)]
#[get("/v1/rules")]
pub async fn list_rules(catalog: web::Data<RuleCatalog>) -> Result<HttpResponse, ApiError> {
    let rules = catalog.load_all_rules().await?;
    Ok(HttpResponse::Ok().json(rules))
}

/// Configure rule routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(extract_rules).service(list_rules);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::service::llm::testing::ScriptedModel;
    use crate::store::{MemoryObjectStore, MemoryRuleStore, RuleStore};

    const TREE: &str = r#"{"sections": [{"title": "Fraud", "subsections": [
        {"title": "Evidence", "guidelines": [{"rule": "Deny if fraud is proven"}, {"rule": "Escalate disputes"}]}
    ]}]}"#;

    async fn app_parts(reply: &str) -> (Arc<MemoryRuleStore>, RuleExtractor, RuleCatalog) {
        let rules = Arc::new(MemoryRuleStore::new());
        let documents = Arc::new(MemoryObjectStore::new());
        documents
            .put_text("claims", "policy.txt", "Policy text")
            .await;
        let extractor = RuleExtractor::new(
            Arc::new(ScriptedModel::replying(reply)),
            rules.clone(),
            documents,
            "claims",
        );
        (rules.clone(), extractor, RuleCatalog::new(rules))
    }

    #[actix_web::test]
    async fn test_extract_stored_document_then_list() {
        let (_rules, extractor, catalog) = app_parts(TREE).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(extractor))
                .app_data(web::Data::new(catalog))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/v1/rules/extract")
            .set_json(json!({ "document_name": "policy.txt" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let report: Value = test::read_body_json(resp).await;
        assert_eq!(report["tree_status"], "parsed");
        assert_eq!(report["rules_extracted"], 2);
        assert_eq!(report["rules_written"], 2);
        assert_eq!(report["write_error"], Value::Null);

        let req = test::TestRequest::get().uri("/v1/rules").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rules: Value = test::read_body_json(resp).await;
        let rules = rules.as_array().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["id"], "1");
        assert_eq!(rules[0]["content"], "Deny if fraud is proven");
        assert_eq!(rules[0]["DocumentName"], "policy.txt");
    }

    #[actix_web::test]
    async fn test_inline_text_with_malformed_reply_stores_nothing() {
        let (rules, extractor, _catalog) = app_parts("not a rule tree").await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(extractor)).configure(configure))
                .await;

        let req = test::TestRequest::post()
            .uri("/v1/rules/extract")
            .set_json(json!({ "document_name": "inline.pdf", "text": "Some policy" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let report: Value = test::read_body_json(resp).await;
        assert_eq!(report["tree_status"], "malformed");
        assert_eq!(report["rules_extracted"], 0);
        assert!(rules.scan().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_missing_document_is_404() {
        let (_rules, extractor, _catalog) = app_parts(TREE).await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(extractor)).configure(configure))
                .await;

        let req = test::TestRequest::post()
            .uri("/v1/rules/extract")
            .set_json(json!({ "document_name": "absent.txt" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_blank_document_name_is_400() {
        let (_rules, extractor, _catalog) = app_parts(TREE).await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(extractor)).configure(configure))
                .await;

        let req = test::TestRequest::post()
            .uri("/v1/rules/extract")
            .set_json(json!({ "document_name": "  ", "text": "x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
