//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::error::ApiError;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Claims Rules Engine",
        description = "Insurance claim outcome prediction against an LLM-extracted rule set"
    ),
    paths(
        crate::api::claims::predict_claim,
        crate::api::claims::get_claim_result,
        crate::api::rules::extract_rules,
        crate::api::rules::list_rules,
        crate::api::health::liveness,
        crate::api::health::readiness,
    ),
    components(schemas(
        crate::api::claims::ClaimRequest,
        crate::api::rules::ExtractRulesRequest,
        crate::api::error::ErrorResponse,
        crate::api::health::HealthStatus,
        crate::api::health::ReadinessStatus,
        crate::api::health::DependencyHealth,
        crate::model::Claim,
        crate::model::PredictionResult,
        crate::model::ClaimResultRecord,
        crate::model::Rule,
        crate::service::claims::PredictionBody,
        crate::service::rules::ExtractionReport,
    )),
    tags(
        (name = "claims", description = "Claim outcome prediction"),
        (name = "rules", description = "Rule extraction and listing"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> Result<HttpResponse, ApiError> {
    let yaml = ApiDoc::openapi()
        .to_yaml()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().content_type("text/yaml").body(yaml))
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
