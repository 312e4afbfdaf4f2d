//! REST API endpoints for claim predictions

use actix_web::{HttpResponse, get, http::StatusCode, post, web};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::model::ClaimResultRecord;
use crate::service::{ClaimService, ResultPersister};

/// Prediction request envelope
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// Flat claim object with the 22 string fields
    #[serde(rename = "Claim")]
    #[schema(value_type = Object)]
    pub claim: Option<Value>,
}

/// Predict the outcome of a claim
///
/// The HTTP status mirrors the pipeline status code: 200 with the prediction,
/// 400 with a list of validation errors, or 500 with an error message.
#[utoipa::path(
    post,
    path = "/v1/claims",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Prediction produced", body = crate::service::claims::PredictionBody),
        (status = 400, description = "Claim failed validation"),
        (status = 500, description = "Prediction pipeline failed")
    ),
    tag = "claims"
)]
#[post("/v1/claims")]
pub async fn predict_claim(
    service: web::Data<ClaimService>,
    request: web::Json<ClaimRequest>,
) -> Result<HttpResponse, ApiError> {
    let claim = request
        .claim
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(|| ApiError::BadRequest("Invalid payload".to_string()))?;

    let response = service.process_claim(claim).await;
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Ok(HttpResponse::build(status).json(response.body))
}

/// Get the stored prediction for a claim
#[utoipa::path(
    get,
    path = "/v1/claims/{claim_id}/result",
    params(
        ("claim_id" = String, Path, description = "Claim identifier")
    ),
    responses(
        (status = 200, description = "Stored prediction", body = ClaimResultRecord),
        (status = 404, description = "No prediction stored for this claim", body = crate::api::error::ErrorResponse),
        (status = 500, description = "Result store unavailable", body = crate::api::error::ErrorResponse)
    ),
    tag = "claims"
)]
#[get("/v1/claims/{claim_id}/result")]
pub async fn get_claim_result(
    persister: web::Data<ResultPersister>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claim_id = path.into_inner();

    match persister.get(&claim_id).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(ApiError::NotFound(format!("claim result {}", claim_id))),
    }
}

/// Configure claim routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(predict_claim).service(get_claim_result);
}
