//! Health check endpoints for Kubernetes liveness and readiness probes

use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::RuleCatalog;

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessStatus {
    pub status: String,
    pub version: String,
    pub dependencies: DependencyHealth,
}

#[derive(Serialize, ToSchema)]
pub struct DependencyHealth {
    pub rule_store: String,
}

/// Liveness probe endpoint
///
/// Always returns 200 OK if the service is running.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive", body = HealthStatus)
    ),
    tag = "health"
)]
#[get("/health/live")]
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe endpoint
///
/// Returns 200 OK once the rule store answers a ping.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessStatus),
        (status = 503, description = "Service is not ready", body = ReadinessStatus)
    ),
    tag = "health"
)]
#[get("/health/ready")]
pub async fn readiness(catalog: web::Data<RuleCatalog>) -> impl Responder {
    let rule_store_status = match catalog.ping().await {
        Ok(()) => {
            tracing::debug!("Rule store health check passed");
            "healthy"
        }
        Err(e) => {
            tracing::error!(error = %e, "Rule store health check failed");
            "unhealthy"
        }
    };

    let ready = rule_store_status == "healthy";

    let status = ReadinessStatus {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dependencies: DependencyHealth {
            rule_store: rule_store_status.to_string(),
        },
    };

    if ready {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}

/// Configure health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(liveness).service(readiness);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;

    use super::*;
    use crate::model::Rule;
    use crate::store::{RuleRecord, RuleStore, StoreError};

    /// Fails pings; scans panic so readiness must never fall back to one
    struct UnreachableRules;

    #[async_trait]
    impl RuleStore for UnreachableRules {
        async fn put_rule(&self, _rule: &Rule) -> Result<(), StoreError> {
            Err(StoreError::Serialization("unreachable".into()))
        }

        async fn scan(&self) -> Result<Vec<RuleRecord>, StoreError> {
            panic!("readiness must not scan the rule table")
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Serialization("unreachable".into()))
        }
    }

    /// Answers pings; scans panic
    struct PingOnlyRules;

    #[async_trait]
    impl RuleStore for PingOnlyRules {
        async fn put_rule(&self, _rule: &Rule) -> Result<(), StoreError> {
            Ok(())
        }

        async fn scan(&self) -> Result<Vec<RuleRecord>, StoreError> {
            panic!("readiness must not scan the rule table")
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[actix_web::test]
    async fn test_liveness() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/health/live").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_readiness_follows_rule_store() {
        let healthy = RuleCatalog::new(Arc::new(PingOnlyRules));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(healthy))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/health/ready").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let broken = RuleCatalog::new(Arc::new(UnreachableRules));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(broken))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/health/ready").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
