use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod db;
mod model;
mod service;
mod store;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();
    tracing::info!(
        backend = ?config.storage.backend,
        bucket = %config.storage.bucket_name,
        template = %config.storage.template_key,
        "Configuration loaded"
    );

    let state = AppState::new(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize application");
        std::io::Error::other(e.to_string())
    })?;

    let claim_service = web::Data::new(state.claim_service);
    let rule_extractor = web::Data::new(state.rule_extractor);
    let rule_catalog = web::Data::new(state.rule_catalog);
    let result_persister = web::Data::new(state.result_persister);

    tracing::info!("Starting claims rules engine on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(claim_service.clone())
            .app_data(rule_extractor.clone())
            .app_data(rule_catalog.clone())
            .app_data(result_persister.clone())
            .configure(api::claims::configure)
            .configure(api::rules::configure)
            .configure(api::health::configure)
            .configure(api::openapi::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
