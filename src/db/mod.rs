//! Database module for PostgreSQL persistence

pub mod models;
pub mod repository;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::env;

// Environment variable names
const ENV_POSTGRES_HOST: &str = "CLAIMS_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "CLAIMS_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "CLAIMS_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "CLAIMS_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "CLAIMS_POSTGRES_DB";

// Default values
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "claims";
const DEFAULT_POSTGRES_PASSWORD: &str = "claims";
const DEFAULT_POSTGRES_DB: &str = "claims";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

/// Initialize database schema
///
/// Table and key names must already be validated identifiers.
pub async fn init_schema(
    pool: &PgPool,
    rules_table: &str,
    results_table: &str,
    results_key: &str,
) -> Result<(), DbError> {
    // Rule content and document name are nullable: the scan tolerates partial rows
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {rules_table} (
            rule_number VARCHAR(64) PRIMARY KEY,
            rule_content TEXT,
            section TEXT,
            subsection TEXT,
            document_name TEXT,
            update_datetime TIMESTAMPTZ
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {results_table} (
            {results_key} VARCHAR(255) PRIMARY KEY,
            item JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#
    ))
    .execute(pool)
    .await?;

    tracing::info!(
        rules_table = %rules_table,
        results_table = %results_table,
        "Database schema initialized"
    );

    Ok(())
}
