use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const ENV_MODEL_SERVICE: &str = "CLAIMS_MODEL_SERVICE";
const ENV_MODEL_REGION: &str = "CLAIMS_MODEL_REGION";
const ENV_MODEL_ID: &str = "CLAIMS_MODEL_ID";
const ENV_MODEL_API_VERSION: &str = "CLAIMS_MODEL_API_VERSION";
const ENV_MODEL_MAX_TOKENS: &str = "CLAIMS_MODEL_MAX_TOKENS";
const ENV_MODEL_ENDPOINT: &str = "CLAIMS_MODEL_ENDPOINT";
const ENV_MODEL_API_KEY: &str = "CLAIMS_MODEL_API_KEY";
const ENV_MODEL_TIMEOUT_SECS: &str = "CLAIMS_MODEL_TIMEOUT_SECS";
const ENV_RULES_TABLE: &str = "CLAIMS_RULES_TABLE";
const ENV_RESULTS_TABLE: &str = "CLAIMS_RESULTS_TABLE";
const ENV_RESULTS_KEY: &str = "CLAIMS_RESULTS_KEY";
const ENV_BUCKET_NAME: &str = "CLAIMS_BUCKET_NAME";
const ENV_TEMPLATE_KEY: &str = "CLAIMS_TEMPLATE_KEY";
const ENV_OBJECT_STORE_ROOT: &str = "CLAIMS_OBJECT_STORE_ROOT";
const ENV_STORAGE_BACKEND: &str = "CLAIMS_STORAGE_BACKEND";

const DEFAULT_MODEL_SERVICE: &str = "bedrock-runtime";
const DEFAULT_MODEL_REGION: &str = "us-east-1";
const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
const DEFAULT_MODEL_API_VERSION: &str = "bedrock-2023-05-31";
const DEFAULT_MODEL_MAX_TOKENS: u32 = 4096;
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RULES_TABLE: &str = "rules";
const DEFAULT_RESULTS_TABLE: &str = "claim_results";
const DEFAULT_RESULTS_KEY: &str = "claim_id";
const DEFAULT_BUCKET_NAME: &str = "claims";
const DEFAULT_TEMPLATE_KEY: &str = "prediction_prompt.txt";
const DEFAULT_OBJECT_STORE_ROOT: &str = "./objects";

/// Language model invocation settings
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Service endpoint selector, e.g. `bedrock-runtime`
    pub service: String,
    pub region: String,
    pub model_id: String,
    pub api_version: String,
    pub max_tokens: u32,
    /// Explicit base URL; when unset it is derived from service and region
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ModelConfig {
    /// Base URL of the model endpoint
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}.amazonaws.com", self.service, self.region),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_MODEL_SERVICE.to_string(),
            region: DEFAULT_MODEL_REGION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_version: DEFAULT_MODEL_API_VERSION.to_string(),
            max_tokens: DEFAULT_MODEL_MAX_TOKENS,
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

/// Tables, bucket and template location
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub rules_table: String,
    pub results_table: String,
    pub results_key: String,
    pub bucket_name: String,
    pub template_key: String,
    pub object_store_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            rules_table: DEFAULT_RULES_TABLE.to_string(),
            results_table: DEFAULT_RESULTS_TABLE.to_string(),
            results_key: DEFAULT_RESULTS_KEY.to_string(),
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
            template_key: DEFAULT_TEMPLATE_KEY.to_string(),
            object_store_root: PathBuf::from(DEFAULT_OBJECT_STORE_ROOT),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            storage: StorageConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let model = ModelConfig {
            service: env_or(ENV_MODEL_SERVICE, DEFAULT_MODEL_SERVICE),
            region: env_or(ENV_MODEL_REGION, DEFAULT_MODEL_REGION),
            model_id: env_or(ENV_MODEL_ID, DEFAULT_MODEL_ID),
            api_version: env_or(ENV_MODEL_API_VERSION, DEFAULT_MODEL_API_VERSION),
            max_tokens: env::var(ENV_MODEL_MAX_TOKENS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MODEL_MAX_TOKENS),
            endpoint: env::var(ENV_MODEL_ENDPOINT).ok().filter(|v| !v.is_empty()),
            api_key: env::var(ENV_MODEL_API_KEY).ok().filter(|v| !v.is_empty()),
            timeout: Duration::from_secs(
                env::var(ENV_MODEL_TIMEOUT_SECS)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
            ),
        };

        let backend = match env::var(ENV_STORAGE_BACKEND) {
            Ok(value) => value.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Invalid storage backend, using postgres");
                StorageBackend::Postgres
            }),
            Err(_) => StorageBackend::Postgres,
        };

        let storage = StorageConfig {
            backend,
            rules_table: env_or(ENV_RULES_TABLE, DEFAULT_RULES_TABLE),
            results_table: env_or(ENV_RESULTS_TABLE, DEFAULT_RESULTS_TABLE),
            results_key: env_or(ENV_RESULTS_KEY, DEFAULT_RESULTS_KEY),
            bucket_name: env_or(ENV_BUCKET_NAME, DEFAULT_BUCKET_NAME),
            template_key: env_or(ENV_TEMPLATE_KEY, DEFAULT_TEMPLATE_KEY),
            object_store_root: PathBuf::from(env_or(
                ENV_OBJECT_STORE_ROOT,
                DEFAULT_OBJECT_STORE_ROOT,
            )),
        };

        Self {
            model,
            storage,
            port,
            host,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Whether `name` can be spliced into SQL as a bare identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
