use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_ssm::Client as SsmClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Parameter not found: {name}")]
    ParameterNotFound { name: String },

    #[error("AWS SDK error: {source}")]
    AwsSdk {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Environment variable missing: {name}")]
    MissingEnvironmentVariable { name: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_members_table")]
    pub members_table: String,
    #[serde(default = "default_credentials_table")]
    pub credentials_table: String,
    #[serde(default = "default_addresses_table")]
    pub addresses_table: String,
    #[serde(default = "default_policies_table")]
    pub policies_table: String,
    #[serde(default = "default_agreements_table")]
    pub agreements_table: String,
    #[serde(default = "default_budgets_table")]
    pub budgets_table: String,
    #[serde(default = "default_carts_table")]
    pub carts_table: String,
    #[serde(default = "default_expenditures_table")]
    pub expenditures_table: String,
    #[serde(default = "default_foods_table")]
    pub foods_table: String,
    #[serde(default = "default_stores_table")]
    pub stores_table: String,
    #[serde(default = "default_region")]
    pub region: String,
}

/// Token issuing settings. The signing secret can come from the
/// environment directly or be resolved from a Parameter Store
/// parameter at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default)]
    pub jwt_secret_parameter: Option<String>,
    #[serde(default = "default_jwt_ttl_ms")]
    pub jwt_ttl_ms: i64,
}

impl AuthConfig {
    pub fn token_ttl_seconds(&self) -> i64 {
        self.jwt_ttl_ms / 1000
    }
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
    pub ssm_client: SsmClient,
    pub parameter_store: Arc<ParameterStoreConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_otlp_endpoint_option")]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_enable_json_logging")]
    pub enable_json_logging: bool,
}

pub struct ParameterStoreConfig {
    ssm_client: SsmClient,
    cache: Arc<RwLock<HashMap<String, (String, Instant)>>>,
    cache_ttl: Duration,
}

impl std::fmt::Debug for ParameterStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStoreConfig")
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_size", &"<runtime>")
            .finish()
    }
}

impl Config {
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment and AWS Parameter Store");

        let server = ServerConfig::from_env()?;
        let database = DatabaseConfig::from_env()?;
        let mut auth = AuthConfig::from_env()?;
        let observability = ObservabilityConfig::from_env()?;

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()))
            .load()
            .await;

        let dynamodb_client = DynamoDbClient::new(&aws_config);
        let ssm_client = SsmClient::new(&aws_config);

        let parameter_store = Arc::new(ParameterStoreConfig::new(
            ssm_client.clone(),
            Duration::from_secs(5 * 60),
        ));

        // A Parameter Store reference takes precedence over the inline secret
        if let Some(parameter_name) = &auth.jwt_secret_parameter {
            auth.jwt_secret = parameter_store.get_parameter(parameter_name).await?;
        }

        let aws = AwsConfig {
            region: database.region.clone(),
            dynamodb_client,
            ssm_client,
            parameter_store,
        };

        let config = Config {
            server,
            database,
            auth,
            aws,
            observability,
        };

        config.validate().await?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    async fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating configuration");

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }

        let table_names = [
            ("members", &self.database.members_table),
            ("credentials", &self.database.credentials_table),
            ("addresses", &self.database.addresses_table),
            ("policies", &self.database.policies_table),
            ("agreements", &self.database.agreements_table),
            ("budgets", &self.database.budgets_table),
            ("carts", &self.database.carts_table),
            ("expenditures", &self.database.expenditures_table),
            ("foods", &self.database.foods_table),
            ("stores", &self.database.stores_table),
        ];
        for (label, name) in table_names {
            if name.is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("{} table name cannot be empty", label),
                });
            }
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "JWT secret cannot be empty".to_string(),
            });
        }

        if self.auth.jwt_ttl_ms <= 0 {
            return Err(ConfigError::ValidationError {
                message: "JWT TTL must be positive".to_string(),
            });
        }

        // Test AWS connectivity
        match self.aws.ssm_client.describe_parameters().send().await {
            Ok(_) => {
                info!("AWS SSM connectivity validated");
            }
            Err(e) => {
                warn!("AWS SSM connectivity test failed: {}", e);
                // Don't fail validation for connectivity issues in development
            }
        }

        info!("Configuration validation completed");
        Ok(())
    }
}

fn from_env_with_prefix<T: serde::de::DeserializeOwned>(section: &str) -> Result<T, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix("MEALTABLE"))
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        from_env_with_prefix("server")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        from_env_with_prefix("database")
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        from_env_with_prefix("auth")
    }
}

impl ObservabilityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        from_env_with_prefix("observability")
    }
}

impl ParameterStoreConfig {
    pub fn new(ssm_client: SsmClient, cache_ttl: Duration) -> Self {
        Self {
            ssm_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl,
        }
    }

    pub async fn get_parameter(&self, name: &str) -> Result<String, ConfigError> {
        debug!("Getting parameter: {}", name);

        {
            let cache = self.cache.read().await;
            if let Some((value, timestamp)) = cache.get(name) {
                if timestamp.elapsed() < self.cache_ttl {
                    debug!("Parameter found in cache: {}", name);
                    return Ok(value.clone());
                } else {
                    debug!("Parameter cache expired: {}", name);
                }
            }
        }

        debug!("Fetching parameter from AWS SSM: {}", name);
        let result = self
            .ssm_client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| ConfigError::AwsSdk {
                source: Box::new(e),
            })?;

        let value = result
            .parameter()
            .and_then(|p| p.value())
            .ok_or_else(|| ConfigError::ParameterNotFound {
                name: name.to_string(),
            })?
            .to_string();

        {
            let mut cache = self.cache.write().await;
            cache.insert(name.to_string(), (value.clone(), Instant::now()));
        }

        debug!("Parameter retrieved and cached: {}", name);
        Ok(value)
    }

    pub async fn get_parameter_with_default(&self, name: &str, default: &str) -> String {
        match self.get_parameter(name).await {
            Ok(value) => value,
            Err(e) => {
                debug!("Failed to get parameter {}, using default: {}", name, e);
                default.to_string()
            }
        }
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        info!("Parameter store cache cleared");
    }

    pub async fn cache_size(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_members_table() -> String {
    "MealTableMembers".to_string()
}

pub(crate) fn default_credentials_table() -> String {
    "MealTableCredentials".to_string()
}

pub(crate) fn default_addresses_table() -> String {
    "MealTableAddresses".to_string()
}

pub(crate) fn default_policies_table() -> String {
    "MealTablePolicies".to_string()
}

pub(crate) fn default_agreements_table() -> String {
    "MealTableAgreements".to_string()
}

pub(crate) fn default_budgets_table() -> String {
    "MealTableBudgets".to_string()
}

pub(crate) fn default_carts_table() -> String {
    "MealTableCarts".to_string()
}

pub(crate) fn default_expenditures_table() -> String {
    "MealTableExpenditures".to_string()
}

pub(crate) fn default_foods_table() -> String {
    "MealTableFoods".to_string()
}

pub(crate) fn default_stores_table() -> String {
    "MealTableStores".to_string()
}

pub(crate) fn default_region() -> String {
    "ap-northeast-2".to_string()
}

pub(crate) fn default_jwt_secret() -> String {
    std::env::var("MEALTABLE_JWT_SECRET").unwrap_or_else(|_| "local-development-secret".to_string())
}

pub(crate) fn default_jwt_ttl_ms() -> i64 {
    3_600_000
}

pub(crate) fn default_service_name() -> String {
    "mealtable-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_otlp_endpoint_option() -> Option<String> {
    std::env::var("MEALTABLE_OTLP_ENDPOINT").ok()
}

pub(crate) fn default_enable_json_logging() -> bool {
    std::env::var("MEALTABLE_ENABLE_JSON_LOGGING")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

pub(crate) fn default_metrics_port() -> u16 {
    9090
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
