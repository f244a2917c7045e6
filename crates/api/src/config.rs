use domain::models::{
    CheckoutEnvironment, PlanTable, SubscriptionTier, DEFAULT_TTL_DAYS, MAX_TTL_DAYS,
};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// JWT authentication configuration
    pub jwt: JwtAuthConfig,
    #[serde(default)]
    pub invitations: InvitationConfig,
    pub checkout: CheckoutSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Upper bound for a single store query before it counts as unavailable.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// RSA private key in PEM format for signing tokens
    pub private_key: String,

    /// RSA public key in PEM format for verifying tokens
    pub public_key: String,

    /// Access token expiration in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,

    /// Leeway in seconds for clock skew tolerance (default: 30)
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationConfig {
    /// Days a pending invitation stays valid.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: i64,

    /// Seconds between expiry sweeps. 0 disables the sweep.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Maximum invitations expired per sweep.
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: i64,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            sweep_interval_secs: default_sweep_interval(),
            sweep_batch_size: default_sweep_batch_size(),
        }
    }
}

impl InvitationConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.ttl_days)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSettings {
    /// Checkout provider environment: sandbox or production
    #[serde(default = "default_checkout_environment")]
    pub environment: String,

    pub plans: PlanTable,
}

impl CheckoutSettings {
    /// Parsed provider environment. Only valid after [`Config::validate`].
    pub fn environment(&self) -> CheckoutEnvironment {
        match self.environment.as_str() {
            "production" => CheckoutEnvironment::Production,
            _ => CheckoutEnvironment::Sandbox,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_query_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_access_token_expiry() -> i64 {
    3600 // 1 hour
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_ttl_days() -> i64 {
    DEFAULT_TTL_DAYS
}
fn default_sweep_interval() -> u64 {
    300
}
fn default_sweep_batch_size() -> i64 {
    500
}
fn default_checkout_environment() -> String {
    "sandbox".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with CA__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("CA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600
            query_timeout_ms = 5000

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []

            [jwt]
            private_key = "test-private-key"
            public_key = "test-public-key"
            access_token_expiry_secs = 3600
            leeway_secs = 30

            [invitations]
            ttl_days = 7
            sweep_interval_secs = 300
            sweep_batch_size = 500

            [checkout]
            environment = "sandbox"

            [checkout.plans.starter]
            name = "Starter"
            price_id = "pri_starter"
            price = 2900
            trial_days = 14

            [checkout.plans.professional]
            name = "Professional"
            price_id = "pri_professional"
            price = 7900
            trial_days = 14

            [checkout.plans.enterprise]
            name = "Enterprise"
            price_id = "pri_enterprise"
            price = 19900
            trial_days = 30
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "CA__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if !(1..=MAX_TTL_DAYS).contains(&self.invitations.ttl_days) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "invitations.ttl_days must be between 1 and {}, got {}",
                MAX_TTL_DAYS, self.invitations.ttl_days
            )));
        }

        if self.invitations.sweep_batch_size < 1 {
            return Err(ConfigValidationError::InvalidValue(
                "invitations.sweep_batch_size must be at least 1".to_string(),
            ));
        }

        if !matches!(self.checkout.environment.as_str(), "sandbox" | "production") {
            return Err(ConfigValidationError::InvalidValue(format!(
                "checkout.environment must be sandbox or production, got {}",
                self.checkout.environment
            )));
        }

        let incomplete = self.checkout.plans.incomplete_tiers();
        if !incomplete.is_empty() {
            let tiers: Vec<&str> = incomplete.iter().map(SubscriptionTier::as_str).collect();
            return Err(ConfigValidationError::MissingRequired(format!(
                "checkout.plans price_id for {}",
                tiers.join(", ")
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
