use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use validator::Validate;

use crate::errors::PaymentError;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const CONFIG_DIR: &str = "config";

/// Payment gateway configuration with validation.
///
/// Loaded from `config/default` + `config/{RUN_ENV}` files with `DRIVEHUB__`
/// environment overrides layered on top.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Base URL of the bank payment proxy
    #[validate(url)]
    pub gateway_url: String,

    /// Base URL of the app backend that stores payment records
    #[validate(url)]
    pub records_url: String,

    /// URL the provider calls back server-side after settlement
    #[validate(url)]
    pub callback_url: String,

    /// Return URL the provider navigates to on success
    #[validate(url)]
    pub success_url: String,

    /// Return URL the provider navigates to on failure
    #[validate(url)]
    pub fail_url: String,

    /// Per-request timeout for proxy calls (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl GatewayConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Loads configuration from files and environment, then validates it.
pub fn load_config() -> Result<GatewayConfig, PaymentError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let cfg: GatewayConfig = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("DRIVEHUB").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()
        .map_err(|e| PaymentError::Validation(e.to_string()))?;

    Ok(cfg)
}

/// Initializes the tracing subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("drivehub_payments={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(filter_directive))
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(filter_directive))
            .with(fmt::layer())
            .try_init();
    }
}
