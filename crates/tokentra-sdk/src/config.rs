//! TokenTra configuration
//!
//! Built once, validated at `build()`, and read-only afterwards. Values come
//! from [`TokenTraConfig::builder`] or from `TOKENTRA_*` environment variables.

use crate::logging::parse_level;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokentra_common::{ApiKey, AttributionDefaults, Result, TokenTraError};
use tokentra_meter::PipelineSettings;
use tracing::Level;

pub const DEFAULT_API_URL: &str = "https://api.tokentra.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

const ENV_PREFIX: &str = "TOKENTRA";

/// What, if anything, prompt content contributes to telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrivacyMode {
    /// Usage and cost only
    #[default]
    MetricsOnly,
    /// Also attach a BLAKE3 digest of the prompt
    Hashed,
}

impl PrivacyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyMode::MetricsOnly => "metrics_only",
            PrivacyMode::Hashed => "hashed",
        }
    }
}

impl fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyMode {
    type Err = TokenTraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metrics_only" => Ok(PrivacyMode::MetricsOnly),
            "hashed" => Ok(PrivacyMode::Hashed),
            other => Err(TokenTraError::Config(format!(
                "Unknown privacy mode: {} (expected metrics_only or hashed)",
                other
            ))),
        }
    }
}

/// Validated SDK configuration
#[derive(Debug, Clone)]
pub struct TokenTraConfig {
    pub api_key: ApiKey,
    /// Collector base URL, without trailing slash
    pub api_url: String,
    /// Collector request timeout
    pub timeout_ms: u64,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_queue_size: usize,
    pub defaults: AttributionDefaults,
    pub privacy_mode: PrivacyMode,
    pub log_level: Level,
}

impl TokenTraConfig {
    pub fn builder(api_key: impl Into<String>) -> TokenTraConfigBuilder {
        TokenTraConfigBuilder::new(api_key)
    }

    /// Load from `.env` and `TOKENTRA_*` environment variables
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit variable map, as if it were the environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn from_environment(source: config::Environment) -> Result<Self> {
        let settings: EnvSettings = config::Config::builder()
            .add_source(source.try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TokenTraError::Config(e.to_string()))?;

        settings.into_builder().build()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Queue and worker tuning derived from this configuration
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            batch_size: self.batch_size,
            flush_interval: self.flush_interval,
            max_queue_size: self.max_queue_size,
            ..PipelineSettings::default()
        }
    }
}

/// Builder for [`TokenTraConfig`]
#[derive(Clone)]
pub struct TokenTraConfigBuilder {
    api_key: String,
    api_url: String,
    timeout_ms: u64,
    batch_size: usize,
    flush_interval: Duration,
    max_queue_size: usize,
    defaults: AttributionDefaults,
    privacy_mode: String,
    log_level: String,
}

impl TokenTraConfigBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            defaults: AttributionDefaults::default(),
            privacy_mode: PrivacyMode::default().as_str().to_string(),
            log_level: "WARNING".to_string(),
        }
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    pub fn default_feature(mut self, feature: impl Into<String>) -> Self {
        self.defaults.feature = Some(feature.into());
        self
    }

    pub fn default_team(mut self, team: impl Into<String>) -> Self {
        self.defaults.team = Some(team.into());
        self
    }

    pub fn default_project(mut self, project: impl Into<String>) -> Self {
        self.defaults.project = Some(project.into());
        self
    }

    pub fn default_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.defaults.cost_center = Some(cost_center.into());
        self
    }

    pub fn default_environment(mut self, environment: impl Into<String>) -> Self {
        self.defaults.environment = Some(environment.into());
        self
    }

    pub fn privacy_mode(mut self, mode: PrivacyMode) -> Self {
        self.privacy_mode = mode.as_str().to_string();
        self
    }

    /// Log level by name (`DEBUG`, `INFO`, `WARNING`, `ERROR`, ...)
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn build(self) -> Result<TokenTraConfig> {
        let api_key = ApiKey::parse(self.api_key)?;

        let api_url = self.api_url.trim().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(TokenTraError::Config("api_url must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(TokenTraError::Config("batch_size must be greater than 0".into()));
        }
        if self.max_queue_size == 0 {
            return Err(TokenTraError::Config(
                "max_queue_size must be greater than 0".into(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(TokenTraError::Config(
                "flush_interval must be greater than 0".into(),
            ));
        }

        Ok(TokenTraConfig {
            api_key,
            api_url,
            timeout_ms: self.timeout_ms,
            batch_size: self.batch_size,
            flush_interval: self.flush_interval,
            max_queue_size: self.max_queue_size,
            defaults: self.defaults,
            privacy_mode: self.privacy_mode.parse()?,
            log_level: parse_level(&self.log_level)?,
        })
    }
}

/// Raw `TOKENTRA_*` values; empty strings are treated as unset
#[derive(Debug, Default, Deserialize)]
struct EnvSettings {
    api_key: Option<String>,
    api_url: Option<String>,
    timeout_ms: Option<u64>,
    batch_size: Option<usize>,
    flush_interval_ms: Option<u64>,
    max_queue_size: Option<usize>,
    default_feature: Option<String>,
    default_team: Option<String>,
    default_project: Option<String>,
    default_cost_center: Option<String>,
    default_environment: Option<String>,
    privacy_mode: Option<String>,
    log_level: Option<String>,
}

fn set(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl EnvSettings {
    fn into_builder(self) -> TokenTraConfigBuilder {
        let mut builder = TokenTraConfig::builder(self.api_key.unwrap_or_default());

        if let Some(url) = set(self.api_url) {
            builder = builder.api_url(url);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            builder = builder.timeout_ms(timeout_ms);
        }
        if let Some(batch_size) = self.batch_size {
            builder = builder.batch_size(batch_size);
        }
        if let Some(ms) = self.flush_interval_ms {
            builder = builder.flush_interval(Duration::from_millis(ms));
        }
        if let Some(size) = self.max_queue_size {
            builder = builder.max_queue_size(size);
        }
        builder.defaults = AttributionDefaults {
            feature: set(self.default_feature),
            team: set(self.default_team),
            project: set(self.default_project),
            cost_center: set(self.default_cost_center),
            environment: set(self.default_environment),
        };
        if let Some(mode) = set(self.privacy_mode) {
            builder.privacy_mode = mode;
        }
        if let Some(level) = set(self.log_level) {
            builder = builder.log_level(level);
        }

        builder
    }
}
