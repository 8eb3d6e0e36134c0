use crate::config::{
    default_service_labels, parse_services, seconds, validate_settings, DEFAULT_BASE_URL,
    DEFAULT_MAX_ACTIVE_CALLS, DEFAULT_MAX_EMPTY_POLLS, DEFAULT_POLL_TIMEOUT_SECS,
    DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEED,
    DEFAULT_TARGET_DISPATCHES,
};
use crate::core::ConfigProvider;
use crate::domain::model::ServiceType;
use crate::utils::error::{DispatchError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub simulation: SimulationConfig,
    pub server: Option<ServerConfig>,
    pub dispatch: Option<DispatchConfig>,
    pub cache: Option<CacheConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub seed: Option<String>,
    pub target_dispatches: Option<u64>,
    pub max_active_calls: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub poll_timeout_secs: Option<f64>,
    pub max_empty_polls: Option<u32>,
    pub services: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub refresh_interval_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| DispatchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DISPATCH_BASE_URL})；未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn service_labels(&self) -> Vec<String> {
        self.dispatch
            .as_ref()
            .and_then(|d| d.services.clone())
            .unwrap_or_else(default_service_labels)
    }

    pub fn refresh_interval_secs(&self) -> f64 {
        self.cache
            .as_ref()
            .and_then(|c| c.refresh_interval_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
    }

    pub fn poll_timeout_secs(&self) -> f64 {
        self.dispatch
            .as_ref()
            .and_then(|d| d.poll_timeout_secs)
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS)
    }

    pub fn request_timeout_secs(&self) -> f64 {
        self.server
            .as_ref()
            .and_then(|s| s.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    fn seed(&self) -> &str {
        self.simulation.seed.as_deref().unwrap_or(DEFAULT_SEED)
    }

    fn target_dispatches(&self) -> u64 {
        self.simulation
            .target_dispatches
            .unwrap_or(DEFAULT_TARGET_DISPATCHES)
    }

    fn max_active_calls(&self) -> usize {
        self.simulation
            .max_active_calls
            .unwrap_or(DEFAULT_MAX_ACTIVE_CALLS)
    }

    fn refresh_interval(&self) -> Duration {
        seconds(self.refresh_interval_secs())
    }

    fn poll_timeout(&self) -> Duration {
        seconds(self.poll_timeout_secs())
    }

    fn max_empty_polls(&self) -> u32 {
        self.dispatch
            .as_ref()
            .and_then(|d| d.max_empty_polls)
            .unwrap_or(DEFAULT_MAX_EMPTY_POLLS)
    }

    fn request_timeout(&self) -> Duration {
        seconds(self.request_timeout_secs())
    }

    fn services(&self) -> Vec<ServiceType> {
        parse_services(&self.service_labels())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(
            self.base_url(),
            self.seed(),
            self.target_dispatches(),
            self.max_active_calls(),
            self.refresh_interval_secs(),
            self.poll_timeout_secs(),
            self.request_timeout_secs(),
            &self.service_labels(),
        )
    }
}
