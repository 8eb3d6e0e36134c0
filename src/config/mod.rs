pub mod toml_config;

use crate::domain::model::ServiceType;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_service_labels,
    validate_url,
};
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_SEED: &str = "default";
pub const DEFAULT_TARGET_DISPATCHES: u64 = 10_000;
pub const DEFAULT_MAX_ACTIVE_CALLS: usize = 1_000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: f64 = 5.0;
pub const DEFAULT_POLL_TIMEOUT_SECS: f64 = 2.0;
pub const DEFAULT_MAX_EMPTY_POLLS: u32 = 1;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 10.0;

pub fn default_service_labels() -> Vec<String> {
    ServiceType::ALL.iter().map(|s| s.label().to_string()).collect()
}

/// 將秒數轉為 `Duration`；非法值交給 validate 處理
pub(crate) fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

pub(crate) fn parse_services(labels: &[String]) -> Vec<ServiceType> {
    labels.iter().filter_map(|label| label.parse().ok()).collect()
}

/// CLI 與 TOML 共用的數值檢查
#[allow(clippy::too_many_arguments)]
pub(crate) fn validate_settings(
    base_url: &str,
    seed: &str,
    target_dispatches: u64,
    max_active_calls: usize,
    refresh_interval_secs: f64,
    poll_timeout_secs: f64,
    request_timeout_secs: f64,
    services: &[String],
) -> Result<()> {
    validate_url("base_url", base_url)?;
    validate_non_empty_string("seed", seed)?;
    validate_positive_number("target_dispatches", target_dispatches, 1)?;
    validate_positive_number("max_active_calls", max_active_calls as u64, 1)?;
    validate_range("refresh_interval_secs", refresh_interval_secs, 0.01, 3600.0)?;
    validate_range("poll_timeout_secs", poll_timeout_secs, 0.01, 600.0)?;
    validate_range("request_timeout_secs", request_timeout_secs, 0.01, 600.0)?;
    validate_service_labels("services", services)?;
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "dispatch-sim")]
#[command(about = "Dispatch emergency units to simulated incidents by proximity")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, default_value = DEFAULT_SEED)]
    pub seed: String,

    #[arg(long, default_value_t = DEFAULT_TARGET_DISPATCHES)]
    pub target_dispatches: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_ACTIVE_CALLS)]
    pub max_active_calls: usize,

    #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
    pub refresh_interval_secs: f64,

    #[arg(long, default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
    pub poll_timeout_secs: f64,

    #[arg(long, default_value_t = DEFAULT_MAX_EMPTY_POLLS)]
    pub max_empty_polls: u32,

    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: f64,

    #[arg(long, value_delimiter = ',', default_values_t = default_service_labels())]
    pub services: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn seed(&self) -> &str {
        &self.seed
    }

    fn target_dispatches(&self) -> u64 {
        self.target_dispatches
    }

    fn max_active_calls(&self) -> usize {
        self.max_active_calls
    }

    fn refresh_interval(&self) -> Duration {
        seconds(self.refresh_interval_secs)
    }

    fn poll_timeout(&self) -> Duration {
        seconds(self.poll_timeout_secs)
    }

    fn max_empty_polls(&self) -> u32 {
        self.max_empty_polls
    }

    fn request_timeout(&self) -> Duration {
        seconds(self.request_timeout_secs)
    }

    fn services(&self) -> Vec<ServiceType> {
        parse_services(&self.services)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(
            &self.base_url,
            &self.seed,
            self.target_dispatches,
            self.max_active_calls,
            self.refresh_interval_secs,
            self.poll_timeout_secs,
            self.request_timeout_secs,
            &self.services,
        )
    }
}
