use crate::domain::model::ServiceType;
use crate::utils::error::{DispatchError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DispatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DispatchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DispatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(DispatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DispatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 服務標籤必須可解析且不可重複
pub fn validate_service_labels(field_name: &str, labels: &[String]) -> Result<Vec<ServiceType>> {
    if labels.is_empty() {
        return Err(DispatchError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut services = Vec::with_capacity(labels.len());
    for label in labels {
        let service = label
            .parse::<ServiceType>()
            .map_err(|e| DispatchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: label.clone(),
                reason: format!(
                    "{}. Valid services: {}",
                    e,
                    ServiceType::ALL.map(|s| s.label()).join(", ")
                ),
            })?;
        if !seen.insert(service) {
            return Err(DispatchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: label.clone(),
                reason: "Service listed more than once".to_string(),
            });
        }
        services.push(service);
    }
    Ok(services)
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DispatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
