use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Location directory unavailable: {message}")]
    LocationDirectoryError { message: String },

    #[error("Invalid location record: {message}")]
    InvalidLocationRecord { message: String },

    #[error("Invalid availability response for {service}: {message}")]
    InvalidAvailabilityResponse { service: String, message: String },

    #[error("Dispatch gateway rejected order: {message}")]
    GatewayError { message: String },

    #[error("Simulation control failed: {message}")]
    SimulationControlError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DispatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DispatchError::ApiError(_)
            | DispatchError::GatewayError { .. }
            | DispatchError::SimulationControlError { .. } => ErrorCategory::Network,
            DispatchError::ConfigError { .. }
            | DispatchError::ConfigValidationError { .. }
            | DispatchError::InvalidConfigValueError { .. }
            | DispatchError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DispatchError::SerializationError(_)
            | DispatchError::LocationDirectoryError { .. }
            | DispatchError::InvalidLocationRecord { .. }
            | DispatchError::InvalidAvailabilityResponse { .. } => ErrorCategory::Data,
            DispatchError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // gateway 回應僅供參考
            DispatchError::GatewayError { .. } => ErrorSeverity::Low,
            DispatchError::ApiError(_)
            | DispatchError::SimulationControlError { .. }
            | DispatchError::InvalidAvailabilityResponse { .. } => ErrorSeverity::Medium,
            DispatchError::ConfigError { .. }
            | DispatchError::ConfigValidationError { .. }
            | DispatchError::InvalidConfigValueError { .. }
            | DispatchError::MissingConfigError { .. }
            | DispatchError::SerializationError(_) => ErrorSeverity::High,
            DispatchError::LocationDirectoryError { .. }
            | DispatchError::InvalidLocationRecord { .. }
            | DispatchError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the simulation server is running and reachable at the configured base URL"
            }
            ErrorCategory::Configuration => {
                "Review the command-line flags or TOML configuration and fix the reported field"
            }
            ErrorCategory::Data => {
                "The simulation server returned malformed data; verify the server version and seed"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DispatchError::LocationDirectoryError { .. }
            | DispatchError::InvalidLocationRecord { .. } => {
                format!("Could not load the location directory: {}", self)
            }
            DispatchError::ConfigError { .. }
            | DispatchError::ConfigValidationError { .. }
            | DispatchError::InvalidConfigValueError { .. }
            | DispatchError::MissingConfigError { .. } => format!("Invalid configuration: {}", self),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
