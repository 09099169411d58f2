use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Vendor API error on page {page}: {message}")]
    VendorApiError { page: u32, message: String },

    #[error("Maps API error ({endpoint}): {status} {message}")]
    MapsApiError {
        endpoint: String,
        status: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_)
            | EtlError::VendorApiError { .. }
            | EtlError::MapsApiError { .. } => ErrorCategory::Network,
            EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常重跑即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) if e.is_timeout() => {
                "The remote API did not answer in time".to_string()
            }
            EtlError::ApiError(_) => "Could not reach the remote API".to_string(),
            EtlError::IoError(e) => format!("File operation failed: {}", e),
            EtlError::SerializationError(e) => format!("Invalid JSON data: {}", e),
            EtlError::VendorApiError { page, .. } => {
                format!("The listings API failed on page {}", page)
            }
            EtlError::MapsApiError { status, .. } => {
                format!("The Google Maps API refused the request ({})", status)
            }
            EtlError::MissingConfigError { field } => {
                format!("{} is not set", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) | EtlError::VendorApiError { .. } => {
                "Check the network connection and the API URL, then re-run the stage"
            }
            EtlError::MapsApiError { .. } => {
                "Check that the Google Maps key is valid and the Places/Distance Matrix APIs are enabled"
            }
            EtlError::IoError(_) => {
                "Make sure the working directory exists and the previous stage has been run"
            }
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                "Re-run the previous stage to regenerate its output file"
            }
            EtlError::MissingConfigError { .. } => {
                "Export the variable or set it in the TOML configuration file"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and try again"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
