use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{component} not initialized")]
    NotInitialized { component: String },

    #[error("Failed to reach {target}: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} error (status {status}): {body}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {service}: {message}")]
    MalformedResponse { service: String, message: String },

    #[error("Empty response from {service}")]
    EmptyResponse { service: String },

    #[error("OCR failed: {message}")]
    Extraction { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Upstream,
    Processing,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ConfigError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AppError::Transport { .. } => ErrorCategory::Network,
            AppError::UpstreamStatus { .. }
            | AppError::MalformedResponse { .. }
            | AppError::EmptyResponse { .. } => ErrorCategory::Upstream,
            AppError::Extraction { .. } => ErrorCategory::Processing,
            AppError::Validation { .. } => ErrorCategory::Input,
            AppError::NotInitialized { .. } | AppError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Processing | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 稍後重試同一服務是否可能成功
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Transport { .. } | AppError::EmptyResponse { .. } => true,
            AppError::UpstreamStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::NotInitialized { .. } => {
                "Initialize the service at startup before handling requests"
            }
            AppError::Transport { .. } => {
                "Check that the service is running and the base URL is correct"
            }
            AppError::UpstreamStatus { .. } => "Inspect the upstream service logs for details",
            AppError::MalformedResponse { .. } => {
                "Check that the upstream service version matches the expected API"
            }
            AppError::EmptyResponse { .. } => {
                "Retry the request or switch to a different model"
            }
            AppError::Extraction { .. } => {
                "Check that the OCR engine is installed and the image is readable"
            }
            AppError::Validation { .. } => "Fix the input and try again",
            AppError::IoError(_) => "Check file paths and permissions",
            AppError::ConfigError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. } => {
                "Review the configuration file and environment variables"
            }
        }
    }

    /// 給使用者的簡短訊息，不包含巢狀錯誤鏈
    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::Transport { target, .. } => format!("Could not reach {}", target),
            AppError::UpstreamStatus {
                service, status, ..
            } => format!("{} returned status {}", service, status),
            AppError::IoError(e) => format!("File access failed: {}", e.kind()),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
