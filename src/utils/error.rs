use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source list unavailable: {path}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No store codes found in {path}")]
    EmptyStoreList { path: String },

    #[error("Failed to write {path}: {source}")]
    PersistError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

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
}

/// 單一門市抓取失敗的原因，只在排程器邊界被收斂
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("gave up after {attempts} attempts: {reason}")]
    TransientFetchFailure { attempts: u32, reason: String },

    #[error("client error, status {status}")]
    ClientFetchFailure { status: u16 },

    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Data,
    Persistence,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::SourceUnavailable { .. } | EtlError::EmptyStoreList { .. } => {
                ErrorCategory::Input
            }
            EtlError::PersistError { .. } | EtlError::IoError(_) => ErrorCategory::Persistence,
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 空的門市清單只是沒事可做
            EtlError::EmptyStoreList { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_) | EtlError::PersistError { .. } => ErrorSeverity::Medium,
            EtlError::SourceUnavailable { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::IoError(_) => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::SourceUnavailable { path, .. } => {
                format!("Check that '{}' exists and is readable", path)
            }
            EtlError::EmptyStoreList { path } => {
                format!("Add at least one 'code,name' line below the header of '{}'", path)
            }
            EtlError::PersistError { path, .. } => {
                format!("Check free disk space and write permission for '{}'", path)
            }
            EtlError::ApiError(_) => {
                "Check the stock API endpoint and network connectivity".to_string()
            }
            EtlError::CsvError(_) => "Check the list files are plain 'code,name' text".to_string(),
            EtlError::IoError(_) => "Check file permissions and paths".to_string(),
            EtlError::SerializationError(_) => {
                "The snapshot data could not be encoded as JSON".to_string()
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags and run again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not read input lists: {}", self),
            ErrorCategory::Network => format!("Stock API unreachable: {}", self),
            ErrorCategory::Data => format!("Input data could not be processed: {}", self),
            ErrorCategory::Persistence => format!("Could not save output: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }

    /// 依嚴重程度決定程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
