use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Unsupported file format '{extension}' for {file_name}. Please upload a CSV or Excel file.")]
    UnsupportedFormat { file_name: String, extension: String },

    #[error("Failed to decode {file_name}: {reason}")]
    Decode { file_name: String, reason: String },

    #[error("Unknown column '{column}' (available: {available})")]
    UnknownColumn { column: String, available: String },

    #[error("Download {file_name} was already written for {first_source}")]
    DownloadConflict {
        file_name: String,
        first_source: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

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

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Input,
    Data,
    Config,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SweepError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SweepError::UnsupportedFormat { .. } => ErrorCategory::Input,
            SweepError::Decode { .. }
            | SweepError::CsvError(_)
            | SweepError::UnknownColumn { .. }
            | SweepError::DownloadConflict { .. }
            | SweepError::ValidationError { .. } => ErrorCategory::Data,
            SweepError::ConfigError { .. }
            | SweepError::ConfigValidationError { .. }
            | SweepError::InvalidConfigValueError { .. } => ErrorCategory::Config,
            SweepError::ZipError(_)
            | SweepError::IoError(_)
            | SweepError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一檔案的問題，其他檔案照常處理
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Config => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SweepError::UnsupportedFormat { .. } => {
                "Only .csv and .xlsx files are accepted; convert the file or rename it with the correct extension"
            }
            SweepError::Decode { .. } | SweepError::CsvError(_) => {
                "Check that the file is not corrupted and that every row has at most as many fields as the header"
            }
            SweepError::UnknownColumn { .. } => {
                "Pick column names from the data preview; names are case-sensitive"
            }
            SweepError::DownloadConflict { .. } => {
                "Rename one of the uploads or convert them in separate runs with different output paths"
            }
            SweepError::ValidationError { .. } => "Inspect the table shape and try the operation again",
            SweepError::ConfigError { .. }
            | SweepError::ConfigValidationError { .. }
            | SweepError::InvalidConfigValueError { .. } => {
                "Review the command-line flags and the TOML configuration file"
            }
            SweepError::ZipError(_) | SweepError::IoError(_) | SweepError::SerializationError(_) => {
                "Check file permissions and available disk space, then retry"
            }
        }
    }

    /// Short message for the person who uploaded the file; callers prefix the file name.
    pub fn user_friendly_message(&self) -> String {
        match self {
            SweepError::UnsupportedFormat { extension, .. } => format!(
                "invalid file format '{}'. Please upload a CSV or Excel file.",
                extension
            ),
            SweepError::Decode { reason, .. } => format!("could not be read: {}", reason),
            SweepError::UnknownColumn { column, .. } => {
                format!("Column '{}' does not exist in this file", column)
            }
            SweepError::DownloadConflict {
                file_name,
                first_source,
            } => format!(
                "not saved: {} would overwrite the download of {}",
                file_name, first_source
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
