use thiserror::Error;

#[derive(Error, Debug)]
pub enum IbmiError {
    #[error("No credentials got returned!")]
    MissingCredentials,

    #[error("The operation \"{operation}\" is not supported!")]
    UnsupportedOperation { operation: String },

    /// 驅動程式回報的錯誤，訊息原樣保留
    #[error("{message}")]
    Execution { message: String },

    #[error("JDBC bridge error: {message}")]
    Bridge { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Connection,
    Database,
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

impl IbmiError {
    pub fn execution(message: impl Into<String>) -> Self {
        IbmiError::Execution {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        IbmiError::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            IbmiError::MissingCredentials
            | IbmiError::UnsupportedOperation { .. }
            | IbmiError::ConfigError { .. }
            | IbmiError::MissingConfigError { .. }
            | IbmiError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            IbmiError::Bridge { .. } => ErrorCategory::Connection,
            IbmiError::Execution { .. } => ErrorCategory::Database,
            IbmiError::CsvError(_)
            | IbmiError::SerializationError(_)
            | IbmiError::ValidationError { .. } => ErrorCategory::Data,
            IbmiError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Database => ErrorSeverity::High,
            ErrorCategory::Connection | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 是否可被 continue-on-fail 吸收
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            IbmiError::MissingCredentials | IbmiError::UnsupportedOperation { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            IbmiError::MissingCredentials => {
                "No IBM i credentials were supplied (host, user, password)".to_string()
            }
            IbmiError::UnsupportedOperation { operation } => {
                format!("Operation '{}' is not available, use executeQuery or insert", operation)
            }
            IbmiError::Execution { message } => format!("DB2 rejected the statement: {}", message),
            IbmiError::Bridge { message } => format!("Could not talk to the JDBC bridge: {}", message),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the connection and operation settings",
            ErrorCategory::Connection => "Make sure the bridge command exists and the host is reachable",
            ErrorCategory::Database => "Check the SQL text, table and column names",
            ErrorCategory::Data => "Check that the input items are flat JSON objects",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, IbmiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_keeps_driver_message() {
        let err = IbmiError::execution("[SQL0104] Token FORM was not valid.");
        assert_eq!(err.to_string(), "[SQL0104] Token FORM was not valid.");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_unsupported_operation_is_fatal() {
        let err = IbmiError::unsupported("update");
        assert_eq!(err.to_string(), "The operation \"update\" is not supported!");
        assert!(!err.is_recoverable());
        assert!(!IbmiError::MissingCredentials.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
