//! Error types for light-curve stacking.
//!
//! Every fallible operation in the crate returns [`StackError`], which pairs a
//! message with an [`ErrorContext`] describing where the failure happened
//! (operation, input source, row).

use std::fmt;

/// Result type for stacking operations
pub type StackResult<T> = Result<T, StackError>;

/// Structured context for stacking errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "parse_ztf", "validate_config")
    pub operation: Option<String>,
    /// Name of the input being processed (file path, request id)
    pub source_name: Option<String>,
    /// Zero-based row of the offending record, if any
    pub row: Option<usize>,
    /// Additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the input source name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_name = Some(source.into());
        self
    }

    /// Set the offending row.
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.source_name.is_none()
            && self.row.is_none()
            && self.details.is_none()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref source) = self.source_name {
            parts.push(format!("source={}", source));
        }
        if let Some(row) = self.row {
            parts.push(format!("row={}", row));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for stacking operations
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Invalid configuration, detected before any data is processed.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// Input text could not be turned into measurements.
    #[error("Parse error: {message} {context}")]
    ParseError {
        message: String,
        context: ErrorContext,
    },

    /// Measurements violate an invariant the caller was responsible for.
    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// Reading input or writing output failed.
    #[error("I/O error: {message} {context}")]
    IoError {
        message: String,
        context: ErrorContext,
    },

    /// Encoding a result table failed.
    #[error("Serialization error: {message} {context}")]
    SerializationError {
        message: String,
        context: ErrorContext,
    },
}

impl StackError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error with context.
    pub fn configuration_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::IoError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Whether the error was caused by the caller's input or settings
    /// rather than by the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError { .. } | Self::ParseError { .. } | Self::ValidationError { .. }
        )
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ConfigurationError { context, .. }
            | Self::ParseError { context, .. }
            | Self::ValidationError { context, .. }
            | Self::IoError { context, .. }
            | Self::SerializationError { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ConfigurationError { context, .. }
            | Self::ParseError { context, .. }
            | Self::ValidationError { context, .. }
            | Self::IoError { context, .. }
            | Self::SerializationError { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add or update the input source in the error context.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.context_mut().source_name = Some(source.into());
        self
    }
}

impl From<std::io::Error> for StackError {
    fn from(err: std::io::Error) -> Self {
        StackError::io(err.to_string())
    }
}

impl From<toml::de::Error> for StackError {
    fn from(err: toml::de::Error) -> Self {
        StackError::configuration_with_context(
            format!("Failed to parse config: {}", err),
            ErrorContext::new("parse_config"),
        )
    }
}

impl From<serde_json::Error> for StackError {
    fn from(err: serde_json::Error) -> Self {
        StackError::serialization(err.to_string())
    }
}

impl From<csv::Error> for StackError {
    fn from(err: csv::Error) -> Self {
        StackError::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("parse_ztf")
            .with_source("lc.txt")
            .with_row(12)
            .with_details("bad jd");
        assert_eq!(
            ctx.to_string(),
            "[operation=parse_ztf, source=lc.txt, row=12, details=bad jd]"
        );
    }

    #[test]
    fn test_empty_context_renders_nothing() {
        let err = StackError::configuration("width must be positive");
        assert_eq!(
            err.to_string().trim_end(),
            "Configuration error: width must be positive"
        );
    }

    #[test]
    fn test_with_operation_and_source() {
        let err = StackError::ParseError {
            message: "unknown band".to_string(),
            context: ErrorContext::default().with_row(3),
        }
        .with_operation("parse_tabular")
            .with_source("tde.dat");
        let ctx = err.context();
        assert_eq!(ctx.operation.as_deref(), Some("parse_tabular"));
        assert_eq!(ctx.source_name.as_deref(), Some("tde.dat"));
        assert_eq!(ctx.row, Some(3));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_io_error_is_not_client_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: StackError = io.into();
        assert!(matches!(err, StackError::IoError { .. }));
        assert!(!err.is_client_error());
    }
}
