use crate::store::StoreError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key or counter key that caused the error (e.g., "stat.shortWindowSeconds", "stat:product:42:2s")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Component that raised the error (e.g., "statistics", "config_loader")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the scheduler.
///
/// Backend failures are recovered at the tier or store boundary, so callers of the
/// facade only ever see `Statistics` (fail-closed counting) or `Configuration`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Access statistics unavailable: {message}{}", format_context(.context))]
    Statistics {
        message: String,
        context: ErrorContext,
        #[source]
        cause: Option<StoreError>,
    },

    #[error("Counter store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config watcher error: {message}{}", format_context(.context))]
    Watcher {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a fail-closed statistics error wrapping the store failure
    pub fn statistics(msg: impl Into<String>, context: ErrorContext, cause: StoreError) -> Self {
        Error::Statistics {
            message: msg.into(),
            context,
            cause: Some(cause),
        }
    }

    pub fn watcher_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Watcher {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Statistics { context, .. }
            | Error::Watcher { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_renders_context() {
        let err = Error::configuration_with_context(
            "short window must be positive",
            ErrorContext::new()
                .with_field_path("stat.shortWindowSeconds")
                .with_details("got -1"),
        );
        let msg = err.to_string();
        assert!(msg.contains("short window must be positive"));
        assert!(msg.contains("field: stat.shortWindowSeconds"));
        assert!(msg.contains("details: got -1"));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("stat.shortWindowSeconds")
        );
    }

    #[test]
    fn store_errors_have_no_context() {
        let err: Error = StoreError::Unavailable("connection refused".into()).into();
        assert!(err.context().is_none());
        assert!(err.to_string().contains("connection refused"));
    }
}
