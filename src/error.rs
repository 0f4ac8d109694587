use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "messages", "LMSTUDIO_ENDPOINT")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config", "router", "search")
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

/// Unified error type for the relay.
///
/// Variants follow the request-level taxonomy: client input problems, upstream
/// failures with their status preserved, local backend reachability, and loop
/// exhaustion are all distinguishable by the HTTP layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Upstream model provider answered with a non-2xx status.
    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// The local inference server refused the connection.
    #[error("Local backend unreachable at {endpoint}: {details}")]
    LocalUnavailable { endpoint: String, details: String },

    /// Any other failure talking to the local inference server.
    #[error("Local backend request failed: {details}")]
    LocalFailed { details: String },

    /// No OpenRouter key in server config or request headers.
    #[error("OpenRouter API key is not configured")]
    MissingApiKey,

    #[error("Maximum tool iterations reached ({limit})")]
    MaxToolIterations { limit: usize },

    /// The reader side of a streamed response went away.
    #[error("Client disconnected")]
    ClientDisconnected,
}

// Helper function to format error context for display
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
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Build a [`Error::Remote`] from an upstream error body.
    ///
    /// Providers nest the human message under `error.message`; some send a bare
    /// `error` string. Anything that is not JSON is surfaced as raw text.
    pub fn from_upstream_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                let err = json.get("error")?;
                err.get("message")
                    .and_then(|m| m.as_str())
                    .or_else(|| err.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string());
        Error::Remote { status, message }
    }
}
