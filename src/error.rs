use thiserror::Error;

use crate::provision::Stage;

/// Unified error type for mrp-copilot operations.
///
/// Every variant is fatal. Nothing in the crate retries: remote creates are
/// not idempotent, so re-issuing one would duplicate a record.
#[derive(Debug, Error)]
pub enum MrpError {
    /// Connection refused, timeout, or a body that could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with HTTP status >= 400.
    #[error("HTTP {status}: {body}")]
    ServiceHttp { status: u16, body: String },

    /// JSON-RPC error object returned with a 2xx status.
    #[error("remote error {code}: {message} ({detail})")]
    Remote {
        code: i64,
        message: String,
        detail: String,
    },

    /// The response did not honour the call's contract.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// An untyped value could not be narrowed to the expected type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("authentication failed for login '{login}'")]
    AuthenticationFailed { login: String },

    #[error("session is not authenticated; call login first")]
    NotAuthenticated,

    /// A provisioning stage referenced an external key no earlier stage produced.
    #[error("{stage} stage: unresolved reference to '{key}'")]
    MissingDependency { stage: Stage, key: String },

    /// External cancellation. Treated like a transport failure.
    #[error("cancelled")]
    Cancelled,

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<MrpError>,
    },

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("narration failed: {0}")]
    Narration(String),
}

impl MrpError {
    /// Wrap with call-site context while keeping the original kind reachable
    /// through [`MrpError::root`].
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any [`MrpError::Context`] layers.
    pub fn root(&self) -> &MrpError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Network-level failures, cancellation included.
    pub fn is_transport(&self) -> bool {
        matches!(self.root(), Self::Transport(_) | Self::Cancelled)
    }
}
