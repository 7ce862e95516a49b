use std::time::Duration;

use crate::{error::MrpError, rpc::DEFAULT_TIMEOUT};

/// Where and as whom to reach the remote store.
#[derive(Clone)]
pub struct OdooConfig {
    /// Full JSON-RPC endpoint, e.g. `https://erp.example.com/jsonrpc`.
    pub url: String,
    pub db: String,
    pub login: String,
    pub api_key: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl OdooConfig {
    pub fn new(
        url: impl Into<String>,
        db: impl Into<String>,
        login: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            db: db.into(),
            login: login.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject settings that cannot possibly reach a server.
    pub fn validate(&self) -> Result<(), MrpError> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(MrpError::InvalidArgument(format!(
                "endpoint must start with http:// or https://, got: {}",
                self.url
            )));
        }
        for (name, value) in [("database", &self.db), ("login", &self.login), ("API key", &self.api_key)] {
            if value.trim().is_empty() {
                return Err(MrpError::InvalidArgument(format!("{name} is empty")));
            }
        }
        if self.timeout.is_zero() {
            return Err(MrpError::InvalidArgument("timeout must be positive".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for OdooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooConfig")
            .field("url", &self.url)
            .field("db", &self.db)
            .field("login", &self.login)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
