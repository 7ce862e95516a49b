//! Authenticated identity for the object service.
//!
//! A [`Session`] starts empty and is filled once by [`Session::login`]. After
//! the owning gateway is shared it is only ever read. There is no refresh: an
//! expired session shows up as a remote error on the next call.

use serde_json::{json, Value};

use crate::{coerce, error::MrpError, rpc::RpcClient};

/// Connection settings for the remote store.
#[derive(Clone)]
pub struct Credentials {
    pub db: String,
    pub login: String,
    pub key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("db", &self.db)
            .field("login", &self.login)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    uid: Option<i64>,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            uid: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The user id assigned at login.
    pub fn uid(&self) -> Result<i64, MrpError> {
        self.uid.ok_or(MrpError::NotAuthenticated)
    }

    /// Authenticate and store the returned user id. A second call overwrites it.
    pub async fn login(&mut self, rpc: &RpcClient) -> Result<i64, MrpError> {
        let args = vec![
            json!(self.credentials.db),
            json!(self.credentials.login),
            json!(self.credentials.key),
            json!({}),
        ];
        let result = rpc.call("common", "authenticate", args).await?;
        let uid = self.interpret_login(&result)?;
        tracing::info!(login = %self.credentials.login, db = %self.credentials.db, uid, "authenticated");
        self.uid = Some(uid);
        Ok(uid)
    }

    fn interpret_login(&self, result: &Value) -> Result<i64, MrpError> {
        let failed = || MrpError::AuthenticationFailed {
            login: self.credentials.login.clone(),
        };
        match result {
            Value::Bool(false) => Err(failed()),
            Value::Number(_) => match coerce::to_id(result)? {
                0 => Err(failed()),
                uid if uid > 0 => Ok(uid),
                uid => Err(MrpError::ProtocolViolation(format!(
                    "login returned negative uid {uid}"
                ))),
            },
            other => Err(MrpError::ProtocolViolation(format!(
                "unexpected login result: {}",
                coerce::shape(other)
            ))),
        }
    }
}
