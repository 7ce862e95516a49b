use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MrpError;

pub const JSONRPC_VERSION: &str = "2.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Outgoing JSON-RPC envelope. The method is always `"call"`; the real
/// dispatch happens on `params.service` / `params.method`.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: RpcParams<'a>,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct RpcParams<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub args: Vec<Value>,
}

/// Generic response shape. `result` is left untyped; callers narrow it.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

/// Server-side diagnostic attached to an error (exception class + message).
#[derive(Debug, Deserialize)]
pub struct RpcErrorData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

impl RpcResponse {
    /// Collapse the response into its result, or the error channel it carries.
    pub fn into_result(self) -> Result<Value, MrpError> {
        if let Some(err) = self.error {
            let detail = match err.data {
                Some(data) if !data.name.is_empty() => format!("{}: {}", data.name, data.message),
                Some(data) => data.message,
                None => String::new(),
            };
            return Err(MrpError::Remote {
                code: err.code,
                message: err.message,
                detail,
            });
        }
        self.result.ok_or_else(|| {
            MrpError::ProtocolViolation("response carries neither result nor error".into())
        })
    }
}

/// Blocking-style JSON-RPC client: one POST per call, awaited to completion.
#[derive(Debug)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, MrpError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Invoke `service.method(args)` and return the raw result value.
    ///
    /// HTTP status >= 400 wins over any JSON-RPC error in the body, because
    /// some deployments answer failures without an error object.
    pub async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value, MrpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method: "call",
            params: RpcParams {
                service,
                method,
                args,
            },
            id,
        };
        tracing::debug!(service, method, id, "rpc call");

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            tracing::debug!(service, method, id, status = status.as_u16(), "rpc http failure");
            return Err(MrpError::ServiceHttp {
                status: status.as_u16(),
                body,
            });
        }

        decode_body(&body)
    }
}

/// Decode a 2xx body into the call's result.
pub fn decode_body(body: &str) -> Result<Value, MrpError> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|e| MrpError::ProtocolViolation(format!("malformed response body ({e}): {body}")))?;
    response.into_result()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_shape() {
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method: "call",
            params: RpcParams {
                service: "common",
                method: "authenticate",
                args: vec![json!("db"), json!("admin"), json!("key"), json!({})],
            },
            id: 3,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {
                    "service": "common",
                    "method": "authenticate",
                    "args": ["db", "admin", "key", {}]
                },
                "id": 3
            })
        );
    }

    #[test]
    fn decode_result() {
        let value = decode_body(r#"{"jsonrpc":"2.0","id":1,"result":[1,2]}"#).unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn decode_false_result_is_a_result() {
        let value = decode_body(r#"{"jsonrpc":"2.0","id":1,"result":false}"#).unwrap();
        assert_eq!(value, json!(false));
    }

    #[test]
    fn decode_empty_object_is_protocol_violation() {
        assert!(matches!(decode_body("{}"), Err(MrpError::ProtocolViolation(_))));
    }

    #[test]
    fn decode_null_result_is_protocol_violation() {
        assert!(matches!(
            decode_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#),
            Err(MrpError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn decode_non_json_is_protocol_violation() {
        assert!(matches!(
            decode_body("<html>502 Bad Gateway</html>"),
            Err(MrpError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn decode_error_object() {
        let body = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "odoo.exceptions.AccessError", "message": "You are not allowed"}
            }
        }"#;
        match decode_body(body) {
            Err(MrpError::Remote { code, message, detail }) => {
                assert_eq!(code, 200);
                assert_eq!(message, "Odoo Server Error");
                assert_eq!(detail, "odoo.exceptions.AccessError: You are not allowed");
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn error_wins_over_result() {
        let body = r#"{"result": 5, "error": {"code": 1, "message": "boom"}}"#;
        assert!(matches!(decode_body(body), Err(MrpError::Remote { .. })));
    }
}
