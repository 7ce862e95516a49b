//! A scripted JSON-RPC endpoint for integration tests.

#![allow(dead_code)]

use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use serde_json::{json, Value};
use wiremock::{matchers::method, Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers `authenticate` with `uid`, `create` with ids 1, 2, 3, ..., `read`
/// with one row per id carrying `product_variant_id = [id + 100, ...]`,
/// `search_read` with `rows` and any other method with `true`. Object calls
/// are held back by `delay` when set.
pub struct FakeOdoo {
    pub uid: Value,
    pub rows: Value,
    pub delay: Option<Duration>,
    last_id: AtomicI64,
}

impl FakeOdoo {
    pub fn new(uid: Value) -> Self {
        Self {
            uid,
            rows: json!([]),
            delay: None,
            last_id: AtomicI64::new(0),
        }
    }

    pub fn with_rows(mut self, rows: Value) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn mount(self, server: &MockServer) {
        Mock::given(method("POST")).respond_with(self).mount(server).await;
    }
}

impl Respond for FakeOdoo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let params = &body["params"];
        let args = &params["args"];

        let result = if params["service"] == "common" {
            self.uid.clone()
        } else {
            match args[4].as_str() {
                Some("create") => json!(self.last_id.fetch_add(1, Ordering::SeqCst) + 1),
                Some("read") => {
                    let ids = args[5][0].as_array().cloned().unwrap_or_default();
                    Value::Array(
                        ids.iter()
                            .map(|id| {
                                let id = id.as_i64().unwrap_or_default();
                                json!({"id": id, "product_variant_id": [id + 100, "variant"]})
                            })
                            .collect(),
                    )
                }
                Some("search_read") => self.rows.clone(),
                _ => json!(true),
            }
        };

        let response = ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": body["id"],
            "result": result
        }));
        match self.delay {
            Some(delay) if params["service"] != "common" => response.set_delay(delay),
            _ => response,
        }
    }
}

/// Request bodies the server received, in order.
pub async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

/// `(model, operation)` of every `execute_kw` call.
pub fn object_calls(bodies: &[Value]) -> Vec<(String, String)> {
    bodies
        .iter()
        .filter(|b| b["params"]["method"] == "execute_kw")
        .map(|b| {
            let args = &b["params"]["args"];
            (
                args[3].as_str().unwrap_or_default().to_string(),
                args[4].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}
