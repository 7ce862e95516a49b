//! Session and record gateway over a scripted endpoint.

mod common;

use std::time::Duration;

use common::{received_bodies, FakeOdoo};
use mrp_copilot::{
    config::OdooConfig,
    domain::{self, Domain},
    gateway::{Gateway, RecordStore},
    rpc::RpcClient,
    session::{Credentials, Session},
    MrpError,
};
use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> OdooConfig {
    OdooConfig::new(server.uri(), "plant", "planner@example.com", "secret")
        .with_timeout(Duration::from_secs(5))
}

async fn logged_in(server: &MockServer) -> Gateway {
    Gateway::connect(&config(server)).await.unwrap()
}

fn last_args(bodies: &[Value]) -> Value {
    bodies.last().unwrap()["params"]["args"].clone()
}

#[tokio::test]
async fn login_false_is_authentication_failure() {
    let server = MockServer::start().await;
    FakeOdoo::new(json!(false)).mount(&server).await;

    let err = Gateway::connect(&config(&server)).await.unwrap_err();
    match err {
        MrpError::AuthenticationFailed { login } => assert_eq!(login, "planner@example.com"),
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn login_stores_uid_and_sends_credentials() {
    let server = MockServer::start().await;
    FakeOdoo::new(json!(42)).mount(&server).await;

    let gateway = logged_in(&server).await;
    assert_eq!(gateway.session().uid().unwrap(), 42);

    let bodies = received_bodies(&server).await;
    assert_eq!(bodies[0]["params"]["service"], "common");
    assert_eq!(bodies[0]["params"]["method"], "authenticate");
    assert_eq!(
        bodies[0]["params"]["args"],
        json!(["plant", "planner@example.com", "secret", {}])
    );
}

#[tokio::test]
async fn calls_before_login_are_rejected_locally() {
    let server = MockServer::start().await;
    FakeOdoo::new(json!(42)).mount(&server).await;

    let rpc = RpcClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let gateway = Gateway::new(
        rpc,
        Session::new(Credentials {
            db: "plant".into(),
            login: "planner@example.com".into(),
            key: "secret".into(),
        }),
    );
    let err = gateway
        .search_read("mrp.production", &["id"], &Domain::all())
        .await
        .unwrap_err();
    assert!(matches!(err.root(), MrpError::NotAuthenticated));
    assert!(received_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn empty_domain_sends_empty_positional_args() {
    let server = MockServer::start().await;
    FakeOdoo::new(json!(42))
        .with_rows(json!([{"id": 1, "name": "WH/MO/00001"}]))
        .mount(&server)
        .await;

    let gateway = logged_in(&server).await;
    let rows = gateway
        .search_read("mrp.production", &["id", "name"], &Domain::all())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let args = last_args(&received_bodies(&server).await);
    assert_eq!(args[0], "plant");
    assert_eq!(args[1], 42);
    assert_eq!(args[3], "mrp.production");
    assert_eq!(args[4], "search_read");
    assert_eq!(args[5], json!([]));
    assert_eq!(args[6], json!({"fields": ["id", "name"], "limit": 500}));
}

#[tokio::test]
async fn single_clause_is_wrapped_once() {
    let server = MockServer::start().await;
    FakeOdoo::new(json!(42)).mount(&server).await;

    let gateway = logged_in(&server).await;
    gateway
        .search_read("mrp.production", &["id"], &domain::open_orders())
        .await
        .unwrap();

    let args = last_args(&received_bodies(&server).await);
    assert_eq!(args[5], json!([[["state", "!=", "done"]]]));
}

#[tokio::test]
async fn create_coerces_returned_id() {
    let server = MockServer::start().await;
    FakeOdoo::new(json!(42)).mount(&server).await;

    let gateway = logged_in(&server).await;
    let mut values = serde_json::Map::new();
    values.insert("name".into(), json!("Assembly"));
    let id = gateway.create("mrp.workcenter", values).await.unwrap();
    assert_eq!(id, 1);

    let args = last_args(&received_bodies(&server).await);
    assert_eq!(args[5], json!([{"name": "Assembly"}]));
    assert_eq!(args.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn remote_error_during_login_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": {"code": 200, "message": "Odoo Server Error"}
        })))
        .mount(&server)
        .await;

    let rpc = RpcClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let mut session = Session::new(Credentials {
        db: "plant".into(),
        login: "planner@example.com".into(),
        key: "secret".into(),
    });
    let err = session.login(&rpc).await.unwrap_err();
    assert!(matches!(err, MrpError::Remote { .. }));
}

#[tokio::test]
async fn non_list_search_result_is_protocol_violation() {
    let server = MockServer::start().await;
    FakeOdoo::new(json!(42))
        .with_rows(json!({"id": 1}))
        .mount(&server)
        .await;

    let gateway = logged_in(&server).await;
    let err = gateway
        .search_read("mrp.bom", &["id"], &Domain::all())
        .await
        .unwrap_err();
    assert!(matches!(err.root(), MrpError::ProtocolViolation(_)));
    assert!(err.to_string().starts_with("search_read on mrp.bom"));
}
