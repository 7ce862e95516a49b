use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::{
    coerce,
    config::OdooConfig,
    domain::Domain,
    error::MrpError,
    rpc::RpcClient,
    session::{Credentials, Session},
};

/// One record as returned by the object service.
pub type Record = Map<String, Value>;

/// Upper bound on rows returned by a single `search_read`. There is no
/// pagination past it.
pub const SEARCH_LIMIT: usize = 500;

/// Shared record store for all tools and the provisioning pipeline.
/// The gateway is read-only after login, so no lock is needed.
pub type SharedStore = Arc<dyn RecordStore>;

/// Record-level verbs over the remote object service.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn search_read(
        &self,
        model: &str,
        fields: &[&str],
        domain: &Domain,
    ) -> Result<Vec<Record>, MrpError>;

    async fn read(&self, model: &str, ids: &[i64], fields: &[&str]) -> Result<Vec<Record>, MrpError>;

    async fn create(&self, model: &str, values: Record) -> Result<i64, MrpError>;

    async fn call_method(&self, model: &str, method: &str, ids: &[i64]) -> Result<Value, MrpError>;
}

/// [`RecordStore`] backed by the JSON-RPC transport and a logged-in session.
#[derive(Debug)]
pub struct Gateway {
    rpc: RpcClient,
    session: Session,
}

impl Gateway {
    pub fn new(rpc: RpcClient, session: Session) -> Self {
        Self { rpc, session }
    }

    /// Build the transport from config and log in once.
    pub async fn connect(config: &OdooConfig) -> Result<Self, MrpError> {
        let rpc = RpcClient::new(&config.url, config.timeout)?;
        let mut session = Session::new(Credentials {
            db: config.db.clone(),
            login: config.login.clone(),
            key: config.api_key.clone(),
        });
        session.login(&rpc).await?;
        Ok(Self::new(rpc, session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn execute_kw(
        &self,
        model: &str,
        operation: &str,
        positional: Vec<Value>,
        kwargs: Option<Value>,
    ) -> Result<Value, MrpError> {
        let creds = self.session.credentials();
        let mut args = vec![
            json!(creds.db),
            json!(self.session.uid()?),
            json!(creds.key),
            json!(model),
            json!(operation),
            Value::Array(positional),
        ];
        if let Some(kwargs) = kwargs {
            args.push(kwargs);
        }
        self.rpc.call("object", "execute_kw", args).await
    }
}

fn records(model: &str, result: Value) -> Result<Vec<Record>, MrpError> {
    let Value::Array(rows) = result else {
        return Err(MrpError::ProtocolViolation(format!(
            "{model}: expected a list of records, got {}",
            coerce::shape(&result)
        )));
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Object(record) => Ok(record),
            other => Err(MrpError::ProtocolViolation(format!(
                "{model}: expected a record object, got {}",
                coerce::shape(&other)
            ))),
        })
        .collect()
}

#[async_trait]
impl RecordStore for Gateway {
    async fn search_read(
        &self,
        model: &str,
        fields: &[&str],
        domain: &Domain,
    ) -> Result<Vec<Record>, MrpError> {
        let kwargs = json!({ "fields": fields, "limit": SEARCH_LIMIT });
        self.execute_kw(model, "search_read", domain.positional(), Some(kwargs))
            .await
            .and_then(|result| records(model, result))
            .map_err(|e| e.context(format!("search_read on {model} (fields: {})", fields.join(", "))))
    }

    async fn read(&self, model: &str, ids: &[i64], fields: &[&str]) -> Result<Vec<Record>, MrpError> {
        self.execute_kw(model, "read", vec![json!(ids)], Some(json!({ "fields": fields })))
            .await
            .and_then(|result| records(model, result))
            .map_err(|e| e.context(format!("read {ids:?} on {model} (fields: {})", fields.join(", "))))
    }

    async fn create(&self, model: &str, values: Record) -> Result<i64, MrpError> {
        let keys = values.keys().cloned().collect::<Vec<_>>().join(", ");
        self.execute_kw(model, "create", vec![Value::Object(values)], None)
            .await
            .and_then(|result| coerce::to_id(&result))
            .map_err(|e| e.context(format!("create on {model} (fields: {keys})")))
    }

    async fn call_method(&self, model: &str, method: &str, ids: &[i64]) -> Result<Value, MrpError> {
        self.execute_kw(model, method, vec![json!(ids)], None)
            .await
            .map_err(|e| e.context(format!("{method} {ids:?} on {model}")))
    }
}
