//! In-memory [`RecordStore`] for unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    domain::Domain,
    error::MrpError,
    gateway::{Record, RecordStore},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SearchRead { model: String, domain: Domain },
    Read { model: String, ids: Vec<i64> },
    Create { model: String, values: Record },
    Method { model: String, method: String, ids: Vec<i64> },
}

/// Records every call. Creates hand out ids 1, 2, 3, ...; a template read
/// reports variant `template_id + 1000`; searches return canned rows.
#[derive(Default)]
pub struct FakeStore {
    calls: Mutex<Vec<Call>>,
    last_id: AtomicI64,
    rows: HashMap<String, Vec<Record>>,
    read_rows: HashMap<String, Vec<Record>>,
    failing_model: Option<String>,
    variant_field: Option<Value>,
}

impl FakeStore {
    /// Rows returned by every `search_read` on `model`.
    pub fn with_rows(mut self, model: &str, rows: Value) -> Self {
        self.rows.insert(model.to_string(), to_records(rows));
        self
    }

    /// Rows returned by every `read` on `model`, instead of the template default.
    pub fn with_read_rows(mut self, model: &str, rows: Value) -> Self {
        self.read_rows.insert(model.to_string(), to_records(rows));
        self
    }

    pub fn fail_creates_on(mut self, model: &str) -> Self {
        self.failing_model = Some(model.to_string());
        self
    }

    pub fn with_variant_field(mut self, value: Value) -> Self {
        self.variant_field = Some(value);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates_on(&self, model: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create { model: m, .. } if m == model))
            .count()
    }

    pub fn created(&self, model: &str) -> Vec<Record> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { model: m, values } if m == model => Some(values),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn to_records(rows: Value) -> Vec<Record> {
    rows.as_array()
        .expect("rows must be an array")
        .iter()
        .map(|r| r.as_object().expect("row must be an object").clone())
        .collect()
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn search_read(&self, model: &str, _fields: &[&str], domain: &Domain) -> Result<Vec<Record>, MrpError> {
        self.record(Call::SearchRead {
            model: model.to_string(),
            domain: domain.clone(),
        });
        Ok(self.rows.get(model).cloned().unwrap_or_default())
    }

    async fn read(&self, model: &str, ids: &[i64], _fields: &[&str]) -> Result<Vec<Record>, MrpError> {
        self.record(Call::Read {
            model: model.to_string(),
            ids: ids.to_vec(),
        });
        if let Some(rows) = self.read_rows.get(model) {
            return Ok(rows.clone());
        }
        Ok(ids
            .iter()
            .map(|id| {
                let variant = self
                    .variant_field
                    .clone()
                    .unwrap_or_else(|| json!([id + 1000, format!("variant of {id}")]));
                let mut row = Record::new();
                row.insert("id".into(), json!(id));
                row.insert("product_variant_id".into(), variant);
                row
            })
            .collect())
    }

    async fn create(&self, model: &str, values: Record) -> Result<i64, MrpError> {
        self.record(Call::Create {
            model: model.to_string(),
            values,
        });
        if self.failing_model.as_deref() == Some(model) {
            return Err(MrpError::Remote {
                code: 200,
                message: "Odoo Server Error".into(),
                detail: "odoo.exceptions.ValidationError: rejected".into(),
            });
        }
        Ok(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn call_method(&self, model: &str, method: &str, ids: &[i64]) -> Result<Value, MrpError> {
        self.record(Call::Method {
            model: model.to_string(),
            method: method.to_string(),
            ids: ids.to_vec(),
        });
        Ok(json!(true))
    }
}
