//! Provisioning pipeline: materializes a [`Batch`] in the remote store.
//!
//! Stages run strictly in order, each one filling the id maps later stages
//! read. The first error stops the run; records already created stay behind
//! and a rerun starts from the top.

use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    future::Future,
};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::watch;

use crate::{
    batch::{Batch, OrderStatus, ProductSpec},
    coerce,
    error::MrpError,
    gateway::{Record, RecordStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Workcenters,
    Products,
    BillsOfMaterials,
    Routings,
    ProductionOrders,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Workcenters => "work-center",
            Self::Products => "product",
            Self::BillsOfMaterials => "bill-of-materials",
            Self::Routings => "routing",
            Self::ProductionOrders => "production-order",
        })
    }
}

/// External key → remote id, filled by exactly one stage.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IdMap {
    ids: HashMap<String, i64>,
}

impl IdMap {
    /// A key already present is an error and leaves the map unchanged.
    pub fn insert(&mut self, key: &str, id: i64) -> Result<(), MrpError> {
        match self.ids.entry(key.to_string()) {
            Entry::Occupied(_) => Err(MrpError::InvalidBatch(format!("key '{key}' provisioned twice"))),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    /// Look up `key` on behalf of `stage`; absence is a hard failure.
    pub fn resolve(&self, stage: Stage, key: &str) -> Result<i64, MrpError> {
        self.ids
            .get(key)
            .copied()
            .ok_or_else(|| MrpError::MissingDependency {
                stage,
                key: key.to_string(),
            })
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.ids.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingStep {
    pub name: String,
    pub minutes: f64,
}

/// Operations associated with a product, for scheduling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingPlan {
    pub product_code: String,
    pub template_id: i64,
    pub workcenter_id: Option<i64>,
    pub steps: Vec<RoutingStep>,
}

impl RoutingPlan {
    pub fn total_minutes(&self) -> f64 {
        self.steps.iter().map(|s| s.minutes).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedOrder {
    pub product_code: String,
    pub id: i64,
    pub confirmed: bool,
}

/// Everything a successful run created.
#[derive(Debug, Default, Serialize)]
pub struct ProvisionReport {
    pub workcenters: IdMap,
    pub templates: IdMap,
    pub variants: IdMap,
    pub boms: Vec<(String, i64)>,
    pub routings: Vec<RoutingPlan>,
    pub orders: Vec<CreatedOrder>,
}

/// External cancellation. Once raised, the in-flight call is abandoned and
/// the run ends with [`MrpError::Cancelled`].
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// A signal plus the sender that raises it (`send(true)`).
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self(rx))
    }

    /// A signal that is never raised.
    pub fn never() -> Self {
        Self::channel().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once raised; pends forever if the sender is gone.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        let closed = rx.wait_for(|raised| *raised).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

pub struct Provisioner<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    cancel: CancelSignal,
}

impl<'a, S: RecordStore + ?Sized> Provisioner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cancel: CancelSignal::never(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate the batch, then run every stage top to bottom.
    pub async fn run(&self, batch: &Batch) -> Result<ProvisionReport, MrpError> {
        batch.validate()?;
        let mut report = ProvisionReport {
            workcenters: self.workcenters(batch).await?,
            ..ProvisionReport::default()
        };
        (report.templates, report.variants) = self.products(batch).await?;
        report.boms = self.bills_of_materials(batch, &report.templates, &report.variants).await?;
        report.routings = self.routings(batch, &report.templates, &report.workcenters)?;
        report.orders = self.production_orders(batch, &report.variants).await?;

        tracing::info!(
            products = report.templates.len(),
            boms = report.boms.len(),
            routings = report.routings.len(),
            orders = report.orders.len(),
            "provisioning complete"
        );
        Ok(report)
    }

    async fn guarded<T>(&self, call: impl Future<Output = Result<T, MrpError>>) -> Result<T, MrpError> {
        if self.cancel.is_cancelled() {
            return Err(MrpError::Cancelled);
        }
        tokio::select! {
            result = call => result,
            () = self.cancel.cancelled() => Err(MrpError::Cancelled),
        }
    }

    async fn workcenters(&self, batch: &Batch) -> Result<IdMap, MrpError> {
        let mut ids = IdMap::default();
        for wc in &batch.workcenters {
            let mut values = Record::new();
            values.insert("name".into(), json!(wc.name));
            values.insert("code".into(), json!(wc.code));
            insert_opt(&mut values, "time_efficiency", wc.time_efficiency);
            insert_opt(&mut values, "default_capacity", wc.default_capacity);
            insert_opt(&mut values, "costs_hour", wc.costs_hour);

            let id = self
                .guarded(self.store.create("mrp.workcenter", values))
                .await
                .and_then(|id| ids.insert(&wc.code, id).map(|()| id))
                .map_err(|e| abort(Stage::Workcenters, &wc.code, e))?;
            tracing::info!(code = %wc.code, id, "work center created");
        }
        Ok(ids)
    }

    async fn products(&self, batch: &Batch) -> Result<(IdMap, IdMap), MrpError> {
        let mut templates = IdMap::default();
        let mut variants = IdMap::default();
        for product in &batch.products {
            let code = product.default_code.as_str();
            let (template_id, variant_id) = self
                .create_product(product)
                .await
                .map_err(|e| abort(Stage::Products, code, e))?;
            templates
                .insert(code, template_id)
                .and_then(|()| variants.insert(code, variant_id))
                .map_err(|e| abort(Stage::Products, code, e))?;
            tracing::info!(code, template_id, variant_id, "product created");
        }
        Ok((templates, variants))
    }

    /// Create the template, then read back the variant the store generated.
    async fn create_product(&self, product: &ProductSpec) -> Result<(i64, i64), MrpError> {
        let mut values = Record::new();
        values.insert("name".into(), json!(product.display_name()));
        values.insert("default_code".into(), json!(product.default_code));
        insert_opt(&mut values, "list_price", product.list_price);
        insert_opt(&mut values, "standard_price", product.standard_price);
        if let Some(kind) = &product.kind {
            values.insert("type".into(), json!(kind));
        }

        let template_id = self.guarded(self.store.create("product.template", values)).await?;
        let rows = self
            .guarded(self.store.read("product.template", &[template_id], &["product_variant_id"]))
            .await?;
        let variant = rows
            .first()
            .and_then(|row| row.get("product_variant_id"))
            .ok_or_else(|| {
                MrpError::ProtocolViolation(format!(
                    "template {template_id} read returned no product_variant_id"
                ))
            })?;
        Ok((template_id, coerce::to_id(variant)?))
    }

    async fn bills_of_materials(
        &self,
        batch: &Batch,
        templates: &IdMap,
        variants: &IdMap,
    ) -> Result<Vec<(String, i64)>, MrpError> {
        let stage = Stage::BillsOfMaterials;
        let mut created = Vec::with_capacity(batch.bom.len());
        for bom in &batch.bom {
            let parent = bom.product_default_code.as_str();
            let template_id = templates
                .resolve(stage, parent)
                .map_err(|e| abort(stage, parent, e))?;

            let mut lines = Vec::with_capacity(bom.lines.len());
            for line in &bom.lines {
                let variant_id = variants
                    .resolve(stage, &line.product)
                    .map_err(|e| abort(stage, parent, e))?;
                lines.push(json!([0, 0, { "product_id": variant_id, "product_qty": line.qty }]));
            }

            let mut values = Record::new();
            values.insert("product_tmpl_id".into(), json!(template_id));
            values.insert("product_qty".into(), json!(bom.quantity.unwrap_or(1.0)));
            values.insert("bom_line_ids".into(), Value::Array(lines));

            let id = self
                .guarded(self.store.create("mrp.bom", values))
                .await
                .map_err(|e| abort(stage, parent, e))?;
            tracing::info!(product = parent, id, lines = bom.lines.len(), "bill of materials created");
            created.push((parent.to_string(), id));
        }
        Ok(created)
    }

    /// Associates steps with products locally; no remote writes.
    fn routings(
        &self,
        batch: &Batch,
        templates: &IdMap,
        workcenters: &IdMap,
    ) -> Result<Vec<RoutingPlan>, MrpError> {
        let stage = Stage::Routings;
        batch
            .routing
            .iter()
            .map(|routing| {
                let code = routing.product.as_str();
                let template_id = templates.resolve(stage, code).map_err(|e| abort(stage, code, e))?;
                let workcenter_id = routing
                    .workcenter
                    .as_deref()
                    .map(|wc| workcenters.resolve(stage, wc))
                    .transpose()
                    .map_err(|e| abort(stage, code, e))?;
                let steps = routing
                    .steps
                    .iter()
                    .zip(&routing.durations)
                    .map(|(name, minutes)| RoutingStep {
                        name: name.clone(),
                        minutes: *minutes,
                    })
                    .collect();
                Ok(RoutingPlan {
                    product_code: code.to_string(),
                    template_id,
                    workcenter_id,
                    steps,
                })
            })
            .collect()
    }

    async fn production_orders(&self, batch: &Batch, variants: &IdMap) -> Result<Vec<CreatedOrder>, MrpError> {
        let stage = Stage::ProductionOrders;
        let mut created = Vec::with_capacity(batch.mrp_orders.len());
        for order in &batch.mrp_orders {
            let code = order.product_default_code.as_str();
            let variant_id = variants.resolve(stage, code).map_err(|e| abort(stage, code, e))?;

            let mut values = Record::new();
            values.insert("product_id".into(), json!(variant_id));
            values.insert("product_qty".into(), json!(order.qty));
            values.insert("date_deadline".into(), json!(order.deadline));
            if order.rush {
                values.insert("priority".into(), json!("1"));
            }

            let id = self
                .guarded(self.store.create("mrp.production", values))
                .await
                .map_err(|e| abort(stage, code, e))?;

            let confirmed = order.status == OrderStatus::Confirmed;
            if confirmed {
                self.guarded(self.store.call_method("mrp.production", "action_confirm", &[id]))
                    .await
                    .map_err(|e| abort(stage, code, e))?;
            }
            tracing::info!(product = code, id, qty = order.qty, deadline = %order.deadline, confirmed, "production order created");
            created.push(CreatedOrder {
                product_code: code.to_string(),
                id,
                confirmed,
            });
        }
        Ok(created)
    }
}

fn insert_opt(values: &mut Record, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        values.insert(field.into(), json!(v));
    }
}

/// Log which stage and key broke the run, so the operator can find the
/// partially provisioned records.
fn abort(stage: Stage, key: &str, err: MrpError) -> MrpError {
    tracing::error!(%stage, key, error = %err, "provisioning aborted");
    err.context(format!("{stage} stage, key '{key}'"))
}
