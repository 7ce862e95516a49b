//! Declarative provisioning batch.
//!
//! Read once from a JSON document and never mutated. Field names follow the
//! seed files used against the store (`default_code`, `product_default_code`,
//! `mrp_orders`).

use std::{collections::HashSet, path::Path};

use serde::Deserialize;

use crate::error::MrpError;

#[derive(Debug, Default, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub workcenters: Vec<WorkcenterSpec>,
    #[serde(default)]
    pub products: Vec<ProductSpec>,
    #[serde(default)]
    pub bom: Vec<BomSpec>,
    #[serde(default)]
    pub routing: Vec<RoutingSpec>,
    #[serde(default)]
    pub mrp_orders: Vec<OrderSpec>,
}

#[derive(Debug, Deserialize)]
pub struct WorkcenterSpec {
    pub name: String,
    pub code: String,
    pub time_efficiency: Option<f64>,
    pub default_capacity: Option<f64>,
    pub costs_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSpec {
    pub default_code: String,
    /// Falls back to the code when absent.
    pub name: Option<String>,
    pub list_price: Option<f64>,
    pub standard_price: Option<f64>,
    /// Product type as understood by the store (e.g. "consu", "service").
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl ProductSpec {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.default_code)
    }
}

#[derive(Debug, Deserialize)]
pub struct BomSpec {
    pub product_default_code: String,
    /// Units of the parent produced by one BOM; defaults to 1.
    pub quantity: Option<f64>,
    pub lines: Vec<BomLineSpec>,
}

#[derive(Debug, Deserialize)]
pub struct BomLineSpec {
    pub product: String,
    pub qty: f64,
}

#[derive(Debug, Deserialize)]
pub struct RoutingSpec {
    pub product: String,
    pub steps: Vec<String>,
    /// Minutes per step, same length as `steps`.
    #[serde(default)]
    pub durations: Vec<f64>,
    /// Work-center code the steps run on.
    pub workcenter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderSpec {
    pub product_default_code: String,
    pub qty: f64,
    pub deadline: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub rush: bool,
}

/// State a production order should be left in after creation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Draft,
    Confirmed,
}

impl Batch {
    pub fn from_json(text: &str) -> Result<Self, MrpError> {
        let batch: Self = serde_json::from_str(text)
            .map_err(|e| MrpError::InvalidBatch(format!("cannot parse batch: {e}")))?;
        batch.validate()?;
        Ok(batch)
    }

    pub fn load(path: &Path) -> Result<Self, MrpError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MrpError::from(e).context(format!("reading {}", path.display())))?;
        Self::from_json(&text)
    }

    /// Structural checks that need no remote state. Cross-stage references
    /// are resolved by the pipeline itself.
    pub fn validate(&self) -> Result<(), MrpError> {
        unique_codes("work-center", self.workcenters.iter().map(|w| w.code.as_str()))?;
        unique_codes("product", self.products.iter().map(|p| p.default_code.as_str()))?;

        for bom in &self.bom {
            if bom.quantity.is_some_and(|q| q <= 0.0) {
                return Err(MrpError::InvalidBatch(format!(
                    "BOM for '{}' has non-positive quantity",
                    bom.product_default_code
                )));
            }
            if let Some(line) = bom.lines.iter().find(|l| l.qty <= 0.0) {
                return Err(MrpError::InvalidBatch(format!(
                    "BOM for '{}' has non-positive quantity for component '{}'",
                    bom.product_default_code, line.product
                )));
            }
        }

        for routing in &self.routing {
            if routing.steps.len() != routing.durations.len() {
                return Err(MrpError::InvalidBatch(format!(
                    "routing for '{}' has {} steps but {} durations",
                    routing.product,
                    routing.steps.len(),
                    routing.durations.len()
                )));
            }
        }

        for order in &self.mrp_orders {
            if order.qty <= 0.0 {
                return Err(MrpError::InvalidBatch(format!(
                    "order for '{}' has non-positive quantity {}",
                    order.product_default_code, order.qty
                )));
            }
        }
        Ok(())
    }
}

fn unique_codes<'a>(what: &str, codes: impl Iterator<Item = &'a str>) -> Result<(), MrpError> {
    let mut seen = HashSet::new();
    for code in codes {
        if code.trim().is_empty() {
            return Err(MrpError::InvalidBatch(format!("{what} with empty code")));
        }
        if !seen.insert(code) {
            return Err(MrpError::InvalidBatch(format!("duplicate {what} code '{code}'")));
        }
    }
    Ok(())
}
