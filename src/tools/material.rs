//! Tool for checking whether the components of a product's bills of
//! materials are on hand.
//!
//! Resolves the variant (directly or through a manufacturing order), finds
//! the BOMs on its template, then sums `stock.quant` quantities per
//! component. When called with an order, required quantities are scaled to
//! the order size.

use std::collections::HashMap;

use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    coerce,
    domain::{self, Domain},
    error::MrpError,
    gateway::{Record, SharedStore},
};

/// Compares BOM component needs with on-hand stock.
pub struct MaterialAvailability {
    pub(crate) store: SharedStore,
}

impl MaterialAvailability {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Arguments for [`MaterialAvailability`]. One of the two is required.
#[derive(Debug, Default, Deserialize)]
pub struct MaterialAvailabilityArgs {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub mo_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ComponentAvailability {
    pub product_id: i64,
    pub product: String,
    /// Quantity per BOM run.
    pub per_bom: f64,
    /// Quantity needed for the order, when checked against one.
    pub required: Option<f64>,
    pub on_hand: f64,
    pub short: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MaterialReport {
    pub product_id: i64,
    pub template_id: i64,
    pub mo_qty: Option<f64>,
    pub bom_ids: Vec<i64>,
    pub components: Vec<ComponentAvailability>,
}

fn field<'a>(record: &'a Record, name: &str) -> &'a Value {
    record.get(name).unwrap_or(&Value::Null)
}

impl MaterialAvailability {
    /// Product and order quantity from the arguments.
    async fn target(&self, args: &MaterialAvailabilityArgs) -> Result<(i64, Option<f64>), MrpError> {
        match (args.product_id, args.mo_id) {
            (Some(pid), _) if pid != 0 => Ok((pid, None)),
            (_, Some(mo)) if mo != 0 => {
                let rows = self
                    .store
                    .search_read("mrp.production", &["product_id", "product_qty"], &domain::by_id(mo))
                    .await?;
                let row = rows
                    .first()
                    .ok_or_else(|| MrpError::NotFound(format!("manufacturing order {mo}")))?;
                Ok((
                    coerce::to_id(field(row, "product_id"))?,
                    Some(coerce::to_f64(field(row, "product_qty"))?),
                ))
            }
            _ => Err(MrpError::InvalidArgument("product_id or mo_id required".into())),
        }
    }
}

impl Tool for MaterialAvailability {
    const NAME: &'static str = "material_availability";
    type Error = MrpError;
    type Args = MaterialAvailabilityArgs;
    type Output = MaterialReport;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Check BOM components and current stock for a product or manufacturing order"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "product_id": {
                        "type": "integer",
                        "description": "Product variant id"
                    },
                    "mo_id": {
                        "type": "integer",
                        "description": "Manufacturing order id; components are scaled to its quantity"
                    }
                }
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let (product_id, mo_qty) = self.target(&args).await?;
        let store = &self.store;

        let products = store
            .read("product.product", &[product_id], &["product_tmpl_id"])
            .await?;
        let product = products
            .first()
            .ok_or_else(|| MrpError::NotFound(format!("product {product_id}")))?;
        let template_id = coerce::to_id(field(product, "product_tmpl_id"))?;

        let boms = store
            .search_read("mrp.bom", &["id", "product_qty"], &domain::boms_for_template(template_id))
            .await?;
        let mut bom_ids = Vec::with_capacity(boms.len());
        let mut bom_qty = HashMap::new();
        for bom in &boms {
            let id = coerce::to_id(field(bom, "id"))?;
            // A BOM yields at least one unit; zero or garbage counts as 1.
            let yields = coerce::to_f64(field(bom, "product_qty"))
                .ok()
                .filter(|q| q.is_finite() && *q > 0.0)
                .unwrap_or(1.0);
            bom_qty.insert(id, yields);
            bom_ids.push(id);
        }

        let mut components = Vec::new();
        if !bom_ids.is_empty() {
            let lines = store
                .search_read(
                    "mrp.bom.line",
                    &["bom_id", "product_id", "product_qty"],
                    &Domain::all().filter("bom_id", "in", json!(bom_ids)),
                )
                .await?;

            let component_ids = lines
                .iter()
                .map(|l| coerce::to_id(field(l, "product_id")))
                .collect::<Result<Vec<_>, _>>()?;
            let quants = store
                .search_read(
                    "stock.quant",
                    &["product_id", "quantity"],
                    &Domain::all().filter("product_id", "in", json!(component_ids)),
                )
                .await?;
            let mut on_hand: HashMap<i64, f64> = HashMap::new();
            for quant in &quants {
                *on_hand.entry(coerce::to_id(field(quant, "product_id"))?).or_default() +=
                    coerce::to_f64(field(quant, "quantity"))?;
            }

            for (line, component_id) in lines.iter().zip(component_ids) {
                let per_bom = coerce::to_f64(field(line, "product_qty"))?;
                let bom_id = coerce::to_id(field(line, "bom_id"))?;
                let required = mo_qty.map(|qty| per_bom * qty / bom_qty.get(&bom_id).copied().unwrap_or(1.0));
                let available = on_hand.get(&component_id).copied().unwrap_or(0.0);
                components.push(ComponentAvailability {
                    product_id: component_id,
                    product: coerce::reference_label(field(line, "product_id"))
                        .unwrap_or_default()
                        .to_string(),
                    per_bom,
                    required,
                    on_hand: available,
                    short: available < required.unwrap_or(per_bom),
                });
            }
        }

        Ok(MaterialReport {
            product_id,
            template_id,
            mo_qty,
            bom_ids,
            components,
        })
    }
}
