//! Tool for opening a manufacturing order on an existing product.
//!
//! The product is looked up by id or code and must already have a bill of
//! materials; an order without one would be rejected on confirmation anyway.

use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::lenient_text;
use crate::{
    coerce,
    domain::{self, Domain},
    error::MrpError,
    gateway::{Record, SharedStore},
};

/// Creates a manufacturing order for a product that already has a BOM.
pub struct CreateMo {
    pub(crate) store: SharedStore,
}

impl CreateMo {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Arguments for [`CreateMo`]. Numbers may arrive as strings.
#[derive(Debug, Default, Deserialize)]
pub struct CreateMoArgs {
    #[serde(default, deserialize_with = "lenient_text")]
    pub product_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub qty: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date_deadline: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CreatedMo {
    pub mo_id: i64,
    pub message: String,
}

fn product_domain(args: &CreateMoArgs) -> Result<Domain, MrpError> {
    if let Some(raw) = &args.product_id {
        let id = coerce::to_id(&json!(raw))
            .map_err(|e| MrpError::InvalidArgument(format!("product_id: {e}")))?;
        return Ok(domain::by_id(id));
    }
    match &args.product_code {
        Some(code) => Ok(domain::product_by_code(code)),
        None => Err(MrpError::InvalidArgument(
            "product_code or product_id is required".into(),
        )),
    }
}

fn parse_qty(raw: Option<&str>) -> Result<f64, MrpError> {
    let raw = raw.ok_or_else(|| MrpError::InvalidArgument("'qty' is required".into()))?;
    let qty: f64 = raw
        .trim()
        .parse()
        .map_err(|e| MrpError::InvalidArgument(format!("invalid qty '{raw}': {e}")))?;
    if !qty.is_finite() || qty <= 0.0 {
        return Err(MrpError::InvalidArgument(format!("qty must be positive, got {raw}")));
    }
    Ok(qty)
}

impl Tool for CreateMo {
    const NAME: &'static str = "create_mo";
    type Error = MrpError;
    type Args = CreateMoArgs;
    type Output = CreatedMo;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Create a manufacturing order for a product that already has a bill of materials"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "product_code": {
                        "type": "string",
                        "description": "Internal reference (default_code) of the product"
                    },
                    "product_id": {
                        "type": "string",
                        "description": "Product variant id; takes precedence over product_code"
                    },
                    "qty": {
                        "type": "string",
                        "description": "Quantity to produce"
                    },
                    "name": {
                        "type": "string",
                        "description": "Optional order reference"
                    },
                    "date_deadline": {
                        "type": "string",
                        "description": "Optional deadline, YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"
                    }
                },
                "required": ["qty"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let qty = parse_qty(args.qty.as_deref())?;
        let lookup = product_domain(&args)?;
        let store = &self.store;

        let products = store
            .search_read(
                "product.product",
                &["id", "product_tmpl_id", "default_code", "name"],
                &lookup,
            )
            .await?;
        let product = products.first().ok_or_else(|| {
            MrpError::NotFound("Product not found. Create product first or check code.".into())
        })?;
        let product_id = coerce::to_id(product.get("id").unwrap_or(&Value::Null))?;
        let template_id = coerce::to_id(product.get("product_tmpl_id").unwrap_or(&Value::Null))?;

        let boms = store
            .search_read("mrp.bom", &["id", "product_tmpl_id"], &domain::boms_for_template(template_id))
            .await?;
        if boms.is_empty() {
            return Err(MrpError::NotFound(
                "No BOM found for product. Create BOM before creating MO.".into(),
            ));
        }

        let mut values = Record::new();
        values.insert("product_id".into(), json!(product_id));
        values.insert("product_qty".into(), json!(qty));
        if let Some(name) = args.name {
            values.insert("name".into(), json!(name));
        }
        if let Some(deadline) = args.date_deadline {
            values.insert("date_deadline".into(), json!(deadline));
        }

        let mo_id = store.create("mrp.production", values).await?;
        info!(mo_id, product_id, qty, "manufacturing order created");
        Ok(CreatedMo {
            mo_id,
            message: "Manufacturing Order created".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{Call, FakeStore};

    fn args(value: Value) -> CreateMoArgs {
        serde_json::from_value(value).unwrap()
    }

    fn store_with_bom() -> FakeStore {
        FakeStore::default()
            .with_rows(
                "product.product",
                json!([{"id": 7, "product_tmpl_id": [3, "Green Tea"], "default_code": "TEA-GREEN"}]),
            )
            .with_rows("mrp.bom", json!([{"id": 2, "product_tmpl_id": [3, "Green Tea"]}]))
    }

    #[test]
    fn numeric_arguments_are_accepted_as_text() {
        let parsed = args(json!({"product_id": 7, "qty": 12.5}));
        assert_eq!(parsed.product_id.as_deref(), Some("7"));
        assert_eq!(parsed.qty.as_deref(), Some("12.5"));
    }

    #[tokio::test]
    async fn qty_is_required() {
        let tool = CreateMo::new(Arc::new(store_with_bom()));
        let err = tool.call(args(json!({"product_code": "TEA-GREEN"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: 'qty' is required");
    }

    #[tokio::test]
    async fn rejects_unparsable_product_id() {
        let tool = CreateMo::new(Arc::new(store_with_bom()));
        let err = tool
            .call(args(json!({"product_id": "seven", "qty": "1"})))
            .await
            .unwrap_err();
        assert!(matches!(err, MrpError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let fake = Arc::new(FakeStore::default());
        let err = CreateMo::new(fake.clone())
            .call(args(json!({"product_code": "NOPE", "qty": "5"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Product not found"));
        assert_eq!(fake.creates_on("mrp.production"), 0);
    }

    #[tokio::test]
    async fn product_without_bom_is_refused() {
        let fake = Arc::new(FakeStore::default().with_rows(
            "product.product",
            json!([{"id": 7, "product_tmpl_id": [3, "Green Tea"]}]),
        ));
        let err = CreateMo::new(fake.clone())
            .call(args(json!({"product_code": "TEA-GREEN", "qty": "5"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No BOM found"));
        assert_eq!(fake.creates_on("mrp.production"), 0);
    }

    #[tokio::test]
    async fn creates_order_on_variant() {
        let fake = Arc::new(store_with_bom());
        let out = CreateMo::new(fake.clone())
            .call(args(json!({
                "product_code": "TEA-GREEN",
                "qty": "250",
                "date_deadline": "2025-02-01"
            })))
            .await
            .unwrap();
        assert_eq!(out.mo_id, 1);
        assert_eq!(out.message, "Manufacturing Order created");

        let created = fake.created("mrp.production");
        assert_eq!(created[0]["product_id"], 7);
        assert_eq!(created[0]["product_qty"], 250.0);
        assert_eq!(created[0]["date_deadline"], "2025-02-01");
        assert!(!created[0].contains_key("name"));
        assert!(matches!(
            &fake.calls()[1],
            Call::SearchRead { model, domain } if model == "mrp.bom" && *domain == domain::boms_for_template(3)
        ));
    }
}
