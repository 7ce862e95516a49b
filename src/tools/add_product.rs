//! Tool for creating a product variant from a name and a few optional fields.

use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::lenient_text;
use crate::{error::MrpError, gateway::{Record, SharedStore}};

/// Product type used when none is given. Storable products are modelled as
/// consumables on current servers.
pub const DEFAULT_PRODUCT_TYPE: &str = "consu";

/// Creates a product variant.
pub struct AddProduct {
    pub(crate) store: SharedStore,
}

impl AddProduct {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddProductArgs {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub default_code: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub list_price: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AddedProduct {
    pub id: i64,
}

fn product_values(args: AddProductArgs) -> Result<Record, MrpError> {
    let name = args
        .name
        .ok_or_else(|| MrpError::InvalidArgument("'name' is required".into()))?;

    let mut values = Record::new();
    values.insert("name".into(), json!(name));
    values.insert(
        "type".into(),
        json!(args.kind.as_deref().unwrap_or(DEFAULT_PRODUCT_TYPE)),
    );
    if let Some(code) = args.default_code {
        values.insert("default_code".into(), json!(code));
    }
    if let Some(raw) = args.list_price {
        let price: f64 = raw
            .trim()
            .parse()
            .map_err(|e| MrpError::InvalidArgument(format!("invalid list_price '{raw}': {e}")))?;
        if !price.is_finite() || price < 0.0 {
            return Err(MrpError::InvalidArgument(format!(
                "list_price must be a non-negative number, got {raw}"
            )));
        }
        values.insert("list_price".into(), json!(price));
    }
    Ok(values)
}

impl Tool for AddProduct {
    const NAME: &'static str = "add_product";
    type Error = MrpError;
    type Args = AddProductArgs;
    type Output = AddedProduct;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Create a new product. Use list_product_meta first to avoid duplicates."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Product name"
                    },
                    "default_code": {
                        "type": "string",
                        "description": "Internal reference / SKU"
                    },
                    "type": {
                        "type": "string",
                        "description": "Product type: consu, service or combo (defaults to consu)"
                    },
                    "list_price": {
                        "type": "string",
                        "description": "Sales price"
                    }
                },
                "required": ["name"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let values = product_values(args)?;
        let id = self.store.create("product.product", values).await?;
        info!(id, "product created");
        Ok(AddedProduct { id })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::FakeStore;

    #[test]
    fn name_is_required() {
        let err = product_values(AddProductArgs::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: 'name' is required");
    }

    #[test]
    fn bad_price_is_rejected() {
        let args = AddProductArgs {
            name: Some("Jasmine".into()),
            list_price: Some("cheap".into()),
            ..Default::default()
        };
        assert!(matches!(product_values(args), Err(MrpError::InvalidArgument(_))));
    }

    #[test]
    fn non_finite_price_is_rejected() {
        for raw in ["NaN", "inf", "-1"] {
            let args = AddProductArgs {
                name: Some("Jasmine".into()),
                list_price: Some(raw.into()),
                ..Default::default()
            };
            assert!(matches!(product_values(args), Err(MrpError::InvalidArgument(_))), "{raw}");
        }
    }

    #[tokio::test]
    async fn creates_variant_with_defaults() {
        let fake = Arc::new(FakeStore::default());
        let args: AddProductArgs = serde_json::from_value(json!({
            "name": "Jasmine Tea",
            "default_code": "TEA-JAS",
            "list_price": 4.5
        }))
        .unwrap();
        let out = AddProduct::new(fake.clone()).call(args).await.unwrap();
        assert_eq!(out, AddedProduct { id: 1 });

        let created = &fake.created("product.product")[0];
        assert_eq!(created["type"], DEFAULT_PRODUCT_TYPE);
        assert_eq!(created["default_code"], "TEA-JAS");
        assert_eq!(created["list_price"], 4.5);
    }
}
