//! Tool for reading the catalogue metadata needed to create products:
//! categories, units of measure, attributes (with their values) and
//! existing templates.

use std::collections::BTreeMap;

use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    coerce,
    domain::{self, Domain},
    error::MrpError,
    gateway::{Record, SharedStore},
};

/// Fetches product metadata, optionally narrowed by a name filter.
pub struct ListProductMeta {
    pub(crate) store: SharedStore,
}

impl ListProductMeta {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Arguments for [`ListProductMeta`].
#[derive(Debug, Default, Deserialize)]
pub struct ListProductMetaArgs {
    /// Case-insensitive name filter for categories, units and templates.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductMeta {
    pub categories: Vec<Record>,
    pub uoms: Vec<Record>,
    pub attributes: Vec<Record>,
    /// Attribute values grouped by attribute id.
    pub attribute_values: BTreeMap<i64, Vec<Record>>,
    pub templates: Vec<Record>,
}

/// Group `product.attribute.value` rows under their `attribute_id`.
fn group_by_attribute(values: Vec<Record>) -> Result<BTreeMap<i64, Vec<Record>>, MrpError> {
    let mut grouped: BTreeMap<i64, Vec<Record>> = BTreeMap::new();
    for value in values {
        let attribute = value
            .get("attribute_id")
            .ok_or_else(|| MrpError::ProtocolViolation("attribute value without attribute_id".into()))?;
        grouped.entry(coerce::to_id(attribute)?).or_default().push(value);
    }
    Ok(grouped)
}

impl Tool for ListProductMeta {
    const NAME: &'static str = "list_product_meta";
    type Error = MrpError;
    type Args = ListProductMetaArgs;
    type Output = ProductMeta;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "List product categories, units of measure, attributes and templates \
                          useful when creating products"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "string",
                        "description": "Optional case-insensitive name filter (e.g. 'tea', 'kg')"
                    }
                }
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let by_name = domain::name_like(args.filter.as_deref().unwrap_or_default());
        let store = &self.store;

        let categories = store
            .search_read("product.category", &["id", "name", "parent_id"], &by_name)
            .await?;
        let uoms = store
            .search_read("uom.uom", &["id", "name", "factor", "category_id"], &by_name)
            .await?;
        let attributes = store
            .search_read("product.attribute", &["id", "name"], &Domain::all())
            .await?;
        let values = store
            .search_read("product.attribute.value", &["id", "name", "attribute_id"], &Domain::all())
            .await?;
        let templates = store
            .search_read("product.template", &["id", "name", "default_code"], &by_name)
            .await?;

        Ok(ProductMeta {
            categories,
            uoms,
            attributes,
            attribute_values: group_by_attribute(values)?,
            templates,
        })
    }
}
