//! Tools listing manufacturing orders.
//!
//! Both tools read `mrp.production` and flatten each record into an
//! [`OrderSummary`]: the `[id, label]` product reference becomes a name plus an
//! id, work orders become a plain id list.

use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    coerce,
    domain::{self, Domain},
    error::MrpError,
    gateway::{Record, SharedStore},
};

pub(crate) const ORDER_MODEL: &str = "mrp.production";

pub(crate) const ORDER_FIELDS: [&str; 7] = [
    "id",
    "name",
    "product_id",
    "product_qty",
    "date_deadline",
    "state",
    "workorder_ids",
];

/// One manufacturing order, flattened for the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub id: i64,
    /// Order reference such as "WH/MO/00012".
    pub name: String,
    pub product: String,
    pub product_id: Option<i64>,
    pub qty: f64,
    /// Deadline as stored remotely ("YYYY-MM-DD HH:MM:SS"), if any.
    pub deadline: Option<String>,
    pub state: String,
    pub workorder_ids: Vec<i64>,
}

impl OrderSummary {
    pub fn from_record(record: &Record) -> Result<Self, MrpError> {
        let field = |name: &str| record.get(name).unwrap_or(&Value::Null);
        let workorder_ids = match field("workorder_ids") {
            Value::Array(ids) => ids.iter().map(coerce::to_id).collect::<Result<_, _>>()?,
            _ => Vec::new(),
        };
        Ok(Self {
            id: coerce::to_id(field("id"))?,
            name: coerce::text(field("name")).unwrap_or_default().to_string(),
            product: coerce::reference_label(field("product_id"))
                .unwrap_or_default()
                .to_string(),
            product_id: coerce::to_id(field("product_id")).ok(),
            qty: coerce::to_f64(field("product_qty"))?,
            deadline: coerce::text(field("date_deadline")).map(str::to_string),
            state: coerce::text(field("state")).unwrap_or_default().to_string(),
            workorder_ids,
        })
    }
}

/// Orders matched by a tool, with their count.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderList {
    pub count: usize,
    pub orders: Vec<OrderSummary>,
}

pub(crate) async fn fetch_orders(store: &SharedStore, domain: &Domain) -> Result<Vec<OrderSummary>, MrpError> {
    store
        .search_read(ORDER_MODEL, &ORDER_FIELDS, domain)
        .await?
        .iter()
        .map(OrderSummary::from_record)
        .collect()
}

async fn order_list(store: &SharedStore, domain: &Domain) -> Result<OrderList, MrpError> {
    let orders = fetch_orders(store, domain).await?;
    Ok(OrderList {
        count: orders.len(),
        orders,
    })
}

/// Lists orders that are confirmed or in progress.
pub struct ListActiveOrders {
    pub(crate) store: SharedStore,
}

impl ListActiveOrders {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Arguments for [`ListActiveOrders`]. Takes no parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListActiveOrdersArgs {}

impl Tool for ListActiveOrders {
    const NAME: &'static str = "list_active_orders";
    type Error = MrpError;
    type Args = ListActiveOrdersArgs;
    type Output = OrderList;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "List manufacturing orders currently confirmed or in progress".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn call(&self, _args: Self::Args) -> Result<Self::Output, Self::Error> {
        order_list(&self.store, &domain::active_orders()).await
    }
}

/// Lists every order that is not done yet, drafts included.
pub struct ListAllOrders {
    pub(crate) store: SharedStore,
}

impl ListAllOrders {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Arguments for [`ListAllOrders`]. Takes no parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListAllOrdersArgs {}

impl Tool for ListAllOrders {
    const NAME: &'static str = "list_all_orders";
    type Error = MrpError;
    type Args = ListAllOrdersArgs;
    type Output = OrderList;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "List all manufacturing orders except those already done".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn call(&self, _args: Self::Args) -> Result<Self::Output, Self::Error> {
        order_list(&self.store, &domain::open_orders()).await
    }
}
