//! Rig tools over the manufacturing backend.
//!
//! Each tool implements the [`rig::tool::Tool`] trait so it can be registered
//! with a Rig agent. Every tool holds a [`SharedStore`] handle and reads or
//! writes records through [`crate::gateway::RecordStore`]; the two narrating
//! tools additionally hold a [`SharedNarrator`].
//!
//! [`invoke`] runs a single tool by name with JSON arguments, outside any
//! agent loop.

mod add_product;
mod capacity;
mod create_mo;
mod material;
mod orders;
mod planner;
mod priority;
mod product_meta;
mod risk;
mod schedule;

pub use add_product::{AddProduct, AddedProduct};
pub use capacity::{CapacityCheck, CapacityReport};
pub use create_mo::{CreateMo, CreatedMo};
pub use material::{ComponentAvailability, MaterialAvailability, MaterialReport};
pub use orders::{ListActiveOrders, ListAllOrders, OrderList, OrderSummary};
pub use planner::{ProductionPlan, ProductionPlanner};
pub use priority::{rank_orders, OrderPriority, PriorityReport, RankedOrder};
pub use product_meta::{ListProductMeta, ProductMeta};
pub use risk::{assess, OrderRisk, RiskAssessment, RiskLevel};
pub use schedule::{ScheduleAnalysis, ScheduleReport};

use rig::tool::Tool;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::{agent::narrator::SharedNarrator, coerce, error::MrpError, gateway::SharedStore};

/// Names of every tool, in registration order.
pub const TOOL_NAMES: [&str; 11] = [
    ListActiveOrders::NAME,
    ListAllOrders::NAME,
    ListProductMeta::NAME,
    MaterialAvailability::NAME,
    CapacityCheck::NAME,
    CreateMo::NAME,
    AddProduct::NAME,
    OrderPriority::NAME,
    OrderRisk::NAME,
    ProductionPlanner::NAME,
    ScheduleAnalysis::NAME,
];

/// Accept a string or a bare number for text-typed arguments. Blank strings
/// count as absent.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected text, found {}",
            coerce::shape(&other)
        ))),
    }
}

async fn run<T>(tool: T, args: Value) -> Result<Value, MrpError>
where
    T: Tool<Error = MrpError>,
{
    let args: T::Args = serde_json::from_value(args)
        .map_err(|e| MrpError::InvalidArgument(format!("{}: {e}", T::NAME)))?;
    let output = tool.call(args).await?;
    Ok(serde_json::to_value(output)?)
}

fn need_narrator(narrator: Option<&SharedNarrator>) -> Result<SharedNarrator, MrpError> {
    narrator
        .cloned()
        .ok_or_else(|| MrpError::Narration("no narration model configured".into()))
}

/// Run one tool by name. Narrating tools fail with [`MrpError::Narration`]
/// when `narrator` is `None`.
pub async fn invoke(
    store: &SharedStore,
    narrator: Option<&SharedNarrator>,
    name: &str,
    args: Value,
) -> Result<Value, MrpError> {
    debug!(tool = name, %args, "invoking tool");
    match name {
        n if n == ListActiveOrders::NAME => run(ListActiveOrders::new(store.clone()), args).await,
        n if n == ListAllOrders::NAME => run(ListAllOrders::new(store.clone()), args).await,
        n if n == ListProductMeta::NAME => run(ListProductMeta::new(store.clone()), args).await,
        n if n == MaterialAvailability::NAME => {
            run(MaterialAvailability::new(store.clone()), args).await
        }
        n if n == CapacityCheck::NAME => run(CapacityCheck::new(store.clone()), args).await,
        n if n == CreateMo::NAME => run(CreateMo::new(store.clone()), args).await,
        n if n == AddProduct::NAME => run(AddProduct::new(store.clone()), args).await,
        n if n == OrderPriority::NAME => run(OrderPriority::new(store.clone()), args).await,
        n if n == OrderRisk::NAME => run(OrderRisk::new(store.clone()), args).await,
        n if n == ProductionPlanner::NAME => {
            let narrator = need_narrator(narrator)?;
            run(ProductionPlanner::new(store.clone(), narrator), args).await
        }
        n if n == ScheduleAnalysis::NAME => {
            let narrator = need_narrator(narrator)?;
            run(ScheduleAnalysis::new(store.clone(), narrator), args).await
        }
        other => Err(MrpError::NotFound(format!("tool '{other}'"))),
    }
}
