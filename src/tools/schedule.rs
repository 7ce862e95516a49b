//! Narrated analysis of how a rush order fits the current schedule under a
//! planning profile such as "Cost-Aware" or "Throughput".

use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::orders::{fetch_orders, OrderSummary};
use crate::{
    agent::narrator::SharedNarrator,
    domain::{self, Domain},
    error::MrpError,
    gateway::{Record, SharedStore},
};

const DEFAULT_PROFILE: &str = "Balanced";
const DEFAULT_RUSH_PRODUCT: &str = "RUSH-TEA";
const DEFAULT_RUSH_QTY: f64 = 1000.0;
/// Products included in the narration context.
const CONTEXT_PRODUCTS: usize = 50;

/// Asks the narrator how a rush order fits the current schedule.
pub struct ScheduleAnalysis {
    pub(crate) store: SharedStore,
    pub(crate) narrator: SharedNarrator,
}

impl ScheduleAnalysis {
    pub fn new(store: SharedStore, narrator: SharedNarrator) -> Self {
        Self { store, narrator }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleAnalysisArgs {
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub rush_product: Option<String>,
    #[serde(default)]
    pub rush_qty: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    pub profile: String,
    pub analysis: String,
}

#[derive(Serialize)]
struct ScheduleContext<'a> {
    manufacturing_orders: &'a [OrderSummary],
    products: &'a [Record],
}

fn schedule_prompt(
    profile: &str,
    rush_product: &str,
    rush_qty: f64,
    context: &ScheduleContext<'_>,
) -> Result<String, MrpError> {
    Ok(format!(
        "Profile: {profile}\nContext: {}\n\nTask: A new RUSH order (Product Code: {rush_product}, Qty: {rush_qty}) \
         has arrived. Provide a concise recommendation and rationale.",
        serde_json::to_string_pretty(context)?
    ))
}

impl Tool for ScheduleAnalysis {
    const NAME: &'static str = "schedule_analysis";
    type Error = MrpError;
    type Args = ScheduleAnalysisArgs;
    type Output = ScheduleReport;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Analyse the impact of a rush order on the active schedule under a planning profile"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "profile": {
                        "type": "string",
                        "description": "Planning profile, e.g. 'Cost-Aware', 'Throughput' (default 'Balanced')"
                    },
                    "rush_product": {
                        "type": "string",
                        "description": "Product code of the rush order (default 'RUSH-TEA')"
                    },
                    "rush_qty": {
                        "type": "number",
                        "description": "Quantity of the rush order (default 1000)"
                    }
                }
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let profile = args
            .profile
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        let rush_product = args.rush_product.as_deref().unwrap_or(DEFAULT_RUSH_PRODUCT);
        let rush_qty = args.rush_qty.unwrap_or(DEFAULT_RUSH_QTY);

        let orders = fetch_orders(&self.store, &domain::active_orders()).await?;
        let mut products = self
            .store
            .search_read("product.product", &["id", "default_code", "name"], &Domain::all())
            .await?;
        products.truncate(CONTEXT_PRODUCTS);

        let context = ScheduleContext {
            manufacturing_orders: &orders,
            products: &products,
        };
        let prompt = schedule_prompt(&profile, rush_product, rush_qty, &context)?;
        let analysis = self.narrator.narrate(&prompt).await?;
        Ok(ScheduleReport { profile, analysis })
    }
}
