//! Narrated production plan for one manufacturing order.

use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    agent::narrator::SharedNarrator,
    domain,
    error::MrpError,
    gateway::{Record, SharedStore},
};

const PLAN_FIELDS: [&str; 5] = ["id", "name", "product_id", "product_qty", "date_deadline"];

/// Asks the narrator for a short plan for one order.
pub struct ProductionPlanner {
    pub(crate) store: SharedStore,
    pub(crate) narrator: SharedNarrator,
}

impl ProductionPlanner {
    pub fn new(store: SharedStore, narrator: SharedNarrator) -> Self {
        Self { store, narrator }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductionPlannerArgs {
    pub mo_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductionPlan {
    pub plan_text: String,
    pub mo: Record,
}

pub(crate) fn plan_prompt(mo: &Record) -> Result<String, MrpError> {
    Ok(format!(
        "Generate short production plan with workcenter assignment and estimated duration.\n\nMO:\n{}",
        serde_json::to_string_pretty(mo)?
    ))
}

impl Tool for ProductionPlanner {
    const NAME: &'static str = "production_planner";
    type Error = MrpError;
    type Args = ProductionPlannerArgs;
    type Output = ProductionPlan;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Draft a short production plan (work centers, estimated duration) for a manufacturing order"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "mo_id": {
                        "type": "integer",
                        "description": "Manufacturing order id"
                    }
                },
                "required": ["mo_id"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        if args.mo_id == 0 {
            return Err(MrpError::InvalidArgument("mo_id is required".into()));
        }
        let mo = self
            .store
            .search_read("mrp.production", &PLAN_FIELDS, &domain::by_id(args.mo_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MrpError::NotFound(format!("manufacturing order {}", args.mo_id)))?;

        let plan_text = self.narrator.narrate(&plan_prompt(&mo)?).await?;
        Ok(ProductionPlan { plan_text, mo })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{agent::narrator::fake::ScriptedNarrator, testing::FakeStore};

    fn store() -> Arc<FakeStore> {
        Arc::new(FakeStore::default().with_rows(
            "mrp.production",
            json!([{"id": 4, "name": "WH/MO/00004", "product_id": [7, "Green Tea"], "product_qty": 100.0}]),
        ))
    }

    #[tokio::test]
    async fn narrates_plan_for_order() {
        let narrator = Arc::new(ScriptedNarrator::replying("1. Blend on line A (45 min)"));
        let tool = ProductionPlanner::new(store(), narrator.clone());
        let plan = tool.call(ProductionPlannerArgs { mo_id: 4 }).await.unwrap();

        assert_eq!(plan.plan_text, "1. Blend on line A (45 min)");
        assert_eq!(plan.mo["name"], "WH/MO/00004");
        let prompts = narrator.prompts();
        assert!(prompts[0].starts_with("Generate short production plan"));
        assert!(prompts[0].contains("\"WH/MO/00004\""));
    }

    #[tokio::test]
    async fn missing_order_skips_narration() {
        let narrator = Arc::new(ScriptedNarrator::replying("unused"));
        let tool = ProductionPlanner::new(Arc::new(FakeStore::default()), narrator.clone());
        let err = tool.call(ProductionPlannerArgs { mo_id: 4 }).await.unwrap_err();
        assert!(matches!(err, MrpError::NotFound(_)));
        assert!(narrator.prompts().is_empty());
    }

    #[tokio::test]
    async fn narration_failure_surfaces() {
        let tool = ProductionPlanner::new(store(), Arc::new(ScriptedNarrator::failing()));
        let err = tool.call(ProductionPlannerArgs { mo_id: 4 }).await.unwrap_err();
        assert_eq!(err.to_string(), "narration failed: model unavailable");
    }
}
