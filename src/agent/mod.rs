pub mod narrator;
pub mod prompts;

use std::sync::Arc;

use rig::{
    agent::Agent,
    client::{CompletionClient, ProviderClient},
    providers::{anthropic, anthropic::completion::CompletionModel},
};

use crate::{error::MrpError, gateway::SharedStore, tools::*};
use narrator::SharedNarrator;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

fn anthropic_client() -> Result<anthropic::Client, MrpError> {
    if std::env::var(API_KEY_VAR).map_or(true, |k| k.trim().is_empty()) {
        return Err(MrpError::Narration(format!("{API_KEY_VAR} is not set")));
    }
    Ok(anthropic::Client::from_env())
}

/// Build the planning copilot backed by Claude, with every manufacturing tool
/// registered.
///
/// Reads `ANTHROPIC_API_KEY` from the environment. Pass `model` to override the
/// default Claude model.
pub fn build_copilot(
    store: &SharedStore,
    narrator: &SharedNarrator,
    model: Option<&str>,
) -> Result<Agent<CompletionModel>, MrpError> {
    let client = anthropic_client()?;
    let model = model.unwrap_or(DEFAULT_MODEL);

    Ok(client
        .agent(model)
        .preamble(prompts::COPILOT_SYSTEM_PROMPT)
        .tool(ListActiveOrders::new(store.clone()))
        .tool(ListAllOrders::new(store.clone()))
        .tool(ListProductMeta::new(store.clone()))
        .tool(MaterialAvailability::new(store.clone()))
        .tool(CapacityCheck::new(store.clone()))
        .tool(CreateMo::new(store.clone()))
        .tool(AddProduct::new(store.clone()))
        .tool(OrderPriority::new(store.clone()))
        .tool(OrderRisk::new(store.clone()))
        .tool(ProductionPlanner::new(store.clone(), narrator.clone()))
        .tool(ScheduleAnalysis::new(store.clone(), narrator.clone()))
        .default_max_turns(10)
        .build())
}

/// Tool-less agent used for free-text plans and analyses.
pub fn build_narrator(model: Option<&str>) -> Result<SharedNarrator, MrpError> {
    let client = anthropic_client()?;
    let agent = client
        .agent(model.unwrap_or(DEFAULT_MODEL))
        .preamble(prompts::NARRATOR_PREAMBLE)
        .build();
    let narrator: SharedNarrator = Arc::new(agent);
    Ok(narrator)
}
