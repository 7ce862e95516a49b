use std::sync::Arc;

use async_trait::async_trait;
use rig::{
    agent::Agent,
    completion::Prompt,
    providers::anthropic::completion::CompletionModel,
};

use crate::error::MrpError;

/// Free-text generation used by the narrating tools (planner, schedule
/// analysis). Kept separate from the chat agent so those tools never recurse
/// into tool calls.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, prompt: &str) -> Result<String, MrpError>;
}

pub type SharedNarrator = Arc<dyn Narrator>;

#[async_trait]
impl Narrator for Agent<CompletionModel> {
    async fn narrate(&self, prompt: &str) -> Result<String, MrpError> {
        self.prompt(prompt.to_string())
            .await
            .map_err(|e| MrpError::Narration(e.to_string()))
    }
}
