pub mod groq;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use super::{ ChatModel, LlmConfig, LlmError };
use crate::config::prompt::PromptConfig;
use self::groq::GroqChatClient;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

/// Seam between the conversation cycle and a hosted chat-completion API.
///
/// `context` is the rendered conversation memory (possibly empty) and
/// `input` is the new question, verbatim. Implementations own transport
/// concerns such as timeouts; callers never retry.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        model: ChatModel,
        context: &str,
        input: &str
    ) -> Result<CompletionResponse, LlmError>;

    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig,
    prompt_config: Arc<PromptConfig>
) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = GroqChatClient::from_config(config, prompt_config)?;
    Ok(Arc::new(client))
}
