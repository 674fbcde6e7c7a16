use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;
use thiserror::Error;

const HISTORY_PLACEHOLDER: &str = "{history}";
const INPUT_PLACEHOLDER: &str = "{input}";

pub const DEFAULT_CONVERSATION_TEMPLATE: &str =
    "The following is a friendly conversation between a human and an AI. \
The AI is talkative and provides lots of specific details from its context. \
If the AI does not know the answer to a question, it truthfully says it does not know.\n\n\
Current conversation:\n{history}\nHuman: {input}\nAI:";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Conversation template is missing the '{0}' placeholder")]
    MissingPlaceholder(&'static str),
}

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_template")]
    pub conversation_template: String,
}

fn default_template() -> String {
    DEFAULT_CONVERSATION_TEMPLATE.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { conversation_template: default_template() }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        for placeholder in [HISTORY_PLACEHOLDER, INPUT_PLACEHOLDER] {
            if !self.conversation_template.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder(placeholder));
            }
        }
        Ok(())
    }

    /// Fills the template in a single pass so placeholder-looking text
    /// inside the history or the question is left alone.
    pub fn render(&self, history: &str, input: &str) -> String {
        let mut out = String::with_capacity(
            self.conversation_template.len() + history.len() + input.len()
        );
        let mut rest = self.conversation_template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(HISTORY_PLACEHOLDER) {
                out.push_str(history);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(INPUT_PLACEHOLDER) {
                out.push_str(input);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded conversation template from {}", path.as_ref().display());
    Ok(Arc::new(config))
}

/// Uses the file at `path` when given, the built-in template otherwise.
pub fn load_prompts_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_prompts(p),
        _ => Ok(Arc::new(PromptConfig::default())),
    }
}
