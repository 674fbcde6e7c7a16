pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use thiserror::Error;

/// Models the mentor can talk to. The set is closed; anything else is
/// rejected when the user picks it, not when the request reaches Groq.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ChatModel {
    #[default]
    #[serde(rename = "mixtral-8x7b-32768")]
    Mixtral8x7b,
    #[serde(rename = "llama2-70b-4096")]
    Llama2_70b,
}

impl ChatModel {
    pub const ALL: [ChatModel; 2] = [ChatModel::Mixtral8x7b, ChatModel::Llama2_70b];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModel::Mixtral8x7b => "mixtral-8x7b-32768",
            ChatModel::Llama2_70b => "llama2-70b-4096",
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseChatModelError {
    message: String,
}

impl fmt::Display for ParseChatModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseChatModelError {}

impl FromStr for ChatModel {
    type Err = ParseChatModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ChatModel::ALL
            .into_iter()
            .find(|model| model.as_str() == wanted)
            .ok_or_else(|| ParseChatModelError {
                message: format!("Unsupported model: '{}'", s),
            })
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider rejected the credential (or none was supplied).
    #[error("authentication with the inference provider failed: {0}")]
    Auth(String),
    #[error("inference provider error: {0}")]
    Provider(String),
    #[error("invalid inference client configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Provider(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}
