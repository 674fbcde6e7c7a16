use async_trait::async_trait;
use log::{ debug, info, warn };
use reqwest::{ Client as HttpClient, StatusCode, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use std::time::Duration;

use super::{ ChatClient, CompletionResponse };
use crate::config::prompt::PromptConfig;
use crate::llm::{ ChatModel, LlmConfig, LlmError };

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const COMPLETIONS_ROUTE: &str = "/openai/v1/chat/completions";

pub struct GroqChatClient {
    http: HttpClient,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    prompt_config: Arc<PromptConfig>,
}

#[derive(Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct GroqRequest {
    messages: Vec<GroqMessage>,
    model: String,
    temperature: f32,
    #[serde(rename = "max_tokens")]
    max_tokens: u32,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        config: &LlmConfig,
        prompt_config: Arc<PromptConfig>
    ) -> Result<Self, LlmError> {
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
            LlmError::InvalidConfig(format!("Invalid API key format: {}", e))
        )?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: api_url,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            prompt_config,
        })
    }

    pub fn from_config(
        config: &LlmConfig,
        prompt_config: Arc<PromptConfig>
    ) -> Result<Self, LlmError> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::Auth("Groq API key is required".to_string()))?;

        Self::new(api_key, config.base_url.clone(), config, prompt_config)
    }

    fn completions_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), COMPLETIONS_ROUTE)
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(
        &self,
        model: ChatModel,
        context: &str,
        input: &str
    ) -> Result<CompletionResponse, LlmError> {
        let url = self.completions_url();
        let prompt = self.prompt_config.render(context, input);
        debug!("Groq prompt ({} chars) for model {}", prompt.len(), model);

        let req = GroqRequest {
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            model: model.as_str().to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        info!("Sending Groq completion request to {} (model {})", url, model);
        let resp = self.http.post(&url).json(&req).send().await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            warn!("Groq rejected credential: {}", status);
            return Err(LlmError::Auth(format!("{} {}", status, body.trim())));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!("Groq API error {}: {}", status, body.trim())));
        }

        let resp = resp.json::<GroqResponse>().await?;
        let content = resp.choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Provider("No response from Groq API".to_string()))?
            .message.content;

        Ok(CompletionResponse { response: content })
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
