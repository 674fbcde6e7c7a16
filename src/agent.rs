use crate::cli::Args;
use crate::config::credential::{ require_credential, CredentialError };
use crate::config::prompt::{ load_prompts_or_default, PromptError };
use crate::history::ChatLog;
use crate::llm::{ ChatModel, LlmConfig, LlmError, ParseChatModelError };
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::memory::{ ConversationMemory, InvalidWindowLength, WindowLength };
use crate::models::chat::Turn;

use log::{ info, error };
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Startup failures. All of them stop the service before it accepts a
/// single connection.
#[derive(Debug, Error)]
pub enum AgentInitError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("invalid default memory length: {0}")]
    MemoryLength(#[from] InvalidWindowLength),
}

/// Per-request failures. The session's log is left untouched.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Please enter a question.")]
    EmptyQuestion,
    #[error(transparent)]
    UnsupportedModel(#[from] ParseChatModelError),
    #[error(transparent)]
    InvalidWindowLength(#[from] InvalidWindowLength),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// State owned by one interactive session (one WebSocket connection).
#[derive(Debug)]
pub struct ChatSession {
    id: String,
    log: ChatLog,
}

impl ChatSession {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4().to_string(), log: ChatLog::new() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub question: String,
    pub model: Option<String>,
    pub memory_length: Option<usize>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), model: None, memory_length: None }
    }
}

/// Runs conversation cycles. Holds no per-session state, so one instance
/// is shared by every connection.
#[derive(Clone)]
pub struct MentorAgent {
    chat_client: Arc<dyn ChatClient>,
    default_model: ChatModel,
    default_memory_length: WindowLength,
}

impl MentorAgent {
    pub fn new(args: &Args) -> Result<Self, AgentInitError> {
        let api_key = require_credential(&args.credential_env)?;
        let default_memory_length = WindowLength::new(args.memory_length)?;
        let prompt_config = load_prompts_or_default(args.prompts_path.as_deref())?;

        let llm_config = LlmConfig {
            api_key: Some(api_key),
            base_url: Some(args.groq_base_url.clone()),
            temperature: args.temperature,
            max_tokens: args.max_tokens,
            timeout_secs: args.request_timeout_secs,
        };
        let chat_client = new_chat_client(&llm_config, prompt_config)?;
        info!(
            "Chat client configured: BaseURL={}, DefaultModel={}, Temperature={}, MaxTokens={}",
            chat_client.get_base_url().as_deref().unwrap_or("adapter default"),
            args.default_model,
            llm_config.temperature,
            llm_config.max_tokens
        );

        Ok(Self::with_client(chat_client, args.default_model, default_memory_length))
    }

    pub fn with_client(
        chat_client: Arc<dyn ChatClient>,
        default_model: ChatModel,
        default_memory_length: WindowLength
    ) -> Self {
        Self { chat_client, default_model, default_memory_length }
    }

    pub fn default_model(&self) -> ChatModel {
        self.default_model
    }

    pub fn default_memory_length(&self) -> WindowLength {
        self.default_memory_length
    }

    /// One full cycle: rebuild memory from the session log, ask the model,
    /// record the exchange. Nothing is recorded unless the model answered.
    pub async fn process_message(
        &self,
        session: &mut ChatSession,
        request: ChatRequest
    ) -> Result<String, AgentError> {
        if request.question.is_empty() {
            return Err(AgentError::EmptyQuestion);
        }
        let model = match request.model.as_deref() {
            Some(m) => m.parse::<ChatModel>()?,
            None => self.default_model,
        };
        let window = match request.memory_length {
            Some(k) => WindowLength::new(k)?,
            None => self.default_memory_length,
        };

        let memory = ConversationMemory::rebuild(session.log.all(), window);
        info!(
            "Session {}: {} of {} turns in context (k={}), model {}",
            session.id,
            memory.len(),
            session.log.len(),
            window,
            model
        );
        let context = memory.render();

        let response = self.chat_client
            .complete(model, &context, &request.question).await
            .map_err(|e| {
                error!("LLM interaction error for session {}: {}", session.id, e);
                e
            })?;

        session.log.append(Turn::new(request.question, response.response.clone()));
        Ok(response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::CompletionResponse;
    use async_trait::async_trait;
    use clap::Parser;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedClient {
        calls: Mutex<Vec<(ChatModel, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(
            &self,
            model: ChatModel,
            context: &str,
            input: &str
        ) -> Result<CompletionResponse, LlmError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((model, context.to_string(), input.to_string()));
            if self.fail {
                return Err(LlmError::Provider("connection reset".into()));
            }
            Ok(CompletionResponse { response: format!("answer {}", calls.len()) })
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn agent(client: Arc<ScriptedClient>) -> MentorAgent {
        MentorAgent::with_client(client, ChatModel::default(), WindowLength::default())
    }

    #[tokio::test]
    async fn first_question_has_empty_context() {
        let client = Arc::new(ScriptedClient::default());
        let mut session = ChatSession::new();
        let reply = agent(client.clone())
            .process_message(&mut session, ChatRequest::new("What is recursion?")).await
            .unwrap();

        assert_eq!(reply, "answer 1");
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.log().all()[0].human, "What is recursion?");
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[0], (ChatModel::Mixtral8x7b, String::new(), "What is recursion?".into()));
    }

    #[tokio::test]
    async fn context_excludes_in_flight_turn() {
        let client = Arc::new(ScriptedClient::default());
        let agent = agent(client.clone());
        let mut session = ChatSession::new();
        agent.process_message(&mut session, ChatRequest::new("one")).await.unwrap();
        agent.process_message(&mut session, ChatRequest::new("two")).await.unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[1].1, "Human: one\nAI: answer 1");
        assert!(!calls[1].1.contains("two"));
    }

    #[tokio::test]
    async fn provider_failure_leaves_log_unchanged() {
        let client = Arc::new(ScriptedClient { fail: true, ..Default::default() });
        let mut session = ChatSession::new();
        let err = agent(client)
            .process_message(&mut session, ChatRequest::new("hello")).await
            .unwrap_err();
        assert!(matches!(err, AgentError::Llm(LlmError::Provider(_))));
        assert!(session.log().is_empty());
    }

    #[tokio::test]
    async fn invalid_controls_are_rejected_before_calling_the_model() {
        let client = Arc::new(ScriptedClient::default());
        let agent = agent(client.clone());
        let mut session = ChatSession::new();

        let bad_model = ChatRequest { model: Some("gpt-4".into()), ..ChatRequest::new("q") };
        assert!(matches!(
            agent.process_message(&mut session, bad_model).await,
            Err(AgentError::UnsupportedModel(_))
        ));
        let bad_window = ChatRequest { memory_length: Some(0), ..ChatRequest::new("q") };
        assert!(matches!(
            agent.process_message(&mut session, bad_window).await,
            Err(AgentError::InvalidWindowLength(_))
        ));
        assert!(matches!(
            agent.process_message(&mut session, ChatRequest::new("")).await,
            Err(AgentError::EmptyQuestion)
        ));

        assert!(client.calls.lock().unwrap().is_empty());
        assert!(session.log().is_empty());
    }

    #[tokio::test]
    async fn whitespace_question_is_still_sent() {
        let client = Arc::new(ScriptedClient::default());
        let mut session = ChatSession::new();
        agent(client.clone())
            .process_message(&mut session, ChatRequest::new("   ")).await
            .unwrap();

        assert_eq!(client.calls.lock().unwrap()[0].2, "   ");
        assert_eq!(session.log().all()[0].human, "   ");
    }

    #[tokio::test]
    async fn per_request_model_and_window_are_honoured() {
        let client = Arc::new(ScriptedClient::default());
        let agent = agent(client.clone());
        let mut session = ChatSession::new();
        for q in ["a", "b", "c"] {
            agent.process_message(&mut session, ChatRequest::new(q)).await.unwrap();
        }
        let request = ChatRequest {
            model: Some("llama2-70b-4096".into()),
            memory_length: Some(1),
            ..ChatRequest::new("d")
        };
        agent.process_message(&mut session, request).await.unwrap();

        let calls = client.calls.lock().unwrap();
        let last = calls.last().unwrap();
        assert_eq!(last.0, ChatModel::Llama2_70b);
        assert_eq!(last.1, "Human: c\nAI: answer 3");
    }

    #[test]
    fn missing_credential_fails_startup() {
        let mut args = Args::try_parse_from(["coding-mentor"]).unwrap();
        args.credential_env = "CODING_MENTOR_AGENT_TEST_UNSET_KEY".into();
        let err = MentorAgent::new(&args).err().unwrap();
        assert!(matches!(err, AgentInitError::Credential(CredentialError::Missing(_))));
    }
}
