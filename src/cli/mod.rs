use clap::Parser;
use crate::llm::ChatModel;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Inference Provider Args ---
    /// Name of the environment variable holding the Groq API key.
    #[arg(long, env = "CREDENTIAL_ENV", default_value = "GROQ_API_KEY")]
    pub credential_env: String,

    /// Base URL for the Groq API.
    #[arg(long, env = "GROQ_BASE_URL", default_value = "https://api.groq.com")]
    pub groq_base_url: String,

    /// Model used when a request does not pick one (mixtral-8x7b-32768, llama2-70b-4096)
    #[arg(long, env = "DEFAULT_MODEL", default_value = "mixtral-8x7b-32768")]
    pub default_model: ChatModel,

    /// Sampling temperature sent with every completion request.
    #[arg(long, env = "TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Upper bound on generated tokens per response.
    #[arg(long, env = "MAX_TOKENS", default_value = "1024")]
    pub max_tokens: u32,

    /// Timeout in seconds for a single completion request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    // --- Conversation Args ---
    /// Default conversational memory length (number of turns, 1 to 10).
    #[arg(long, env = "MEMORY_LENGTH", default_value = "5")]
    pub memory_length: usize,

    /// Optional JSON file overriding the conversation template.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Server Args ---
    /// Host address and port for the chat WebSocket server.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Port for the HTTP server that serves the UI and JSON API. It binds
    /// the same host as `server_addr` so the page can always reach the socket.
    #[arg(long, env = "HTTP_PORT", default_value = "8080")]
    pub http_port: u16,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    /// Host half of `server_addr`, shared by both listeners.
    pub fn bind_host(&self) -> &str {
        self.server_addr.rsplit_once(':').map(|(host, _)| host).unwrap_or("127.0.0.1")
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.bind_host(), self.http_port)
    }

    /// Port half of `server_addr`, handed to the browser so it can open the socket.
    pub fn ws_port(&self) -> Option<u16> {
        self.server_addr.rsplit(':').next().and_then(|p| p.parse().ok())
    }
}
