// Kept in its own test binary: the accept limiter is process-wide, so any
// other connection opened from the same binary would eat into the budget.

use async_trait::async_trait;
use coding_mentor::agent::MentorAgent;
use coding_mentor::llm::chat::{ ChatClient, CompletionResponse };
use coding_mentor::llm::{ ChatModel, LlmError };
use coding_mentor::memory::WindowLength;
use coding_mentor::server::websocket::serve;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;

struct Silent;

#[async_trait]
impl ChatClient for Silent {
    async fn complete(&self, _: ChatModel, _: &str, _: &str) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::Provider("not used".into()))
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

#[tokio::test]
async fn burst_above_ten_per_second_is_dropped() {
    let agent = Arc::new(MentorAgent::with_client(Arc::new(Silent), ChatModel::default(), WindowLength::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, agent));

    // The quota refills one slot every 100ms, so a slow machine lets a few
    // extra through; only the first ten are guaranteed and some of the
    // rest must be refused.
    let mut accepted = Vec::new();
    let mut refused = 0;
    for _ in 0..30 {
        match connect_async(format!("ws://{}", addr)).await {
            Ok((socket, _)) => accepted.push(socket),
            Err(_) => refused += 1,
        }
    }

    assert!(accepted.len() >= 10, "only {} connections accepted", accepted.len());
    assert!(refused > 0, "no connection was refused");
}
