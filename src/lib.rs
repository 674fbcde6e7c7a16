pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;
pub mod memory;

use agent::MentorAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP Address: {}", args.http_addr());
    info!("Groq Base URL: {}", args.groq_base_url);
    info!("Credential Variable: {}", args.credential_env);
    info!("Default Model: {}", args.default_model);
    info!("Memory Length: {}", args.memory_length);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("-------------------------");

    // Fails before any socket is bound when the credential is missing.
    let agent = Arc::new(MentorAgent::new(&args)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args.clone());
    server.run().await?;

    Ok(())
}
