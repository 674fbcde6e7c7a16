use crate::agent::MentorAgent;
use crate::cli::Args;
use crate::llm::ChatModel;
use crate::memory::WindowLength;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::get,
    Router,
    Json,
    extract::State,
    response::{ Html, IntoResponse },
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use log::{info, error};

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Serialize)]
struct MemoryLengthRange {
    min: usize,
    max: usize,
    default: usize,
}

#[derive(Serialize)]
struct ConfigResponse {
    models: Vec<&'static str>,
    default_model: &'static str,
    memory_length: MemoryLengthRange,
    ws_port: Option<u16>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    agent: Arc<MentorAgent>,
    ws_port: Option<u16>,
}

impl AppState {
    pub fn new(agent: Arc<MentorAgent>, ws_port: Option<u16>) -> Self {
        Self { agent, ws_port }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/config", get(config_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    agent: Arc<MentorAgent>,
    args: Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.http_addr().parse::<SocketAddr>()?;
    info!("Starting HTTP server on: http://{}", addr);

    let app = router(AppState::new(agent, args.ws_port()));
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
        e
    })?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            error!("HTTP server error: {}", e);
        }
    });

    info!("HTTP server started");
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn config_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(ConfigResponse {
        models: ChatModel::ALL.iter().map(|m| m.as_str()).collect(),
        default_model: state.agent.default_model().as_str(),
        memory_length: MemoryLengthRange {
            min: WindowLength::MIN,
            max: WindowLength::MAX,
            default: state.agent.default_memory_length().get(),
        },
        ws_port: state.ws_port,
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
