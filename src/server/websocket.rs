use crate::agent::{ChatRequest, ChatSession, MentorAgent};
use crate::models::websocket::{ClientMessage, ServerMessage};

use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::sleep;
use tokio::io::{AsyncRead, AsyncWrite};

use tokio_tungstenite::{accept_async, WebSocketStream};
use tokio_tungstenite::tungstenite::protocol::Message;

use lazy_static::lazy_static;
use governor::{RateLimiter, Quota, state::{InMemoryState, NotKeyed}, clock::DefaultClock};

use chrono::Utc;
use log::{info, warn, error};
use futures::{stream, SinkExt, Stream, StreamExt};

const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::new(10).unwrap()));
}

fn to_frame(msg: &ServerMessage) -> Message {
    match serde_json::to_string(msg) {
        Ok(json) => Message::Text(json),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            Message::Text(r#"{"type":"error","message":"internal error"}"#.to_string())
        }
    }
}

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub async fn start_ws_server(
    addr: &str,
    agent: Arc<MentorAgent>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS server listening on: {}", addr);
    serve(listener, agent).await;
    Ok(())
}

/// Turns a listener into an endless stream of accept results.
pub fn incoming(listener: TcpListener) -> impl Stream<Item = io::Result<(TcpStream, SocketAddr)>> {
    stream::unfold(listener, |listener| async move {
        let accepted = listener.accept().await;
        Some((accepted, listener))
    })
}

pub async fn serve(listener: TcpListener, agent: Arc<MentorAgent>) {
    serve_incoming(incoming(listener), agent).await
}

/// Accept loop. Every connection gets its own task and its own session.
/// A failed accept (EMFILE, ECONNABORTED, ...) only costs that connection.
pub async fn serve_incoming<I>(incoming: I, agent: Arc<MentorAgent>)
    where I: Stream<Item = io::Result<(TcpStream, SocketAddr)>>
{
    futures::pin_mut!(incoming);
    while let Some(accepted) = incoming.next().await {
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let agent_clone = Arc::clone(&agent);

        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(ws) => handle_connection(peer, ws, agent_clone).await,
                Err(e) => error!("Handshake failed for {}: {}", peer, e),
            }
        });
    }
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    agent: Arc<MentorAgent>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let (mut tx, mut rx) = websocket.split();
    let mut session = ChatSession::new();
    info!("Assigned session ID {} to {}", session.id(), peer);

    let ready = ServerMessage::Ready {
        session_id: session.id().to_string(),
        default_model: agent.default_model().to_string(),
        memory_length: agent.default_memory_length().get(),
    };
    if let Err(e) = tx.send(to_frame(&ready)).await {
        error!("Error sending ready message to {}: {}", peer, e);
        return;
    }

    while let Some(msg) = rx.next().await {
        match msg {
            Ok(message) => {
                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let error_msg = ServerMessage::Error {
                        message: "Message too large".to_string(),
                    };
                    if tx.send(to_frame(&error_msg)).await.is_err() {
                        error!("Failed to send size limit error to {}", peer);
                    }
                    break;
                }

                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Chat { content, model, memory_length }) => {
                                if let Err(e) = tx.send(to_frame(&ServerMessage::Processing)).await {
                                    error!("Error sending processing status to {}: {}", peer, e);
                                    break;
                                }

                                let request = ChatRequest {
                                    question: content,
                                    model,
                                    memory_length,
                                };
                                let reply = match agent.process_message(&mut session, request).await {
                                    Ok(content) => ServerMessage::Response {
                                        content,
                                        timestamp: Utc::now().timestamp(),
                                    },
                                    Err(e) => {
                                        error!("Agent processing error for {}: {}", peer, e);
                                        ServerMessage::Error {
                                            message: format!("Error processing message: {}", e),
                                        }
                                    }
                                };
                                if let Err(e) = tx.send(to_frame(&reply)).await {
                                    error!("Error sending message to {}: {}", peer, e);
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                let error_msg = ServerMessage::Error {
                                    message: format!("Failed to parse message: {}", e),
                                };
                                if let Err(e) = tx.send(to_frame(&error_msg)).await {
                                    error!("Error sending parse error to {}: {}", peer, e);
                                    break;
                                }
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Pong(_) | Message::Frame(_) => {}
                }
            }
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        }
    }
    info!(
        "WebSocket connection closed for {} (session {}, {} turns)",
        peer,
        session.id(),
        session.log().len()
    );
}
