use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, Semaphore};
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::player::{ConnectionId, Movement};
use crate::protocol::{ClientMsg, ConnectedMsg, ServerMsg, PROTOCOL_VERSION};
use crate::session_loop::SessionCommand;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub session_tx: mpsc::Sender<SessionCommand>,
    pub connection_semaphore: Arc<Semaphore>,
    pub max_message_bytes: usize,
}

impl AppState {
    pub fn new(session_tx: mpsc::Sender<SessionCommand>, config: &ServerConfig) -> Self {
        Self {
            session_tx,
            connection_semaphore: Arc::new(Semaphore::new(config.max_connections)),
            max_message_bytes: config.max_message_bytes,
        }
    }
}

/// Router with the WebSocket endpoint mounted at `ws_path`.
pub fn router(app_state: AppState, ws_path: &str) -> Router {
    Router::new()
        .route(ws_path, get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    let permit = match app_state.connection_semaphore.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            tracing::warn!("Connection limit reached, refusing upgrade");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let max_bytes = app_state.max_message_bytes;
    ws.max_message_size(max_bytes)
        .max_frame_size(max_bytes)
        .on_upgrade(move |socket| async move {
            handle_socket(socket, app_state).await;
            drop(permit);
        })
}

/// Translate a client event into a session command for connection `id`.
pub fn command_for(id: &ConnectionId, msg: ClientMsg) -> SessionCommand {
    match msg {
        ClientMsg::Join { username } => SessionCommand::Join {
            id: id.clone(),
            username,
        },
        ClientMsg::Move {
            position,
            rotation,
            is_moving,
            is_jumping,
        } => SessionCommand::Move {
            id: id.clone(),
            movement: Movement {
                position,
                rotation,
                is_moving,
                is_jumping,
            },
        },
        ClientMsg::Collect { kind } => SessionCommand::Collect {
            id: id.clone(),
            kind,
        },
    }
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Registered with the loop on Connect, so nothing addressed to us is missed
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<ServerMsg>();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .session_tx
        .send(SessionCommand::Connect {
            outbox,
            response: resp_tx,
        })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Connect command");
        return;
    }

    let my_id = match resp_rx.await {
        Ok(id) => id,
        Err(_) => {
            tracing::error!("Failed to receive connection id");
            return;
        }
    };

    tracing::info!("Connection {} opened", my_id);

    let connected = ServerMsg::Connected(ConnectedMsg {
        protocol_version: PROTOCOL_VERSION,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        self_id: my_id.clone(),
    });

    if send_msg(&mut sink, &connected).await {
        loop {
            tokio::select! {
                // Client -> Server
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientMsg>(&text) {
                                Ok(client_msg) => {
                                    let cmd = command_for(&my_id, client_msg);
                                    if app_state.session_tx.send(cmd).await.is_err() {
                                        tracing::error!("Session loop gone, closing {}", my_id);
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::debug!(
                                        "Ignoring malformed message from {}: {}",
                                        my_id,
                                        e
                                    );
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            tracing::debug!("Connection {} errored: {}", my_id, e);
                            break;
                        }
                        _ => {} // Ignore ping/pong/binary
                    }
                }

                // Server -> Client
                msg = outbox_rx.recv() => {
                    let Some(msg) = msg else { break };
                    if !send_msg(&mut sink, &msg).await {
                        break;
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .session_tx
        .send(SessionCommand::Disconnect { id: my_id.clone() })
        .await;
    tracing::info!("Connection {} closed", my_id);
}

/// Serialize and send one message. Returns false if the socket is gone.
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize {}: {}", msg.kind(), e);
            return true;
        }
    };
    sink.send(Message::Text(json.into())).await.is_ok()
}
