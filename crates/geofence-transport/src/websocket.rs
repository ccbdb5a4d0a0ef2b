//! WebSocket transport for browser clients.

use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::{
    dispatch::Dispatcher,
    protocol::{ClientMessage, ServerMessage},
};

/// WebSocket handler state.
#[derive(Clone)]
pub struct WsState {
    /// Shared dispatcher.
    pub dispatcher: Arc<Dispatcher>,
}

impl WsState {
    /// Create new WebSocket state.
    #[must_use]
    pub const fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// WebSocket upgrade handler.
///
/// Use this as an Axum route handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WsState) {
    let (mut sender, mut receiver) = socket.split();

    // Channel for sending messages to the client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Past notices as one batch, then live notices
    let (history, mut notices) = state.dispatcher.open_notices();
    let _ = tx.send(history);
    let notice_tx = tx.clone();
    let notice_task = tokio::spawn(async move {
        while let Some(msg) = notices.next().await {
            if notice_tx.send(msg).is_err() {
                break;
            }
        }
    });

    if let Some(status) = state.dispatcher.dispatch(ClientMessage::GetStatus).await {
        let _ = tx.send(status);
    }

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => continue,
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!("WebSocket error: {e}");
                break;
            }
        };

        let reply = match Dispatcher::parse(&text) {
            Ok(client_msg) => state.dispatcher.dispatch(client_msg).await,
            Err(err) => Some(err),
        };
        if let Some(reply) = reply {
            let _ = tx.send(reply);
        }
    }

    notice_task.abort();
    send_task.abort();
    tracing::debug!("WebSocket client disconnected");
}

/// Create WebSocket router.
///
/// # Example
/// ```ignore
/// let app = Router::new()
///     .merge(create_ws_router(dispatcher));
/// ```
#[must_use]
pub fn create_ws_router(dispatcher: Arc<Dispatcher>) -> axum::Router {
    axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(WsState::new(dispatcher))
}
