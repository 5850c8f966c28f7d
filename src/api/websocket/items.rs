//! Item notification WebSocket handler
//!
//! Clients only listen. Anything they send is logged and otherwise ignored.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::server::AppState;
use crate::realtime::{ClientConnection, Outbound};

/// WebSocket handler for item notifications
pub async fn items_ws(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_items_ws(socket, remote, state))
}

/// Drive one connection from accept to removal
async fn handle_items_ws(socket: WebSocket, remote: SocketAddr, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Outbound>(state.ws_buffer_size.max(1));

    let conn = Arc::new(ClientConnection::new(remote.to_string(), tx));
    let conn_id = conn.id;
    state.pool.accept(conn.clone());

    // Single writer keeps per-connection frame order
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let message = match frame {
                Outbound::Text(text) => Message::Text(text.to_string()),
                Outbound::Ping => Message::Ping(Vec::new()),
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let pool = state.pool.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Pong(_)) => pool.on_pong(conn_id),
                Ok(Message::Text(text)) => {
                    info!(conn_id = %conn_id, message = %text, "Received message from client");
                }
                Ok(Message::Binary(data)) => {
                    info!(conn_id = %conn_id, bytes = data.len(), "Received binary message from client");
                }
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by axum
                    debug!(conn_id = %conn_id, "WebSocket ping received");
                }
                Ok(Message::Close(frame)) => {
                    match frame {
                        Some(frame) => info!(
                            conn_id = %conn_id,
                            code = frame.code,
                            reason = %frame.reason,
                            "Client disconnected"
                        ),
                        None => info!(conn_id = %conn_id, "Client disconnected"),
                    }
                    break;
                }
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {}
        _ = &mut receive_task => {}
        _ = conn.terminated() => {
            debug!(conn_id = %conn_id, "Connection terminated by server");
        }
    }

    send_task.abort();
    receive_task.abort();
    let _ = tokio::join!(send_task, receive_task);

    state.pool.remove(conn_id);
    info!(
        conn_id = %conn_id,
        session_secs = conn.age().as_secs(),
        total = state.pool.len(),
        "WebSocket connection closed"
    );
}
