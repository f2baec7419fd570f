//! WebSocket upgrade + message loop. A chat transport keeps one socket open, pushes each
//! inbound chat message as JSON, and receives one `reply` frame per outgoing text.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};
use uuid::Uuid;

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "chatquiz_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state), fields(conn = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "chatquiz_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize every reply.
        let out_msgs = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "chatquiz_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        };

        for reply_msg in out_msgs {
          let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
          });
          if let Err(e) = socket.send(Message::Text(out)).await {
            error!(target: "chatquiz_backend", error = %e, "WS send error");
            return;
          }
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "chatquiz_backend", "WebSocket disconnected");
}

async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],
    ClientWsMessage::Message(event) => {
      let replies = state.bot.on_message(&event).await;
      info!(target: "chatquiz_backend", sender = %event.sender_key, replies = replies.len(), "WS message handled");
      replies.into_iter().map(ServerWsMessage::Reply).collect()
    }
  }
}
