//! HTTP endpoint handlers. These are thin wrappers that forward to the bot and the stores.
//! Each handler is instrumented and logs basic request/result info.

use std::sync::Arc;
use axum::{extract::State, response::{Html, IntoResponse}, Json};
use tracing::{info, instrument};

use crate::bot::InboundEvent;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let s = state.snapshot().await;
  Json(HealthOut { status: "online", uptime: s.uptime_secs, users: s.users, drafts: s.drafts, quizzes: s.quizzes })
}

#[instrument(level = "info", skip(state, event), fields(sender = %event.sender_key, text_len = event.text.len()))]
pub async fn http_post_event(
  State(state): State<Arc<AppState>>,
  Json(event): Json<InboundEvent>,
) -> impl IntoResponse {
  let replies = state.bot.on_message(&event).await;
  info!(target: "chatquiz_backend", sender = %event.sender_key, replies = replies.len(), "HTTP event handled");
  Json(EventsOut { replies })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_quizzes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let listed = state.bot.router().registry().list().await;
  Json(listed.iter().map(to_out).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state))]
pub async fn http_status_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let s = state.snapshot().await;
  Html(format!(
    "<!DOCTYPE html><html><head><title>Quiz Bot</title>\
     <style>body{{font-family:Arial;text-align:center;background:#25D366;color:white;padding:50px}}</style></head>\
     <body><h1>✅ Bot en ligne</h1><p>👥 {} utilisateurs</p><p>✍️ {} quiz en création</p>\
     <p>🧠 {} quiz actifs (durée de vie {}h)</p><p>⏰ {} min d'uptime</p></body></html>",
    s.users,
    s.drafts,
    s.quizzes,
    state.settings.ttl_hours,
    s.uptime_secs / 60
  ))
}
