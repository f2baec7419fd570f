//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable so chat transports can evolve independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bot::{InboundEvent, Reply};
use crate::domain::{Category, Difficulty};
use crate::registry::Listed;

/// Messages a transport can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Message(InboundEvent),
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Reply(Reply),
    Error { message: String },
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct EventsOut {
    pub replies: Vec<Reply>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub status: &'static str,
    pub uptime: u64,
    pub users: usize,
    pub drafts: usize,
    pub quizzes: usize,
}

/// Read-only view of a published quiz. Correct answers are not exposed.
#[derive(Serialize)]
pub struct QuizOut {
    pub id: String,
    pub title: String,
    pub creator: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub questions: usize,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "expiresInSecs")]
    pub expires_in_secs: u64,
}

pub fn to_out(entry: &Listed) -> QuizOut {
    let q = &entry.quiz;
    QuizOut {
        id: q.id.clone(),
        title: q.title.clone(),
        creator: q.creator.clone(),
        category: q.category,
        difficulty: q.difficulty,
        questions: q.questions.len(),
        expires_at: q.expires_at,
        expires_in_secs: entry.remaining.as_secs(),
    }
}
