//! Application state: config, the two in-memory stores, and the bot built on top of them.
//!
//! This module owns:
//!   - the session store (per-sender drafts and welcome flags)
//!   - the quiz registry (published quizzes and their expiry tasks)
//!   - the front-door `Bot` that transports feed messages into

use std::sync::Arc;
use tracing::{info, instrument};

use crate::bot::Bot;
use crate::config::{load_config_from_env, QuizSettings};
use crate::registry::QuizRegistry;
use crate::session::{SessionRouter, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub bot: Bot,
    pub settings: QuizSettings,
}

/// Counters shared by the health endpoint and the status page.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot {
    pub users: usize,
    pub drafts: usize,
    pub quizzes: usize,
    pub uptime_secs: u64,
}

impl AppState {
    /// Build state from env: load the TOML config if any, then wire stores into the bot.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let settings = load_config_from_env()
            .map(|c| c.quiz)
            .unwrap_or_default();
        info!(
            target: "chatquiz_backend",
            ttl_hours = settings.ttl_hours,
            id_length = settings.id_length,
            "Quiz settings"
        );
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: QuizSettings) -> Self {
        let registry = QuizRegistry::new(settings.ttl());
        let router = SessionRouter::new(Arc::new(SessionStore::new()), registry, settings.clone());
        Self { bot: Bot::new(router), settings }
    }

    pub async fn snapshot(&self) -> Snapshot {
        let router = self.bot.router();
        Snapshot {
            users: router.sessions().user_count().await,
            drafts: router.sessions().open_drafts(),
            quizzes: router.registry().len().await,
            uptime_secs: router.uptime().as_secs(),
        }
    }
}
