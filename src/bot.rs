//! Front door for chat traffic.
//!
//! Decides, per inbound message, whether it belongs to an open draft, to the `/quiz`
//! namespace, to one of the bot-wide commands, or to nobody at all.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::render;
use crate::session::SessionRouter;

const DEFAULT_NAME: &str = "Utilisateur";

/// One text message received by the chat transport.
#[derive(Clone, Debug, Deserialize)]
pub struct InboundEvent {
  #[serde(rename = "senderKey")]
  pub sender_key: String,
  #[serde(rename = "chatId")]
  pub chat_id: String,
  #[serde(rename = "senderName", default)]
  pub sender_name: Option<String>,
  pub text: String,
  /// Unix seconds as reported by the transport.
  #[serde(default)]
  pub timestamp: Option<i64>,
}

/// Text to send back to a chat. Delivery is the transport's business.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reply {
  #[serde(rename = "chatId")]
  pub chat_id: String,
  pub text: String,
}

/// Splits `"/quiz créer"` into `("/quiz", "créer")`.
fn split_command(text: &str) -> (&str, &str) {
  match text.split_once(char::is_whitespace) {
    Some((head, rest)) => (head, rest.trim_start()),
    None => (text, ""),
  }
}

#[derive(Clone)]
pub struct Bot {
  router: SessionRouter,
}

impl Bot {
  pub fn new(router: SessionRouter) -> Self { Self { router } }

  pub fn router(&self) -> &SessionRouter { &self.router }

  #[instrument(level = "info", skip(self, event), fields(sender = %event.sender_key, chat = %event.chat_id, ts = ?event.timestamp, text_len = event.text.len()))]
  pub async fn on_message(&self, event: &InboundEvent) -> Vec<Reply> {
    let text = event.text.trim();
    if text.is_empty() {
      return Vec::new();
    }
    let name = event
      .sender_name
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .unwrap_or(DEFAULT_NAME);
    let key = event.sender_key.as_str();

    let slot = self.router.sessions().slot(key).await;
    let mut session = slot.lock().await;

    let texts = if session.draft.is_some() {
      self.router.step_draft(&mut session, key, &event.text).await
    } else {
      let (head, rest) = split_command(text);
      match head.to_lowercase().as_str() {
        "/quiz" => self.router.run_command(&mut session, key, name, rest).await,
        "/help" | "/aide" => vec![render::general_help()],
        "/stats" => {
          let sessions = self.router.sessions();
          vec![render::stats(
            sessions.user_count().await,
            sessions.open_drafts(),
            self.router.registry().len().await,
            self.router.uptime(),
          )]
        }
        cmd if cmd.starts_with('/') => {
          debug!(target: "chatquiz_backend", %cmd, "Unknown command");
          vec![render::unknown_command()]
        }
        _ if !session.welcomed => {
          session.welcomed = true;
          info!(target: "chatquiz_backend", sender = %key, first_seen = %session.first_seen, "Welcoming new sender");
          vec![render::welcome(name)]
        }
        _ => Vec::new(),
      }
    };

    texts.into_iter().map(|text| Reply { chat_id: event.chat_id.clone(), text }).collect()
  }
}
