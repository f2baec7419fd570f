//! Loading quiz settings from TOML.
//!
//! Expected schema (every key optional):
//!
//! ```toml
//! [quiz]
//! ttl_hours = 24
//! id_length = 8
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

const MIN_ID_LENGTH: usize = 4;
const MAX_ID_LENGTH: usize = 32;
const MAX_TTL_HOURS: u64 = 24 * 365;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub quiz: QuizSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
  /// Publication window of a finished quiz.
  pub ttl_hours: u64,
  /// Length of generated quiz identifiers.
  pub id_length: usize,
}

impl Default for QuizSettings {
  fn default() -> Self {
    Self { ttl_hours: 24, id_length: 8 }
  }
}

impl QuizSettings {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_hours.saturating_mul(3600))
  }

  /// Clamp out-of-range values instead of refusing to start.
  pub fn sanitized(mut self) -> Self {
    let ttl = self.ttl_hours.clamp(1, MAX_TTL_HOURS);
    if ttl != self.ttl_hours {
      warn!(target: "chatquiz_backend", requested = self.ttl_hours, used = ttl, "ttl_hours out of range");
      self.ttl_hours = ttl;
    }
    let clamped = self.id_length.clamp(MIN_ID_LENGTH, MAX_ID_LENGTH);
    if clamped != self.id_length {
      warn!(target: "chatquiz_backend", requested = self.id_length, used = clamped, "id_length out of range");
      self.id_length = clamped;
    }
    self
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s).map(|mut cfg| {
    cfg.quiz = cfg.quiz.sanitized();
    cfg
  })
}

/// Attempt to load `AppConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "chatquiz_backend", %path, ttl_hours = cfg.quiz.ttl_hours, id_length = cfg.quiz.id_length, "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "chatquiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "chatquiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
