//! Internal faults of the quiz core.
//!
//! User input problems are not errors: the wizard answers them with a corrective reply.
//! Everything here means in-progress work is lost and operators should see it in the logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
  #[error("draft {id} is inconsistent: {detail}")]
  InconsistentDraft { id: String, detail: &'static str },

  #[error("draft {0} reached the end of the wizard with missing metadata")]
  IncompleteDraft(String),

  #[error("quiz id {0} is already published")]
  DuplicateId(String),

  #[error("quiz {id} has an unrepresentable expiry")]
  ExpiryOutOfRange { id: String },
}

pub type Result<T> = std::result::Result<T, QuizError>;
