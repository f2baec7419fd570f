//! Published quizzes with time-based eviction.
//!
//! A quiz's `expires_at` is the only expiry it has: at publish time the registry turns it
//! into a monotonic deadline. Every entry owns exactly one eviction task, which sleeps until
//! that deadline and removes it; a manual [`QuizRegistry::evict`] aborts it. Lookups also
//! compare the deadline against the clock, so an expired quiz is never served even if its
//! task has not been scheduled yet.

use std::{
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
  },
  time::Duration,
};

use chrono::Utc;
use indexmap::IndexMap;
use tokio::{
  sync::RwLock,
  task::AbortHandle,
  time::{self, Instant},
};
use tracing::{info, instrument, warn};

use crate::domain::PublishedQuiz;
use crate::error::{QuizError, Result};

struct Entry {
  quiz: Arc<PublishedQuiz>,
  deadline: Instant,
  timer: AbortHandle,
  /// Distinguishes a re-published id from the entry an old timer was armed for.
  seq: u64,
}

impl Entry {
  fn is_live(&self, now: Instant) -> bool { now < self.deadline }
}

/// A published quiz as seen by `list`.
#[derive(Clone, Debug)]
pub struct Listed {
  pub quiz: Arc<PublishedQuiz>,
  /// `deadline - now`, floored at zero.
  pub remaining: Duration,
}

#[derive(Clone)]
pub struct QuizRegistry {
  entries: Arc<RwLock<IndexMap<String, Entry>>>,
  next_seq: Arc<AtomicU64>,
  ttl: Duration,
}

impl QuizRegistry {
  pub fn new(ttl: Duration) -> Self {
    Self { entries: Arc::new(RwLock::new(IndexMap::new())), next_seq: Arc::new(AtomicU64::new(0)), ttl }
  }

  /// Lifetime given to quizzes published from now on.
  pub fn ttl(&self) -> Duration { self.ttl }

  /// Insert a quiz and arm its eviction task. The id must not be in use.
  #[instrument(level = "info", skip(self, quiz), fields(id = %quiz.id, questions = quiz.questions.len()))]
  pub async fn publish(&self, quiz: PublishedQuiz) -> Result<String> {
    let id = quiz.id.clone();
    let expires_at = quiz.expires_at;
    let mut entries = self.entries.write().await;
    if entries.contains_key(&id) {
      return Err(QuizError::DuplicateId(id));
    }

    let lifetime = (quiz.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    let Some(deadline) = Instant::now().checked_add(lifetime) else {
      return Err(QuizError::ExpiryOutOfRange { id });
    };
    let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
    let timer = {
      let entries = Arc::clone(&self.entries);
      let id = id.clone();
      tokio::spawn(async move {
        time::sleep_until(deadline).await;
        let mut entries = entries.write().await;
        if entries.get(&id).is_some_and(|e| e.seq == seq) {
          entries.shift_remove(&id);
          info!(target: "quiz", %id, "Quiz expired and removed");
        }
      })
      .abort_handle()
    };

    entries.insert(id.clone(), Entry { quiz: Arc::new(quiz), deadline, timer, seq });
    info!(target: "quiz", %id, expires_at = %expires_at, live = entries.len(), "Quiz published");
    Ok(id)
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn get(&self, id: &str) -> Option<Arc<PublishedQuiz>> {
    let now = Instant::now();
    let entries = self.entries.read().await;
    entries.get(id).filter(|e| e.is_live(now)).map(|e| Arc::clone(&e.quiz))
  }

  /// Snapshot of live quizzes in publication order.
  pub async fn list(&self) -> Vec<Listed> {
    let now = Instant::now();
    let entries = self.entries.read().await;
    entries
      .values()
      .filter(|e| e.is_live(now))
      .map(|e| Listed { quiz: Arc::clone(&e.quiz), remaining: e.deadline.saturating_duration_since(now) })
      .collect()
  }

  /// Idempotent removal. Returns whether something was removed.
  #[instrument(level = "info", skip(self))]
  pub async fn evict(&self, id: &str) -> bool {
    let removed = self.entries.write().await.shift_remove(id);
    match removed {
      Some(entry) => {
        entry.timer.abort();
        info!(target: "quiz", %id, "Quiz evicted manually");
        true
      }
      None => {
        warn!(target: "quiz", %id, "Evict requested for unknown quiz");
        false
      }
    }
  }

  pub async fn contains(&self, id: &str) -> bool {
    self.entries.read().await.contains_key(id)
  }

  /// Number of quizzes currently reachable.
  pub async fn len(&self) -> usize {
    let now = Instant::now();
    self.entries.read().await.values().filter(|e| e.is_live(now)).count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Category, Difficulty, Question};

  const DAY: Duration = Duration::from_secs(24 * 3600);

  fn quiz(id: &str) -> PublishedQuiz {
    let now = Utc::now();
    PublishedQuiz {
      id: id.into(),
      title: format!("Quiz {id}"),
      category: Category::History,
      difficulty: Difficulty::Easy,
      creator: "Chloé".into(),
      created_at: now,
      expires_at: now + chrono::Duration::hours(24),
      questions: vec![Question::new("Qui a peint la Joconde?")],
    }
  }

  async fn settle() {
    for _ in 0..8 {
      tokio::task::yield_now().await;
    }
  }

  #[tokio::test(start_paused = true)]
  async fn publish_get_and_list() {
    let registry = QuizRegistry::new(DAY);
    assert_eq!(registry.publish(quiz("b2")).await.unwrap(), "b2");
    registry.publish(quiz("a1")).await.unwrap();

    assert_eq!(registry.get("a1").await.map(|q| q.title.clone()).as_deref(), Some("Quiz a1"));
    assert!(registry.get("A1").await.is_none());

    time::advance(Duration::from_secs(3600)).await;
    let listed = registry.list().await;
    let ids: Vec<_> = listed.iter().map(|l| l.quiz.id.as_str()).collect();
    assert_eq!(ids, vec!["b2", "a1"]);
    let expected = DAY - Duration::from_secs(3600);
    assert!(listed[0].remaining <= expected && expected - listed[0].remaining < Duration::from_secs(5));
    assert_eq!(registry.len().await, 2);
  }

  #[tokio::test(start_paused = true)]
  async fn duplicate_id_is_refused() {
    let registry = QuizRegistry::new(DAY);
    registry.publish(quiz("x")).await.unwrap();
    assert!(matches!(registry.publish(quiz("x")).await, Err(QuizError::DuplicateId(id)) if id == "x"));
  }

  #[tokio::test(start_paused = true)]
  async fn quiz_is_gone_after_ttl() {
    let registry = QuizRegistry::new(DAY);
    registry.publish(quiz("ttl")).await.unwrap();

    time::advance(DAY - Duration::from_secs(1)).await;
    assert!(registry.get("ttl").await.is_some());

    time::advance(Duration::from_secs(2)).await;
    assert!(registry.get("ttl").await.is_none());
    assert!(registry.list().await.is_empty());

    settle().await;
    assert!(registry.entries.read().await.is_empty(), "eviction task should have removed the entry");
  }

  #[tokio::test(start_paused = true)]
  async fn expiry_follows_the_quiz_timestamp() {
    let registry = QuizRegistry::new(DAY);
    let mut short = quiz("short");
    short.expires_at = Utc::now() + chrono::Duration::hours(2);
    registry.publish(short).await.unwrap();

    let listed = registry.list().await;
    assert!(listed[0].remaining <= Duration::from_secs(2 * 3600));
    assert!(listed[0].remaining > Duration::from_secs(2 * 3600 - 5));

    time::advance(Duration::from_secs(2 * 3600)).await;
    assert!(registry.get("short").await.is_none());

    let mut stale = quiz("stale");
    stale.expires_at = Utc::now() - chrono::Duration::minutes(1);
    registry.publish(stale).await.unwrap();
    assert!(registry.get("stale").await.is_none());
    assert!(registry.list().await.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn manual_evict_is_idempotent_and_disarms_the_timer() {
    let registry = QuizRegistry::new(DAY);
    registry.publish(quiz("m")).await.unwrap();
    time::advance(Duration::from_secs(3600)).await;

    assert!(registry.evict("m").await);
    assert!(!registry.evict("m").await);
    assert!(registry.get("m").await.is_none());

    // Same id again: the first entry's timer must not take the new one down.
    registry.publish(quiz("m")).await.unwrap();
    time::sleep(DAY - Duration::from_secs(1800)).await;
    settle().await;
    assert!(registry.get("m").await.is_some());
    assert!(registry.contains("m").await);
  }
}
