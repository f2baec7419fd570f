//! Per-sender sessions and the quiz command router.
//!
//! A sender's session is guarded by its own async mutex, so two messages from the same
//! sender are handled one after the other while different senders proceed in parallel.
//! The router owns no globals: the session store and the quiz registry are injected.

use std::{
  collections::HashMap,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use crate::config::QuizSettings;
use crate::error::{QuizError, Result};
use crate::grading;
use crate::registry::QuizRegistry;
use crate::render;
use crate::wizard::{self, Advance, QuizDraft};

const ID_ATTEMPTS: usize = 8;

/// Everything the bot remembers about one sender.
#[derive(Debug)]
pub struct UserSession {
  pub draft: Option<QuizDraft>,
  pub welcomed: bool,
  pub first_seen: DateTime<Utc>,
}

impl UserSession {
  fn new() -> Self {
    Self { draft: None, welcomed: false, first_seen: Utc::now() }
  }
}

/// Process-wide map from sender key to session.
#[derive(Default)]
pub struct SessionStore {
  users: RwLock<HashMap<String, Arc<Mutex<UserSession>>>>,
  open_drafts: AtomicUsize,
}

impl SessionStore {
  pub fn new() -> Self { Self::default() }

  /// The sender's session slot, created on first contact.
  pub async fn slot(&self, sender_key: &str) -> Arc<Mutex<UserSession>> {
    if let Some(slot) = self.users.read().await.get(sender_key) {
      return Arc::clone(slot);
    }
    let mut users = self.users.write().await;
    Arc::clone(
      users
        .entry(sender_key.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(UserSession::new()))),
    )
  }

  pub async fn user_count(&self) -> usize {
    self.users.read().await.len()
  }

  /// Number of drafts being authored right now.
  pub fn open_drafts(&self) -> usize {
    self.open_drafts.load(Ordering::Relaxed)
  }

  fn draft_opened(&self) {
    self.open_drafts.fetch_add(1, Ordering::Relaxed);
  }

  fn draft_closed(&self) {
    let _ = self.open_drafts.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
  }
}

/// First token of a quiz command, already lowercased.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
  Create,
  Answer { quiz_id: Option<&'a str>, answers: String },
  List,
  Help,
  Menu,
  Unknown,
}

fn parse_command(text: &str) -> Command<'_> {
  let mut tokens = text.split_whitespace();
  let Some(head) = tokens.next() else {
    return Command::Menu;
  };
  match head.to_lowercase().as_str() {
    "create" | "créer" | "creer" => Command::Create,
    "answer" | "répondre" | "repondre" => {
      let quiz_id = tokens.next();
      let answers = tokens.collect::<Vec<_>>().join(" ");
      Command::Answer { quiz_id, answers }
    }
    "list" | "liste" => Command::List,
    "help" | "aide" => Command::Help,
    _ => Command::Unknown,
  }
}

/// `create` typed (with or without the `/quiz` prefix) while a draft is open.
fn is_create_request(text: &str) -> bool {
  let mut tokens = text.split_whitespace().peekable();
  if tokens.peek().is_some_and(|t| t.eq_ignore_ascii_case("/quiz")) {
    tokens.next();
  }
  let rest: Vec<_> = tokens.collect();
  rest.len() == 1 && parse_command(rest[0]) == Command::Create
}

fn generate_id(len: usize) -> String {
  rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

#[derive(Clone)]
pub struct SessionRouter {
  sessions: Arc<SessionStore>,
  registry: QuizRegistry,
  settings: QuizSettings,
  started: Instant,
}

impl SessionRouter {
  pub fn new(sessions: Arc<SessionStore>, registry: QuizRegistry, settings: QuizSettings) -> Self {
    Self { sessions, registry, settings, started: Instant::now() }
  }

  pub fn sessions(&self) -> &SessionStore { &self.sessions }

  pub fn registry(&self) -> &QuizRegistry { &self.registry }

  pub fn uptime(&self) -> Duration { self.started.elapsed() }

  /// Handle one message addressed to the quiz namespace (`/quiz <text>`), or any
  /// message at all while the sender has a draft open.
  #[instrument(level = "info", skip(self, sender_name, text), fields(text_len = text.len()))]
  pub async fn handle(&self, sender_key: &str, sender_name: &str, text: &str) -> Vec<String> {
    let slot = self.sessions.slot(sender_key).await;
    let mut session = slot.lock().await;
    if session.draft.is_some() {
      self.step_draft(&mut session, sender_key, text).await
    } else {
      self.run_command(&mut session, sender_key, sender_name, text).await
    }
  }

  /// Feed the open draft. The caller holds the sender's lock.
  pub(crate) async fn step_draft(&self, session: &mut UserSession, sender_key: &str, text: &str) -> Vec<String> {
    let Some(draft) = session.draft.take() else {
      return Vec::new();
    };

    if is_create_request(text) {
      info!(target: "quiz", %sender_key, id = %draft.id, "Create refused: draft already open");
      session.draft = Some(draft);
      return vec![render::already_creating()];
    }

    match wizard::advance(draft, text) {
      Ok(Advance::Next { draft, reply }) => {
        session.draft = Some(draft);
        vec![reply]
      }
      Ok(Advance::Cancelled { reply }) => {
        self.sessions.draft_closed();
        info!(target: "quiz", %sender_key, "Draft cancelled");
        vec![reply]
      }
      Ok(Advance::Done(draft)) => {
        self.sessions.draft_closed();
        match self.commit(draft).await {
          Ok(replies) => replies,
          Err(e) => self.fault(sender_key, e),
        }
      }
      Err(e) => {
        self.sessions.draft_closed();
        self.fault(sender_key, e)
      }
    }
  }

  async fn commit(&self, draft: QuizDraft) -> Result<Vec<String>> {
    let quiz = draft.publish(self.registry.ttl())?;
    let replies = vec![render::published(&quiz, self.registry.ttl()), render::share(&quiz)];
    self.registry.publish(quiz).await?;
    Ok(replies)
  }

  fn fault(&self, sender_key: &str, e: QuizError) -> Vec<String> {
    error!(target: "quiz", %sender_key, error = %e, "Internal fault; draft dropped");
    vec![render::internal_fault()]
  }

  /// Quiz sub-commands. The caller holds the sender's lock.
  pub(crate) async fn run_command(
    &self,
    session: &mut UserSession,
    sender_key: &str,
    sender_name: &str,
    text: &str,
  ) -> Vec<String> {
    match parse_command(text) {
      Command::Create => {
        let id = self.fresh_id().await;
        let draft = QuizDraft::new(id, sender_name.to_string(), Utc::now());
        info!(target: "quiz", %sender_key, id = %draft.id, "Draft opened");
        let intro = draft.intro();
        session.draft = Some(draft);
        self.sessions.draft_opened();
        vec![intro]
      }
      Command::Answer { quiz_id: Some(quiz_id), answers } if !answers.is_empty() => {
        match self.registry.get(quiz_id).await {
          Some(quiz) => {
            let report = grading::grade(&quiz, &answers);
            info!(target: "quiz", %sender_key, id = %quiz_id, correct = report.correct, total = report.total, grade = report.grade.label(), "Answers graded");
            vec![render::report(&quiz, &report)]
          }
          None => {
            info!(target: "quiz", %sender_key, id = %quiz_id, "Answer for unknown or expired quiz");
            vec![render::not_found(quiz_id)]
          }
        }
      }
      Command::Answer { .. } => vec![render::answer_usage()],
      Command::List => vec![render::list(&self.registry.list().await)],
      Command::Help => vec![render::quiz_guide()],
      Command::Menu => {
        let users = self.sessions.user_count().await;
        let quizzes = self.registry.len().await;
        vec![render::menu(users, quizzes, self.uptime())]
      }
      Command::Unknown => vec![render::unknown_quiz_command()],
    }
  }

  /// An id not used by any published quiz. After `ID_ATTEMPTS` clashes the last
  /// candidate is returned anyway and `publish` reports the duplicate.
  async fn fresh_id(&self) -> String {
    let len = self.settings.id_length;
    let mut id = generate_id(len);
    for _ in 1..ID_ATTEMPTS {
      if !self.registry.contains(&id).await {
        return id;
      }
      warn!(target: "quiz", %id, "Generated quiz id already in use; retrying");
      id = generate_id(len);
    }
    id
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn router() -> SessionRouter {
    let settings = QuizSettings::default();
    SessionRouter::new(Arc::new(SessionStore::new()), QuizRegistry::new(settings.ttl()), settings)
  }

  async fn say(router: &SessionRouter, sender: &str, text: &str) -> Vec<String> {
    router.handle(sender, "Alice", text).await
  }

  /// Drives the wizard through a one-question quiz and returns the published id.
  async fn author_one(router: &SessionRouter, sender: &str) -> String {
    let script = [
      "create",
      "Capitales du Monde",
      "7",
      "2",
      "1",
      "Quelle est la capitale de la France?",
      "Paris",
      "Lyon",
      "fini",
      "a",
    ];
    for line in script {
      assert_eq!(say(router, sender, line).await.len(), 1, "after {line:?}");
    }
    let replies = say(router, sender, "skip").await;
    assert_eq!(replies.len(), 2, "summary and share message");
    let listed = router.registry().list().await;
    listed.last().expect("quiz published").quiz.id.clone()
  }

  #[test]
  fn parse_commands() {
    assert_eq!(parse_command(""), Command::Menu);
    assert_eq!(parse_command("Créer"), Command::Create);
    assert_eq!(parse_command("LISTE"), Command::List);
    assert_eq!(parse_command("aide"), Command::Help);
    assert_eq!(parse_command("jouer"), Command::Unknown);
    assert_eq!(
      parse_command("répondre AbC123 1a  2b"),
      Command::Answer { quiz_id: Some("AbC123"), answers: "1a 2b".into() }
    );
    assert_eq!(parse_command("answer"), Command::Answer { quiz_id: None, answers: String::new() });
  }

  #[tokio::test]
  async fn end_to_end_create_then_answer() {
    let router = router();
    let id = author_one(&router, "alice").await;

    assert_eq!(id.len(), 8);
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(router.sessions().open_drafts(), 0);

    let quiz = router.registry().get(&id).await.expect("published");
    assert_eq!(quiz.questions.len(), 1);
    assert_eq!(quiz.creator, "Alice");
    assert_eq!(quiz.category.label(), "Géographie");
    assert_eq!(quiz.difficulty.label(), "Normale");

    let reply = say(&router, "bob", &format!("answer {id} 1a")).await;
    assert!(reply[0].contains("1/1 (100%)"), "{}", reply[0]);
    assert!(reply[0].contains("A+"));
  }

  #[tokio::test]
  async fn cancel_clears_the_draft_and_publishes_nothing() {
    let router = router();
    say(&router, "carol", "créer").await;
    say(&router, "carol", "Mon super quiz").await;
    assert_eq!(router.sessions().open_drafts(), 1);

    let reply = say(&router, "carol", "Annuler").await;
    assert!(reply[0].contains("annulée"));
    assert_eq!(router.sessions().open_drafts(), 0);
    assert_eq!(router.registry().len().await, 0);

    // Back to command mode.
    let reply = say(&router, "carol", "liste").await;
    assert!(reply[0].contains("Aucun quiz"));
  }

  #[tokio::test]
  async fn create_while_open_is_refused() {
    let router = router();
    say(&router, "dan", "create").await;
    say(&router, "dan", "Quiz numéro un").await;

    let reply = say(&router, "dan", "/quiz créer").await;
    assert!(reply[0].contains("déjà"));
    let slot = router.sessions().slot("dan").await;
    let session = slot.lock().await;
    let draft = session.draft.as_ref().expect("draft kept");
    assert_eq!(draft.title, "Quiz numéro un");
    assert_eq!(draft.step, wizard::Step::Category);
  }

  #[tokio::test]
  async fn answer_usage_and_lookup_miss() {
    let router = router();
    let usage = say(&router, "eve", "answer").await;
    assert!(usage[0].contains("Usage incorrect"));
    let usage = say(&router, "eve", "répondre XYZ").await;
    assert!(usage[0].contains("Usage incorrect"));

    let missing = say(&router, "eve", "answer XYZ 1a").await;
    assert!(missing[0].contains("introuvable"));
    assert!(missing[0].contains("XYZ"));
  }

  #[tokio::test]
  async fn list_shows_remaining_time() {
    let router = router();
    let id = author_one(&router, "frank").await;
    let listing = say(&router, "gina", "list").await;
    assert!(listing[0].contains(&id));
    assert!(listing[0].contains("Capitales du Monde"));
    assert!(listing[0].contains("24h"));
  }

  #[tokio::test]
  async fn drafts_are_independent_per_sender() {
    let router = router();
    say(&router, "h1", "create").await;
    say(&router, "h2", "create").await;
    say(&router, "h1", "Premier quiz").await;
    assert_eq!(router.sessions().open_drafts(), 2);

    let h2 = router.sessions().slot("h2").await;
    assert_eq!(h2.lock().await.draft.as_ref().map(|d| d.step), Some(wizard::Step::Title));
    let h1 = router.sessions().slot("h1").await;
    assert_eq!(h1.lock().await.draft.as_ref().map(|d| d.step), Some(wizard::Step::Category));
  }

  #[tokio::test]
  async fn unknown_subcommand_gets_a_hint_and_empty_gets_the_menu() {
    let router = router();
    assert!(say(&router, "ivy", "jouer").await[0].contains("/quiz aide"));
    assert!(say(&router, "ivy", "").await[0].contains("Menu"));
  }

  #[tokio::test]
  async fn inconsistent_draft_is_dropped_with_a_notice() {
    let router = router();
    say(&router, "jo", "create").await;
    {
      let slot = router.sessions().slot("jo").await;
      let mut session = slot.lock().await;
      session.draft.as_mut().unwrap().step = wizard::Step::Finished;
    }
    let reply = say(&router, "jo", "bonjour tout le monde").await;
    assert!(reply[0].contains("Erreur inattendue"));
    assert_eq!(router.sessions().open_drafts(), 0);
    let slot = router.sessions().slot("jo").await;
    assert!(slot.lock().await.draft.is_none());
  }
}
