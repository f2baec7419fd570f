//! Domain models: categories, difficulties, option letters, questions and published quizzes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Upper bound on the number of questions in one quiz.
pub const MAX_QUESTIONS: u8 = 15;
/// Options per question, inclusive bounds.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

/// Thematic category chosen at step 2 of the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  GeneralKnowledge,
  Science,
  History,
  Sport,
  Entertainment,
  Personality,
  Geography,
  Other,
}

impl Category {
  /// Maps free text through the synonym table. Never fails: unknown input is `Other`.
  pub fn from_input(text: &str) -> Self {
    match text.trim().to_lowercase().as_str() {
      "1" | "culture générale" | "culture generale" | "culture" => Self::GeneralKnowledge,
      "2" | "sciences" | "science" => Self::Science,
      "3" | "histoire" | "history" => Self::History,
      "4" | "sport" | "sports" => Self::Sport,
      "5" | "divertissement" | "entertainment" => Self::Entertainment,
      "6" | "personnalité" | "personalité" | "personnalite" => Self::Personality,
      "7" | "géographie" | "geographie" | "geography" => Self::Geography,
      _ => Self::Other,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::GeneralKnowledge => "Culture Générale",
      Self::Science => "Sciences",
      Self::History => "Histoire",
      Self::Sport => "Sport",
      Self::Entertainment => "Divertissement",
      Self::Personality => "Personnalité",
      Self::Geography => "Géographie",
      Self::Other => "Autre",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Normal,
  Hard,
  Expert,
}

impl Difficulty {
  /// Same pattern as [`Category::from_input`]; unknown input is `Normal`.
  pub fn from_input(text: &str) -> Self {
    match text.trim().to_lowercase().as_str() {
      "1" | "facile" | "easy" => Self::Easy,
      "2" | "normale" | "normal" | "moyen" => Self::Normal,
      "3" | "difficile" | "hard" | "dur" => Self::Hard,
      "4" | "expert" | "très difficile" | "extrême" | "extreme" => Self::Expert,
      _ => Self::Normal,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Easy => "Facile",
      Self::Normal => "Normale",
      Self::Hard => "Difficile",
      Self::Expert => "Expert",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// Index of an answer option, bounded to `0..MAX_OPTIONS`. Rendered as `a`..`d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionLetter(u8);

impl OptionLetter {
  pub fn from_index(index: usize) -> Option<Self> {
    (index < MAX_OPTIONS).then(|| Self(index as u8))
  }

  /// Accepts `a`..`d` in either case.
  pub fn from_char(c: char) -> Option<Self> {
    match c.to_ascii_lowercase() {
      l @ 'a'..='d' => Some(Self(l as u8 - b'a')),
      _ => None,
    }
  }

  pub fn index(self) -> usize { self.0 as usize }

  pub fn as_char(self) -> char { (b'a' + self.0) as char }

  pub fn upper(self) -> char { self.as_char().to_ascii_uppercase() }

  /// Letter of the last option when `count` options exist.
  pub fn last_for(count: usize) -> Option<Self> {
    count.checked_sub(1).and_then(Self::from_index)
  }
}

impl fmt::Display for OptionLetter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_char()) }
}

/// One multiple-choice question. Owned by its draft, then frozen in a [`PublishedQuiz`].
#[derive(Clone, Debug)]
pub struct Question {
  pub text: String,
  pub options: Vec<String>,
  pub correct: Option<OptionLetter>,
  pub explanation: Option<String>,
}

impl Question {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), options: Vec::new(), correct: None, explanation: None }
  }

  pub fn option(&self, letter: OptionLetter) -> Option<&str> {
    self.options.get(letter.index()).map(String::as_str)
  }
}

/// Immutable snapshot of a completed draft, held by the registry until it expires.
#[derive(Clone, Debug)]
pub struct PublishedQuiz {
  pub id: String,
  pub title: String,
  pub category: Category,
  pub difficulty: Difficulty,
  pub creator: String,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
  pub questions: Vec<Question>,
}
