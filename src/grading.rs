//! Answer grading.
//!
//! Answers arrive as free text such as `"1a 2b 3c"`. Every `<number><letter>` pair is
//! extracted, and for each question the first pair carrying its number is the learner's
//! choice. Everything here is pure: same quiz and same text, same [`Report`].

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{OptionLetter, PublishedQuiz};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
  Correct,
  Wrong,
  Unanswered,
  /// The author skipped the correct answer, so nothing can score.
  NoKey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionResult {
  pub number: usize,
  pub outcome: Outcome,
  pub given: Option<OptionLetter>,
  pub expected: Option<OptionLetter>,
  pub explanation: Option<String>,
}

impl QuestionResult {
  pub fn is_correct(&self) -> bool { self.outcome == Outcome::Correct }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
  APlus,
  A,
  BPlus,
  B,
  C,
  D,
  F,
}

impl Grade {
  pub fn from_percentage(pct: u32) -> Self {
    match pct {
      90..=u32::MAX => Self::APlus,
      80..=89 => Self::A,
      70..=79 => Self::BPlus,
      60..=69 => Self::B,
      50..=59 => Self::C,
      30..=49 => Self::D,
      _ => Self::F,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::APlus => "A+",
      Self::A => "A",
      Self::BPlus => "B+",
      Self::B => "B",
      Self::C => "C",
      Self::D => "D",
      Self::F => "F",
    }
  }

  pub fn emoji(self) -> &'static str {
    match self {
      Self::APlus => "🏆",
      Self::A => "🥇",
      Self::BPlus => "🥈",
      Self::B => "🥉",
      Self::C => "📚",
      Self::D => "💪",
      Self::F => "🔄",
    }
  }

  pub fn comment(self) -> &'static str {
    match self {
      Self::APlus => "PARFAIT! Tu es un expert!",
      Self::A => "Excellent! Très impressionnant!",
      Self::BPlus => "Très bien! Tu maîtrises le sujet!",
      Self::B => "Bien joué! C'est un bon résultat!",
      Self::C => "Pas mal! Continue à apprendre!",
      Self::D => "Il faut réviser, mais n'abandonne pas!",
      Self::F => "Réessaye! L'apprentissage est un processus!",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
  pub quiz_id: String,
  pub results: Vec<QuestionResult>,
  pub correct: usize,
  pub total: usize,
  pub percentage: u32,
  pub grade: Grade,
}

fn answer_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?i)([0-9]+)([a-d])").expect("static answer pattern"))
}

/// `(question number, letter)` pairs in the order they appear.
/// Numbers too large for `usize` can never match a question and are dropped.
pub fn extract_answers(raw: &str) -> Vec<(usize, OptionLetter)> {
  answer_pattern()
    .captures_iter(raw)
    .filter_map(|caps| {
      let number = caps[1].parse().ok()?;
      let letter = caps[2].chars().next().and_then(OptionLetter::from_char)?;
      Some((number, letter))
    })
    .collect()
}

/// `round(100 * correct / total)`, halves rounded up.
fn percentage(correct: usize, total: usize) -> u32 {
  if total == 0 {
    return 0;
  }
  ((200 * correct + total) / (2 * total)) as u32
}

pub fn grade(quiz: &PublishedQuiz, raw: &str) -> Report {
  let answers = extract_answers(raw);

  let results: Vec<QuestionResult> = quiz
    .questions
    .iter()
    .enumerate()
    .map(|(i, q)| {
      let number = i + 1;
      let given = answers.iter().find(|(n, _)| *n == number).map(|&(_, l)| l);
      let outcome = match (given, q.correct) {
        (_, None) => Outcome::NoKey,
        (None, Some(_)) => Outcome::Unanswered,
        (Some(g), Some(k)) if g == k => Outcome::Correct,
        (Some(_), Some(_)) => Outcome::Wrong,
      };
      QuestionResult { number, outcome, given, expected: q.correct, explanation: q.explanation.clone() }
    })
    .collect();

  let correct = results.iter().filter(|r| r.is_correct()).count();
  let total = results.len();
  let percentage = percentage(correct, total);
  Report { quiz_id: quiz.id.clone(), results, correct, total, percentage, grade: Grade::from_percentage(percentage) }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::domain::{Category, Difficulty, Question};

  fn quiz(keys: &[Option<char>]) -> PublishedQuiz {
    let questions = keys
      .iter()
      .enumerate()
      .map(|(i, key)| Question {
        text: format!("Question numéro {}", i + 1),
        options: vec!["Alpha".into(), "Bravo".into(), "Charlie".into(), "Delta".into()],
        correct: key.and_then(OptionLetter::from_char),
        explanation: Some(format!("Parce que {}", i + 1)),
      })
      .collect();
    let now = Utc::now();
    PublishedQuiz {
      id: "Qz12Ab34".into(),
      title: "Quiz de test".into(),
      category: Category::Other,
      difficulty: Difficulty::Normal,
      creator: "Bob".into(),
      created_at: now,
      expires_at: now + chrono::Duration::hours(24),
      questions,
    }
  }

  #[test]
  fn matching_letter_scores() {
    let q = quiz(&[Some('b')]);
    let report = grade(&q, "1b");
    assert!(report.results[0].is_correct());
    assert_eq!(report.percentage, 100);

    let report = grade(&q, "1a");
    let r = &report.results[0];
    assert_eq!(r.outcome, Outcome::Wrong);
    assert_eq!(r.given.map(OptionLetter::as_char), Some('a'));
    assert_eq!(r.expected.map(OptionLetter::as_char), Some('b'));
    assert_eq!(r.explanation.as_deref(), Some("Parce que 1"));
  }

  #[test]
  fn two_of_three_rounds_to_67() {
    let report = grade(&quiz(&[Some('a'), Some('b'), Some('c')]), "1A, 2b et 3d");
    assert_eq!(report.correct, 2);
    assert_eq!(report.total, 3);
    assert_eq!(report.percentage, 67);
    assert_eq!(report.grade, Grade::B);
  }

  #[test]
  fn outcomes_are_reported_distinctly() {
    let report = grade(&quiz(&[Some('a'), None, Some('c'), Some('d')]), "1a 2a 4b");
    let outcomes: Vec<_> = report.results.iter().map(|r| r.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Correct, Outcome::NoKey, Outcome::Unanswered, Outcome::Wrong]);
    assert_eq!(report.correct, 1);
    assert_eq!(report.percentage, 25);
  }

  #[test]
  fn first_pair_for_a_number_wins() {
    let q = quiz(&[Some('c'), Some('a')]);
    let report = grade(&q, "1c 1a 12a 2a");
    assert_eq!(report.correct, 2);

    let report = grade(&q, "12a 1b 1c");
    assert_eq!(report.results[0].outcome, Outcome::Wrong);
    assert_eq!(report.results[1].outcome, Outcome::Unanswered);
  }

  #[test]
  fn only_ascii_digits_form_question_numbers() {
    assert_eq!(
      extract_answers("١1a ٢b"),
      vec![(1, OptionLetter::from_char('a').unwrap())]
    );
    let report = grade(&quiz(&[Some('a')]), "١1a");
    assert!(report.results[0].is_correct());
  }

  #[test]
  fn grading_is_deterministic() {
    let q = quiz(&[Some('a'), Some('b'), None]);
    let raw = "3c 2B 1d 99999999999999999999999a";
    assert_eq!(grade(&q, raw), grade(&q, raw));
  }

  #[test]
  fn grade_thresholds() {
    let table = [
      (100, Grade::APlus),
      (90, Grade::APlus),
      (89, Grade::A),
      (80, Grade::A),
      (70, Grade::BPlus),
      (60, Grade::B),
      (50, Grade::C),
      (30, Grade::D),
      (29, Grade::F),
      (0, Grade::F),
    ];
    for (pct, expected) in table {
      assert_eq!(Grade::from_percentage(pct), expected, "{pct}%");
    }
    assert_eq!(Grade::APlus.label(), "A+");
    assert!(!Grade::F.comment().is_empty());
  }

  #[test]
  fn halves_round_up() {
    assert_eq!(percentage(1, 2), 50);
    assert_eq!(percentage(1, 8), 13);
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(0, 0), 0);
  }
}
