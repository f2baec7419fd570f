//! Quiz authoring wizard.
//!
//! A [`QuizDraft`] moves through
//! `Title -> Category -> Difficulty -> QuestionCount -> Questions -> Finished`,
//! one step per chat message. Inside `Questions`, every question cycles through
//! `Question -> Options -> Correct -> Explanation`.
//!
//! [`advance`] is pure: it consumes the draft and hands back the next draft plus the reply
//! text. Storing the draft, publishing it and arming the expiry timer belong to the caller.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::domain::{
  Category, Difficulty, OptionLetter, PublishedQuiz, Question, MAX_OPTIONS, MAX_QUESTIONS, MIN_OPTIONS,
};
use crate::error::{QuizError, Result};

const MIN_TITLE_CHARS: usize = 5;
const MIN_QUESTION_CHARS: usize = 10;
const MIN_OPTION_CHARS: usize = 2;

const CANCEL_HINT: &str = "⚠️ Tapez \"annuler\" pour arrêter";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
  Title,
  Category,
  Difficulty,
  QuestionCount,
  Questions(Phase),
  Finished,
}

/// Sub-phase of [`Step::Questions`] for the question at `current_question`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
  Question,
  Options,
  Correct,
  Explanation,
}

#[derive(Clone, Debug)]
pub struct QuizDraft {
  pub id: String,
  pub title: String,
  pub category: Option<Category>,
  pub difficulty: Option<Difficulty>,
  pub creator: String,
  pub created_at: DateTime<Utc>,
  pub question_count: u8,
  /// 1-based number of the question being authored.
  pub current_question: usize,
  pub questions: Vec<Question>,
  pub step: Step,
}

/// Outcome of feeding one message to the wizard.
#[derive(Debug)]
pub enum Advance {
  /// Keep authoring. Also used for validation failures, with the draft unchanged.
  Next { draft: QuizDraft, reply: String },
  /// Every question is captured; the draft must be published and dropped.
  Done(QuizDraft),
  /// The author aborted; drop the draft, publish nothing.
  Cancelled { reply: String },
}

impl QuizDraft {
  pub fn new(id: String, creator: String, created_at: DateTime<Utc>) -> Self {
    Self {
      id,
      title: String::new(),
      category: None,
      difficulty: None,
      creator,
      created_at,
      question_count: 0,
      current_question: 0,
      questions: Vec::new(),
      step: Step::Title,
    }
  }

  /// First message of the wizard, sent when the draft is opened.
  pub fn intro(&self) -> String {
    format!(
      "🧠 *Créateur de Quiz*\n\n👋 Salut {}! Créons un quiz ensemble!\n\n\
       📝 *Étape 1/6 : Titre du quiz*\nQuel est le titre de votre quiz?\n\n\
       💡 Exemples : \"Culture Générale 2024\", \"Connais-tu bien ton pays?\"\n\n\
       ⚠️ À tout moment, tapez \"annuler\" pour arrêter la création",
      self.creator
    )
  }

  /// Freezes a finished draft.
  pub fn publish(self, ttl: std::time::Duration) -> Result<PublishedQuiz> {
    let (Some(category), Some(difficulty)) = (self.category, self.difficulty) else {
      return Err(QuizError::IncompleteDraft(self.id));
    };
    if self.step != Step::Finished || self.questions.len() != usize::from(self.question_count) {
      return Err(QuizError::IncompleteDraft(self.id));
    }
    let Some(expires_at) = chrono::Duration::from_std(ttl)
      .ok()
      .and_then(|ttl| self.created_at.checked_add_signed(ttl))
    else {
      return Err(QuizError::ExpiryOutOfRange { id: self.id });
    };
    Ok(PublishedQuiz {
      expires_at,
      id: self.id,
      title: self.title,
      category,
      difficulty,
      creator: self.creator,
      created_at: self.created_at,
      questions: self.questions,
    })
  }

  /// The question currently being filled in (options, correct letter or explanation).
  fn current_mut(&mut self) -> Result<&mut Question> {
    if self.questions.len() != self.current_question {
      return Err(self.inconsistent("no question captured for the current index"));
    }
    let id = &self.id;
    self.questions.last_mut().ok_or_else(|| QuizError::InconsistentDraft {
      id: id.clone(),
      detail: "question list is empty",
    })
  }

  fn inconsistent(&self, detail: &'static str) -> QuizError {
    QuizError::InconsistentDraft { id: self.id.clone(), detail }
  }
}

/// True for the words that abort a draft from any step.
pub fn is_cancel(text: &str) -> bool {
  matches!(text.trim().to_lowercase().as_str(), "annuler" | "cancel" | "stop")
}

fn is_skip(text: &str) -> bool {
  text.trim().eq_ignore_ascii_case("skip")
}

fn is_end_marker(line: &str) -> bool {
  matches!(line.trim().to_lowercase().as_str(), "fini" | "terminé" | "termine")
}

/// Drops an `a) `-style prefix from an option line.
fn strip_option_marker(line: &str) -> &str {
  let line = line.trim();
  let mut chars = line.chars();
  match (chars.next(), chars.next()) {
    (Some(c), Some(')')) if OptionLetter::from_char(c).is_some() => chars.as_str().trim(),
    _ => line,
  }
}

/// Leading decimal digits, the way chat users type "5" or "5 questions".
fn parse_count(text: &str) -> Option<u32> {
  let digits: String = text.trim().chars().take_while(char::is_ascii_digit).collect();
  digits.parse().ok()
}

fn retry(draft: QuizDraft, reply: String) -> Result<Advance> {
  Ok(Advance::Next { draft, reply })
}

/// Feeds one chat message to the draft.
#[instrument(level = "debug", skip(draft, text), fields(id = %draft.id, step = ?draft.step))]
pub fn advance(mut draft: QuizDraft, text: &str) -> Result<Advance> {
  if is_cancel(text) {
    debug!(target: "quiz", id = %draft.id, "Draft cancelled by author");
    return Ok(Advance::Cancelled {
      reply: format!(
        "🚫 *Création annulée*\n\n❌ La création de votre quiz a été annulée.\n\
         🔄 Vous pouvez recommencer avec /quiz créer\n\n👋 À bientôt {}!",
        draft.creator
      ),
    });
  }

  let raw = text;
  let text = text.trim();
  match draft.step {
    Step::Title => {
      if text.chars().count() < MIN_TITLE_CHARS {
        return retry(
          draft,
          format!(
            "❌ *Titre trop court!*\n\n📝 Le titre doit contenir au moins {MIN_TITLE_CHARS} caractères.\n\n{CANCEL_HINT}"
          ),
        );
      }
      draft.title = text.to_string();
      draft.step = Step::Category;
      let reply = format!(
        "✅ *Titre :* \"{text}\"\n\n📂 *Étape 2/6 : Catégorie*\nChoisissez une catégorie :\n\n\
         1️⃣ Culture Générale\n2️⃣ Sciences\n3️⃣ Histoire\n4️⃣ Sport\n5️⃣ Divertissement\n\
         6️⃣ Personnalité\n7️⃣ Géographie\n8️⃣ Autre\n\n\
         💡 Tapez le numéro ou le nom de la catégorie\n{CANCEL_HINT}"
      );
      retry(draft, reply)
    }

    Step::Category => {
      let category = Category::from_input(text);
      draft.category = Some(category);
      draft.step = Step::Difficulty;
      let reply = format!(
        "✅ *Catégorie :* {category}\n\n⭐ *Étape 3/6 : Difficulté*\n\n\
         🟢 1. Facile\n🟡 2. Normale\n🔴 3. Difficile\n🟣 4. Expert\n\n\
         💡 Tapez le numéro ou le nom de la difficulté\n{CANCEL_HINT}"
      );
      retry(draft, reply)
    }

    Step::Difficulty => {
      let difficulty = Difficulty::from_input(text);
      draft.difficulty = Some(difficulty);
      draft.step = Step::QuestionCount;
      let reply = format!(
        "✅ *Difficulté :* {difficulty}\n\n🔢 *Étape 4/6 : Nombre de questions*\n\
         Combien de questions voulez-vous? (1-{MAX_QUESTIONS})\n\n{CANCEL_HINT}"
      );
      retry(draft, reply)
    }

    Step::QuestionCount => {
      let count = match parse_count(text) {
        Some(n) if (1..=u32::from(MAX_QUESTIONS)).contains(&n) => n as u8,
        _ => {
          return retry(
            draft,
            format!(
              "❌ *Nombre invalide!*\n\n🔢 Veuillez entrer un nombre entre 1 et {MAX_QUESTIONS}.\n\n{CANCEL_HINT}"
            ),
          )
        }
      };
      draft.question_count = count;
      draft.current_question = 1;
      draft.step = Step::Questions(Phase::Question);
      let reply = format!(
        "✅ *{count} question(s)* programmée(s)\n\n📝 *Étape 5/6 : Questions*\n\
         *Question 1/{count}*\n\nÉcrivez votre première question :\n\n{CANCEL_HINT}"
      );
      retry(draft, reply)
    }

    Step::Questions(phase) => advance_question(draft, phase, raw),

    Step::Finished => Err(draft.inconsistent("message received after the wizard finished")),
  }
}

/// `raw` is the message as typed; only the explanation keeps it untrimmed.
fn advance_question(mut draft: QuizDraft, phase: Phase, raw: &str) -> Result<Advance> {
  let text = raw.trim();
  match phase {
    Phase::Question => {
      if draft.questions.len() + 1 != draft.current_question {
        return Err(draft.inconsistent("question list out of step with the current index"));
      }
      if text.chars().count() < MIN_QUESTION_CHARS {
        return retry(
          draft,
          format!(
            "❌ *Question trop courte!*\n\n📝 La question doit contenir au moins {MIN_QUESTION_CHARS} caractères.\n\n\
             💡 Exemple : \"Quelle est la capitale de la France?\"\n\n{CANCEL_HINT}"
          ),
        );
      }
      draft.questions.push(Question::new(text));
      draft.step = Step::Questions(Phase::Options);
      let reply = format!(
        "✅ *Question :* \"{text}\"\n\n📋 *Options de réponse*\n\
         Donnez {MIN_OPTIONS} à {MAX_OPTIONS} options (une par ligne ou une par message) :\n\n\
         a) Première option\nb) Deuxième option\n\nPuis tapez *\"fini\"* quand terminé\n\n{CANCEL_HINT}"
      );
      retry(draft, reply)
    }

    Phase::Options => collect_options(draft, text),

    Phase::Correct => {
      let question = draft.current_mut()?;
      let correct = if is_skip(text) {
        None
      } else {
        match text.to_lowercase().chars().find_map(OptionLetter::from_char) {
          Some(letter) if letter.index() < question.options.len() => Some(letter),
          Some(_) => {
            let last = OptionLetter::last_for(question.options.len()).map_or('a', OptionLetter::as_char);
            return retry(
              draft,
              format!(
                "❌ *Lettre invalide!*\n\n🎯 Choisissez parmi les options disponibles (a-{last})\n\n{CANCEL_HINT}"
              ),
            );
          }
          None => None,
        }
      };
      question.correct = correct;
      draft.step = Step::Questions(Phase::Explanation);
      let shown = correct.map_or_else(|| "non définie".to_string(), |l| l.upper().to_string());
      let reply = format!(
        "✅ *Réponse {shown}*\n\n💡 *Explication (optionnelle)*\n\
         Tapez votre explication ou \"skip\" pour passer\n{CANCEL_HINT}"
      );
      retry(draft, reply)
    }

    Phase::Explanation => {
      let question = draft.current_mut()?;
      if !is_skip(text) {
        question.explanation = Some(raw.to_string());
      }
      let finished = draft.current_question;
      draft.current_question += 1;
      if draft.current_question <= usize::from(draft.question_count) {
        draft.step = Step::Questions(Phase::Question);
        let reply = format!(
          "✅ *Question {finished} terminée!*\n\n📝 *Question {}/{}*\n\nÉcrivez votre prochaine question :\n\n{CANCEL_HINT}",
          draft.current_question, draft.question_count
        );
        retry(draft, reply)
      } else {
        draft.step = Step::Finished;
        debug!(target: "quiz", id = %draft.id, questions = draft.questions.len(), "Draft complete");
        Ok(Advance::Done(draft))
      }
    }
  }
}

/// Options phase. A message may carry several options, one per line. The message is
/// applied as a whole: if any line is rejected, no option from it is kept.
fn collect_options(mut draft: QuizDraft, text: &str) -> Result<Advance> {
  let stored = draft.current_mut()?.options.len();
  let mut pending: Vec<String> = Vec::new();
  let mut finish = false;

  for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
    if is_end_marker(line) {
      if stored + pending.len() < MIN_OPTIONS {
        return retry(
          draft,
          format!(
            "❌ *Pas assez d'options!*\n\n📋 Il faut au moins {MIN_OPTIONS} options de réponse.\n\n\
             💡 Ajoutez encore une option puis tapez \"fini\"\n\n{CANCEL_HINT}"
          ),
        );
      }
      finish = true;
      break;
    }

    if stored + pending.len() >= MAX_OPTIONS {
      return retry(
        draft,
        format!("❌ *Maximum {MAX_OPTIONS} options!*\n\n💡 Tapez \"fini\" pour continuer\n{CANCEL_HINT}"),
      );
    }

    let option = strip_option_marker(line);
    if option.chars().count() < MIN_OPTION_CHARS {
      return retry(
        draft,
        format!(
          "❌ *Option trop courte!*\n\n📝 L'option doit contenir au moins {MIN_OPTION_CHARS} caractères.\n\n{CANCEL_HINT}"
        ),
      );
    }
    pending.push(option.to_string());
  }

  let added = pending.len();
  let question = draft.current_mut()?;
  question.options.extend(pending);
  let total = question.options.len();

  if finish {
    let listing: String = question
      .options
      .iter()
      .enumerate()
      .filter_map(|(i, opt)| OptionLetter::from_index(i).map(|l| format!("{l}) {opt}\n")))
      .collect();
    let last = OptionLetter::last_for(total).map_or('b', OptionLetter::as_char);
    draft.step = Step::Questions(Phase::Correct);
    let reply = format!(
      "✅ *Options enregistrées!*\n\n{listing}\n🎯 *Bonne réponse*\n\
       Quelle est la bonne réponse? (a-{last})\n\n💡 Ou tapez \"skip\" pour ne pas en définir\n{CANCEL_HINT}"
    );
    return retry(draft, reply);
  }

  let reply = if added == 0 {
    format!("💡 Ajoutez une option ou tapez \"fini\"\n{CANCEL_HINT}")
  } else {
    format!("✅ *Option {total} ajoutée!* ({total}/{MAX_OPTIONS})\n\n💡 Ajoutez une autre option ou tapez \"fini\"\n{CANCEL_HINT}")
  };
  retry(draft, reply)
}
