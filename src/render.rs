//! Chat replies. Every user-visible string outside the wizard prompts lives here.

use std::time::Duration;

use crate::domain::{OptionLetter, PublishedQuiz};
use crate::grading::{Outcome, Report};
use crate::registry::Listed;

/// Whole hours rounded up, or minutes under one hour.
pub fn remaining(d: Duration) -> String {
  let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
  if secs >= 3600 {
    format!("{}h", secs.div_ceil(3600))
  } else {
    format!("{} min", secs.div_ceil(60))
  }
}

fn uptime(d: Duration) -> String {
  format!("{} minutes", d.as_secs() / 60)
}

pub fn published(quiz: &PublishedQuiz, ttl: Duration) -> String {
  let mut out = format!(
    "🎉 *Quiz créé avec succès!*\n\n🏆 Félicitations {}! Votre quiz est en ligne!\n\n\
     🧠 *{}*\n🆔 *ID :* {}\n👤 *Créateur :* {}\n📂 *Catégorie :* {}\n⭐ *Difficulté :* {}\n📅 *Créé :* {}\n\n",
    quiz.creator,
    quiz.title,
    quiz.id,
    quiz.creator,
    quiz.category,
    quiz.difficulty,
    quiz.created_at.format("%d/%m/%Y %H:%M UTC"),
  );
  for (i, q) in quiz.questions.iter().enumerate() {
    out.push_str(&format!("*{}.* {}\n", i + 1, q.text));
    for (j, opt) in q.options.iter().enumerate() {
      let Some(letter) = OptionLetter::from_index(j) else { continue };
      let marker = if q.correct == Some(letter) { " ✅" } else { "" };
      out.push_str(&format!("   {letter}) {opt}{marker}\n"));
    }
    if let Some(exp) = &q.explanation {
      out.push_str(&format!("   💡 _{exp}_\n"));
    }
    out.push('\n');
  }
  out.push_str(&format!(
    "🎯 *Comment répondre :*\n/quiz répondre {} 1a 2b 3c...\n\n⏰ *Quiz actif pendant {}*",
    quiz.id,
    remaining(ttl)
  ));
  out
}

pub fn share(quiz: &PublishedQuiz) -> String {
  format!(
    "📢 *Partagez votre quiz!*\n\n📋 Copiez et partagez ce message :\n\n\
     \"🧠 Nouveau quiz : *{}*\n📂 {} | ⭐ {}\n🎯 Jouez avec : /quiz répondre {} [vos réponses]\n👤 Par {}\"",
    quiz.title, quiz.category, quiz.difficulty, quiz.id, quiz.creator
  )
}

pub fn report(quiz: &PublishedQuiz, report: &Report) -> String {
  let mut out = format!(
    "🧠 *Résultats du quiz : {}*\n👤 Par : {}\n📊 Catégorie : {}\n⭐ Difficulté : {}\n\n📈 *Résultats détaillés :*\n",
    quiz.title, quiz.creator, quiz.category, quiz.difficulty
  );
  for r in &report.results {
    let given = r.given.map_or_else(|| "Pas de réponse".to_string(), |l| l.upper().to_string());
    let expected = r.expected.map_or_else(|| "Pas définie".to_string(), |l| l.upper().to_string());
    match r.outcome {
      Outcome::Correct => out.push_str(&format!("✅ *Q{}* : Correct! ({expected})\n", r.number)),
      Outcome::Wrong | Outcome::Unanswered | Outcome::NoKey => {
        out.push_str(&format!("❌ *Q{}* : {given} → Réponse : {expected}\n", r.number));
        if let Some(exp) = &r.explanation {
          out.push_str(&format!("   💡 {exp}\n"));
        }
      }
    }
  }
  out.push_str(&format!(
    "\n🎯 *SCORE FINAL :* {}/{} ({}%)\n📝 *NOTE :* {} {}\n💬 *{}*\n\n🎮 Merci d'avoir joué! Créez votre quiz avec /quiz créer",
    report.correct,
    report.total,
    report.percentage,
    report.grade.label(),
    report.grade.emoji(),
    report.grade.comment()
  ));
  out
}

pub fn list(listed: &[Listed]) -> String {
  if listed.is_empty() {
    return "📝 *Aucun quiz disponible*\n\n🎮 Soyez le premier à créer un quiz!\n/quiz créer".into();
  }
  let mut out = format!("📋 *Quiz disponibles ({})*\n\n", listed.len());
  for (i, entry) in listed.iter().enumerate() {
    let q = &entry.quiz;
    out.push_str(&format!(
      "{}. *{}*\n   🆔 ID : {}\n   👤 Créateur : {}\n   📊 {} question(s)\n   ⏰ Expire dans {}\n\n",
      i + 1,
      q.title,
      q.id,
      q.creator,
      q.questions.len(),
      remaining(entry.remaining)
    ));
  }
  out.push_str("🎯 *Pour jouer :* /quiz répondre [ID] [réponses]");
  out
}

pub fn answer_usage() -> String {
  "❌ *Usage incorrect!*\n\n🎯 *Format correct :*\n/quiz répondre [ID] [réponses]\n\n\
   💡 *Exemple :*\n/quiz répondre ABC123 1a 2b 3c 4d\n\n\
   📝 1a = question 1, réponse A ; 2b = question 2, réponse B"
    .into()
}

pub fn not_found(quiz_id: &str) -> String {
  format!(
    "❌ *Quiz introuvable!*\n\n🔍 Le quiz \"{quiz_id}\" n'existe pas ou a expiré.\n\n\
     💡 Créez votre propre quiz avec :\n/quiz créer"
  )
}

pub fn quiz_guide() -> String {
  "🧠 *Guide des quiz*\n\n🎮 *Commandes :*\n\
   📝 /quiz créer - Créer un nouveau quiz\n\
   🎯 /quiz répondre [ID] [réponses] - Jouer à un quiz\n\
   📋 /quiz liste - Voir les quiz disponibles\n\
   ❓ /quiz aide - Voir ce guide\n\n\
   🎯 *Comment jouer :*\n1. Trouvez l'ID du quiz (ex : ABC123)\n\
   2. Répondez : /quiz répondre ABC123 1a 2b 3c\n\
   3. Format : [numéro de question][lettre de réponse]\n\n\
   📝 *Création :*\n• 6 étapes guidées\n• Jusqu'à 15 questions\n• Catégories et difficultés\n\
   • Explications optionnelles\n• Annulation possible à tout moment\n\n\
   🏆 *Notation :*\n• A+ (90-100%)\n• A (80-89%)\n• B+ (70-79%)\n• B (60-69%)\n\
   • C (50-59%)\n• D (30-49%)\n• F (0-29%)"
    .into()
}

pub fn menu(users: usize, quizzes: usize, up: Duration) -> String {
  format!(
    "🧠 *Quiz - Menu principal*\n\n🎮 *Actions rapides :*\n\
     📝 /quiz créer - Nouveau quiz interactif\n📋 /quiz liste - Voir les quiz disponibles\n\
     ❓ /quiz aide - Guide complet\n\n📊 *Statistiques :*\n👥 {users} utilisateurs actifs\n\
     🧠 {quizzes} quiz en ligne\n⚡ {} d'uptime",
    uptime(up)
  )
}

pub fn unknown_quiz_command() -> String {
  "❓ Sous-commande inconnue. Tapez /quiz aide pour voir les commandes du quiz.".into()
}

pub fn already_creating() -> String {
  "⚠️ Vous avez déjà un quiz en cours de création.\n\n\
   ✍️ Terminez-le, ou tapez \"annuler\" pour l'abandonner avant d'en créer un nouveau."
    .into()
}

pub fn internal_fault() -> String {
  "❌ *Erreur inattendue*\n\n🔧 Une erreur s'est produite pendant la création; votre brouillon a été supprimé.\n\
   🔄 Réessayez avec /quiz créer"
    .into()
}

pub fn welcome(name: &str) -> String {
  format!(
    "👋 *Bienvenue {name}!*\n\n🤖 Je suis votre assistant quiz!\n\n📋 *Menu principal :*\n\
     🧠 /quiz - Créer et jouer aux quiz\n📊 /stats - Statistiques\n❓ /help - Aide complète\n\n\
     ✨ Tapez une commande pour commencer!"
  )
}

pub fn general_help() -> String {
  "🤖 *Bot Quiz*\n\n🧠 *Quiz* - /quiz\n   /quiz créer - Nouveau quiz\n\
   /quiz répondre [ID] [réponses] - Jouer\n   /quiz liste - Quiz disponibles\n   /quiz aide - Guide\n\n\
   📊 /stats - Statistiques du bot\n\n🚀 Prêt à défier vos amis?"
    .into()
}

pub fn stats(users: usize, drafts: usize, quizzes: usize, up: Duration) -> String {
  format!(
    "📊 *Statistiques*\n👥 Utilisateurs : {users}\n✍️ Quiz en création : {drafts}\n\
     🧠 Quiz actifs : {quizzes}\n⏰ Uptime : {}",
    uptime(up)
  )
}

pub fn unknown_command() -> String {
  "❌ Commande non reconnue. Tapez /help pour voir toutes les commandes disponibles.".into()
}
