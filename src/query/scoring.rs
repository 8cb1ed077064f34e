//! Confidence scoring, ambiguity detection and clarification prompts.

use crate::types::Language;

pub const BASE_CONFIDENCE: f32 = 0.3;
pub const ENTITY_WEIGHT: f32 = 0.15;
pub const EXPLICIT_RULE_BONUS: f32 = 0.1;
pub const WORD_WEIGHT: f32 = 0.05;
pub const MAX_WORD_BONUS: f32 = 0.2;

/// Below this a query is considered too vague to run without clarification.
pub const AMBIGUITY_THRESHOLD: f32 = 0.5;

/// Words that carry no discriminating information on their own.
const GENERIC_WORDS: &[&str] = &[
   "a", "an", "the", "me", "my", "all", "any", "some", "for", "of", "to", "in", "on", "and", "or",
   "please", "i", "want", "need", "can", "you", "it", "this", "that", "with", "is", "are", "find",
   "search", "show", "get", "list", "look", "looking", "give", "stuff", "thing", "things",
   "something", "anything", "everything", "عن", "في", "من", "على", "إلى", "الى", "ابحث", "بحث",
   "أريد", "اريد", "كل", "هذا", "هذه", "شيء", "أشياء", "اعرض",
];

pub fn is_generic(word: &str) -> bool {
   GENERIC_WORDS.contains(&word)
}

/// Splits lower-cased text into word tokens.
pub fn tokenize(lowered: &str) -> impl Iterator<Item = &str> {
   lowered
      .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
      .filter(|w| !w.is_empty())
}

/// Tokens that are neither stop words nor generic verbs.
pub fn distinguishing_words(lowered: &str) -> usize {
   tokenize(lowered).filter(|w| !is_generic(w)).count()
}

/// Scores a classified query.
///
/// Every extracted entity, every distinguishing word (capped) and an explicit
/// rule match raise the score above the base; the result is clamped to
/// `[0, 1]`. Empty input scores zero.
pub fn confidence(lowered: &str, entity_count: usize, explicit_rule: bool) -> f32 {
   if tokenize(lowered).next().is_none() {
      return 0.0;
   }

   let word_bonus = (distinguishing_words(lowered) as f32 * WORD_WEIGHT).min(MAX_WORD_BONUS);
   let rule_bonus = if explicit_rule {
      EXPLICIT_RULE_BONUS
   } else {
      0.0
   };

   (BASE_CONFIDENCE + entity_count as f32 * ENTITY_WEIGHT + word_bonus + rule_bonus).clamp(0.0, 1.0)
}

pub fn is_ambiguous(text: &str, confidence: f32) -> bool {
   let lowered = text.to_lowercase();
   let mut tokens = tokenize(&lowered).peekable();

   if tokens.peek().is_none() {
      return true;
   }
   if tokens.all(is_generic) {
      return true;
   }
   confidence < AMBIGUITY_THRESHOLD
}

struct ClarificationTemplates {
   document_type: &'static str,
   criteria:      &'static str,
}

const fn templates(language: Language) -> ClarificationTemplates {
   match language {
      Language::En => ClarificationTemplates {
         document_type: "What type of document are you looking for (for example PDF, Word or image)?",
         criteria:      "Can you add more details to \"{query}\", such as an author, a date or a topic?",
      },
      Language::Ar => ClarificationTemplates {
         document_type: "ما نوع المستند الذي تبحث عنه (مثل PDF أو Word أو صورة)؟",
         criteria:      "هل يمكنك إضافة تفاصيل أكثر إلى \"{query}\" مثل المؤلف أو التاريخ أو الموضوع؟",
      },
   }
}

pub fn clarification_questions(text: &str, language: Language) -> [String; 2] {
   let t = templates(language);
   [t.document_type.to_string(), t.criteria.replace("{query}", text.trim())]
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn empty_scores_zero() {
      assert_eq!(confidence("", 0, false), 0.0);
      assert_eq!(confidence("   ", 0, false), 0.0);
   }

   #[test]
   fn entities_and_words_raise_score() {
      let vague = confidence("find stuff", 0, true);
      let specific = confidence("find pdf documents", 1, true);
      assert!(specific > vague, "{specific} <= {vague}");
   }

   #[test]
   fn score_is_clamped() {
      let score = confidence("alpha beta gamma delta epsilon zeta", 12, true);
      assert_eq!(score, 1.0);
   }

   #[test]
   fn single_generic_verb_is_ambiguous() {
      assert!(is_ambiguous("find", 0.9));
      assert!(is_ambiguous("", 0.9));
      assert!(is_ambiguous("quarterly invoices", 0.2));
      assert!(!is_ambiguous("find pdf invoices by john", 0.8));
   }

   #[test]
   fn clarification_is_bilingual() {
      let en = clarification_questions("find", Language::En);
      assert!(en[0].contains("type of document"));
      assert!(en[1].contains("\"find\""));

      let ar = clarification_questions("ابحث", Language::Ar);
      assert!(ar[1].contains("\"ابحث\""));
   }
}
