//! Ordered intent rules.
//!
//! Each language carries its own table, evaluated top to bottom against the
//! lower-cased query. The first rule whose pattern matches decides the intent,
//! so more specific rules are declared before broader ones. A query that no
//! rule matches is a plain `search`/`find`.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{IntentType, Language};

pub const FALLBACK_ACTION: &str = "find";

#[derive(Debug)]
pub struct IntentRule {
   pub kind:   IntentType,
   pub action: &'static str,
   pattern:    Regex,
}

impl IntentRule {
   fn compile(kind: IntentType, action: &'static str, pattern: &str) -> Self {
      let pattern = Regex::new(pattern)
         .unwrap_or_else(|e| panic!("invalid intent rule for {action}: {e}"));
      Self { kind, action, pattern }
   }

   pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
      self.pattern.find(text).map(|m| m.as_str())
   }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMatch {
   pub kind:    IntentType,
   pub action:  &'static str,
   /// The text that triggered the rule; `None` for the fallback.
   pub keyword: Option<String>,
}

impl IntentMatch {
   pub fn fallback() -> Self {
      Self { kind: IntentType::Search, action: FALLBACK_ACTION, keyword: None }
   }

   pub const fn is_explicit(&self) -> bool {
      self.keyword.is_some()
   }
}

type RuleDef = (IntentType, &'static str, &'static str);

const EN_RULES: &[RuleDef] = &[
   (IntentType::Analytics, "count", r"\bhow many\b|\bcount\b|\bnumber of\b"),
   (IntentType::Analytics, "sum", r"\btotal\b|\bsum\b"),
   (IntentType::Analytics, "average", r"\baverage\b|\bmean\b"),
   (IntentType::Action, "download", r"\bdownload\b"),
   (IntentType::Action, "share", r"\bshare\b|\bsend\b"),
   (IntentType::Action, "delete", r"\bdelete\b|\bremove\b"),
   (IntentType::Action, "export", r"\bexport\b"),
   (IntentType::Action, "print", r"\bprint\b"),
   (IntentType::Filter, "exclude", r"\bexclude\b|\bexcept\b|\bwithout\b"),
   (IntentType::Filter, "filter", r"\bonly\b|\bfilter(?:ed)? by\b|\brestrict(?:ed)? to\b"),
   (IntentType::Context, "recent", r"\brecent(?:ly)?\b|\blatest\b"),
   (IntentType::Context, "popular", r"\bpopular\b|\bmost viewed\b|\btrending\b"),
   (IntentType::Context, "similar", r"\bsimilar\b|\blike this\b|\brelated to\b"),
   (IntentType::Search, "find", r"\bfind\b|\bsearch\b|\blook(?:ing)? for\b|\blocate\b|\bwhere is\b"),
   (IntentType::Search, "list", r"\bshow\b|\blist\b|\bdisplay\b"),
];

const AR_RULES: &[RuleDef] = &[
   (IntentType::Analytics, "count", r"\bكم\b|\bعدد\b"),
   (IntentType::Analytics, "sum", r"\bمجموع\b|\bإجمالي\b|\bاجمالي\b"),
   (IntentType::Analytics, "average", r"\bمتوسط\b|\bمعدل\b"),
   (IntentType::Action, "download", r"\bتحميل\b|\bنزل\b|\bحمل\b"),
   (IntentType::Action, "share", r"\bشارك\b|\bمشاركة\b|\bأرسل\b"),
   (IntentType::Action, "delete", r"\bاحذف\b|\bحذف\b"),
   (IntentType::Action, "export", r"\bتصدير\b|\bصدر\b"),
   (IntentType::Action, "print", r"\bاطبع\b|\bطباعة\b"),
   (IntentType::Filter, "exclude", r"\bباستثناء\b|\bماعدا\b|\bبدون\b"),
   (IntentType::Filter, "filter", r"\bفقط\b|\bتصفية\b|\bفلتر\b"),
   (IntentType::Context, "recent", r"\bالأخيرة\b|\bالحديثة\b|\bمؤخرا"),
   (IntentType::Context, "popular", r"\bالشائعة\b|\bالأكثر\s+مشاهدة\b"),
   (IntentType::Context, "similar", r"\bمشابهة?\b|\bمماثلة\b"),
   (IntentType::Search, "find", r"\bابحث\b|\bبحث\b|\bجد\b|\bأوجد\b|\bاعثر\b"),
   (IntentType::Search, "list", r"\bاعرض\b|\bأظهر\b|\bعرض\b"),
];

static EN_TABLE: LazyLock<Vec<IntentRule>> = LazyLock::new(|| compile(EN_RULES));
static AR_TABLE: LazyLock<Vec<IntentRule>> = LazyLock::new(|| compile(AR_RULES));

fn compile(defs: &[RuleDef]) -> Vec<IntentRule> {
   defs
      .iter()
      .map(|&(kind, action, pattern)| IntentRule::compile(kind, action, pattern))
      .collect()
}

pub fn rules_for(language: Language) -> &'static [IntentRule] {
   match language {
      Language::En => &EN_TABLE,
      Language::Ar => &AR_TABLE,
   }
}

/// Classifies `lowered` using the table for `language` first and the other
/// language's table second, so mixed-language queries still resolve.
pub fn classify(lowered: &str, language: Language) -> IntentMatch {
   let secondary = match language {
      Language::En => Language::Ar,
      Language::Ar => Language::En,
   };

   for table in [rules_for(language), rules_for(secondary)] {
      for rule in table {
         if let Some(keyword) = rule.find(lowered) {
            return IntentMatch {
               kind:    rule.kind,
               action:  rule.action,
               keyword: Some(keyword.to_string()),
            };
         }
      }
   }

   IntentMatch::fallback()
}

#[cfg(test)]
mod tests {
   use super::*;

   fn kind_action(text: &str, language: Language) -> (IntentType, &'static str) {
      let m = classify(text, language);
      (m.kind, m.action)
   }

   #[test]
   fn all_tables_compile() {
      assert_eq!(rules_for(Language::En).len(), EN_RULES.len());
      assert_eq!(rules_for(Language::Ar).len(), AR_RULES.len());
   }

   #[test]
   fn analytics_verbs() {
      assert_eq!(kind_action("how many invoices", Language::En), (IntentType::Analytics, "count"));
      assert_eq!(kind_action("total pages scanned", Language::En), (IntentType::Analytics, "sum"));
      assert_eq!(kind_action("average file size", Language::En), (IntentType::Analytics, "average"));
   }

   #[test]
   fn specific_rules_win_over_search_verbs() {
      assert_eq!(kind_action("find only pdf files", Language::En), (IntentType::Filter, "filter"));
      assert_eq!(kind_action("find recent contracts", Language::En), (IntentType::Context, "recent"));
      assert_eq!(kind_action("search and download", Language::En), (IntentType::Action, "download"));
   }

   #[test]
   fn word_boundaries_are_respected() {
      // "discount" must not trigger the count rule
      assert_eq!(kind_action("find discount vouchers", Language::En), (IntentType::Search, "find"));
   }

   #[test]
   fn unmatched_falls_back_to_find() {
      let m = classify("quarterly budget", Language::En);
      assert_eq!((m.kind, m.action), (IntentType::Search, "find"));
      assert!(!m.is_explicit());
   }

   #[test]
   fn arabic_rules() {
      assert_eq!(kind_action("ابحث عن ملفات pdf", Language::Ar), (IntentType::Search, "find"));
      assert_eq!(kind_action("كم عدد العقود", Language::Ar), (IntentType::Analytics, "count"));
      assert_eq!(kind_action("تحميل التقرير", Language::Ar), (IntentType::Action, "download"));
   }

   #[test]
   fn secondary_language_is_consulted() {
      assert_eq!(kind_action("download التقرير", Language::Ar), (IntentType::Action, "download"));
   }
}
