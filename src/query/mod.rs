//! Natural-language query understanding.
//!
//! [`QueryProcessor`] turns free text (English or Arabic) into a
//! [`QueryIntent`]: an intent type and action from the ordered rule tables in
//! [`rules`], entities from [`entities`], and a confidence from [`scoring`].
//! Corpus-backed expansion and user context live behind a single lock so one
//! processor can be shared across tasks.

pub mod context;
pub mod entities;
pub mod expansion;
pub mod rules;
pub mod scoring;

use std::{collections::HashMap, sync::LazyLock};

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use self::{
   context::{ContextualQuery, OrganizationalContext, RecentActivity, UserContext, UserPreferences},
   expansion::{CorpusDocument, CorpusStats, ExpandedQuery},
};
use self::{context::ContextManager, expansion::QueryExpander};
use crate::types::{EntityType, IntentType, Language, QueryIntent};

const ABBREVIATIONS: &[(&str, &str)] = &[
   ("docs", "documents"),
   ("doc", "document"),
   ("pics", "pictures"),
   ("pic", "picture"),
   ("imgs", "images"),
   ("img", "image"),
   ("info", "information"),
   ("mgmt", "management"),
   ("dept", "department"),
   ("pres", "presentation"),
];

static ABBREVIATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
   let alternatives = ABBREVIATIONS
      .iter()
      .map(|(short, _)| *short)
      .collect::<Vec<_>>()
      .join("|");
   Regex::new(&format!(r"(?i)\b(?:{alternatives})\b"))
      .unwrap_or_else(|e| panic!("invalid abbreviation pattern: {e}"))
});

/// Collapses whitespace and expands known abbreviations, keeping case.
pub fn normalize(text: &str) -> String {
   let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
   ABBREVIATION_PATTERN
      .replace_all(&collapsed, |caps: &regex::Captures<'_>| {
         let short = caps[0].to_lowercase();
         ABBREVIATIONS
            .iter()
            .find(|(abbr, _)| *abbr == short)
            .map_or_else(|| caps[0].to_string(), |(_, long)| (*long).to_string())
      })
      .into_owned()
}

/// Arabic script anywhere in the text selects Arabic.
pub fn detect_language(text: &str) -> Language {
   if text.chars().any(|c| matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}')) {
      Language::Ar
   } else {
      Language::En
   }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualResult {
   pub intent:           QueryIntent,
   pub contextual_query: ContextualQuery,
   pub expanded_query:   ExpandedQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionResult {
   pub intent:         QueryIntent,
   pub expanded_query: ExpandedQuery,
}

#[derive(Default)]
struct ProcessorState {
   expander: QueryExpander,
   contexts: ContextManager,
}

/// Shared query-understanding service.
///
/// Construct one per application and hand out `Arc<QueryProcessor>`; tests
/// build a fresh instance each. Every method takes `&self`.
#[derive(Default)]
pub struct QueryProcessor {
   state: RwLock<ProcessorState>,
}

impl QueryProcessor {
   pub fn new() -> Self {
      Self::default()
   }

   /// Classifies `text` and extracts its entities. `language` defaults to the
   /// script detected in the text. Never fails: empty or unrecognised input
   /// yields a low-confidence `search`/`find`.
   pub fn process_query(&self, text: &str, language: Option<Language>) -> QueryIntent {
      self.process_query_on(text, language, Local::now().date_naive())
   }

   /// Same as [`Self::process_query`] with relative dates resolved against
   /// `today`.
   pub fn process_query_on(&self, text: &str, language: Option<Language>, today: NaiveDate) -> QueryIntent {
      let language = language.unwrap_or_else(|| detect_language(text));
      let normalized = normalize(text);
      let lowered = normalized.to_lowercase();

      let matched = rules::classify(&lowered, language);
      let entities = entities::extract(&normalized, language, today);
      let confidence = scoring::confidence(&lowered, entities.len(), matched.is_explicit());

      let mut parameters = HashMap::new();
      parameters.insert("language".to_string(), Value::from(language.code()));
      if let Some(keyword) = &matched.keyword {
         parameters.insert("keyword".to_string(), Value::from(keyword.as_str()));
      }
      if matched.kind == IntentType::Analytics {
         parameters.insert("aggregation".to_string(), Value::from(matched.action));
      }

      tracing::debug!(
         kind = ?matched.kind,
         action = matched.action,
         entities = entities.len(),
         confidence,
         "processed query"
      );

      QueryIntent {
         kind: matched.kind,
         action: matched.action.to_string(),
         confidence,
         parameters,
         entities,
         language,
         normalized_query: lowered,
      }
   }

   pub fn is_ambiguous(&self, text: &str, confidence: f32) -> bool {
      scoring::is_ambiguous(text, confidence)
   }

   pub fn generate_clarification_questions(&self, text: &str, language: Language) -> [String; 2] {
      scoring::clarification_questions(text, language)
   }

   /// Intent, organizational context, history-based suggestions and
   /// expansion in one pass. The user's activity is recorded as a side
   /// effect.
   pub fn process_query_with_context(
      &self,
      text: &str,
      language: Option<Language>,
      user: Option<&UserContext>,
   ) -> ContextualResult {
      let language = language
         .or_else(|| user.map(|u| u.preferences.language))
         .unwrap_or_else(|| detect_language(text));
      let intent = self.process_query(text, Some(language));
      let contextual_query = ContextualQuery::build(text, user);

      let mut state = self.state.write();
      let expanded_query = state.expander.expand(text);

      if let Some(user) = user
         && !user.id.is_empty()
      {
         let topics = intent
            .entities_of(EntityType::Topic)
            .map(|e| e.normalized.clone())
            .collect::<Vec<_>>();
         state.contexts.record_query(&user.id, text.trim(), topics);
      }

      ContextualResult { intent, contextual_query, expanded_query }
   }

   pub fn process_query_with_expansion(&self, text: &str) -> ExpansionResult {
      let intent = self.process_query(text, None);
      let expanded_query = self.state.read().expander.expand(text);
      ExpansionResult { intent, expanded_query }
   }

   pub fn get_query_suggestions(&self, prefix: &str, user: &UserContext) -> Vec<String> {
      context::query_suggestions(prefix, user)
   }

   pub fn update_document_corpus(&self, docs: impl IntoIterator<Item = CorpusDocument>) {
      let mut state = self.state.write();
      state.expander.update_corpus(docs);
      tracing::debug!(documents = state.expander.stats().document_count, "corpus updated");
   }

   pub fn add_synonym_mapping(&self, term: &str, synonyms: &[String]) {
      self.state.write().expander.add_synonyms(term, synonyms);
   }

   pub fn add_acronym_mapping(&self, acronym: &str, expansions: &[String]) {
      self.state.write().expander.add_acronym(acronym, expansions);
   }

   pub fn get_corpus_stats(&self) -> CorpusStats {
      self.state.read().expander.stats()
   }

   pub fn record_document_access(&self, user_id: &str, document_id: &str) {
      self.state.write().contexts.record_document(user_id, document_id);
   }

   pub fn recent_activity(&self, user_id: &str) -> Option<RecentActivity> {
      self.state.read().contexts.activity(user_id).cloned()
   }
}
