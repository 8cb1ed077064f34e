//! User and organizational context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::scoring::{is_generic, tokenize};
use crate::types::Language;

const MAX_RECENT_ENTRIES: usize = 50;
const MAX_SUGGESTED_TERMS: usize = 5;
pub const MAX_QUERY_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecentActivity {
   pub queries:   Vec<String>,
   pub documents: Vec<String>,
   pub topics:    Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
   pub language:       Language,
   pub document_types: Vec<String>,
   pub search_history: Vec<String>,
}

/// Caller-supplied description of who is searching. Read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserContext {
   pub id:              String,
   pub role:            String,
   pub department:      String,
   pub permissions:     Vec<String>,
   pub recent_activity: RecentActivity,
   pub preferences:     UserPreferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationalContext {
   pub id:             String,
   pub name:           String,
   pub terms:          Vec<String>,
   pub document_types: Vec<String>,
}

struct OrgDef {
   id:             &'static str,
   name:           &'static str,
   terms:          &'static [&'static str],
   document_types: &'static [&'static str],
}

const ORGANIZATIONAL_CONTEXTS: &[OrgDef] = &[
   OrgDef {
      id:             "it",
      name:           "Information Technology",
      terms:          &["server", "network", "security", "software license", "incident report"],
      document_types: &["pdf", "word"],
   },
   OrgDef {
      id:             "hr",
      name:           "Human Resources",
      terms:          &["employee", "policy", "leave request", "payroll", "recruitment"],
      document_types: &["pdf", "word"],
   },
   OrgDef {
      id:             "finance",
      name:           "Finance",
      terms:          &["invoice", "budget", "expense report", "tax", "audit"],
      document_types: &["excel", "pdf"],
   },
   OrgDef {
      id:             "legal",
      name:           "Legal",
      terms:          &["contract", "agreement", "compliance", "nda", "litigation"],
      document_types: &["pdf", "word"],
   },
   OrgDef {
      id:             "operations",
      name:           "Operations",
      terms:          &["rack", "storage location", "inventory", "maintenance", "shipment"],
      document_types: &["excel", "image"],
   },
];

impl OrgDef {
   fn to_context(&self) -> OrganizationalContext {
      OrganizationalContext {
         id:             self.id.to_string(),
         name:           self.name.to_string(),
         terms:          self.terms.iter().map(|t| (*t).to_string()).collect(),
         document_types: self.document_types.iter().map(|t| (*t).to_string()).collect(),
      }
   }
}

/// Organizational contexts whose id matches the department, case-insensitively.
pub fn organizational_contexts(department: &str) -> Vec<OrganizationalContext> {
   let department = department.trim();
   ORGANIZATIONAL_CONTEXTS
      .iter()
      .filter(|def| def.id.eq_ignore_ascii_case(department))
      .map(OrgDef::to_context)
      .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
   pub user:           Option<UserContext>,
   pub organizational: Vec<OrganizationalContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualQuery {
   pub original_query:  String,
   pub context:         QueryContext,
   pub suggested_terms: Vec<String>,
}

impl ContextualQuery {
   pub fn build(query: &str, user: Option<&UserContext>) -> Self {
      let organizational = user
         .map(|u| organizational_contexts(&u.department))
         .unwrap_or_default();
      let suggested_terms = user
         .map(|u| related_history(query, &u.preferences.search_history))
         .unwrap_or_default();

      Self {
         original_query: query.to_string(),
         context: QueryContext { user: user.cloned(), organizational },
         suggested_terms,
      }
   }
}

/// History entries sharing at least one distinguishing word with `query`.
fn related_history(query: &str, history: &[String]) -> Vec<String> {
   let lowered = query.to_lowercase();
   let words: Vec<&str> = tokenize(&lowered).filter(|w| !is_generic(w)).collect();
   if words.is_empty() {
      return Vec::new();
   }

   let mut related: Vec<String> = Vec::new();
   for entry in history {
      let entry_lower = entry.to_lowercase();
      if entry_lower.trim() == lowered.trim() || related.contains(entry) {
         continue;
      }
      if tokenize(&entry_lower).any(|w| words.contains(&w)) {
         related.push(entry.clone());
      }
      if related.len() == MAX_SUGGESTED_TERMS {
         break;
      }
   }
   related
}

/// History and organizational terms containing `prefix`, history first.
pub fn query_suggestions(prefix: &str, user: &UserContext) -> Vec<String> {
   let needle = prefix.trim().to_lowercase();
   if needle.is_empty() {
      return Vec::new();
   }

   let org_terms: Vec<String> = organizational_contexts(&user.department)
      .into_iter()
      .flat_map(|ctx| ctx.terms)
      .collect();

   let mut suggestions: Vec<String> = Vec::new();
   for candidate in user.preferences.search_history.iter().chain(org_terms.iter()) {
      let lowered = candidate.to_lowercase();
      if lowered.contains(&needle) && !suggestions.iter().any(|s| s.to_lowercase() == lowered) {
         suggestions.push(candidate.clone());
      }
      if suggestions.len() == MAX_QUERY_SUGGESTIONS {
         break;
      }
   }
   suggestions
}

/// Records per-user activity observed while processing queries.
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
   activity: HashMap<String, RecentActivity>,
}

fn push_bounded(list: &mut Vec<String>, value: String) {
   list.retain(|existing| existing != &value);
   list.push(value);
   if list.len() > MAX_RECENT_ENTRIES {
      list.remove(0);
   }
}

impl ContextManager {
   pub fn record_query(&mut self, user_id: &str, query: &str, topics: impl IntoIterator<Item = String>) {
      let activity = self.activity.entry(user_id.to_string()).or_default();
      push_bounded(&mut activity.queries, query.to_string());
      for topic in topics {
         push_bounded(&mut activity.topics, topic);
      }
   }

   pub fn record_document(&mut self, user_id: &str, document_id: &str) {
      let activity = self.activity.entry(user_id.to_string()).or_default();
      push_bounded(&mut activity.documents, document_id.to_string());
   }

   pub fn activity(&self, user_id: &str) -> Option<&RecentActivity> {
      self.activity.get(user_id)
   }
}
