use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
   #[default]
   En,
   Ar,
}

impl Language {
   pub const fn code(self) -> &'static str {
      match self {
         Self::En => "en",
         Self::Ar => "ar",
      }
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
   Search,
   Filter,
   Analytics,
   Action,
   Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
   DocumentType,
   Author,
   Date,
   Topic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
   #[serde(rename = "type")]
   pub kind:       EntityType,
   pub value:      String,
   pub normalized: String,
}

impl Entity {
   pub fn new(kind: EntityType, value: impl Into<String>, normalized: impl Into<String>) -> Self {
      Self { kind, value: value.into(), normalized: normalized.into() }
   }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
   #[serde(rename = "type")]
   pub kind:             IntentType,
   pub action:           String,
   pub confidence:       f32,
   #[serde(default, skip_serializing_if = "HashMap::is_empty")]
   pub parameters:       HashMap<String, Value>,
   pub entities:         Vec<Entity>,
   pub language:         Language,
   pub normalized_query: String,
}

impl QueryIntent {
   pub fn entities_of(&self, kind: EntityType) -> impl Iterator<Item = &Entity> {
      self.entities.iter().filter(move |e| e.kind == kind)
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
   pub start: String,
   pub end:   String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
   #[serde(default, skip_serializing_if = "Vec::is_empty")]
   pub document_types:  Vec<String>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub date_range:      Option<DateRange>,
   #[serde(default, skip_serializing_if = "Vec::is_empty")]
   pub authors:         Vec<String>,
   #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
   pub custom_metadata: BTreeMap<String, String>,
}

impl SearchFilters {
   pub fn is_empty(&self) -> bool {
      self.document_types.is_empty()
         && self.date_range.is_none()
         && self.authors.is_empty()
         && self.custom_metadata.is_empty()
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
   #[default]
   Relevance,
   Date,
   Title,
   Author,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
   pub id:            String,
   pub title:         String,
   pub content:       String,
   pub document_type: String,
   pub author:        String,
   pub score:         f32,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub created_at:    Option<String>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub modified_at:   Option<String>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub ocr_text:      Option<String>,
   #[serde(default)]
   pub tags:          Vec<String>,
   #[serde(default)]
   pub metadata:      BTreeMap<String, Value>,
   #[serde(default)]
   pub highlights:    Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationBucket {
   pub key:       String,
   pub doc_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
   pub results:       Vec<SearchResult>,
   pub total_results: u64,
   /// Milliseconds reported by the backend.
   pub time_taken:    u64,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub aggregations:  Option<BTreeMap<String, Vec<AggregationBucket>>>,
}

impl SearchResponse {
   pub fn empty() -> Self {
      Self::default()
   }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
   pub text:  String,
   #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
   pub kind:  Option<String>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub score: Option<f32>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub count: Option<u64>,
}

/// A document as the console knows it, before it is mapped to index fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
   #[serde(default)]
   pub id:            String,
   pub title:         String,
   #[serde(default)]
   pub content:       String,
   #[serde(default)]
   pub ocr_text:      Option<String>,
   #[serde(default)]
   pub document_type: String,
   #[serde(default)]
   pub author:        String,
   #[serde(default)]
   pub created_at:    Option<String>,
   #[serde(default)]
   pub tags:          Vec<String>,
   #[serde(default)]
   pub metadata:      BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
   #[serde(default)]
   pub title:         Option<String>,
   #[serde(default)]
   pub content:       Option<String>,
   #[serde(default)]
   pub ocr_text:      Option<String>,
   #[serde(default)]
   pub document_type: Option<String>,
   #[serde(default)]
   pub author:        Option<String>,
   #[serde(default)]
   pub tags:          Option<Vec<String>>,
   #[serde(default)]
   pub metadata:      Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOutcome {
   pub success:     bool,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub document_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
   #[serde(default)]
   pub id:      String,
   #[serde(default = "default_true")]
   pub success: bool,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub error:   Option<String>,
}

const fn default_true() -> bool {
   true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIndexOutcome {
   pub success: bool,
   pub results: Vec<BatchItemResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BooleanOperator {
   #[default]
   And,
   Or,
   Not,
}

/// One parenthesised group of an advanced query; groups nest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryGroup {
   pub operator: BooleanOperator,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub field:    Option<String>,
   #[serde(default)]
   pub terms:    Vec<String>,
   #[serde(default, skip_serializing_if = "Vec::is_empty")]
   pub groups:   Vec<QueryGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedQuery {
   pub text:    String,
   #[serde(default)]
   pub filters: SearchFilters,
   pub boolean: BooleanOperator,
   #[serde(default)]
   pub groups:  Vec<QueryGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
   #[default]
   Csv,
   Json,
   Xlsx,
   Pdf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
   pub format:           ExportFormat,
   pub include_content:  bool,
   pub include_metadata: bool,
   #[serde(default)]
   pub selected_fields:  Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexHealth {
   Green,
   Yellow,
   Red,
   #[default]
   #[serde(other)]
   Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatus {
   #[serde(default)]
   pub total_documents: u64,
   #[serde(default)]
   pub last_indexed:    Option<String>,
   #[serde(default)]
   pub index_health:    IndexHealth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexJob {
   pub job_id: String,
}
