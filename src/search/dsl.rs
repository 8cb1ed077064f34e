//! Elasticsearch request bodies.
//!
//! The `query.bool.must[0].multi_match` / `query.bool.filter[]` layout is what
//! the search backend expects; keep it stable.

use serde_json::{Value, json};

use crate::types::{SearchFilters, SortOrder};

pub const SEARCH_FIELDS: &[&str] = &["title^3", "content^2", "ocr_text^1.5", "metadata.*"];
pub const HIGHLIGHT_FIELDS: &[&str] = &["title", "content", "ocr_text"];
pub const AGGREGATION_SIZE: usize = 20;

pub fn text_clause(query: &str) -> Value {
   let query = query.trim();
   if query.is_empty() {
      return json!({ "match_all": {} });
   }

   json!({
      "multi_match": {
         "query": query,
         "fields": SEARCH_FIELDS,
         "fuzziness": "AUTO",
      }
   })
}

/// One clause per populated filter; absent or empty filters add nothing.
pub fn filter_clauses(filters: &SearchFilters) -> Vec<Value> {
   let mut clauses = Vec::new();

   if !filters.document_types.is_empty() {
      clauses.push(json!({ "terms": { "document_type": filters.document_types } }));
   }

   if let Some(range) = &filters.date_range {
      let mut bounds = serde_json::Map::new();
      if !range.start.is_empty() {
         bounds.insert("gte".to_string(), Value::from(range.start.as_str()));
      }
      if !range.end.is_empty() {
         bounds.insert("lte".to_string(), Value::from(range.end.as_str()));
      }
      if !bounds.is_empty() {
         clauses.push(json!({ "range": { "created_at": bounds } }));
      }
   }

   if !filters.authors.is_empty() {
      clauses.push(json!({ "terms": { "author.keyword": filters.authors } }));
   }

   for (key, value) in &filters.custom_metadata {
      clauses.push(json!({ "term": { format!("metadata.{key}"): value } }));
   }

   clauses
}

pub fn sort_clause(sort: SortOrder) -> Value {
   match sort {
      SortOrder::Relevance => json!([{ "_score": { "order": "desc" } }]),
      SortOrder::Date => json!([{ "created_at": { "order": "desc" } }, "_score"]),
      SortOrder::Title => json!([{ "title.keyword": { "order": "asc" } }, "_score"]),
      SortOrder::Author => json!([{ "author.keyword": { "order": "asc" } }, "_score"]),
   }
}

fn highlight() -> Value {
   let fields: serde_json::Map<String, Value> = HIGHLIGHT_FIELDS
      .iter()
      .map(|field| ((*field).to_string(), json!({})))
      .collect();
   json!({
      "pre_tags": ["<mark>"],
      "post_tags": ["</mark>"],
      "fields": fields,
   })
}

fn aggregations() -> Value {
   json!({
      "document_types": { "terms": { "field": "document_type", "size": AGGREGATION_SIZE } },
      "authors": { "terms": { "field": "author.keyword", "size": AGGREGATION_SIZE } },
   })
}

/// Full body for `POST {base}/elasticsearch`. `page` is 1-based.
pub fn search_body(query: &str, filters: &SearchFilters, page: usize, page_size: usize, sort: SortOrder) -> Value {
   let page = page.max(1);
   json!({
      "query": {
         "bool": {
            "must": [text_clause(query)],
            "filter": filter_clauses(filters),
         }
      },
      "size": page_size,
      "from": (page - 1).saturating_mul(page_size),
      "sort": sort_clause(sort),
      "highlight": highlight(),
      "aggs": aggregations(),
   })
}
