//! Maps raw Elasticsearch responses onto [`SearchResponse`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{AggregationBucket, SearchResponse, SearchResult};

/// Highlight fields in display order; anything else follows alphabetically.
const HIGHLIGHT_ORDER: &[&str] = &["title", "content", "ocr_text"];

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
   D: Deserializer<'de>,
   T: Default + Deserialize<'de>,
{
   Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Default, Deserialize)]
pub struct EsResponse {
   #[serde(default)]
   pub took:         u64,
   #[serde(default)]
   pub hits:         EsHits,
   #[serde(default)]
   pub aggregations: Option<BTreeMap<String, EsAggregation>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EsHits {
   #[serde(default)]
   pub total: Option<EsTotal>,
   #[serde(default, deserialize_with = "null_as_default")]
   pub hits:  Vec<EsHit>,
}

/// `hits.total` is an object since ES 7 and a bare number before it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EsTotal {
   Object { value: u64 },
   Count(u64),
}

impl EsTotal {
   pub const fn value(&self) -> u64 {
      match self {
         Self::Object { value } | Self::Count(value) => *value,
      }
   }
}

#[derive(Debug, Deserialize)]
pub struct EsHit {
   #[serde(rename = "_id")]
   pub id:        String,
   #[serde(rename = "_score", default)]
   pub score:     Option<f32>,
   #[serde(rename = "_source", default, deserialize_with = "null_as_default")]
   pub source:    EsSource,
   #[serde(default, deserialize_with = "null_as_default")]
   pub highlight: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EsSource {
   #[serde(default, deserialize_with = "null_as_default")]
   pub title:         String,
   #[serde(default, deserialize_with = "null_as_default")]
   pub content:       String,
   #[serde(default, deserialize_with = "null_as_default")]
   pub document_type: String,
   #[serde(default, deserialize_with = "null_as_default")]
   pub author:        String,
   #[serde(default)]
   pub created_at:    Option<String>,
   #[serde(default)]
   pub modified_at:   Option<String>,
   #[serde(default)]
   pub ocr_text:      Option<String>,
   #[serde(default, deserialize_with = "null_as_default")]
   pub tags:          Vec<String>,
   #[serde(default, deserialize_with = "null_as_default")]
   pub metadata:      BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EsAggregation {
   #[serde(default, deserialize_with = "null_as_default")]
   pub buckets: Vec<EsBucket>,
}

#[derive(Debug, Deserialize)]
pub struct EsBucket {
   pub key:       Value,
   #[serde(default)]
   pub doc_count: u64,
}

fn bucket_key(key: &Value) -> String {
   match key {
      Value::String(s) => s.clone(),
      other => other.to_string(),
   }
}

fn ordered_highlights(mut highlight: BTreeMap<String, Vec<String>>) -> Vec<String> {
   let mut fragments = Vec::new();
   for field in HIGHLIGHT_ORDER {
      if let Some(values) = highlight.remove(*field) {
         fragments.extend(values);
      }
   }
   // BTreeMap iteration keeps the remainder alphabetical
   for (_, values) in highlight {
      fragments.extend(values);
   }
   fragments
}

impl From<EsHit> for SearchResult {
   fn from(hit: EsHit) -> Self {
      let EsSource {
         title,
         content,
         document_type,
         author,
         created_at,
         modified_at,
         ocr_text,
         tags,
         metadata,
      } = hit.source;

      Self {
         id: hit.id,
         title,
         content,
         document_type,
         author,
         score: hit.score.unwrap_or(0.0),
         created_at,
         modified_at,
         ocr_text,
         tags,
         metadata,
         highlights: ordered_highlights(hit.highlight),
      }
   }
}

impl From<EsResponse> for SearchResponse {
   fn from(raw: EsResponse) -> Self {
      let total_results = raw
         .hits
         .total
         .as_ref()
         .map_or(raw.hits.hits.len() as u64, EsTotal::value);

      let aggregations = raw.aggregations.map(|aggs| {
         aggs
            .into_iter()
            .map(|(name, agg)| {
               let buckets = agg
                  .buckets
                  .into_iter()
                  .map(|b| AggregationBucket { key: bucket_key(&b.key), doc_count: b.doc_count })
                  .collect();
               (name, buckets)
            })
            .collect()
      });

      Self {
         results: raw.hits.hits.into_iter().map(SearchResult::from).collect(),
         total_results,
         time_taken: raw.took,
         aggregations,
      }
   }
}

/// Parses a response body, treating anything unparseable as a failure of
/// the caller's choosing.
pub fn parse_response(body: &str) -> serde_json::Result<SearchResponse> {
   serde_json::from_str::<EsResponse>(body).map(SearchResponse::from)
}

#[cfg(test)]
mod tests {
   use serde_json::json;

   use super::*;

   #[test]
   fn normalizes_hits_and_totals() {
      let body = json!({
         "took": 7,
         "hits": {
            "total": { "value": 42, "relation": "eq" },
            "hits": [{
               "_id": "doc-1",
               "_score": 3.5,
               "_source": {
                  "title": "Rack inventory",
                  "content": "Rack R-12 holds archive boxes",
                  "document_type": "pdf",
                  "author": "Mona Said",
                  "created_at": "2025-01-04",
                  "metadata": { "rack": "R-12" }
               },
               "highlight": {
                  "metadata.rack": ["<mark>R-12</mark>"],
                  "content": ["<mark>Rack</mark> R-12 holds"],
                  "title": ["<mark>Rack</mark> inventory"]
               }
            }]
         }
      })
      .to_string();

      let response = parse_response(&body).unwrap();
      assert_eq!(response.total_results, 42);
      assert_eq!(response.time_taken, 7);
      let hit = &response.results[0];
      assert_eq!(hit.id, "doc-1");
      assert_eq!(hit.document_type, "pdf");
      assert_eq!(hit.metadata["rack"], "R-12");
      assert_eq!(hit.highlights, vec![
         "<mark>Rack</mark> inventory",
         "<mark>Rack</mark> R-12 holds",
         "<mark>R-12</mark>"
      ]);
   }

   #[test]
   fn legacy_numeric_total() {
      let response = parse_response(r#"{"took": 1, "hits": {"total": 3, "hits": []}}"#).unwrap();
      assert_eq!(response.total_results, 3);
   }

   #[test]
   fn zero_hits() {
      let response =
         parse_response(r#"{"took": 2, "hits": {"total": {"value": 0}, "hits": []}}"#).unwrap();
      assert!(response.results.is_empty());
      assert_eq!(response.total_results, 0);
      assert!(response.aggregations.is_none());
   }

   #[test]
   fn null_source_fields_keep_the_page() {
      let body = json!({
         "took": 3,
         "hits": {
            "total": { "value": 2 },
            "hits": [
               { "_id": "a", "_score": 2.0, "_source": { "title": "Budget", "author": "Mona Said" } },
               {
                  "_id": "b",
                  "_score": 1.0,
                  "_source": { "title": "Minutes", "author": null, "tags": null, "metadata": null },
                  "highlight": null
               }
            ]
         }
      })
      .to_string();

      let response = parse_response(&body).unwrap();
      assert_eq!(response.results.len(), 2);
      assert_eq!(response.results[0].author, "Mona Said");
      let second = &response.results[1];
      assert_eq!(second.id, "b");
      assert_eq!(second.title, "Minutes");
      assert_eq!(second.author, "");
      assert!(second.tags.is_empty());
      assert!(second.metadata.is_empty());
      assert!(second.highlights.is_empty());
   }

   #[test]
   fn aggregation_buckets() {
      let body = r#"{
         "took": 1,
         "hits": {"total": {"value": 0}, "hits": []},
         "aggregations": {
            "document_types": {"buckets": [{"key": "pdf", "doc_count": 9}, {"key": 2024, "doc_count": 1}]}
         }
      }"#;
      let response = parse_response(body).unwrap();
      let buckets = &response.aggregations.unwrap()["document_types"];
      assert_eq!(buckets[0], AggregationBucket { key: "pdf".to_string(), doc_count: 9 });
      assert_eq!(buckets[1].key, "2024");
   }
}
