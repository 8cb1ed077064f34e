//! Sample results served when the backend is unreachable and
//! `search.mock_fallback` is enabled.

use std::collections::BTreeMap;

use crate::types::{SearchFilters, SearchResponse, SearchResult};

struct Sample {
   id:            &'static str,
   title:         &'static str,
   content:       &'static str,
   document_type: &'static str,
   author:        &'static str,
   created_at:    &'static str,
}

const SAMPLES: &[Sample] = &[
   Sample {
      id:            "mock-1",
      title:         "Annual Budget Report 2024",
      content:       "Consolidated budget figures and expense breakdown by department.",
      document_type: "pdf",
      author:        "Finance Team",
      created_at:    "2024-12-15",
   },
   Sample {
      id:            "mock-2",
      title:         "Server Rack Layout",
      content:       "Physical location of racks R-01 to R-24 in the main archive room.",
      document_type: "image",
      author:        "Operations",
      created_at:    "2025-01-08",
   },
   Sample {
      id:            "mock-3",
      title:         "Employee Onboarding Policy",
      content:       "Steps and documents required when onboarding a new employee.",
      document_type: "word",
      author:        "Human Resources",
      created_at:    "2024-09-02",
   },
   Sample {
      id:            "mock-4",
      title:         "Vendor Contract Renewal",
      content:       "Project management services agreement renewed for two years.",
      document_type: "pdf",
      author:        "John Doe",
      created_at:    "2025-02-20",
   },
];

fn matches(sample: &Sample, words: &[String], filters: &SearchFilters) -> bool {
   let haystack = format!("{} {}", sample.title, sample.content).to_lowercase();
   let text_ok = words.is_empty() || words.iter().any(|w| haystack.contains(w.as_str()));

   let type_ok = filters.document_types.is_empty()
      || filters
         .document_types
         .iter()
         .any(|t| t.eq_ignore_ascii_case(sample.document_type));

   let author_ok = filters.authors.is_empty()
      || filters
         .authors
         .iter()
         .any(|a| a.eq_ignore_ascii_case(sample.author));

   let date_ok = filters.date_range.as_ref().is_none_or(|range| {
      (range.start.is_empty() || sample.created_at >= range.start.as_str())
         && (range.end.is_empty() || sample.created_at <= range.end.as_str())
   });

   text_ok && type_ok && author_ok && date_ok
}

pub fn mock_response(query: &str, filters: &SearchFilters, page: usize, page_size: usize) -> SearchResponse {
   let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

   let matched: Vec<SearchResult> = SAMPLES
      .iter()
      .filter(|sample| matches(sample, &words, filters))
      .map(|sample| SearchResult {
         id: sample.id.to_string(),
         title: sample.title.to_string(),
         content: sample.content.to_string(),
         document_type: sample.document_type.to_string(),
         author: sample.author.to_string(),
         score: 1.0,
         created_at: Some(sample.created_at.to_string()),
         metadata: BTreeMap::new(),
         ..SearchResult::default()
      })
      .collect();

   let total_results = matched.len() as u64;
   let skip = page.max(1).saturating_sub(1).saturating_mul(page_size);
   SearchResponse {
      results: matched.into_iter().skip(skip).take(page_size).collect(),
      total_results,
      time_taken: 0,
      aggregations: None,
   }
}
