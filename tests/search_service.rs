//! HTTP behaviour of `SearchService` against a mocked search backend.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use docquery::{
   Error, SearchRequest, SearchService, SearchState,
   auth::StaticToken,
   config::SearchConfig,
   types::{
      AdvancedQuery, BooleanOperator, DateRange, Document, DocumentUpdate, ExportFormat,
      ExportOptions, IndexHealth, SearchFilters,
   },
};
use serde_json::{Value, json};
use wiremock::{
   Mock, MockServer, ResponseTemplate,
   matchers::{body_partial_json, body_string_contains, header, method, path, query_param},
};

fn service(server: &MockServer, mock_fallback: bool) -> SearchService {
   let config = SearchConfig {
      mock_fallback,
      ..SearchConfig::with_base_url(format!("{}/api/search", server.uri()))
   };
   SearchService::new(config, StaticToken::none()).unwrap()
}

fn zero_hits() -> Value {
   json!({ "took": 3, "hits": { "total": { "value": 0, "relation": "eq" }, "hits": [] } })
}

fn one_hit(id: &str) -> Value {
   json!({
      "took": 5,
      "hits": {
         "total": { "value": 1 },
         "hits": [{
            "_id": id,
            "_score": 2.0,
            "_source": { "title": "Quarterly report", "content": "Q3 numbers", "document_type": "pdf", "author": "Finance" }
         }]
      }
   })
}

async fn last_body(server: &MockServer) -> Value {
   let requests = server.received_requests().await.unwrap();
   let request = requests.last().unwrap();
   serde_json::from_slice(&request.body).unwrap()
}

#[tokio::test]
async fn search_posts_filters_as_es_clauses() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/elasticsearch"))
      .and(header("content-type", "application/json"))
      .respond_with(ResponseTemplate::new(200).set_body_json(zero_hits()))
      .expect(1)
      .mount(&server)
      .await;

   let mut custom_metadata = BTreeMap::new();
   custom_metadata.insert("rack".to_string(), "R-12".to_string());
   let filters = SearchFilters {
      document_types: vec!["pdf".to_string()],
      date_range: Some(DateRange { start: "2025-01-01".to_string(), end: "2025-03-31".to_string() }),
      authors: vec!["John Doe".to_string()],
      custom_metadata,
   };

   let service = service(&server, false);
   let mut request = SearchRequest::new("budget", &filters);
   request.page = 2;
   request.page_size = 10;
   let response = service.search(request).await.unwrap();
   assert!(response.results.is_empty());
   assert_eq!(response.total_results, 0);
   assert_eq!(service.state(), SearchState::Completed);

   let body = last_body(&server).await;
   assert_eq!(body["query"]["bool"]["must"][0]["multi_match"]["query"], "budget");
   assert_eq!(body["from"], 10);
   assert_eq!(body["size"], 10);
   assert_eq!(
      body["query"]["bool"]["filter"],
      json!([
         { "terms": { "document_type": ["pdf"] } },
         { "range": { "created_at": { "gte": "2025-01-01", "lte": "2025-03-31" } } },
         { "terms": { "author.keyword": ["John Doe"] } },
         { "term": { "metadata.rack": "R-12" } },
      ])
   );
}

#[tokio::test]
async fn search_normalizes_hits() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/elasticsearch"))
      .respond_with(ResponseTemplate::new(200).set_body_json(one_hit("doc-7")))
      .mount(&server)
      .await;

   let filters = SearchFilters::default();
   let response = service(&server, false)
      .search(SearchRequest::new("report", &filters))
      .await
      .unwrap();
   assert_eq!(response.total_results, 1);
   assert_eq!(response.time_taken, 5);
   assert_eq!(response.results[0].id, "doc-7");
   assert_eq!(response.results[0].document_type, "pdf");
}

#[tokio::test]
async fn newer_search_cancels_the_one_in_flight() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(body_string_contains("\"slow\""))
      .respond_with(
         ResponseTemplate::new(200)
            .set_body_json(one_hit("stale"))
            .set_delay(Duration::from_secs(2)),
      )
      .with_priority(1)
      .mount(&server)
      .await;
   Mock::given(method("POST"))
      .and(path("/api/search/elasticsearch"))
      .respond_with(ResponseTemplate::new(200).set_body_json(one_hit("fresh")))
      .mount(&server)
      .await;

   let service = Arc::new(service(&server, false));
   let first = {
      let service = Arc::clone(&service);
      tokio::spawn(async move {
         let filters = SearchFilters::default();
         service.search(SearchRequest::new("slow", &filters)).await
      })
   };
   tokio::time::sleep(Duration::from_millis(100)).await;
   assert_eq!(service.state(), SearchState::Searching);

   let filters = SearchFilters::default();
   let second = service.search(SearchRequest::new("fast", &filters)).await.unwrap();
   assert_eq!(second.results[0].id, "fresh");

   let first = first.await.unwrap();
   assert!(matches!(first, Err(Error::Cancelled)));
   assert_eq!(service.state(), SearchState::Completed);
}

#[tokio::test]
async fn explicit_cancel_aborts_search() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .respond_with(
         ResponseTemplate::new(200)
            .set_body_json(zero_hits())
            .set_delay(Duration::from_secs(2)),
      )
      .mount(&server)
      .await;

   let service = Arc::new(service(&server, false));
   let pending = {
      let service = Arc::clone(&service);
      tokio::spawn(async move {
         let filters = SearchFilters::default();
         service.search(SearchRequest::new("anything", &filters)).await
      })
   };
   tokio::time::sleep(Duration::from_millis(100)).await;
   service.cancel();

   assert!(matches!(pending.await.unwrap(), Err(Error::Cancelled)));
   assert_eq!(service.state(), SearchState::Cancelled);
}

#[tokio::test]
async fn null_fields_do_not_drop_the_page() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/elasticsearch"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
         "took": 4,
         "hits": {
            "total": { "value": 2 },
            "hits": [
               { "_id": "a", "_score": 2.0, "_source": { "title": "Budget", "author": "Finance" } },
               { "_id": "b", "_score": 1.0, "_source": { "title": "Minutes", "author": null, "document_type": null } }
            ]
         }
      })))
      .mount(&server)
      .await;

   let service = service(&server, false);
   let filters = SearchFilters::default();
   let response = service.search(SearchRequest::new("budget", &filters)).await.unwrap();
   assert_eq!(response.results.len(), 2);
   assert_eq!(response.results[1].author, "");
   assert_eq!(service.state(), SearchState::Completed);
}

#[tokio::test]
async fn backend_failure_degrades_to_empty() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

   let service = service(&server, false);
   let filters = SearchFilters::default();
   let response = service.search(SearchRequest::new("budget", &filters)).await.unwrap();
   assert!(response.results.is_empty());
   assert_eq!(response.total_results, 0);
   assert_eq!(service.state(), SearchState::Failed);
}

#[tokio::test]
async fn backend_failure_serves_samples_when_enabled() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

   let filters = SearchFilters::default();
   let response = service(&server, true)
      .search(SearchRequest::new("", &filters))
      .await
      .unwrap();
   assert_eq!(response.total_results, 4);
   assert!(response.results.iter().all(|r| r.id.starts_with("mock-")));
}

#[tokio::test]
async fn bearer_token_is_attached() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(header("authorization", "Bearer secret-token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(zero_hits()))
      .expect(1)
      .mount(&server)
      .await;

   let config = SearchConfig::with_base_url(format!("{}/api/search", server.uri()));
   let service = SearchService::new(config, StaticToken::new("secret-token")).unwrap();
   let filters = SearchFilters::default();
   service.search(SearchRequest::new("x", &filters)).await.unwrap();
   assert_eq!(service.state(), SearchState::Completed);
}

#[tokio::test]
async fn short_prefix_skips_the_network() {
   let server = MockServer::start().await;
   Mock::given(method("GET"))
      .and(path("/api/search/suggestions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(0)
      .mount(&server)
      .await;

   let service = service(&server, false);
   assert!(service.get_suggestions("a", &[], None).await.is_empty());
   assert!(service.get_suggestions("  b ", &[], None).await.is_empty());
}

#[tokio::test]
async fn suggestions_accept_wrapped_and_plain_payloads() {
   let server = MockServer::start().await;
   Mock::given(method("GET"))
      .and(path("/api/search/suggestions"))
      .and(query_param("q", "bud"))
      .and(query_param("types", "title,author"))
      .and(query_param("limit", "5"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
         "suggestions": [{ "text": "budget 2025", "type": "title", "count": 4 }, "budget review"]
      })))
      .mount(&server)
      .await;

   let types = vec!["title".to_string(), "author".to_string()];
   let suggestions = service(&server, false).get_suggestions("bud", &types, Some(5)).await;
   assert_eq!(suggestions.len(), 2);
   assert_eq!(suggestions[0].kind.as_deref(), Some("title"));
   assert_eq!(suggestions[0].count, Some(4));
   assert_eq!(suggestions[1].text, "budget review");
}

#[tokio::test]
async fn suggestion_failure_yields_nothing() {
   let server = MockServer::start().await;
   Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

   assert!(service(&server, false).get_suggestions("budget", &[], None).await.is_empty());
}

#[tokio::test]
async fn index_document_maps_fields() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/index/document"))
      .and(body_partial_json(json!({
         "document": { "id": "doc-1", "document_type": "pdf", "ocr_text": "scanned" }
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "documentId": "doc-1" })))
      .expect(1)
      .mount(&server)
      .await;

   let doc = Document {
      id: "doc-1".to_string(),
      title: "Lease".to_string(),
      ocr_text: Some("scanned".to_string()),
      document_type: "pdf".to_string(),
      ..Document::default()
   };
   let outcome = service(&server, false).index_document(&doc).await.unwrap();
   assert!(outcome.success);
   assert_eq!(outcome.document_id.as_deref(), Some("doc-1"));

   let body = last_body(&server).await;
   assert!(body["document"]["indexed_at"].is_string());
   assert!(body["document"].get("documentType").is_none());
}

#[tokio::test]
async fn index_failure_surfaces_server_message() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/index/document"))
      .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "index is read-only" })))
      .mount(&server)
      .await;

   let doc = Document { id: "doc-1".to_string(), ..Document::default() };
   let err = service(&server, false).index_document(&doc).await.unwrap_err();
   assert!(matches!(err, Error::Service { op: "index document", .. }));
   assert_eq!(err.to_string(), "failed to index document: index is read-only");
}

#[tokio::test]
async fn html_success_page_is_not_an_acknowledgement() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/index/document"))
      .respond_with(
         ResponseTemplate::new(200)
            .set_body_string("<html><body>Gateway login</body></html>")
            .insert_header("content-type", "text/html"),
      )
      .mount(&server)
      .await;

   let doc = Document { id: "doc-1".to_string(), ..Document::default() };
   let err = service(&server, false).index_document(&doc).await.unwrap_err();
   assert!(matches!(err, Error::Service { op: "index document", .. }));
}

#[tokio::test]
async fn update_sends_only_present_fields() {
   let server = MockServer::start().await;
   Mock::given(method("PATCH"))
      .and(path("/api/search/index/document/doc-9"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
      .expect(1)
      .mount(&server)
      .await;

   let updates = DocumentUpdate { title: Some("Renamed".to_string()), ..DocumentUpdate::default() };
   let outcome = service(&server, false).update_document_index("doc-9", &updates).await.unwrap();
   assert_eq!(outcome.document_id.as_deref(), Some("doc-9"));

   let body = last_body(&server).await;
   assert_eq!(body["updates"]["title"], "Renamed");
   assert!(body["updates"]["modified_at"].is_string());
   assert!(body["updates"].get("content").is_none());
}

#[tokio::test]
async fn remove_accepts_empty_success_body() {
   let server = MockServer::start().await;
   Mock::given(method("DELETE"))
      .and(path("/api/search/index/document/doc-3"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

   let outcome = service(&server, false).remove_document_from_index("doc-3").await.unwrap();
   assert!(outcome.success);
}

#[tokio::test]
async fn remove_reports_explicit_failure() {
   let server = MockServer::start().await;
   Mock::given(method("DELETE"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false, "error": "document is locked" })))
      .mount(&server)
      .await;

   let err = service(&server, false).remove_document_from_index("doc-3").await.unwrap_err();
   assert_eq!(err.to_string(), "failed to remove document from index: document is locked");
}

#[tokio::test]
async fn batch_reports_per_document_results() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/index/batch"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
         "results": [{ "id": "a" }, { "id": "b", "success": false, "error": "too large" }]
      })))
      .mount(&server)
      .await;

   let docs = vec![
      Document { id: "a".to_string(), ..Document::default() },
      Document { id: "b".to_string(), ..Document::default() },
   ];
   let outcome = service(&server, false).batch_index_documents(&docs).await.unwrap();
   assert!(!outcome.success);
   assert!(outcome.results[0].success);
   assert_eq!(outcome.results[1].error.as_deref(), Some("too large"));

   let body = last_body(&server).await;
   assert_eq!(body["documents"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn advanced_search_posts_boolean_groups() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/advanced"))
      .and(body_partial_json(json!({ "text": "contract", "boolean": "AND" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(one_hit("c-1")))
      .expect(1)
      .mount(&server)
      .await;

   let query = AdvancedQuery {
      text: "contract".to_string(),
      boolean: BooleanOperator::And,
      ..AdvancedQuery::default()
   };
   let response = service(&server, false).advanced_search(&query).await;
   assert_eq!(response.results[0].id, "c-1");
}

#[tokio::test]
async fn export_returns_raw_payload() {
   let server = MockServer::start().await;
   Mock::given(method("POST"))
      .and(path("/api/search/export"))
      .and(body_partial_json(json!({ "query": "invoices", "options": { "format": "csv" } })))
      .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id,title\n1,Invoice\n".to_vec()))
      .mount(&server)
      .await;

   let options = ExportOptions { format: ExportFormat::Csv, ..ExportOptions::default() };
   let payload = service(&server, false)
      .export_results("invoices", &SearchFilters::default(), &options)
      .await
      .unwrap();
   assert_eq!(&payload[..], b"id,title\n1,Invoice\n");
}

#[tokio::test]
async fn status_and_reindex() {
   let server = MockServer::start().await;
   Mock::given(method("GET"))
      .and(path("/api/search/status"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
         "totalDocuments": 1204, "lastIndexed": "2025-05-30T10:00:00Z", "indexHealth": "yellow"
      })))
      .mount(&server)
      .await;
   Mock::given(method("POST"))
      .and(path("/api/search/reindex"))
      .and(body_partial_json(json!({ "documentIds": ["a", "b"] })))
      .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "jobId": "job-9" })))
      .mount(&server)
      .await;

   let service = service(&server, false);
   let status = service.get_index_status().await.unwrap();
   assert_eq!(status.total_documents, 1204);
   assert_eq!(status.index_health, IndexHealth::Yellow);

   let job = service
      .reindex_documents(&["a".to_string(), "b".to_string()])
      .await
      .unwrap();
   assert_eq!(job.job_id, "job-9");
}
