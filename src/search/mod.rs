//! Client for the document search backend.
//!
//! [`SearchService`] builds Elasticsearch bodies via [`dsl`], posts them, and
//! normalizes what comes back via [`normalize`]. Only `search` is
//! single-flight: starting a new one cancels whatever search the same
//! instance still has in flight. Everything else runs independently.

pub mod dsl;
pub mod mock;
pub mod normalize;

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::{Client, Method, RequestBuilder, Response, Url, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::{
   Result,
   auth::{FileTokenSource, TokenSource},
   config::{Config, DEFAULT_PAGE_SIZE, DEFAULT_SUGGESTION_LIMIT, MAX_PAGE_SIZE, SearchConfig},
   error::Error,
   types::{
      AdvancedQuery, BatchIndexOutcome, BatchItemResult, Document, DocumentUpdate, ExportOptions,
      IndexOutcome, IndexStatus, ReindexJob, SearchFilters, SearchResponse, SortOrder, Suggestion,
   },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
   Idle,
   Searching,
   Completed,
   Cancelled,
   Failed,
}

struct InFlight {
   cancel:     Option<CancellationToken>,
   generation: u64,
   state:      SearchState,
}

#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
   pub query:     &'a str,
   pub filters:   &'a SearchFilters,
   pub page:      usize,
   pub page_size: usize,
   pub sort:      SortOrder,
}

impl<'a> SearchRequest<'a> {
   pub fn new(query: &'a str, filters: &'a SearchFilters) -> Self {
      Self { query, filters, page: 1, page_size: DEFAULT_PAGE_SIZE, sort: SortOrder::Relevance }
   }
}

/// Index-side field names for a [`Document`].
#[derive(Debug, Serialize)]
struct IndexedDocument<'a> {
   id:            &'a str,
   title:         &'a str,
   content:       &'a str,
   #[serde(skip_serializing_if = "Option::is_none")]
   ocr_text:      Option<&'a str>,
   document_type: &'a str,
   author:        &'a str,
   #[serde(skip_serializing_if = "Option::is_none")]
   created_at:    Option<&'a str>,
   tags:          &'a [String],
   metadata:      &'a std::collections::BTreeMap<String, Value>,
   indexed_at:    String,
}

impl<'a> IndexedDocument<'a> {
   fn new(doc: &'a Document, now: &str) -> Self {
      Self {
         id:            &doc.id,
         title:         &doc.title,
         content:       &doc.content,
         ocr_text:      doc.ocr_text.as_deref(),
         document_type: &doc.document_type,
         author:        &doc.author,
         created_at:    doc.created_at.as_deref(),
         tags:          &doc.tags,
         metadata:      &doc.metadata,
         indexed_at:    now.to_string(),
      }
   }
}

#[derive(Debug, Serialize)]
struct IndexedUpdate<'a> {
   #[serde(skip_serializing_if = "Option::is_none")]
   title:         Option<&'a str>,
   #[serde(skip_serializing_if = "Option::is_none")]
   content:       Option<&'a str>,
   #[serde(skip_serializing_if = "Option::is_none")]
   ocr_text:      Option<&'a str>,
   #[serde(skip_serializing_if = "Option::is_none")]
   document_type: Option<&'a str>,
   #[serde(skip_serializing_if = "Option::is_none")]
   author:        Option<&'a str>,
   #[serde(skip_serializing_if = "Option::is_none")]
   tags:          Option<&'a [String]>,
   #[serde(skip_serializing_if = "Option::is_none")]
   metadata:      Option<&'a std::collections::BTreeMap<String, Value>>,
   modified_at:   String,
}

impl<'a> IndexedUpdate<'a> {
   fn new(update: &'a DocumentUpdate, now: &str) -> Self {
      Self {
         title:         update.title.as_deref(),
         content:       update.content.as_deref(),
         ocr_text:      update.ocr_text.as_deref(),
         document_type: update.document_type.as_deref(),
         author:        update.author.as_deref(),
         tags:          update.tags.as_deref(),
         metadata:      update.metadata.as_ref(),
         modified_at:   now.to_string(),
      }
   }
}

/// Loose acknowledgement shape shared by the write endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ack {
   #[serde(default)]
   success:     Option<bool>,
   #[serde(default, alias = "id", alias = "_id")]
   document_id: Option<String>,
   #[serde(default)]
   job_id:      Option<String>,
   #[serde(default)]
   results:     Option<Vec<BatchItemResult>>,
   #[serde(default)]
   message:     Option<String>,
   #[serde(default)]
   error:       Option<String>,
}

impl Ack {
   fn reason(&self) -> Option<String> {
      self.message.clone().or_else(|| self.error.clone())
   }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionItem {
   Plain(String),
   Full(Suggestion),
}

impl From<SuggestionItem> for Suggestion {
   fn from(item: SuggestionItem) -> Self {
      match item {
         SuggestionItem::Plain(text) => Self { text, kind: None, score: None, count: None },
         SuggestionItem::Full(s) => s,
      }
   }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionsPayload {
   List(Vec<SuggestionItem>),
   Wrapped { suggestions: Vec<SuggestionItem> },
}

fn now_rfc3339() -> String {
   chrono::Utc::now().to_rfc3339()
}

pub struct SearchService {
   client:   Client,
   config:   SearchConfig,
   tokens:   Arc<dyn TokenSource>,
   inflight: Mutex<InFlight>,
}

impl SearchService {
   pub fn new(config: SearchConfig, tokens: impl TokenSource + 'static) -> Result<Self> {
      let mut builder = Client::builder();
      if let Some(ms) = config.timeout_ms {
         builder = builder.timeout(Duration::from_millis(ms));
      }

      Ok(Self {
         client: builder.build()?,
         config,
         tokens: Arc::new(tokens),
         inflight: Mutex::new(InFlight { cancel: None, generation: 0, state: SearchState::Idle }),
      })
   }

   /// Service wired to the persisted auth state named by `config`.
   pub fn from_config(config: &Config) -> Result<Self> {
      let tokens = FileTokenSource::new(config.auth.resolved_state_path());
      Self::new(config.search.clone(), tokens)
   }

   pub const fn config(&self) -> &SearchConfig {
      &self.config
   }

   pub fn state(&self) -> SearchState {
      self.inflight.lock().state
   }

   /// Aborts the in-flight search, if any.
   pub fn cancel(&self) {
      let mut inflight = self.inflight.lock();
      if let Some(token) = inflight.cancel.take() {
         token.cancel();
         if inflight.state == SearchState::Searching {
            inflight.state = SearchState::Cancelled;
         }
      }
   }

   fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
      let builder = self
         .client
         .request(method, url)
         .header(header::CONTENT_TYPE, "application/json");

      match self.tokens.token() {
         Some(token) => builder.bearer_auth(token),
         None => builder,
      }
   }

   fn document_url(&self, id: &str) -> Result<Url> {
      let mut url = Url::parse(&self.config.endpoint("index/document"))
         .map_err(|e| Error::InvalidInput(format!("invalid base url: {e}")))?;
      url.path_segments_mut()
         .map_err(|()| Error::InvalidInput("base url cannot carry a path".to_string()))?
         .push(id);
      Ok(url)
   }

   // ------------------------------------------------------------------
   // Search
   // ------------------------------------------------------------------

   /// Runs a search, cancelling any search this instance still has in
   /// flight.
   ///
   /// Transport and backend failures resolve to an empty response, or to
   /// sample data when `mock_fallback` is set. A search superseded by a newer
   /// call resolves to [`Error::Cancelled`].
   pub async fn search(&self, request: SearchRequest<'_>) -> Result<SearchResponse> {
      let page_size = request.page_size.clamp(1, MAX_PAGE_SIZE);
      let body = dsl::search_body(request.query, request.filters, request.page, page_size, request.sort);

      let cancel = CancellationToken::new();
      let generation = {
         let mut inflight = self.inflight.lock();
         if let Some(previous) = inflight.cancel.replace(cancel.clone())
            && inflight.state == SearchState::Searching
         {
            tracing::debug!("cancelling superseded search");
            previous.cancel();
            inflight.state = SearchState::Cancelled;
         }
         inflight.generation += 1;
         inflight.state = SearchState::Searching;
         inflight.generation
      };

      tracing::debug!(query = request.query, page = request.page, "search");

      let outcome = tokio::select! {
         biased;
         () = cancel.cancelled() => None,
         result = self.execute_search(&body) => Some(result),
      };

      let Some(result) = outcome else {
         tracing::debug!(query = request.query, "search cancelled");
         return Err(Error::Cancelled);
      };

      let state = if result.is_ok() {
         SearchState::Completed
      } else {
         SearchState::Failed
      };
      {
         let mut inflight = self.inflight.lock();
         if inflight.generation == generation {
            inflight.state = state;
            inflight.cancel = None;
         }
      }

      match result {
         Ok(response) => Ok(response),
         Err(e) => Ok(self.degraded(&e, request.query, request.filters, request.page, page_size)),
      }
   }

   fn degraded(
      &self,
      err: &Error,
      query: &str,
      filters: &SearchFilters,
      page: usize,
      page_size: usize,
   ) -> SearchResponse {
      let cause = failure_cause(err);
      if self.config.mock_fallback {
         tracing::warn!("search backend {cause} ({err}), serving sample results");
         mock::mock_response(query, filters, page, page_size)
      } else {
         tracing::warn!("search backend {cause}: {err}");
         SearchResponse::empty()
      }
   }

   async fn execute_search(&self, body: &Value) -> Result<SearchResponse> {
      let response = self
         .request(Method::POST, self.config.endpoint("elasticsearch"))
         .json(body)
         .send()
         .await?;
      let response = check_status("search", response).await?;
      let text = response.text().await?;
      Ok(normalize::parse_response(&text)?)
   }

   /// Boolean search with nested groups. Degrades like [`Self::search`] but
   /// is not single-flight.
   pub async fn advanced_search(&self, query: &AdvancedQuery) -> SearchResponse {
      let body = json!({
         "text": query.text,
         "filters": query.filters,
         "boolean": query.boolean,
         "groups": query.groups,
      });

      match self.execute_advanced(&body).await {
         Ok(response) => response,
         Err(e) => self.degraded(&e, &query.text, &query.filters, 1, self.config.default_page_size),
      }
   }

   async fn execute_advanced(&self, body: &Value) -> Result<SearchResponse> {
      let response = self
         .request(Method::POST, self.config.endpoint("advanced"))
         .json(body)
         .send()
         .await?;
      let response = check_status("run advanced search", response).await?;
      let text = response.text().await?;
      Ok(normalize::parse_response(&text)?)
   }

   /// Autocomplete suggestions. Prefixes shorter than
   /// `min_suggestion_len` return nothing without touching the network.
   pub async fn get_suggestions(&self, prefix: &str, types: &[String], limit: Option<usize>) -> Vec<Suggestion> {
      let prefix = prefix.trim();
      if prefix.chars().count() < self.config.min_suggestion_len {
         return Vec::new();
      }
      let limit = limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);

      match self.fetch_suggestions(prefix, types, limit).await {
         Ok(suggestions) => suggestions,
         Err(e) => {
            tracing::warn!("suggestions unavailable: {e}");
            Vec::new()
         },
      }
   }

   async fn fetch_suggestions(&self, prefix: &str, types: &[String], limit: usize) -> Result<Vec<Suggestion>> {
      let response = self
         .request(Method::GET, self.config.endpoint("suggestions"))
         .query(&[
            ("q", prefix.to_string()),
            ("types", types.join(",")),
            ("limit", limit.to_string()),
         ])
         .send()
         .await?;
      let response = check_status("fetch suggestions", response).await?;

      let items = match response.json::<SuggestionsPayload>().await? {
         SuggestionsPayload::List(items) | SuggestionsPayload::Wrapped { suggestions: items } => items,
      };
      Ok(items.into_iter().map(Suggestion::from).take(limit).collect())
   }

   // ------------------------------------------------------------------
   // Index management
   // ------------------------------------------------------------------

   pub async fn index_document(&self, doc: &Document) -> Result<IndexOutcome> {
      let now = now_rfc3339();
      let body = json!({ "document": IndexedDocument::new(doc, &now) });

      let response = self
         .request(Method::POST, self.config.endpoint("index/document"))
         .json(&body)
         .send()
         .await?;
      let ack = acknowledge("index document", response).await?;

      tracing::info!(id = doc.id, "document indexed");
      Ok(IndexOutcome {
         success:     true,
         document_id: ack.document_id.or_else(|| Some(doc.id.clone())),
      })
   }

   pub async fn update_document_index(&self, id: &str, updates: &DocumentUpdate) -> Result<IndexOutcome> {
      let now = now_rfc3339();
      let body = json!({ "updates": IndexedUpdate::new(updates, &now) });

      let response = self
         .request(Method::PATCH, self.document_url(id)?)
         .json(&body)
         .send()
         .await?;
      acknowledge("update document index", response).await?;

      tracing::info!(id, "document index updated");
      Ok(IndexOutcome { success: true, document_id: Some(id.to_string()) })
   }

   pub async fn remove_document_from_index(&self, id: &str) -> Result<IndexOutcome> {
      let response = self
         .request(Method::DELETE, self.document_url(id)?)
         .send()
         .await?;
      acknowledge("remove document from index", response).await?;

      tracing::info!(id, "document removed from index");
      Ok(IndexOutcome { success: true, document_id: Some(id.to_string()) })
   }

   pub async fn batch_index_documents(&self, docs: &[Document]) -> Result<BatchIndexOutcome> {
      if docs.is_empty() {
         return Ok(BatchIndexOutcome { success: true, results: Vec::new() });
      }

      let now = now_rfc3339();
      let documents: Vec<IndexedDocument<'_>> =
         docs.iter().map(|doc| IndexedDocument::new(doc, &now)).collect();

      let response = self
         .request(Method::POST, self.config.endpoint("index/batch"))
         .json(&json!({ "documents": documents }))
         .send()
         .await?;
      let ack = acknowledge("batch index documents", response).await?;

      let results = ack.results.unwrap_or_else(|| {
         docs
            .iter()
            .map(|doc| BatchItemResult { id: doc.id.clone(), success: true, error: None })
            .collect()
      });
      let success = results.iter().all(|r| r.success);

      tracing::info!(count = docs.len(), success, "batch indexed");
      Ok(BatchIndexOutcome { success, results })
   }

   /// Server-rendered export; the payload is returned untouched.
   pub async fn export_results(
      &self,
      query: &str,
      filters: &SearchFilters,
      options: &ExportOptions,
   ) -> Result<Bytes> {
      let response = self
         .request(Method::POST, self.config.endpoint("export"))
         .json(&json!({ "query": query, "filters": filters, "options": options }))
         .send()
         .await?;

      let response = ensure_success("export results", response).await?;
      Ok(response.bytes().await?)
   }

   pub async fn get_index_status(&self) -> Result<IndexStatus> {
      let response = self
         .request(Method::GET, self.config.endpoint("status"))
         .send()
         .await?;
      let response = ensure_success("fetch index status", response).await?;
      Ok(response.json().await?)
   }

   pub async fn reindex_documents(&self, ids: &[String]) -> Result<ReindexJob> {
      let response = self
         .request(Method::POST, self.config.endpoint("reindex"))
         .json(&json!({ "documentIds": ids }))
         .send()
         .await?;
      let ack = acknowledge("reindex documents", response).await?;

      let job_id = ack.job_id.ok_or_else(|| Error::Service {
         op:     "reindex documents",
         reason: "response did not include a job id".to_string(),
      })?;
      tracing::info!(job_id, count = ids.len(), "reindex started");
      Ok(ReindexJob { job_id })
   }
}

fn failure_cause(err: &Error) -> &'static str {
   if err.is_transport() { "unavailable" } else { "sent an unusable response" }
}

/// Non-2xx on a read path: the caller decides how to degrade.
async fn check_status(op: &'static str, response: Response) -> Result<Response> {
   let status = response.status();
   if status.is_success() {
      return Ok(response);
   }
   let reason = response.text().await.unwrap_or_default();
   Err(Error::Status { op, status: status.as_u16(), reason })
}

/// Non-2xx on a write path: surface the server's message.
async fn ensure_success(op: &'static str, response: Response) -> Result<Response> {
   let status = response.status();
   if status.is_success() {
      return Ok(response);
   }

   let text = response.text().await.unwrap_or_default();
   let reason = serde_json::from_str::<Ack>(&text)
      .ok()
      .and_then(|ack| ack.reason())
      .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
      .unwrap_or_else(|| status.to_string());
   Err(Error::Service { op, reason })
}

/// Checks status, then the body's `success` flag when present.
async fn acknowledge(op: &'static str, response: Response) -> Result<Ack> {
   let response = ensure_success(op, response).await?;
   let text = response.text().await?;
   if text.trim().is_empty() {
      return Ok(Ack::default());
   }

   let ack: Ack = serde_json::from_str(&text).map_err(|e| {
      tracing::warn!(op, "unreadable acknowledgement: {e}");
      Error::Service { op, reason: format!("unexpected response body: {e}") }
   })?;
   if ack.success == Some(false) {
      return Err(Error::Service {
         op,
         reason: ack.reason().unwrap_or_else(|| "server reported failure".to_string()),
      });
   }
   Ok(ack)
}
