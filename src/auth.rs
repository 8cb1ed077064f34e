//! Bearer-token lookup for outgoing requests.
//!
//! Tokens are read from the persisted client auth state every time a request
//! is built, so a login or logout elsewhere takes effect on the next call.

use std::path::PathBuf;

use serde::Deserialize;

pub trait TokenSource: Send + Sync {
   fn token(&self) -> Option<String>;
}

impl<T: TokenSource + ?Sized> TokenSource for std::sync::Arc<T> {
   fn token(&self) -> Option<String> {
      (**self).token()
   }
}

#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
   pub fn new(token: impl Into<String>) -> Self {
      Self(Some(token.into()))
   }

   pub const fn none() -> Self {
      Self(None)
   }
}

impl TokenSource for StaticToken {
   fn token(&self) -> Option<String> {
      self.0.clone()
   }
}

#[derive(Deserialize)]
struct AuthState {
   #[serde(alias = "accessToken", alias = "access_token")]
   token: Option<String>,
}

/// Reads `{"token": "..."}` from a JSON file on every lookup.
#[derive(Debug, Clone)]
pub struct FileTokenSource {
   path: PathBuf,
}

impl FileTokenSource {
   pub fn new(path: impl Into<PathBuf>) -> Self {
      Self { path: path.into() }
   }
}

impl TokenSource for FileTokenSource {
   fn token(&self) -> Option<String> {
      let content = match std::fs::read_to_string(&self.path) {
         Ok(content) => content,
         Err(e) => {
            tracing::debug!("no auth state at {}: {e}", self.path.display());
            return None;
         },
      };

      match serde_json::from_str::<AuthState>(&content) {
         Ok(state) => state.token.filter(|t| !t.is_empty()),
         Err(e) => {
            tracing::warn!("ignoring malformed auth state {}: {e}", self.path.display());
            None
         },
      }
   }
}

#[cfg(test)]
mod tests {
   use tempfile::TempDir;

   use super::*;

   #[test]
   fn missing_file_yields_no_token() {
      let dir = TempDir::new().unwrap();
      let source = FileTokenSource::new(dir.path().join("auth.json"));
      assert_eq!(source.token(), None);
   }

   #[test]
   fn token_is_reread_on_each_call() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("auth.json");
      let source = FileTokenSource::new(&path);

      std::fs::write(&path, r#"{"token": "first"}"#).unwrap();
      assert_eq!(source.token().as_deref(), Some("first"));

      std::fs::write(&path, r#"{"accessToken": "second", "user": {"id": 7}}"#).unwrap();
      assert_eq!(source.token().as_deref(), Some("second"));
   }

   #[test]
   fn malformed_or_empty_token_is_ignored() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("auth.json");
      let source = FileTokenSource::new(&path);

      std::fs::write(&path, "not json").unwrap();
      assert_eq!(source.token(), None);

      std::fs::write(&path, r#"{"token": ""}"#).unwrap();
      assert_eq!(source.token(), None);
   }
}
