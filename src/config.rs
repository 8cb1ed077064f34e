use std::path::{Path, PathBuf};

use directories::BaseDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::Result;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/search";

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 500;

pub const MIN_SUGGESTION_LEN: usize = 2;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

pub const ENV_PREFIX: &str = "DOCQUERY_";

pub fn data_dir() -> PathBuf {
   BaseDirs::new().map_or_else(
      || PathBuf::from(".docquery"),
      |dirs| dirs.home_dir().join(".docquery"),
   )
}

pub fn config_path() -> PathBuf {
   data_dir().join("config.toml")
}

pub fn auth_state_path() -> PathBuf {
   data_dir().join("auth.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
   pub base_url:           String,
   /// Serve built-in sample results when the search backend is unreachable.
   pub mock_fallback:      bool,
   pub min_suggestion_len: usize,
   pub default_page_size:  usize,
   pub timeout_ms:         Option<u64>,
}

impl Default for SearchConfig {
   fn default() -> Self {
      Self {
         base_url:           DEFAULT_BASE_URL.to_string(),
         mock_fallback:      false,
         min_suggestion_len: MIN_SUGGESTION_LEN,
         default_page_size:  DEFAULT_PAGE_SIZE,
         timeout_ms:         None,
      }
   }
}

impl SearchConfig {
   pub fn with_base_url(base_url: impl Into<String>) -> Self {
      Self { base_url: base_url.into(), ..Self::default() }
   }

   /// Joins `path` onto the configured base, tolerating a trailing slash.
   pub fn endpoint(&self, path: &str) -> String {
      format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
   }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
   pub state_path: Option<PathBuf>,
}

impl AuthConfig {
   pub fn resolved_state_path(&self) -> PathBuf {
      self.state_path.clone().unwrap_or_else(auth_state_path)
   }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   pub search: SearchConfig,
   pub auth:   AuthConfig,
}

impl Config {
   /// Loads defaults, then `~/.docquery/config.toml`, then `extra` if given,
   /// then `DOCQUERY_*` environment variables (`__` separates sections).
   pub fn load(extra: Option<&Path>) -> Result<Self> {
      let mut figment = Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(config_path()));

      if let Some(path) = extra {
         figment = figment.merge(Toml::file(path));
      }

      let config = figment
         .merge(Env::prefixed(ENV_PREFIX).split("__"))
         .extract()?;
      Ok(config)
   }

   pub fn to_toml(&self) -> Result<String> {
      toml::to_string_pretty(self).map_err(|e| crate::Error::InvalidInput(e.to_string()))
   }
}
