use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
   #[error("http transport error: {0}")]
   Http(#[from] reqwest::Error),

   #[error("failed to {op}: server responded with {status}: {reason}")]
   Status { op: &'static str, status: u16, reason: String },

   #[error("failed to {op}: {reason}")]
   Service { op: &'static str, reason: String },

   #[error("search request was superseded by a newer search")]
   Cancelled,

   #[error("configuration error: {0}")]
   Config(#[from] Box<figment::Error>),

   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   #[error("json error: {0}")]
   Json(#[from] serde_json::Error),

   #[error("invalid input: {0}")]
   InvalidInput(String),
}

impl From<figment::Error> for Error {
   fn from(err: figment::Error) -> Self {
      Self::Config(Box::new(err))
   }
}

impl Error {
   /// Whether the backend could not be reached or refused the request, as
   /// opposed to answering with a body that could not be used.
   pub const fn is_transport(&self) -> bool {
      matches!(self, Self::Http(_) | Self::Status { .. })
   }
}
