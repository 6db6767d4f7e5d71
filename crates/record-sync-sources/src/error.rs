use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// A required field was absent or empty in an otherwise valid response.
    /// A release with no cover image is this error, not a record with a hole.
    #[error("missing field `{0}` in response")]
    MissingField(&'static str),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("not authenticated")]
    NotAuthenticated,
}

impl SourceError {
    /// Coarse label used to group failures in batch summaries.
    pub fn category(&self) -> &'static str {
        match self {
            SourceError::Http(_) => "http",
            SourceError::Api { .. } => "api",
            SourceError::MissingField(_) => "missing-field",
            SourceError::Malformed(_) => "malformed",
            SourceError::NotAuthenticated => "auth",
        }
    }
}
