use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;

/// Why a topic refresh produced no articles. Always recoverable: the store
/// falls back to the last known-good set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("feed returned no entries")]
    Empty,

    #[error("feed fetch failed: {0}")]
    Network(String),
}

/// A malformed request. Reported to the client as a 400 with a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("invalid page number '{0}': expected an integer >= 1")]
    InvalidPage(String),

    #[error("invalid sort order '{0}': expected 'latest' or 'hottest'")]
    InvalidSort(String),
}

impl RequestError {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::InvalidPage(_) => "invalid_page",
            RequestError::InvalidSort(_) => "invalid_sort",
        }
    }
}

/// JSON error body shared by request errors and catchers.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl From<&RequestError> for ErrorBody {
    fn from(err: &RequestError) -> Self {
        ErrorBody {
            error: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for RequestError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        tracing::debug!("rejecting request {}: {}", req.uri(), self);
        (Status::BadRequest, Json(ErrorBody::from(&self))).respond_to(req)
    }
}
