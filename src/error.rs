//! Service error module
//!
//! One error type covers every failure a handler can surface, and the
//! error-to-status mapping lives here as a single total function instead of
//! being scattered across handlers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::http::response::json_error_response;

/// Errors surfaced to API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid client-supplied parameter
    #[error("{0}")]
    MissingParam(String),

    /// Request body could not be read or parsed
    #[error("Invalid request body: {0}")]
    BadBody(String),

    /// Search provider failure (network, token, parse, provider-side error)
    #[error("Search failed: {0}")]
    SearchFailed(String),

    /// Image proxy pipeline failure (fetch, decode or encode)
    #[error("Failed to fetch image: {0}")]
    ProxyFailed(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Map error class to HTTP status code
    ///
    /// Proxy failures are deliberately reported as 400 rather than 502: the
    /// frontend treats them as "this image URL is unusable", which is a
    /// property of the request.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParam(_) | Self::BadBody(_) | Self::ProxyFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::SearchFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the client-facing JSON error response
    pub fn into_response(self) -> Response<Full<Bytes>> {
        json_error_response(self.status(), &self.to_string())
    }
}
