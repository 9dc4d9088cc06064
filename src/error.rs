//! Error types shared by every part of the fetch layer.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure raised by the transport or while materializing a body.
///
/// The original error is kept as-is; nothing is reclassified.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(BoxError);

impl TransportError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    /// Borrow the original error as a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Recover the original error.
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

/// Errors that can occur while building, cloning, or dispatching requests.
#[derive(Debug, Error)]
pub enum ShimError {
    /// A frozen header collection was written to.
    #[error("Can't modify immutable headers")]
    ImmutableHeaders,

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] axum::http::header::InvalidHeaderValue),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid URI: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    /// GET and HEAD requests cannot carry a body.
    #[error("request with {0} method cannot have body")]
    BodyNotAllowed(axum::http::Method),

    /// The body was already read, so it can't be read or cloned again.
    #[error("body used already")]
    BodyUsed,

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ShimError {
    /// True for writes rejected because the headers are frozen.
    pub fn is_immutable_headers(&self) -> bool {
        matches!(self, ShimError::ImmutableHeaders)
    }
}

/// Result type for fetch layer operations.
pub type ShimResult<T> = Result<T, ShimError>;
