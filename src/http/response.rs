//! Response type.
//!
//! # Responsibilities
//! - Construct responses the way the fetch `Response` constructor does
//! - Wrap responses coming back from a transport
//! - Clone with the frozen-header flag carried over
//! - Build redirects
//!
//! # Design Decisions
//! - Composition over the `http` types, same as `Request`
//! - `redirect` goes through the ordinary constructor, so a redirect can be
//!   frozen and cloned like any dispatched response

use axum::body::{Body as HttpBody, Bytes};
use axum::http::header::LOCATION;
use axum::http::{Response as HttpResponse, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ShimError, ShimResult};
use crate::http::body::{read_slot, tee_slot, Body};
use crate::http::headers::Headers;

/// Status used by `redirect` when none is given.
pub const DEFAULT_REDIRECT_STATUS: u16 = 302;

/// Optional settings applied on construction.
#[derive(Debug, Default)]
pub struct ResponseInit {
    /// Defaults to 200.
    pub status: Option<u16>,
    /// Defaults to the canonical reason phrase for the status.
    pub status_text: Option<String>,
    pub headers: Option<Headers>,
    pub url: Option<Url>,
}

#[derive(Debug)]
pub struct Response {
    url: Option<Url>,
    status: StatusCode,
    status_text: String,
    headers: Headers,
    body: Option<Body>,
    body_used: bool,
}

impl Response {
    /// Build a response. The status must be within 200..=599.
    pub fn new(body: Option<Body>, init: ResponseInit) -> ShimResult<Self> {
        let code = init.status.unwrap_or(200);
        if !(200..=599).contains(&code) {
            return Err(ShimError::InvalidStatus(code));
        }
        let status = StatusCode::from_u16(code).map_err(|_| ShimError::InvalidStatus(code))?;

        Ok(Self {
            url: init.url,
            status,
            status_text: init.status_text.unwrap_or_else(|| reason(status)),
            headers: init
                .headers
                .map(|h| Headers::from(h.into_header_map()))
                .unwrap_or_default(),
            body,
            body_used: false,
        })
    }

    /// An empty response pointing at `url` via `Location`.
    ///
    /// `status` defaults to 302.
    pub fn redirect(url: &str, status: Option<u16>) -> ShimResult<Self> {
        let mut headers = Headers::new();
        headers.set(LOCATION.as_str(), url)?;

        Response::new(
            Some(Body::empty()),
            ResponseInit {
                status: Some(status.unwrap_or(DEFAULT_REDIRECT_STATUS)),
                headers: Some(headers),
                ..Default::default()
            },
        )
    }

    /// Wrap a response returned by a transport for a request to `url`.
    pub fn from_http(response: HttpResponse<HttpBody>, url: Option<Url>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            url,
            status: parts.status,
            status_text: reason(parts.status),
            headers: Headers::from(parts.headers),
            body: Some(Body::from_stream(body)),
            body_used: false,
        }
    }

    /// Clone this response.
    ///
    /// The body is teed so both responses can read it, and the clone's
    /// headers are frozen when these are.
    pub fn try_clone(&mut self) -> ShimResult<Self> {
        let body = tee_slot(&mut self.body, self.body_used)?;

        let mut cloned = Response {
            url: self.url.clone(),
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body,
            body_used: false,
        };

        if self.headers.is_frozen() {
            cloned.headers.freeze();
        }

        Ok(cloned)
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn body_used(&self) -> bool {
        self.body_used
    }

    pub async fn bytes(&mut self) -> ShimResult<Bytes> {
        read_slot(&mut self.body, &mut self.body_used, usize::MAX).await
    }

    pub async fn text(&mut self) -> ShimResult<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(&mut self) -> ShimResult<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Convert into an `http::Response`, e.g. to serve it through axum.
    pub fn into_http(self) -> HttpResponse<HttpBody> {
        let body = self.body.map(Body::into_http_body).unwrap_or_else(HttpBody::empty);
        let mut response = HttpResponse::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.into_header_map();
        response
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}
