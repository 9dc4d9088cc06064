//! Outbound and inbound request type.
//!
//! # Responsibilities
//! - Construct requests the way the fetch `Request` constructor does
//!   (URL or existing request, plus optional overrides)
//! - Hold the write-once connection context slot
//! - Clone with the frozen-header flag and context carried over
//!
//! # Design Decisions
//! - Composition over the `http` types: the wrapper owns url, method,
//!   headers, and body and converts to `http::Request` at the transport edge
//! - The context slot is a `OnceLock`, so binding works through `&Request`
//!   and can never replace an existing value
//! - Building from another request copies its headers unfrozen and leaves
//!   the context behind; only `try_clone` propagates those

use std::sync::{Arc, OnceLock};

use axum::body::{Body as HttpBody, Bytes};
use axum::http::{Method, Request as HttpRequest, Uri};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ShimError, ShimResult};
use crate::http::body::{read_slot, tee_slot, Body};
use crate::http::cf::ConnectionContext;
use crate::http::headers::Headers;

/// First constructor argument: a URL or an existing request.
#[derive(Debug)]
pub enum RequestInfo {
    Url(String),
    Parsed(Url),
    Request(Request),
}

impl From<&str> for RequestInfo {
    fn from(url: &str) -> Self {
        RequestInfo::Url(url.to_string())
    }
}

impl From<String> for RequestInfo {
    fn from(url: String) -> Self {
        RequestInfo::Url(url)
    }
}

impl From<Url> for RequestInfo {
    fn from(url: Url) -> Self {
        RequestInfo::Parsed(url)
    }
}

impl From<Request> for RequestInfo {
    fn from(request: Request) -> Self {
        RequestInfo::Request(request)
    }
}

/// Optional overrides applied on construction.
#[derive(Debug, Default)]
pub struct RequestInit {
    pub method: Option<Method>,
    pub headers: Option<Headers>,
    pub body: Option<Body>,
}

#[derive(Debug)]
pub struct Request {
    url: Url,
    method: Method,
    headers: Headers,
    body: Option<Body>,
    body_used: bool,
    cf: OnceLock<Arc<ConnectionContext>>,
}

impl Request {
    /// Build a request from a URL or another request, applying `init`.
    ///
    /// When `input` is a request its body is taken over unless `init.body`
    /// replaces it; a source whose body was already read is rejected.
    pub fn new(input: impl Into<RequestInfo>, init: RequestInit) -> ShimResult<Self> {
        let (url, method, headers, inherited) = match input.into() {
            RequestInfo::Url(raw) => (Url::parse(&raw)?, Method::GET, Headers::new(), None),
            RequestInfo::Parsed(url) => (url, Method::GET, Headers::new(), None),
            RequestInfo::Request(source) => {
                if init.body.is_none() && source.body_used {
                    return Err(ShimError::BodyUsed);
                }
                let headers = Headers::from(source.headers.into_header_map());
                (source.url, source.method, headers, source.body)
            }
        };

        let method = init.method.unwrap_or(method);
        let headers = init
            .headers
            .map(|h| Headers::from(h.into_header_map()))
            .unwrap_or(headers);
        let body = init.body.or(inherited);

        if body.is_some() && (method == Method::GET || method == Method::HEAD) {
            return Err(ShimError::BodyNotAllowed(method));
        }

        Ok(Self {
            url,
            method,
            headers,
            body,
            body_used: false,
            cf: OnceLock::new(),
        })
    }

    /// Wrap an inbound `http::Request`, resolving its URI against `base`.
    ///
    /// GET and HEAD requests are given no body.
    pub fn from_http(request: HttpRequest<HttpBody>, base: &Url) -> ShimResult<Self> {
        let (parts, body) = request.into_parts();
        let url = base.join(&parts.uri.to_string())?;
        let body = if parts.method == Method::GET || parts.method == Method::HEAD {
            None
        } else {
            Some(Body::from_stream(body))
        };

        Request::new(
            url,
            RequestInit {
                method: Some(parts.method),
                headers: Some(Headers::from(parts.headers)),
                body,
            },
        )
    }

    /// Clone this request.
    ///
    /// The body is teed so both requests can read it. The clone's headers are
    /// frozen when these are, and it shares this request's connection context.
    pub fn try_clone(&mut self) -> ShimResult<Self> {
        let body = tee_slot(&mut self.body, self.body_used)?;

        let mut cloned = Request {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body,
            body_used: false,
            cf: self
                .cf
                .get()
                .map(|cf| OnceLock::from(Arc::clone(cf)))
                .unwrap_or_default(),
        };

        if self.headers.is_frozen() {
            cloned.headers.freeze();
        }

        Ok(cloned)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// The bound connection context, if any.
    pub fn cf(&self) -> Option<&ConnectionContext> {
        self.cf.get().map(|cf| cf.as_ref())
    }

    /// Fill the context slot from `build` if it is empty. Returns whether
    /// this call bound it.
    pub(crate) fn bind_cf(&self, build: impl FnOnce(&Headers) -> ConnectionContext) -> bool {
        let mut bound = false;
        self.cf.get_or_init(|| {
            bound = true;
            Arc::new(build(&self.headers))
        });
        bound
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn body_used(&self) -> bool {
        self.body_used
    }

    /// The body payload when it is held in memory.
    pub fn buffered_body(&self) -> Option<&Bytes> {
        self.body.as_ref().and_then(Body::as_bytes)
    }

    pub async fn bytes(&mut self) -> ShimResult<Bytes> {
        self.bytes_limited(usize::MAX).await
    }

    pub(crate) async fn bytes_limited(&mut self, limit: usize) -> ShimResult<Bytes> {
        read_slot(&mut self.body, &mut self.body_used, limit).await
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub async fn text(&mut self) -> ShimResult<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(&mut self) -> ShimResult<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Convert into an `http::Request` for a transport.
    ///
    /// A bound connection context travels along as a request extension.
    pub fn into_http(self) -> ShimResult<HttpRequest<HttpBody>> {
        let uri: Uri = self.url.as_str().parse()?;
        let body = self.body.map(Body::into_http_body).unwrap_or_else(HttpBody::empty);

        let mut request = HttpRequest::new(body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers.into_header_map();
        if let Some(cf) = self.cf.into_inner() {
            request.extensions_mut().insert(cf);
        }
        Ok(request)
    }
}
