//! The `fetch` entry point.
//!
//! # Responsibilities
//! - Build the outbound request from fetch-style arguments
//! - Apply the edge runtime's request rules (no `host`, no streamed bodies)
//! - Hand the request to the transport and wrap what comes back
//! - Freeze the headers of every returned response
//!
//! # Design Decisions
//! - Errors are never retried or reclassified
//! - A call either returns a frozen response or stops at the first error

use std::time::Instant;

use axum::http::header::HOST;

use crate::config::FetchConfig;
use crate::error::{ShimError, ShimResult};
use crate::http::body::Body;
use crate::http::request::{Request, RequestInfo, RequestInit};
use crate::http::response::Response;
use crate::http::transport::{HyperTransport, Transport};
use crate::observability::metrics;

/// Dispatches requests through a transport with edge runtime semantics.
#[derive(Debug, Clone)]
pub struct Fetcher<T = HyperTransport> {
    transport: T,
    config: FetchConfig,
}

impl Default for Fetcher<HyperTransport> {
    fn default() -> Self {
        Self::new(HyperTransport::new())
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, FetchConfig::default())
    }

    pub fn with_config(transport: T, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Perform one fetch. Takes the same arguments as the `Request` constructor.
    pub async fn fetch(
        &self,
        input: impl Into<RequestInfo>,
        init: RequestInit,
    ) -> ShimResult<Response> {
        let start_time = Instant::now();
        let mut request = Request::new(input, init)?;
        let method = request.method().clone();
        let url = request.url().clone();

        tracing::debug!(method = %method, url = %url, "Dispatching fetch");

        if self.config.strip_host_header {
            request.headers_mut().delete(HOST.as_str())?;
        }

        if self.config.buffer_request_body && request.has_body() {
            let body = match request.bytes_limited(self.config.max_body_bytes).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(method = %method, url = %url, error = %e, "Failed to buffer request body");
                    metrics::record_fetch_error(method.as_str());
                    return Err(e);
                }
            };
            tracing::trace!(bytes = body.len(), "Buffered request body");
            request = Request::new(
                request,
                RequestInit {
                    body: Some(Body::from(body)),
                    ..Default::default()
                },
            )?;
        }

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(method = %method, url = %url, error = %e, "Upstream fetch failed");
                metrics::record_fetch_error(method.as_str());
                return Err(ShimError::Transport(e));
            }
        };

        let mut response = Response::from_http(response, Some(url));
        response.headers_mut().freeze();

        metrics::record_fetch(method.as_str(), response.status(), start_time);
        tracing::debug!(method = %method, status = response.status(), "Fetch complete");

        Ok(response)
    }
}

/// Fetch with the default plain-HTTP transport and runtime rules.
pub async fn fetch(input: impl Into<RequestInfo>, init: RequestInit) -> ShimResult<Response> {
    Fetcher::<HyperTransport>::default().fetch(input, init).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::body::{Body as HttpBody, Bytes};
    use axum::http::{Method, Response as HttpResponse};
    use futures_util::stream;

    use crate::error::TransportError;
    use crate::http::headers::Headers;

    #[derive(Debug, Default)]
    struct Seen {
        had_host: bool,
        buffered: Option<Bytes>,
        had_body: bool,
    }

    /// Records what reached the transport and answers 200.
    fn recording_transport(
        seen: Arc<Mutex<Seen>>,
    ) -> impl Fn(Request) -> std::future::Ready<Result<HttpResponse<HttpBody>, TransportError>>
           + Send
           + Sync {
        move |request: Request| {
            let mut seen = seen.lock().unwrap();
            seen.had_host = request.headers().has("host");
            seen.had_body = request.has_body();
            seen.buffered = request.buffered_body().cloned();
            std::future::ready(Ok(HttpResponse::builder()
                .header("x-upstream", "yes")
                .body(HttpBody::from("ok"))
                .unwrap()))
        }
    }

    fn streamed(text: &'static str) -> Body {
        let chunks: Vec<Result<Bytes, std::io::Error>> = text
            .as_bytes()
            .chunks(2)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Body::from_stream(HttpBody::from_stream(stream::iter(chunks)))
    }

    #[tokio::test]
    async fn test_host_header_is_stripped() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let fetcher = Fetcher::new(recording_transport(seen.clone()));

        let headers = Headers::from_pairs([("Host", "spoofed.example"), ("x-keep", "1")]).unwrap();
        fetcher
            .fetch(
                "http://example.com/",
                RequestInit {
                    headers: Some(headers),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!seen.lock().unwrap().had_host);
    }

    #[tokio::test]
    async fn test_streamed_body_is_buffered_before_dispatch() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let fetcher = Fetcher::new(recording_transport(seen.clone()));

        fetcher
            .fetch(
                "http://example.com/upload",
                RequestInit {
                    method: Some(Method::POST),
                    body: Some(streamed("streamed payload")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.had_body);
        assert_eq!(seen.buffered.as_deref(), Some(&b"streamed payload"[..]));
    }

    #[tokio::test]
    async fn test_no_body_stays_absent() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let fetcher = Fetcher::new(recording_transport(seen.clone()));

        fetcher.fetch("http://example.com/", RequestInit::default()).await.unwrap();
        assert!(!seen.lock().unwrap().had_body);
    }

    #[tokio::test]
    async fn test_response_headers_are_frozen() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let fetcher = Fetcher::new(recording_transport(seen));

        let mut response = fetcher
            .fetch("http://example.com/", RequestInit::default())
            .await
            .unwrap();
        assert!(response.headers().is_frozen());
        assert_eq!(response.url().map(|u| u.as_str()), Some("http://example.com/"));
        assert!(response
            .headers_mut()
            .set("x-upstream", "no")
            .unwrap_err()
            .is_immutable_headers());
        assert!(response.try_clone().unwrap().headers().is_frozen());
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_policies_can_be_disabled() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let config = FetchConfig {
            strip_host_header: false,
            buffer_request_body: false,
            ..Default::default()
        };
        let fetcher = Fetcher::with_config(recording_transport(seen.clone()), config);

        fetcher
            .fetch(
                "http://example.com/",
                RequestInit {
                    method: Some(Method::POST),
                    headers: Some(Headers::from_pairs([("host", "kept")]).unwrap()),
                    body: Some(streamed("raw")),
                },
            )
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.had_host);
        assert!(seen.had_body);
        assert!(seen.buffered.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        #[derive(Debug, thiserror::Error)]
        #[error("connection refused")]
        struct Refused;

        let fetcher = Fetcher::new(|_request: Request| async {
            Err::<HttpResponse<HttpBody>, _>(TransportError::new(Refused))
        });

        let err = fetcher
            .fetch("http://example.com/", RequestInit::default())
            .await
            .unwrap_err();
        match err {
            ShimError::Transport(inner) => assert!(inner.downcast_ref::<Refused>().is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_body_limit_aborts_dispatch() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let config = FetchConfig {
            max_body_bytes: 4,
            ..Default::default()
        };
        let fetcher = Fetcher::with_config(recording_transport(seen.clone()), config);

        let err = fetcher
            .fetch(
                "http://example.com/",
                RequestInit {
                    method: Some(Method::PUT),
                    body: Some(streamed("far too long")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ShimError::Transport(_)));
        assert!(!seen.lock().unwrap().had_body);
    }

    #[tokio::test]
    async fn test_body_limit_applies_to_buffered_body() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let config = FetchConfig {
            max_body_bytes: 4,
            ..Default::default()
        };
        let fetcher = Fetcher::with_config(recording_transport(seen.clone()), config);

        let err = fetcher
            .fetch(
                "http://example.com/",
                RequestInit {
                    method: Some(Method::POST),
                    body: Some(Body::from("far too long")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ShimError::Transport(_)));
        assert!(!seen.lock().unwrap().had_body);

        fetcher
            .fetch(
                "http://example.com/",
                RequestInit {
                    method: Some(Method::POST),
                    body: Some(Body::from("fits")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap().buffered.as_deref(), Some(&b"fits"[..]));
    }

    #[tokio::test]
    async fn test_invalid_input_fails_before_transport() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let fetcher = Fetcher::new(move |_request: Request| {
            flag.store(true, Ordering::SeqCst);
            async { Ok::<_, TransportError>(HttpResponse::new(HttpBody::empty())) }
        });

        let err = fetcher.fetch("not a url", RequestInit::default()).await.unwrap_err();
        assert!(matches!(err, ShimError::InvalidUrl(_)));

        let err = fetcher
            .fetch(
                "http://example.com/",
                RequestInit {
                    body: Some(Body::from("get with body")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ShimError::BodyNotAllowed(_)));
        assert!(!called.load(Ordering::SeqCst));
    }
}
