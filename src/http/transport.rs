//! The underlying fetch transport.
//!
//! # Responsibilities
//! - Define the seam between the dispatcher and whatever performs I/O
//! - Provide a plain-HTTP default built on the hyper-util legacy client
//!
//! # Design Decisions
//! - The transport is a black box: redirects, TLS, and retries are its own
//!   business, and its errors are returned untouched
//! - Any `Fn(Request) -> Future` is a transport, which keeps test doubles and
//!   host adapters to a closure
//! - The default client keeps no idle connections

use std::future::Future;

use axum::body::Body as HttpBody;
use axum::http::Response as HttpResponse;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::TransportError;
use crate::http::request::Request;

/// Sends a prepared request and returns the raw response.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<HttpResponse<HttpBody>, TransportError>> + Send;
}

impl<F, Fut> Transport for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse<HttpBody>, TransportError>> + Send,
{
    fn send(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<HttpResponse<HttpBody>, TransportError>> + Send {
        self(request)
    }
}

/// Plain HTTP transport over hyper.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, HttpBody>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse<HttpBody>, TransportError> {
        let request = request.into_http().map_err(TransportError::new)?;
        let response = self
            .client
            .request(request)
            .await
            .map_err(TransportError::new)?;
        Ok(response.map(|body: Incoming| HttpBody::new(body)))
    }
}
