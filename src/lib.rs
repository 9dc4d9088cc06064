//! Cloudflare Workers style `fetch` for ordinary hosts.
//!
//! Wraps a plain HTTP transport so that code written against the Workers
//! network layer sees the same behavior when it runs locally:
//!
//! - the `host` request header is dropped before dispatch
//! - request bodies are read fully into memory instead of streamed
//! - inbound requests can carry a simulated `cf` connection context
//! - response headers from `fetch` are immutable, and stay so when cloned
//!
//! ```text
//! caller ─▶ Fetcher ─▶ Request (strip host, buffer body) ─▶ Transport
//!                                                              │
//! caller ◀─ Response (frozen headers) ◀────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod observability;

pub use config::ShimConfig;
pub use error::{ShimError, ShimResult, TransportError};
pub use http::{
    bind_cf_property, bind_cf_property_with, fetch, freeze_headers, Body, BotManagement,
    BotScore, ConnectionContext, Fetcher, Headers, HyperTransport, Request, RequestInfo,
    RequestInit, Response, ResponseInit, Transport, BOT_SCORE_HEADER, DEFAULT_BOT_SCORE,
};
