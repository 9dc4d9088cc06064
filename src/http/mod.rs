//! Edge runtime flavored HTTP types and the fetch dispatcher.
//!
//! # Data Flow
//! ```text
//! caller
//!     → fetch.rs (build Request, strip host, buffer body)
//!     → transport.rs (black-box I/O)
//!     → response.rs (wrap result)
//!     → headers.rs (freeze)
//!     → caller
//!
//! inbound request (host process)
//!     → request.rs (Request::from_http)
//!     → cf.rs (bind_cf_property)
//! ```

pub mod body;
pub mod cf;
pub mod fetch;
pub mod headers;
pub mod request;
pub mod response;
pub mod transport;

pub use body::Body;
pub use cf::{
    bind_cf_property, bind_cf_property_with, BotManagement, BotScore, ConnectionContext,
    BOT_SCORE_HEADER, DEFAULT_BOT_SCORE,
};
pub use fetch::{fetch, Fetcher};
pub use headers::{freeze_headers, Headers};
pub use request::{Request, RequestInfo, RequestInit};
pub use response::{Response, ResponseInit};
pub use transport::{HyperTransport, Transport};
