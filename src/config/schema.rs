//! Configuration schema definitions.
//!
//! All types derive Serde traits so hosts can embed them in their own config.

use serde::{Deserialize, Serialize};

use crate::http::cf::BOT_SCORE_HEADER;

/// Root configuration for the fetch layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShimConfig {
    /// Dispatch policy.
    pub fetch: FetchConfig,

    /// Simulated connection metadata.
    pub cf: CfConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Runtime behaviors applied to every dispatched request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Drop the `host` header before dispatch (the edge runtime ignores it).
    pub strip_host_header: bool,

    /// Read request bodies fully before dispatch instead of streaming them.
    pub buffer_request_body: bool,

    /// Upper bound in bytes for a buffered request body.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            strip_host_header: true,
            buffer_request_body: true,
            max_body_bytes: usize::MAX,
        }
    }
}

/// Values used when binding a connection context.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CfConfig {
    pub tls_version: String,
    pub tls_cipher: String,
    /// ISO country code reported for the client.
    pub country: String,
    /// Data center identifier.
    pub colo: String,
    /// Request header carrying the bot score.
    pub bot_score_header: String,
}

impl Default for CfConfig {
    fn default() -> Self {
        Self {
            tls_version: "TLSv1.2".to_string(),
            tls_cipher: "ECDHE-ECDSA-CHACHA20-POLY1305".to_string(),
            country: "US".to_string(),
            colo: "LAX".to_string(),
            bot_score_header: BOT_SCORE_HEADER.to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
