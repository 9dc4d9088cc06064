//! Simulated edge connection metadata (`request.cf`).
//!
//! # Responsibilities
//! - Build the connection context an edge runtime would attach to a request
//! - Read the bot score from the `x-cloudworker-botscore` request header
//! - Attach the context to a request at most once
//!
//! # Design Decisions
//! - The context lives in a write-once slot on the request; binding is a
//!   presence check, never an overwrite
//! - The bot score is parsed like JavaScript `parseInt`, including the
//!   not-a-number outcome for non-numeric input
//! - Clones share the same `Arc`, so the values are never recomputed

use serde::{Serialize, Serializer};

use crate::config::CfConfig;
use crate::http::headers::Headers;
use crate::http::request::Request;

/// Header carrying the simulated bot-management score.
pub const BOT_SCORE_HEADER: &str = "x-cloudworker-botscore";

/// Baseline bot score for callers that need one. Never injected by the binder.
pub const DEFAULT_BOT_SCORE: i64 = 100;

/// Per-request connection metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionContext {
    pub tls_version: String,
    pub tls_cipher: String,
    pub country: String,
    pub colo: String,
    /// Present only when the request carried a bot score header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_management: Option<BotManagement>,
}

impl ConnectionContext {
    /// Build a context from `config` defaults and the request `headers`.
    pub fn from_headers(headers: &Headers, config: &CfConfig) -> Self {
        let name = config.bot_score_header.as_str();
        let bot_management = headers.has(name).then(|| BotManagement {
            score: BotScore::parse(&raw_header_value(headers, name)),
        });

        Self {
            tls_version: config.tls_version.clone(),
            tls_cipher: config.tls_cipher.clone(),
            country: config.country.clone(),
            colo: config.colo.clone(),
            bot_management,
        }
    }

    /// JSON rendering in the shape edge code reads from `request.cf`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// All values of `name` joined with `", "`; undecodable bytes become U+FFFD.
fn raw_header_value(headers: &Headers, name: &str) -> String {
    headers
        .as_header_map()
        .get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotManagement {
    pub score: BotScore,
}

impl Default for BotManagement {
    fn default() -> Self {
        Self {
            score: BotScore::Score(DEFAULT_BOT_SCORE),
        }
    }
}

/// A parsed bot score. `NotANumber` is what `parseInt` yields for
/// input without leading digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotScore {
    Score(i64),
    NotANumber,
}

impl BotScore {
    /// Parse with `parseInt` rules: skip leading whitespace, accept one sign
    /// and an optional `0x` prefix, then read digits up to the first
    /// non-digit. Values past the `i64` range saturate.
    pub fn parse(raw: &str) -> Self {
        let mut rest = raw.trim_start();
        let negative = match rest.as_bytes().first() {
            Some(b'-') => {
                rest = &rest[1..];
                true
            }
            Some(b'+') => {
                rest = &rest[1..];
                false
            }
            _ => false,
        };

        let radix = if rest.len() >= 2 && (rest.starts_with("0x") || rest.starts_with("0X")) {
            rest = &rest[2..];
            16
        } else {
            10
        };

        let mut value: Option<i64> = None;
        for digit in rest.chars().map_while(|c| c.to_digit(radix)) {
            let acc = value.unwrap_or(0);
            let next = if negative {
                acc.saturating_mul(radix as i64).saturating_sub(digit as i64)
            } else {
                acc.saturating_mul(radix as i64).saturating_add(digit as i64)
            };
            value = Some(next);
        }

        match value {
            Some(score) => BotScore::Score(score),
            None => BotScore::NotANumber,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BotScore::Score(score) => Some(*score),
            BotScore::NotANumber => None,
        }
    }

    /// Numeric view; `NotANumber` becomes `f64::NAN`.
    pub fn as_f64(&self) -> f64 {
        match self {
            BotScore::Score(score) => *score as f64,
            BotScore::NotANumber => f64::NAN,
        }
    }
}

// NaN has no JSON form, so it renders as null like JSON.stringify does.
impl Serialize for BotScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BotScore::Score(score) => serializer.serialize_i64(*score),
            BotScore::NotANumber => serializer.serialize_none(),
        }
    }
}

/// Attach a connection context to `request` unless it already has one.
pub fn bind_cf_property(request: &Request) {
    bind_cf_property_with(request, &CfConfig::default());
}

/// Like [`bind_cf_property`], with host-supplied defaults and header name.
pub fn bind_cf_property_with(request: &Request, config: &CfConfig) {
    let bound = request.bind_cf(|headers| ConnectionContext::from_headers(headers, config));
    if bound {
        tracing::trace!(url = %request.url(), "Bound connection context");
    }
}
