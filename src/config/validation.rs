//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject empty connection context fields
//! - Check the bot score header is a legal header name
//! - Check the log filter parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShimConfig → Result<(), Vec<ValidationError>>

use axum::http::HeaderName;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ShimConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("invalid bot score header name: {0:?}")]
    BotScoreHeader(String),

    #[error("fetch.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("invalid log level: {0:?}")]
    LogLevel(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &ShimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let cf = &config.cf;
    for (field, value) in [
        ("cf.tls_version", &cf.tls_version),
        ("cf.tls_cipher", &cf.tls_cipher),
        ("cf.country", &cf.country),
        ("cf.colo", &cf.colo),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty(field));
        }
    }

    if HeaderName::from_bytes(cf.bot_score_header.as_bytes()).is_err() {
        errors.push(ValidationError::BotScoreHeader(cf.bot_score_header.clone()));
    }

    if config.fetch.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
