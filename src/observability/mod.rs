//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! fetch dispatch produces:
//!     → tracing events (structured fields: method, url, status, error)
//!     → metrics.rs (counters, histogram)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout) or the host's own subscriber
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder on its own
//! - Metrics go through the `metrics` facade, so they are no-ops without a recorder

pub mod logging;
pub mod metrics;
