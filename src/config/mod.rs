//! Configuration for the fetch layer.
//!
//! # Data Flow
//! ```text
//! host-supplied TOML string (or ShimConfig built in code)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ShimConfig (validated, immutable)
//!     → Fetcher / bind_cf_property_with / logging::init
//! ```
//!
//! # Design Decisions
//! - Every field has a default equal to the edge runtime baseline
//! - No file access: the host owns where configuration comes from
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config_str, ConfigError};
pub use schema::{CfConfig, FetchConfig, ObservabilityConfig, ShimConfig};
