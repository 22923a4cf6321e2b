//! oncokb-common: Shared types, errors, and configuration used across all OncoKB annotation crates.

pub mod config;
pub mod entities;
pub mod error;

// Re-export commonly used types
pub use config::{AggregationConfig, ClientConfig, OncokbConfig, QueryConfig};
pub use entities::*;
pub use error::{OncokbError, Result};
