//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → ShopConfig (validated, immutable)
//!     → simulation section handed to the shop, the rest to bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    LatencyRange, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig, ShopConfig,
    SimulationConfig, StageLatencies,
};
