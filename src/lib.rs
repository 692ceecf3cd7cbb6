//! Synthetic storefront that exists to emit realistic telemetry.
//!
//! The interesting part is [`shop`]: order creation and checkout are broken
//! into ordered stages, each wrapped in a span carrying typed attributes,
//! each feeding shared counters and histograms, and each logging correlated
//! events. Everything around it (HTTP routing, config, bootstrap) is plumbing.

pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod shop;

pub use config::schema::ShopConfig;
pub use error::ShopError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use shop::Shop;
