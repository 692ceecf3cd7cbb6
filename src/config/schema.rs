//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Root configuration for the storefront.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShopConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Service identity attached to logs and health output.
    pub service: ServiceConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Simulated workload parameters.
    pub simulation: SimulationConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
    /// Deployment environment label (e.g., "staging").
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "storefront".to_string(),
            version: "1.0.0".to_string(),
            environment: "staging".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed per request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Inclusive latency bounds in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LatencyRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const ZERO: Self = Self::new(0, 0);
}

/// Per-stage simulated latency.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StageLatencies {
    pub inventory: LatencyRange,
    pub payment: LatencyRange,
    pub notification: LatencyRange,
    pub cart: LatencyRange,
    pub discount: LatencyRange,
    pub tax: LatencyRange,
    pub charge: LatencyRange,
    pub shipment: LatencyRange,
    pub products_query: LatencyRange,
    pub users_query: LatencyRange,
}

impl StageLatencies {
    /// Every stage completes without delay.
    pub fn instant() -> Self {
        Self {
            inventory: LatencyRange::ZERO,
            payment: LatencyRange::ZERO,
            notification: LatencyRange::ZERO,
            cart: LatencyRange::ZERO,
            discount: LatencyRange::ZERO,
            tax: LatencyRange::ZERO,
            charge: LatencyRange::ZERO,
            shipment: LatencyRange::ZERO,
            products_query: LatencyRange::ZERO,
            users_query: LatencyRange::ZERO,
        }
    }

    /// Worst-case simulated time of the slowest request path, in ms.
    pub fn longest_path_ms(&self) -> u64 {
        let total = |ranges: &[LatencyRange]| ranges.iter().map(|r| r.max_ms).sum::<u64>();
        let checkout = total(&[self.cart, self.discount, self.tax, self.charge, self.shipment]);
        let order = total(&[self.inventory, self.payment, self.notification]);
        checkout
            .max(order)
            .max(self.products_query.max_ms)
            .max(self.users_query.max_ms)
    }

    pub(crate) fn named(&self) -> [(&'static str, LatencyRange); 10] {
        [
            ("inventory", self.inventory),
            ("payment", self.payment),
            ("notification", self.notification),
            ("cart", self.cart),
            ("discount", self.discount),
            ("tax", self.tax),
            ("charge", self.charge),
            ("shipment", self.shipment),
            ("products_query", self.products_query),
            ("users_query", self.users_query),
        ]
    }
}

impl Default for StageLatencies {
    fn default() -> Self {
        Self {
            inventory: LatencyRange::new(10, 30),
            payment: LatencyRange::new(50, 200),
            notification: LatencyRange::new(10, 40),
            cart: LatencyRange::new(5, 20),
            discount: LatencyRange::new(5, 10),
            tax: LatencyRange::new(5, 10),
            charge: LatencyRange::new(50, 300),
            shipment: LatencyRange::new(10, 50),
            products_query: LatencyRange::new(10, 50),
            users_query: LatencyRange::new(10, 80),
        }
    }
}

/// Workload parameters of the transaction pipelines.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for reproducible runs; fresh entropy per request when unset.
    pub seed: Option<u64>,

    /// Probability that a checkout charge is declined.
    pub payment_failure_rate: f64,

    /// Payment latency above which a warning is logged.
    pub slow_payment_threshold_ms: u64,

    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,

    pub latency: StageLatencies,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            payment_failure_rate: 0.05,
            slow_payment_threshold_ms: 150,
            tax_rate: Decimal::new(20, 2),
            latency: StageLatencies::default(),
        }
    }
}
