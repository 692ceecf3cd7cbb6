//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (probabilities, latency bounds, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ShopConfig → Result<(), Vec<ValidationError>>
//! - Runs after environment overrides, before the config is used

use std::net::SocketAddr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::schema::ShopConfig;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ShopConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let sim = &config.simulation;
    let longest_ms = sim.latency.longest_path_ms();
    if config.timeouts.request_secs > 0
        && config.timeouts.request_secs.saturating_mul(1000) <= longest_ms
    {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!("must exceed the slowest simulated path ({longest_ms}ms)"),
        ));
    }

    if !(0.0..=1.0).contains(&sim.payment_failure_rate) {
        errors.push(ValidationError::new(
            "simulation.payment_failure_rate",
            format!("must be within [0, 1], got {}", sim.payment_failure_rate),
        ));
    }

    if sim.tax_rate < Decimal::ZERO || sim.tax_rate > Decimal::ONE {
        errors.push(ValidationError::new(
            "simulation.tax_rate",
            format!("must be within [0, 1], got {}", sim.tax_rate),
        ));
    }

    for (stage, range) in sim.latency.named() {
        if range.min_ms > range.max_ms {
            errors.push(ValidationError::new(
                format!("simulation.latency.{stage}"),
                format!("min_ms {} exceeds max_ms {}", range.min_ms, range.max_ms),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LatencyRange;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ShopConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = ShopConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.simulation.payment_failure_rate = 1.5;
        config.simulation.latency.charge = LatencyRange::new(300, 50);
        config.service.name = "  ".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "service.name",
                "simulation.payment_failure_rate",
                "simulation.latency.charge",
            ]
        );
    }

    #[test]
    fn test_timeout_must_outlast_slowest_path() {
        let mut config = ShopConfig::default();
        config.timeouts.request_secs = 1;
        config.simulation.latency.charge = LatencyRange::new(2000, 2000);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = 3;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_longest_path_is_checkout_by_default() {
        // cart 20 + discount 10 + tax 10 + charge 300 + shipment 50
        assert_eq!(ShopConfig::default().simulation.latency.longest_path_ms(), 390);
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = ShopConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());
    }
}
