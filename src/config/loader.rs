//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ShopConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML document without overrides or validation.
pub fn parse_config(content: &str) -> Result<ShopConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply environment overrides: `PORT`, `OTEL_SERVICE_NAME`, `ENVIRONMENT`.
pub fn apply_env_overrides<F>(config: &mut ShopConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }
    if let Some(name) = lookup("OTEL_SERVICE_NAME") {
        config.service.name = name;
    }
    if let Some(environment) = lookup("ENVIRONMENT") {
        config.service.environment = environment;
    }
}

/// Replace the port of a `host:port` address.
pub fn with_port(address: &str, port: u16) -> String {
    let host = address.rsplit_once(':').map_or(address, |(host, _)| host);
    format!("{host}:{port}")
}

/// Load from an optional file, apply process environment, then validate.
pub fn load_config(path: Option<&Path>) -> Result<ShopConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)?
        }
        None => ShopConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LatencyRange, LogFormat};
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [service]
            name = "shop-eu"

            [observability]
            log_format = "pretty"

            [simulation]
            payment_failure_rate = 0.5
            tax_rate = 0.25
            seed = 99

            [simulation.latency]
            charge = { min_ms = 1, max_ms = 2 }
            "#,
        )
        .unwrap();

        assert_eq!(config.service.name, "shop-eu");
        assert_eq!(config.service.environment, "staging");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert_eq!(config.simulation.payment_failure_rate, 0.5);
        assert_eq!(config.simulation.tax_rate, Decimal::new(25, 2));
        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.simulation.latency.charge, LatencyRange::new(1, 2));
        assert_eq!(config.simulation.latency.payment, LatencyRange::new(50, 200));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9001"),
            ("OTEL_SERVICE_NAME", "sample-app"),
            ("ENVIRONMENT", "production"),
        ]
        .into_iter()
        .collect();

        let mut config = ShopConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.listener.bind_address, "0.0.0.0:9001");
        assert_eq!(config.service.name, "sample-app");
        assert_eq!(config.service.environment, "production");
    }

    #[test]
    fn test_unparseable_port_ignored() {
        let mut config = ShopConfig::default();
        apply_env_overrides(&mut config, |key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\npayment_failure_rate = 2.0").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_with_port() {
        assert_eq!(with_port("127.0.0.1:8080", 3000), "127.0.0.1:3000");
        assert_eq!(with_port("localhost", 3000), "localhost:3000");
    }
}
