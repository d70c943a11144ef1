//! Runtime configuration read from the environment (and `.env` when present).

use std::env;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Dashboard listen port.
    pub port: u16,
    /// Backend endpoint; actions are selected with `?action=`.
    pub api_base_url: String,
    /// Center shown when a request does not name one.
    pub default_center_id: String,
    pub api_timeout: Duration,
    pub chart_min_width: f64,
    /// Offered in the new-student school dropdown.
    pub schools: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            api_base_url: "http://127.0.0.1:9000/api".to_string(),
            default_center_id: "1".to_string(),
            api_timeout: Duration::from_secs(30),
            chart_min_width: 600.0,
            schools: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let api_base_url = env::var("API_BASE_URL")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("API_BASE_URL"))?;

        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            api_base_url,
            default_center_id: env::var("CENTER_ID").unwrap_or(defaults.default_center_id),
            api_timeout: Duration::from_secs(parse_var(
                "API_TIMEOUT_SECS",
                defaults.api_timeout.as_secs(),
            )?),
            chart_min_width: chart_width(parse_var(
                "CHART_MIN_WIDTH",
                defaults.chart_min_width,
            )?)?,
            schools: env::var("SCHOOLS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn chart_width(width: f64) -> Result<f64, ConfigError> {
    if width.is_finite() && width > 0.0 {
        Ok(width)
    } else {
        Err(ConfigError::Invalid {
            name: "CHART_MIN_WIDTH",
            value: width.to_string(),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn school_list_skips_blanks() {
        assert_eq!(
            split_list("Hagaskóli, ,Melaskóli,"),
            vec!["Hagaskóli".to_string(), "Melaskóli".to_string()]
        );
    }

    #[test]
    fn chart_width_must_be_finite_and_positive() {
        assert_eq!(chart_width(600.0).unwrap(), 600.0);
        for bad in [f64::NAN, f64::INFINITY, -1.0, 0.0] {
            assert!(matches!(
                chart_width(bad),
                Err(ConfigError::Invalid { name: "CHART_MIN_WIDTH", .. })
            ));
        }
    }
}
