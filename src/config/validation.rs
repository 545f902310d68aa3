//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic parsing. Every failure is
//! collected and reported together rather than stopping at the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::Config;

/// A single semantic problem found in a parsed configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener port must be non-zero")]
    InvalidPort,

    #[error("backend URL {0:?} is not a valid absolute URL: {1}")]
    InvalidBackendUrl(String, url::ParseError),

    #[error("backend URL {0:?} has unsupported scheme {1:?}")]
    UnsupportedScheme(String, String),
}

/// Validate a parsed configuration.
///
/// A malformed backend URL is fatal to startup. An empty backend list is
/// allowed; selection on an empty pool degrades to 503 at request time.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    for raw in &config.backends {
        match Url::parse(raw) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                errors.push(ValidationError::UnsupportedScheme(
                    raw.clone(),
                    url.scheme().to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidBackendUrl(raw.clone(), e)),
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

    fn config_with_backends(backends: &[&str]) -> Config {
        Config {
            backends: backends.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = config_with_backends(&["http://127.0.0.1:3000", "https://origin.example"]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_backend_list_is_allowed() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = config_with_backends(&["not a url", "ftp://127.0.0.1:21"]);
        config.port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn relative_url_is_rejected() {
        let config = config_with_backends(&["127.0.0.1:3000"]);
        assert!(validate_config(&config).is_err());
    }
}
