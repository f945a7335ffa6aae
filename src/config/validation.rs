//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threshold > 0, delay bounds ordered)
//! - Keep the inbound timeout above throttle delay + upstream timeout
//! - Check the upstream URL and endpoint table
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("circuit_breaker.failure_threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("circuit_breaker.timeout_secs must be greater than 0")]
    ZeroBreakerTimeout,

    #[error("throttle.min_delay_ms ({min}) exceeds throttle.max_delay_ms ({max})")]
    InvertedDelayBounds { min: u64, max: u64 },

    #[error("throttle.identities must contain at least one entry")]
    EmptyIdentityPool,

    #[error("upstream.base_url '{0}' is not a valid http(s) URL")]
    InvalidBaseUrl(String),

    #[error("endpoint name must not be empty")]
    EmptyEndpointName,

    #[error("endpoint '{0}' is defined more than once")]
    DuplicateEndpoint(String),

    #[error(
        "timeouts.request_secs ({request_secs}s) must exceed throttle.max_delay_ms \
         ({max_delay_ms}ms) plus upstream.request_timeout_secs ({upstream_timeout_secs}s)"
    )]
    RequestTimeoutTooShort {
        request_secs: u64,
        max_delay_ms: u64,
        upstream_timeout_secs: u64,
    },

    #[error("listener.max_concurrent_requests must be greater than 0")]
    ZeroConcurrency,
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }
    if config.circuit_breaker.timeout_secs == 0 {
        errors.push(ValidationError::ZeroBreakerTimeout);
    }

    let throttle = &config.throttle;
    if throttle.min_delay_ms > throttle.max_delay_ms {
        errors.push(ValidationError::InvertedDelayBounds {
            min: throttle.min_delay_ms,
            max: throttle.max_delay_ms,
        });
    }
    if throttle.identities.is_empty() {
        errors.push(ValidationError::EmptyIdentityPool);
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(
            config.upstream.base_url.clone(),
        )),
    }

    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        if endpoint.name.trim().is_empty() {
            errors.push(ValidationError::EmptyEndpointName);
        } else if !seen.insert(endpoint.name.as_str()) {
            errors.push(ValidationError::DuplicateEndpoint(endpoint.name.clone()));
        }
    }

    if let Err(e) = check_request_budget(
        config.timeouts.request_secs,
        throttle.max_delay_ms,
        config.upstream.request_timeout_secs,
    ) {
        errors.push(e);
    }

    if config.listener.max_concurrent_requests == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The inbound timeout must outlast the longest throttle delay plus a full
/// upstream attempt, otherwise a slow fetch is cut off before its fallback.
pub fn check_request_budget(
    request_secs: u64,
    max_delay_ms: u64,
    upstream_timeout_secs: u64,
) -> Result<(), ValidationError> {
    let needed = Duration::from_millis(max_delay_ms)
        .checked_add(Duration::from_secs(upstream_timeout_secs));
    match needed {
        Some(needed) if Duration::from_secs(request_secs) > needed => Ok(()),
        _ => Err(ValidationError::RequestTimeoutTooShort {
            request_secs,
            max_delay_ms,
            upstream_timeout_secs,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::EndpointConfig;

    fn endpoint(name: &str) -> EndpointConfig {
        EndpointConfig {
            name: name.to_string(),
            path: "/x".to_string(),
            ttl_secs: None,
            cacheable: true,
            fallback: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        config.circuit_breaker.timeout_secs = 0;
        config.throttle.min_delay_ms = 20;
        config.throttle.max_delay_ms = 10;
        config.throttle.identities.clear();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroFailureThreshold));
        assert!(errors.contains(&ValidationError::ZeroBreakerTimeout));
        assert!(errors.contains(&ValidationError::InvertedDelayBounds { min: 20, max: 10 }));
        assert!(errors.contains(&ValidationError::EmptyIdentityPool));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "ftp://example.com".to_string();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidBaseUrl("ftp://example.com".into())])
        );
    }

    #[test]
    fn test_rejects_duplicate_and_empty_endpoints() {
        let mut config = GatewayConfig::default();
        config.endpoints = vec![endpoint("trends"), endpoint("trends"), endpoint(" ")];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateEndpoint("trends".into()),
                ValidationError::EmptyEndpointName,
            ]
        );
    }

    #[test]
    fn test_request_timeout_must_cover_throttle() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 15;
        config.throttle.max_delay_ms = 15_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::RequestTimeoutTooShort {
                request_secs: 15,
                max_delay_ms: 15_000,
                upstream_timeout_secs: 60,
            }]
        );
    }

    #[test]
    fn test_request_timeout_must_cover_upstream_attempt() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 2;
        config.throttle.min_delay_ms = 0;
        config.throttle.max_delay_ms = 0;
        config.upstream.request_timeout_secs = 30;

        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RequestTimeoutTooShort {
                request_secs: 2,
                max_delay_ms: 0,
                upstream_timeout_secs: 30,
            }])
        );
    }

    #[test]
    fn test_request_budget_boundaries() {
        // 15s delay + 60s attempt needs strictly more than 75s.
        assert!(check_request_budget(75, 15_000, 60).is_err());
        assert!(check_request_budget(76, 15_000, 60).is_ok());
        assert!(check_request_budget(u64::MAX, u64::MAX, u64::MAX).is_err());
    }
}
