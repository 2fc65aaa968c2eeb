//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, enough bidders)
//! - Check that addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SimConfig → Result<(), Vec<ValidationError>>

use alloy::primitives::Address;

use crate::config::schema::SimConfig;
use crate::funding::MIN_BIDDERS;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &SimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "chain.rpc_url",
            format!("'{}' is not a valid URL", config.chain.rpc_url),
        ));
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be > 0"));
    }
    if config.chain.tx_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.tx_timeout_secs", "must be > 0"));
    }
    if config.chain.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "chain.receipt_poll_interval_ms",
            "must be > 0",
        ));
    }
    if config.watcher.poll_interval_ms == 0 {
        errors.push(ValidationError::new("watcher.poll_interval_ms", "must be > 0"));
    }

    let funding = &config.funding;
    if funding.bidder_count < MIN_BIDDERS {
        errors.push(ValidationError::new(
            "funding.bidder_count",
            format!("must be at least {}", MIN_BIDDERS),
        ));
    }
    if funding.fixed_amounts_wei.len() != 3 {
        errors.push(ValidationError::new(
            "funding.fixed_amounts_wei",
            format!("expected 3 amounts, got {}", funding.fixed_amounts_wei.len()),
        ));
    }
    if let Some(owner) = &funding.owner {
        if owner.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                "funding.owner",
                format!("'{}' is not a valid address", owner),
            ));
        }
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "observability.metrics_address",
                format!("'{}' is not a valid socket address", addr),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
