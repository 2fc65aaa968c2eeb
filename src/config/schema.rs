//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! simulation helpers. All types derive Serde traits for deserialization
//! from config files.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// One ether in wei.
pub const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Root configuration for a simulation run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SimConfig {
    /// Chain connection settings.
    pub chain: ChainConfig,

    /// Event log watching settings.
    pub watcher: WatcherConfig,

    /// Test fund distribution settings.
    pub funding: FundingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// How long to wait for a transaction receipt, in seconds.
    pub tx_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_interval_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            rpc_timeout_secs: 10,
            tx_timeout_secs: 180,
            receipt_poll_interval_ms: 500,
        }
    }
}

/// Event log watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Interval between live filter polls in milliseconds.
    pub poll_interval_ms: u64,

    /// First block to backfill from.
    pub from_block: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            from_block: 0,
        }
    }
}

/// Fund distribution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FundingConfig {
    /// Owner account holding the test funds (node-managed).
    pub owner: Option<String>,

    /// Passphrase used to unlock node-managed accounts.
    pub passphrase: Option<String>,

    /// How long an unlocked account stays unlocked, in seconds.
    pub unlock_duration_secs: u64,

    /// Number of bidder accounts to generate when none are given.
    pub bidder_count: usize,

    /// Fixed amounts for the first three bidders, in wei.
    #[serde(with = "crate::config::amount::vec")]
    pub fixed_amounts_wei: Vec<U256>,

    /// Added to every fixed amount so the bidder can pay for its bid.
    pub approx_bid_txn_cost_wei: u64,

    /// Lower bound for the randomized amount ceiling, in wei.
    #[serde(with = "crate::config::amount")]
    pub min_random_bid_wei: U256,

    /// Gas added on top of each transfer's estimate. A transfer whose gas
    /// limit equals its usage is indistinguishable from a failed one.
    pub gas_limit_margin: u64,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            owner: None,
            passphrase: None,
            unlock_duration_secs: 300,
            bidder_count: 5,
            fixed_amounts_wei: vec![
                U256::from(WEI_PER_ETHER),
                U256::from(WEI_PER_ETHER),
                U256::from(2 * WEI_PER_ETHER),
            ],
            approx_bid_txn_cost_wei: 40_000,
            min_random_bid_wei: U256::from(5 * WEI_PER_ETHER),
            gas_limit_margin: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Prometheus exporter bind address; disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_address: None,
        }
    }
}
