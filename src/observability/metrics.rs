//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sim_transfers_total` (counter): confirmed funding transfers
//! - `sim_transfer_gwei_total` (counter): value moved by funding transfers
//! - `sim_tx_failures_total` (counter): transactions that used all their gas
//! - `sim_logs_delivered_total` (counter): decoded logs handed to callbacks, by phase
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use alloy::primitives::U256;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_transfer(value: U256) {
    let gwei = value / U256::from(WEI_PER_GWEI);
    ::metrics::counter!("sim_transfers_total").increment(1);
    ::metrics::counter!("sim_transfer_gwei_total")
        .increment(u64::try_from(gwei).unwrap_or(u64::MAX));
}

pub fn record_tx_failure() {
    ::metrics::counter!("sim_tx_failures_total").increment(1);
}

/// `phase` is `"backfill"` or `"live"`.
pub fn record_log_delivered(phase: &'static str) {
    ::metrics::counter!("sim_logs_delivered_total", "phase" => phase).increment(1);
}
