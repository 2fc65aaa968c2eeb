//! Chain-facing types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// No receipt appeared within the confirmation window.
    #[error("Receipt for {tx_hash} not available after {timeout_secs} seconds")]
    ReceiptTimeout { tx_hash: TxHash, timeout_secs: u64 },

    /// The node does not know the transaction.
    #[error("Transaction {0} not found")]
    TransactionNotFound(TxHash),

    /// The transaction consumed its whole gas allowance.
    #[error("Transaction {tx_hash} execution failed: used all {gas} gas")]
    ExecutionFailed { tx_hash: TxHash, gas: u64 },

    /// Invalid private key or account operation.
    #[error("Wallet error: {0}")]
    Wallet(String),
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// The parts of a transaction receipt the simulation looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Post-byzantium status flag. Nodes that always report success still
    /// signal failure through full gas consumption.
    pub status: bool,
}

/// The parts of a submitted transaction the simulation looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxDetails {
    pub hash: TxHash,
    pub to: Option<Address>,
    pub value: U256,
    /// Declared gas limit.
    pub gas_limit: u64,
}

/// A plain value transfer between two accounts managed by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    /// Left to the node when unset.
    pub gas_limit: Option<u64>,
    /// Legacy gas price in wei; left to the node when unset.
    pub gas_price: Option<u128>,
}

impl TransferRequest {
    pub fn new(from: Address, to: Address, value: U256) -> Self {
        Self {
            from,
            to,
            value,
            gas_limit: None,
            gas_price: None,
        }
    }

    pub fn with_gas(mut self, gas_limit: u64, gas_price: u128) -> Self {
        self.gas_limit = Some(gas_limit);
        self.gas_price = Some(gas_price);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChainConfig::default();
        assert_eq!(config.rpc_timeout_secs, 10);
        assert_eq!(config.tx_timeout_secs, 180);
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = ChainError::ExecutionFailed {
            tx_hash: TxHash::ZERO,
            gas: 21000,
        };
        assert!(err.to_string().contains("21000"));
        assert!(err.to_string().contains("execution failed"));
    }
}
