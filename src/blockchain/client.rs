//! Chain client abstraction and its JSON-RPC implementation.
//!
//! # Responsibilities
//! - Define the RPC surface the simulation helpers rely on
//! - Connect to a JSON-RPC endpoint
//! - Bound every call with the configured RPC timeout

use std::fmt::Display;
use std::future::IntoFuture;
use std::time::Duration;

use alloy::consensus::Transaction as _;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use async_trait::async_trait;
use tokio::time::timeout;

use crate::blockchain::types::{
    ChainConfig, ChainError, ChainResult, TransferRequest, TxDetails, TxReceipt,
};

/// RPC operations consumed by the simulation helpers.
///
/// Signing, gas estimation and filter bookkeeping all stay on the node side;
/// implementors only translate calls.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Look up a transaction by hash.
    async fn get_transaction(&self, tx_hash: TxHash) -> ChainResult<Option<TxDetails>>;

    /// Get a transaction receipt, `None` while the transaction is pending.
    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<TxReceipt>>;

    async fn get_balance(&self, address: Address) -> ChainResult<U256>;

    /// Current gas price in wei.
    async fn get_gas_price(&self) -> ChainResult<u128>;

    async fn estimate_gas(&self, request: TransferRequest) -> ChainResult<u64>;

    /// Submit a transfer signed by the node (the sender must be unlocked).
    async fn send_transaction(&self, request: TransferRequest) -> ChainResult<TxHash>;

    /// Install a log filter on the node and return its id.
    async fn new_filter(&self, filter: &Filter) -> ChainResult<U256>;

    /// All logs currently matching an installed filter.
    async fn get_filter_logs(&self, filter_id: U256) -> ChainResult<Vec<Log>>;

    /// Logs matching an installed filter since the previous poll.
    async fn get_filter_changes(&self, filter_id: U256) -> ChainResult<Vec<Log>>;

    async fn uninstall_filter(&self, filter_id: U256) -> ChainResult<bool>;

    /// Unlock a node-managed account for `duration_secs`.
    async fn unlock_account(
        &self,
        address: Address,
        passphrase: &str,
        duration_secs: u64,
    ) -> ChainResult<bool>;
}

/// JSON-RPC client backed by an alloy HTTP provider.
#[derive(Clone)]
pub struct RpcClient {
    provider: DynProvider,
    config: ChainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcClient {
    /// Create a client for the configured endpoint.
    ///
    /// No request is made here; an unreachable node surfaces on first use.
    pub fn new(config: ChainConfig) -> ChainResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        tracing::info!(
            rpc_url = %config.rpc_url,
            timeout_secs = config.rpc_timeout_secs,
            "Chain client initialized"
        );

        Ok(Self {
            provider,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        })
    }

    async fn call<F, T, E>(&self, method: &'static str, fut: F) -> ChainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Display,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(method, error = %e, "RPC error");
                Err(ChainError::Rpc(format!("{}: {}", method, e)))
            }
            Err(_) => {
                tracing::warn!(method, "RPC timeout");
                Err(ChainError::Timeout(self.config.rpc_timeout_secs))
            }
        }
    }
}

fn transfer_request(request: TransferRequest) -> TransactionRequest {
    let mut tx = TransactionRequest::default()
        .with_from(request.from)
        .with_to(request.to)
        .with_value(request.value);
    if let Some(gas_limit) = request.gas_limit {
        tx = tx.with_gas_limit(gas_limit);
    }
    if let Some(gas_price) = request.gas_price {
        tx = tx.with_gas_price(gas_price);
    }
    tx
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn get_transaction(&self, tx_hash: TxHash) -> ChainResult<Option<TxDetails>> {
        let tx = self
            .call("eth_getTransactionByHash", self.provider.get_transaction_by_hash(tx_hash))
            .await?;
        Ok(tx.map(|tx| TxDetails {
            hash: tx_hash,
            to: tx.to(),
            value: tx.value(),
            gas_limit: tx.gas_limit(),
        }))
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<TxReceipt>> {
        let receipt = self
            .call("eth_getTransactionReceipt", self.provider.get_transaction_receipt(tx_hash))
            .await?;
        Ok(receipt.map(|r| TxReceipt {
            transaction_hash: r.transaction_hash,
            block_number: r.block_number,
            gas_used: r.gas_used,
            status: r.status(),
        }))
    }

    async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        self.call("eth_getBalance", self.provider.get_balance(address)).await
    }

    async fn get_gas_price(&self) -> ChainResult<u128> {
        self.call("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn estimate_gas(&self, request: TransferRequest) -> ChainResult<u64> {
        self.call(
            "eth_estimateGas",
            self.provider.estimate_gas(transfer_request(request)),
        )
        .await
    }

    async fn send_transaction(&self, request: TransferRequest) -> ChainResult<TxHash> {
        let pending = self
            .call(
                "eth_sendTransaction",
                self.provider.send_transaction(transfer_request(request)),
            )
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn new_filter(&self, filter: &Filter) -> ChainResult<U256> {
        self.call("eth_newFilter", self.provider.new_filter(filter)).await
    }

    async fn get_filter_logs(&self, filter_id: U256) -> ChainResult<Vec<Log>> {
        self.call("eth_getFilterLogs", self.provider.get_filter_logs(filter_id))
            .await
    }

    async fn get_filter_changes(&self, filter_id: U256) -> ChainResult<Vec<Log>> {
        self.call(
            "eth_getFilterChanges",
            self.provider.get_filter_changes::<Log>(filter_id),
        )
        .await
    }

    async fn uninstall_filter(&self, filter_id: U256) -> ChainResult<bool> {
        self.call("eth_uninstallFilter", self.provider.uninstall_filter(filter_id))
            .await
    }

    async fn unlock_account(
        &self,
        address: Address,
        passphrase: &str,
        duration_secs: u64,
    ) -> ChainResult<bool> {
        let unlocked = self
            .call(
                "personal_unlockAccount",
                self.provider.raw_request::<_, bool>(
                    "personal_unlockAccount".into(),
                    (address, passphrase.to_string(), duration_secs),
                ),
            )
            .await
            .map_err(|e| ChainError::Wallet(format!("Failed to unlock {}: {}", address, e)))?;
        tracing::debug!(address = %address, unlocked, "Account unlock requested");
        Ok(unlocked)
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
