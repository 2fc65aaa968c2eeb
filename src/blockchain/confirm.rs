//! Transaction confirmation.
//!
//! The EVM has a single failure mode visible without tracing: a transaction
//! that consumes its entire gas allowance. A receipt is therefore only
//! accepted once its gas usage is compared with the declared limit.

use std::time::Duration;

use alloy::primitives::TxHash;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainError, ChainResult, TxReceipt};
use crate::observability::metrics;

/// Poll for `tx_hash`'s receipt until it appears or `timeout_duration`
/// elapses, then fail if the transaction used all of its gas.
pub async fn check_successful_tx<C>(
    client: &C,
    tx_hash: TxHash,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> ChainResult<TxReceipt>
where
    C: ChainClient + ?Sized,
{
    let receipt = wait_for_receipt(client, tx_hash, timeout_duration, poll_interval).await?;

    let tx = client
        .get_transaction(tx_hash)
        .await?
        .ok_or(ChainError::TransactionNotFound(tx_hash))?;

    if receipt.gas_used == tx.gas_limit {
        metrics::record_tx_failure();
        tracing::error!(
            tx_hash = %tx_hash,
            gas = tx.gas_limit,
            "Transaction consumed all gas"
        );
        return Err(ChainError::ExecutionFailed {
            tx_hash,
            gas: tx.gas_limit,
        });
    }

    tracing::debug!(
        tx_hash = %tx_hash,
        block_number = ?receipt.block_number,
        gas_used = receipt.gas_used,
        gas_limit = tx.gas_limit,
        "Transaction confirmed"
    );
    Ok(receipt)
}

/// Poll until a receipt is available.
pub async fn wait_for_receipt<C>(
    client: &C,
    tx_hash: TxHash,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> ChainResult<TxReceipt>
where
    C: ChainClient + ?Sized,
{
    let result: Result<ChainResult<TxReceipt>, _> = timeout(timeout_duration, async {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match client.get_transaction_receipt(tx_hash).await? {
                Some(receipt) => return Ok(receipt),
                None => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
            }
        }
    })
    .await;

    match result {
        Ok(receipt) => receipt,
        Err(_) => Err(ChainError::ReceiptTimeout {
            tx_hash,
            timeout_secs: timeout_duration.as_secs(),
        }),
    }
}
