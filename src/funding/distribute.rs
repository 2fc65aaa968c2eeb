//! Test fund distribution from an owner account to simulated bidders.
//!
//! # Schedule
//! - First three bidders: fixed amounts plus the approximate cost of a bid
//! - Middle bidders: random amount in `[max/2, max]` where `max` is the
//!   owner's balance split over the remaining bidders, floored at
//!   `min_random_bid_wei` and capped at what the balance can pay once the
//!   transfer fee is reserved
//! - Last bidder: whatever is left after reserving the fee for its transfer
//!
//! Transfers are strictly sequential; each one is confirmed before the next
//! is sent and the first failure aborts the run.

use std::time::Duration;

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use rand::Rng;

use crate::blockchain::{check_successful_tx, ChainClient, ChainConfig, TransferRequest};
use crate::config::FundingConfig;
use crate::funding::types::{FundingError, FundingResult, Transfer};
use crate::observability::metrics;

/// Smallest bidder list the schedule supports.
pub const MIN_BIDDERS: usize = 4;

/// Sends owner funds and waits for each confirmation.
struct Funder<'a, C: ChainClient + ?Sized> {
    client: &'a C,
    funding: &'a FundingConfig,
    owner: Address,
    tx_timeout: Duration,
    poll_interval: Duration,
    transfers: Vec<Transfer>,
}

impl<'a, C: ChainClient + ?Sized> Funder<'a, C> {
    /// Gas limit (estimate plus margin) and gas price for a transfer.
    async fn gas_for(&self, to: Address, value: U256) -> FundingResult<(u64, u128)> {
        let estimate = self
            .client
            .estimate_gas(TransferRequest::new(self.owner, to, value))
            .await?;
        let gas_price = self.client.get_gas_price().await?;
        Ok((estimate + self.funding.gas_limit_margin, gas_price))
    }

    async fn send(
        &mut self,
        index: usize,
        to: Address,
        value: U256,
        gas_limit: u64,
        gas_price: u128,
    ) -> FundingResult<()> {
        let request = TransferRequest::new(self.owner, to, value).with_gas(gas_limit, gas_price);
        let tx_hash = self.client.send_transaction(request).await?;
        let receipt =
            check_successful_tx(self.client, tx_hash, self.tx_timeout, self.poll_interval).await?;

        metrics::record_transfer(value);
        tracing::info!(
            index,
            bidder = %to,
            amount = %format_ether(value),
            tx_hash = %tx_hash,
            "Funded bidder"
        );

        self.transfers.push(Transfer {
            index,
            recipient: to,
            value,
            tx_hash,
            gas_used: receipt.gas_used,
            fee: U256::from(receipt.gas_used) * U256::from(gas_price),
        });
        Ok(())
    }

    async fn send_estimated(
        &mut self,
        index: usize,
        to: Address,
        value: U256,
    ) -> FundingResult<()> {
        let (gas_limit, gas_price) = self.gas_for(to, value).await?;
        self.send(index, to, value, gas_limit, gas_price).await
    }
}

/// Ceiling for a random amount: `balance` split over the `remaining`
/// bidders, at least `min_random`, never more than `balance - fee`.
fn bid_ceiling(balance: U256, remaining: usize, min_random: U256, fee: U256) -> U256 {
    (balance / U256::from(remaining))
        .max(min_random)
        .min(balance.saturating_sub(fee))
}

/// Draw uniformly from `[low, high]`.
fn random_amount<R: Rng + ?Sized>(rng: &mut R, low: U256, high: U256) -> U256 {
    let low = u128::try_from(low).unwrap_or(u128::MAX);
    let high = u128::try_from(high).unwrap_or(u128::MAX);
    if low >= high {
        return U256::from(high);
    }
    U256::from(rng.gen_range(low..=high))
}

/// Distribute the owner's balance among `bidders`.
///
/// The owner must be a node-managed account; it is unlocked first when a
/// passphrase is configured. Returns the confirmed transfers in order.
pub async fn assign_funds_to_bidders<C, R>(
    client: &C,
    chain: &ChainConfig,
    funding: &FundingConfig,
    owner: Address,
    bidders: &[Address],
    rng: &mut R,
) -> FundingResult<Vec<Transfer>>
where
    C: ChainClient + ?Sized,
    R: Rng + ?Sized,
{
    let fixed = &funding.fixed_amounts_wei;
    let required = MIN_BIDDERS.max(fixed.len() + 1);
    if bidders.len() < required {
        return Err(FundingError::NotEnoughBidders {
            required,
            actual: bidders.len(),
        });
    }

    if let Some(passphrase) = &funding.passphrase {
        client
            .unlock_account(owner, passphrase, funding.unlock_duration_secs)
            .await?;
    }

    let mut funder = Funder {
        client,
        funding,
        owner,
        tx_timeout: Duration::from_secs(chain.tx_timeout_secs),
        poll_interval: Duration::from_millis(chain.receipt_poll_interval_ms),
        transfers: Vec::with_capacity(bidders.len()),
    };

    tracing::info!(owner = %owner, bidders = bidders.len(), "Assigning funds to bidders");

    let bid_cost = U256::from(funding.approx_bid_txn_cost_wei);
    for (index, amount) in fixed.iter().enumerate() {
        funder
            .send_estimated(index, bidders[index], *amount + bid_cost)
            .await?;
    }

    // Transfer gas does not depend on the value, so the remaining transfers
    // are estimated with zero to size the fee before the amount is known.
    let last = bidders.len() - 1;
    for (index, bidder) in bidders.iter().enumerate().take(last).skip(fixed.len()) {
        let balance = client.get_balance(owner).await?;
        let (gas_limit, gas_price) = funder.gas_for(*bidder, U256::ZERO).await?;
        let fee = U256::from(gas_limit) * U256::from(gas_price);
        let max_bid = bid_ceiling(
            balance,
            bidders.len() - index,
            funding.min_random_bid_wei,
            fee,
        );
        let value = random_amount(rng, max_bid / U256::from(2), max_bid);
        funder.send(index, *bidder, value, gas_limit, gas_price).await?;
    }

    let balance = client.get_balance(owner).await?;
    if balance.is_zero() {
        tracing::warn!(owner = %owner, "Owner has no funds left for the last bidder");
        return Ok(funder.transfers);
    }

    let (gas_limit, gas_price) = funder.gas_for(bidders[last], U256::ZERO).await?;
    let fee = U256::from(gas_limit) * U256::from(gas_price);
    if balance <= fee {
        tracing::warn!(
            owner = %owner,
            balance = %format_ether(balance),
            fee = %format_ether(fee),
            "Owner balance does not cover the last transfer fee"
        );
        return Ok(funder.transfers);
    }
    funder
        .send(last, bidders[last], balance - fee, gas_limit, gas_price)
        .await?;

    Ok(funder.transfers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_amount_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let low = U256::from(5u64);
        let high = U256::from(10u64);
        for _ in 0..100 {
            let value = random_amount(&mut rng, low, high);
            assert!(value >= low && value <= high);
        }
    }

    #[test]
    fn test_random_amount_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_amount(&mut rng, U256::ZERO, U256::ZERO), U256::ZERO);
        assert_eq!(
            random_amount(&mut rng, U256::from(9u64), U256::from(3u64)),
            U256::from(3u64)
        );
    }

    #[test]
    fn test_bid_ceiling() {
        let ether = U256::from(1_000_000_000_000_000_000u64);
        let fee = U256::from(31_000_000_000_000u64);
        let min_random = U256::from(5) * ether;

        // Even split above the floor
        assert_eq!(bid_ceiling(U256::from(30) * ether, 3, min_random, fee), U256::from(10) * ether);
        // Floor applies
        assert_eq!(bid_ceiling(U256::from(6) * ether, 3, min_random, fee), min_random);
        // Floor exceeds the balance: only what is left after the fee
        assert_eq!(
            bid_ceiling(U256::from(3) * ether, 2, min_random, fee),
            U256::from(3) * ether - fee
        );
        assert_eq!(bid_ceiling(fee / U256::from(2), 2, min_random, fee), U256::ZERO);
    }
}
