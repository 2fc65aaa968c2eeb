//! Fund distribution types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;

use crate::blockchain::ChainError;

/// Errors that can occur while distributing funds.
#[derive(Debug, Error)]
pub enum FundingError {
    /// Too few bidders for the fixed-then-random schedule.
    #[error("Need at least {required} bidders, got {actual}")]
    NotEnoughBidders { required: usize, actual: usize },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Result type for funding operations.
pub type FundingResult<T> = Result<T, FundingError>;

/// A confirmed transfer from the owner to one bidder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Position of the recipient in the bidder list.
    pub index: usize,
    pub recipient: Address,
    pub value: U256,
    pub tx_hash: TxHash,
    pub gas_used: u64,
    /// Fee actually paid: gas used times gas price.
    pub fee: U256,
}
