//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! keys.rs (fresh secp256k1 accounts for bidders)
//!
//! ChainConfig (RPC URL, timeouts)
//!     → client.rs (ChainClient trait, RpcClient over alloy)
//!     → confirm.rs (receipt polling, full-gas failure check)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or passphrases
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod confirm;
pub mod keys;
pub mod types;

pub use client::{ChainClient, RpcClient};
pub use confirm::check_successful_tx;
pub use keys::Keypair;
pub use types::{ChainConfig, ChainError, ChainResult, TransferRequest, TxDetails, TxReceipt};
