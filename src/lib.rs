//! Chain helpers for auction simulations.
//!
//! # Architecture Overview
//!
//! ```text
//!   config ──▶ blockchain::RpcClient ──────────────┐
//!                     │                             │
//!                     ▼                             ▼
//!        funding::assign_funds_to_bidders    events::LogFilter
//!                     │                             │ start
//!                     ▼                             ▼
//!        blockchain::check_successful_tx    events::Subscription ──▶ LogCallback
//!
//!   blockchain::Keypair (bidder accounts)     observability (tracing, metrics)
//! ```

pub mod blockchain;
pub mod config;
pub mod events;
pub mod funding;
pub mod observability;

pub use blockchain::{ChainClient, Keypair, RpcClient};
pub use config::SimConfig;
pub use events::{LogFilter, Subscription};
