//! Test fund distribution.
//!
//! Only the owner → bidders direction exists. Returning funds to the owner
//! is handled by the auction contract itself once tokens are claimed.

pub mod distribute;
pub mod types;

pub use distribute::{assign_funds_to_bidders, MIN_BIDDERS};
pub use types::{FundingError, FundingResult, Transfer};
