//! Contract event log watching.
//!
//! # Data Flow
//! ```text
//! JSON ABI → abi.rs (event descriptor lookup)
//!     → filter.rs (address, block range, indexed-argument topics)
//!     → watcher.rs (install filter, backfill, poll for changes)
//!     → decode.rs (topics/data → named args)
//!     → LogCallback
//! ```

pub mod abi;
pub mod decode;
pub mod filter;
pub mod types;
pub mod watcher;

pub use abi::{find_event, load_abi, parse_abi};
pub use decode::decode_log;
pub use filter::build_filter;
pub use types::{BlockRange, DecodedArg, DecodedLog, EventArgs, EventError, EventResult, WatchState};
pub use watcher::{log_printer, LogCallback, LogFilter, Subscription};
