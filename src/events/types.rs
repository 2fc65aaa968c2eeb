//! Event watching types and error definitions.

use alloy::dyn_abi::DynSolValue;
use alloy::eips::BlockNumberOrTag;
use alloy::rpc::types::Log;
use thiserror::Error;

use crate::blockchain::ChainError;

/// Errors raised while locating, filtering or decoding contract events.
#[derive(Debug, Error)]
pub enum EventError {
    /// The contract interface could not be parsed.
    #[error("Invalid contract ABI: {0}")]
    InvalidAbi(String),

    /// No event with this name in the contract interface.
    #[error("Event '{0}' not found in contract ABI")]
    EventNotFound(String),

    /// Several overloads share the name; the caller must disambiguate.
    #[error("Event name '{name}' is ambiguous: {count} overloads")]
    AmbiguousEvent { name: String, count: usize },

    /// A filter constraint names no input of the event.
    #[error("Event '{event}' has no argument '{argument}'")]
    UnknownArgument { event: String, argument: String },

    /// A filter constraint names an input that is not indexed.
    #[error("Argument '{0}' is not indexed and cannot be filtered on")]
    NotIndexed(String),

    /// A filter constraint value does not fit the argument type.
    #[error("Invalid value for argument '{argument}': {reason}")]
    InvalidArgumentValue { argument: String, reason: String },

    /// A log does not match the event descriptor.
    #[error("Failed to decode log: {0}")]
    Decode(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

/// Block span a filter covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: BlockNumberOrTag,
    pub to: BlockNumberOrTag,
}

impl BlockRange {
    pub fn new(from: impl Into<BlockNumberOrTag>, to: impl Into<BlockNumberOrTag>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// From `from` up to the latest block.
    pub fn since(from: u64) -> Self {
        Self::new(from, BlockNumberOrTag::Latest)
    }
}

impl Default for BlockRange {
    fn default() -> Self {
        Self::since(0)
    }
}

/// Parse a block bound: a decimal number, `0x` hex number or tag name.
pub fn parse_block(s: &str) -> Result<BlockNumberOrTag, String> {
    if let Ok(number) = s.parse::<u64>() {
        return Ok(BlockNumberOrTag::Number(number));
    }
    s.parse::<BlockNumberOrTag>()
        .map_err(|e| format!("invalid block '{}': {}", s, e))
}

/// One decoded event argument.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArg {
    pub name: String,
    pub value: DynSolValue,
    pub indexed: bool,
}

/// Decoded event arguments in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventArgs(pub Vec<DecodedArg>);

impl EventArgs {
    /// Look up an argument by name.
    pub fn get(&self, name: &str) -> Option<&DynSolValue> {
        self.0.iter().find(|arg| arg.name == name).map(|arg| &arg.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecodedArg> {
        self.0.iter()
    }
}

impl std::fmt::Display for EventArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:?}", arg.name, arg.value)?;
        }
        write!(f, "}}")
    }
}

/// A raw log together with its decoded arguments.
#[derive(Debug, Clone)]
pub struct DecodedLog {
    pub event: String,
    pub log: Log,
    pub args: EventArgs,
}

/// Lifecycle of a log watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Descriptor located and filter built, nothing installed yet.
    Created,
    /// Historical logs are being delivered.
    Backfilling,
    /// New logs are delivered as they arrive.
    Live,
    /// Subscription cancelled and filter released.
    Stopped,
}
