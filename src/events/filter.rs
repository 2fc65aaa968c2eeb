//! Log filter construction.
//!
//! Indexed argument constraints are encoded the way the EVM writes topics:
//! value types as their 32-byte ABI word, `string`/`bytes` as the Keccak
//! hash of their contents.

use std::collections::BTreeMap;

use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::{Event, EventParam};
use alloy::primitives::{keccak256, Address, B256};
use alloy::rpc::types::Filter;

use crate::events::types::{BlockRange, EventError, EventResult};

/// Topics a log (and so a filter) can hold.
const MAX_TOPICS: usize = 4;

/// Types whose topic is the value itself rather than a hash of it.
pub(crate) fn is_value_type(ty: &DynSolType) -> bool {
    matches!(
        ty,
        DynSolType::Bool
            | DynSolType::Int(_)
            | DynSolType::Uint(_)
            | DynSolType::FixedBytes(_)
            | DynSolType::Address
            | DynSolType::Function
    )
}

pub(crate) fn resolve_param(param: &EventParam) -> EventResult<DynSolType> {
    param.resolve().map_err(|e| {
        EventError::Decode(format!("unsupported type for '{}': {}", param.name, e))
    })
}

/// Encode a typed value as the topic an indexed argument would produce.
pub fn topic_for_value(argument: &str, ty: &DynSolType, value: &DynSolValue) -> EventResult<B256> {
    if is_value_type(ty) {
        return value.as_word().ok_or_else(|| EventError::InvalidArgumentValue {
            argument: argument.to_string(),
            reason: format!("expected a value of type {}", ty),
        });
    }
    match (ty, value) {
        (DynSolType::String, DynSolValue::String(s)) => Ok(keccak256(s.as_bytes())),
        (DynSolType::Bytes, DynSolValue::Bytes(b)) => Ok(keccak256(b)),
        _ => Err(EventError::InvalidArgumentValue {
            argument: argument.to_string(),
            reason: format!("filtering on {} arguments is not supported", ty),
        }),
    }
}

/// Build a filter for `event` emitted by `address` within `range`.
///
/// `args` maps indexed argument names to required values, written the way
/// they would be in Solidity source (`0x…` addresses, decimal integers,
/// `true`/`false`, plain strings).
pub fn build_filter(
    event: &Event,
    address: Address,
    range: BlockRange,
    args: &BTreeMap<String, String>,
) -> EventResult<Filter> {
    for name in args.keys() {
        match event.inputs.iter().find(|input| &input.name == name) {
            None => {
                return Err(EventError::UnknownArgument {
                    event: event.name.clone(),
                    argument: name.clone(),
                })
            }
            Some(input) if !input.indexed => return Err(EventError::NotIndexed(name.clone())),
            Some(_) => {}
        }
    }

    let indexed_count = event.inputs.iter().filter(|input| input.indexed).count();
    let topic_count = indexed_count + usize::from(!event.anonymous);
    if topic_count > MAX_TOPICS {
        return Err(EventError::InvalidAbi(format!(
            "event {} needs {} topics, a log carries at most {}",
            event.signature(),
            topic_count,
            MAX_TOPICS
        )));
    }

    let mut filter = Filter::new()
        .address(address)
        .from_block(range.from)
        .to_block(range.to);

    let offset = if event.anonymous {
        0
    } else {
        filter = filter.event_signature(event.selector());
        1
    };

    for (position, input) in event.inputs.iter().filter(|input| input.indexed).enumerate() {
        let Some(raw) = args.get(&input.name) else {
            continue;
        };
        let ty = resolve_param(input)?;
        let value = ty
            .coerce_str(raw)
            .map_err(|e| EventError::InvalidArgumentValue {
                argument: input.name.clone(),
                reason: e.to_string(),
            })?;
        filter.topics[offset + position] = topic_for_value(&input.name, &ty, &value)?.into();
    }

    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::abi::{find_event, parse_abi};
    use alloy::eips::BlockNumberOrTag;
    use alloy::primitives::{address, U256};

    const ABI: &str = r#"[
        {"type":"event","name":"BidSubmission","anonymous":false,"inputs":[
            {"name":"_sender","type":"address","indexed":true},
            {"name":"_amount","type":"uint256","indexed":false}
        ]},
        {"type":"event","name":"Named","anonymous":false,"inputs":[
            {"name":"label","type":"string","indexed":true},
            {"name":"owner","type":"address","indexed":true}
        ]},
        {"type":"event","name":"Settled","anonymous":false,"inputs":[
            {"name":"a","type":"uint256","indexed":true},
            {"name":"b","type":"uint256","indexed":true},
            {"name":"c","type":"uint256","indexed":true},
            {"name":"d","type":"uint256","indexed":true}
        ]},
        {"type":"event","name":"Swept","anonymous":true,"inputs":[
            {"name":"a","type":"uint256","indexed":true},
            {"name":"b","type":"uint256","indexed":true},
            {"name":"c","type":"uint256","indexed":true},
            {"name":"d","type":"uint256","indexed":true}
        ]}
    ]"#;

    const SENDER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const AUCTION: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

    fn event(name: &str) -> Event {
        find_event(&parse_abi(ABI).unwrap(), name).unwrap().clone()
    }

    #[test]
    fn test_filter_without_constraints() {
        let event = event("BidSubmission");
        let filter =
            build_filter(&event, AUCTION, BlockRange::default(), &BTreeMap::new()).unwrap();

        assert_eq!(filter.get_from_block(), Some(0));
        assert_eq!(filter.get_to_block(), None);
        assert_eq!(filter.block_option.get_to_block(), Some(&BlockNumberOrTag::Latest));
        assert!(filter.address.matches(&AUCTION));
        assert!(filter.topics[0].matches(&event.selector()));
        assert!(filter.topics[1].is_empty());
    }

    #[test]
    fn test_indexed_address_constraint() {
        let event = event("BidSubmission");
        let args = BTreeMap::from([("_sender".to_string(), SENDER.to_string())]);
        let filter = build_filter(&event, AUCTION, BlockRange::since(10), &args).unwrap();

        assert_eq!(filter.get_from_block(), Some(10));
        assert!(filter.topics[1].matches(&SENDER.into_word()));
    }

    #[test]
    fn test_indexed_string_is_hashed() {
        let event = event("Named");
        let args = BTreeMap::from([("label".to_string(), "alice".to_string())]);
        let filter = build_filter(&event, AUCTION, BlockRange::default(), &args).unwrap();

        assert!(filter.topics[1].matches(&keccak256("alice")));
        assert!(filter.topics[2].is_empty());
    }

    #[test]
    fn test_unknown_and_unindexed_arguments() {
        let event = event("BidSubmission");

        let args = BTreeMap::from([("_bidder".to_string(), "0x00".to_string())]);
        assert!(matches!(
            build_filter(&event, AUCTION, BlockRange::default(), &args),
            Err(EventError::UnknownArgument { .. })
        ));

        let args = BTreeMap::from([("_amount".to_string(), "1".to_string())]);
        assert!(matches!(
            build_filter(&event, AUCTION, BlockRange::default(), &args),
            Err(EventError::NotIndexed(name)) if name == "_amount"
        ));
    }

    #[test]
    fn test_invalid_value() {
        let event = event("BidSubmission");
        let args = BTreeMap::from([("_sender".to_string(), "not-an-address".to_string())]);
        assert!(matches!(
            build_filter(&event, AUCTION, BlockRange::default(), &args),
            Err(EventError::InvalidArgumentValue { .. })
        ));
    }

    #[test]
    fn test_too_many_indexed_inputs() {
        let event = event("Settled");
        let args = BTreeMap::from([("d".to_string(), "1".to_string())]);
        assert!(matches!(
            build_filter(&event, AUCTION, BlockRange::default(), &args),
            Err(EventError::InvalidAbi(_))
        ));
        assert!(matches!(
            build_filter(&event, AUCTION, BlockRange::default(), &BTreeMap::new()),
            Err(EventError::InvalidAbi(_))
        ));
    }

    #[test]
    fn test_anonymous_event_uses_all_topics() {
        let event = event("Swept");
        let args = BTreeMap::from([("d".to_string(), "1".to_string())]);
        let filter = build_filter(&event, AUCTION, BlockRange::default(), &args).unwrap();

        assert!(filter.topics[0].is_empty());
        assert!(filter.topics[3].matches(&B256::from(U256::from(1))));
    }
}
