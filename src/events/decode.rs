//! Decoding raw logs against an event descriptor.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::json_abi::Event;
use alloy::rpc::types::Log;

use crate::events::filter::{is_value_type, resolve_param};
use crate::events::types::{DecodedArg, DecodedLog, EventArgs, EventError, EventResult};

/// Decode `log` into the arguments of `event`, in declaration order.
///
/// Indexed value types are read back from their topic word. Indexed
/// dynamic or composite types only survive as their 32-byte hash and are
/// returned as `bytes32`.
pub fn decode_log(event: &Event, log: Log) -> EventResult<DecodedLog> {
    let topics = log.topics();

    let offset = if event.anonymous {
        0
    } else {
        match topics.first() {
            Some(topic0) if *topic0 == event.selector() => 1,
            Some(topic0) => {
                return Err(EventError::Decode(format!(
                    "topic0 {} is not the selector of {}",
                    topic0,
                    event.signature()
                )))
            }
            None => return Err(EventError::Decode("log has no topics".to_string())),
        }
    };

    let indexed_count = event.inputs.iter().filter(|input| input.indexed).count();
    if topics.len() != offset + indexed_count {
        return Err(EventError::Decode(format!(
            "expected {} topics for {}, got {}",
            offset + indexed_count,
            event.signature(),
            topics.len()
        )));
    }

    let body_types = event
        .inputs
        .iter()
        .filter(|input| !input.indexed)
        .map(resolve_param)
        .collect::<EventResult<Vec<_>>>()?;
    let body = match DynSolType::Tuple(body_types)
        .abi_decode_sequence(&log.data().data)
        .map_err(|e| EventError::Decode(e.to_string()))?
    {
        DynSolValue::Tuple(values) => values,
        other => vec![other],
    };

    let mut indexed_topics = topics[offset..].iter();
    let mut body_values = body.into_iter();
    let mut args = Vec::with_capacity(event.inputs.len());

    for input in &event.inputs {
        let value = if input.indexed {
            let topic = indexed_topics
                .next()
                .ok_or_else(|| EventError::Decode("missing topic".to_string()))?;
            let ty = resolve_param(input)?;
            if is_value_type(&ty) {
                ty.abi_decode(topic.as_slice())
                    .map_err(|e| EventError::Decode(format!("{}: {}", input.name, e)))?
            } else {
                DynSolValue::FixedBytes(*topic, 32)
            }
        } else {
            body_values
                .next()
                .ok_or_else(|| EventError::Decode("missing data value".to_string()))?
        };

        args.push(DecodedArg {
            name: input.name.clone(),
            value,
            indexed: input.indexed,
        });
    }

    Ok(DecodedLog {
        event: event.name.clone(),
        log,
        args: EventArgs(args),
    })
}
