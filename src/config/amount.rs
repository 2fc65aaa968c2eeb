//! Wei amounts in configuration files.
//!
//! TOML integers stop at `i64::MAX` wei (about 9.2 ether), so amounts may
//! also be given as strings: plain decimal wei (`"20000000000000000000"`) or
//! a number followed by a unit (`"20 ether"`, `"1.5 ether"`, `"40000 gwei"`).
//! Amounts are written back as decimal wei strings.
//!
//! Use with `#[serde(with = "crate::config::amount")]`, or
//! `crate::config::amount::vec` for lists.

use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Wei(u64),
    Text(String),
}

impl RawAmount {
    fn into_wei(self) -> Result<U256, String> {
        match self {
            RawAmount::Wei(wei) => Ok(U256::from(wei)),
            RawAmount::Text(text) => parse_amount(&text),
        }
    }
}

/// Parse `"<wei>"` or `"<number> <unit>"` into wei.
pub fn parse_amount(s: &str) -> Result<U256, String> {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((value, unit)) => match parse_units(value, unit.trim()) {
            Ok(ParseUnits::U256(wei)) => Ok(wei),
            Ok(ParseUnits::I256(_)) => Err(format!("amount '{}' is negative", s)),
            Err(e) => Err(format!("invalid amount '{}': {}", s, e)),
        },
        None => s
            .parse::<U256>()
            .map_err(|e| format!("invalid amount '{}': {}", s, e)),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    RawAmount::deserialize(deserializer)?
        .into_wei()
        .map_err(serde::de::Error::custom)
}

pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Lists of amounts.
pub mod vec {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<RawAmount>::deserialize(deserializer)?
            .into_iter()
            .map(RawAmount::into_wei)
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(values: &[U256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(U256::to_string))
    }
}
