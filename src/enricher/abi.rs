//! Event parameter decoding on top of the alloy ABI crates.
//!
//! Signature files declare events as plain `{name, type, indexed}` lists;
//! these are turned into [`alloy_json_abi::Event`]s and logs are decoded
//! with [`EventExt::decode_log_parts`]. A log that doesn't fit the event
//! (wrong topic count, short data, bad offsets) simply doesn't decode.

use crate::parser::receipt::ReceiptLog;
use crate::utils::error::SignatureError;
use alloy_dyn_abi::{DecodedEvent, DynSolEvent, DynSolValue, EventExt, Specifier};
use alloy_json_abi::{Event, EventParam};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// One declared event parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    /// Solidity type, e.g. `address`, `uint256`, `bytes32`, `string`
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub indexed: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, indexed: bool) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            indexed,
        }
    }

    fn to_event_param(&self) -> Result<EventParam, SignatureError> {
        EventParam::new(&self.name, &self.kind, self.indexed, vec![], None).map_err(|e| {
            SignatureError::InvalidEntry(format!(
                "parameter {:?} of type {:?}: {}",
                self.name, self.kind, e
            ))
        })
    }
}

/// Build a non-anonymous event from a declared parameter list
///
/// # Errors
/// * `SignatureError::InvalidEntry` - Unparseable or unresolvable type, bad
///   identifier, or too many indexed parameters
pub fn event_from_params(name: &str, params: &[ParamSpec]) -> Result<Event, SignatureError> {
    let inputs = params
        .iter()
        .map(ParamSpec::to_event_param)
        .collect::<Result<Vec<_>, _>>()?;

    let event = Event {
        name: name.to_string(),
        inputs,
        anonymous: false,
    };

    // Catches custom type names and more than three indexed params
    let _: DynSolEvent = event
        .resolve()
        .map_err(|e| SignatureError::InvalidEntry(format!("event {name}: {e}")))?;

    Ok(event)
}

/// Decode `log` against `event` into a JSON object keyed by parameter name
///
/// Returns `None` when the log's topics or data don't match the event.
pub fn decode_event(event: &Event, log: &ReceiptLog) -> Option<serde_json::Value> {
    let topics = log
        .topics
        .iter()
        .map(|topic| topic.parse::<B256>().ok())
        .collect::<Option<Vec<_>>>()?;
    let data = hex::decode(strip_hex_prefix(&log.data)).ok()?;

    let decoded = event.decode_log_parts(topics, &data).ok()?;
    Some(params_to_json(event, decoded))
}

/// Pair decoded values back up with their names, in declaration order
///
/// **Private** - alloy returns indexed and body values separately
fn params_to_json(event: &Event, decoded: DecodedEvent) -> serde_json::Value {
    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    let mut params = serde_json::Map::new();

    for (position, input) in event.inputs.iter().enumerate() {
        let value = if input.indexed {
            indexed.next()
        } else {
            body.next()
        };
        let name = if input.name.is_empty() {
            format!("arg{position}")
        } else {
            input.name.clone()
        };
        params.insert(
            name,
            value.as_ref().map_or(serde_json::Value::Null, value_to_json),
        );
    }

    serde_json::Value::Object(params)
}

/// Render a decoded ABI value as JSON
///
/// Integers of every width become decimal strings; byte values and
/// addresses become lower-case `0x` hex.
pub fn value_to_json(value: &DynSolValue) -> serde_json::Value {
    use serde_json::Value;

    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(n, _) => Value::String(n.to_string()),
        DynSolValue::Uint(n, _) => Value::String(n.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(to_hex(&word[..(*size).min(word.len())]))
        }
        DynSolValue::Address(address) => Value::String(to_hex(address.as_slice())),
        DynSolValue::Function(function) => Value::String(to_hex(function.as_slice())),
        DynSolValue::Bytes(bytes) => Value::String(to_hex(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(values)
        | DynSolValue::FixedArray(values)
        | DynSolValue::Tuple(values) => Value::Array(values.iter().map(value_to_json).collect()),
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
