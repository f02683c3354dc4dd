//! Selector and topic lookup tables.
//!
//! The enricher only talks to [`SignatureLookup`], so any source of ABI
//! knowledge can be plugged in. [`SignatureTable`] is the stock
//! implementation: a few common token signatures built in, extendable
//! from a TOML file.
//!
//! # Example
//! ```ignore
//! let mut table = SignatureTable::builtin();
//! table.extend(load_signatures("signatures.toml")?)?;
//! ```

use super::abi::{decode_event, event_from_params, ParamSpec};
use crate::parser::receipt::ReceiptLog;
use crate::utils::config::{SELECTOR_HEX_LEN, WORD_HEX_LEN};
use crate::utils::error::SignatureError;
use alloy_json_abi::Event;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Pure function from a raw log to its structured parameters, `None` if it doesn't fit
pub type LogParser = Arc<dyn Fn(&ReceiptLog) -> Option<serde_json::Value> + Send + Sync>;

/// A known event: its name and how to read its parameters
#[derive(Clone)]
pub struct EventDescriptor {
    pub name: String,
    parser: LogParser,
}

impl EventDescriptor {
    pub fn new(
        name: impl Into<String>,
        parser: impl Fn(&ReceiptLog) -> Option<serde_json::Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parser: Arc::new(parser),
        }
    }

    /// Descriptor trying each ABI variant sharing one topic in turn
    ///
    /// ERC-20 and ERC-721 `Transfer` hash to the same topic and differ only
    /// in how many parameters are indexed.
    pub fn from_events(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self::new(name, move |log| {
            events.iter().find_map(|event| decode_event(event, log))
        })
    }

    /// Descriptor decoding the declared parameter list
    ///
    /// # Errors
    /// * `SignatureError::InvalidEntry` - A parameter type doesn't resolve
    pub fn with_params(name: &str, params: &[ParamSpec]) -> Result<Self, SignatureError> {
        let event = event_from_params(name, params)?;
        Ok(Self::from_events(name, vec![event]))
    }

    pub fn parse(&self, log: &ReceiptLog) -> Option<serde_json::Value> {
        (self.parser)(log)
    }
}

impl fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Source of method and event names
pub trait SignatureLookup {
    /// Method name for a `0x`-prefixed lower-case 4-byte selector
    fn method_name(&self, selector: &str) -> Option<&str>;

    /// Event descriptor for a `0x`-prefixed lower-case topic hash
    fn event_descriptor(&self, topic: &str) -> Option<&EventDescriptor>;
}

/// Signature file layout
#[derive(Debug, Default, Deserialize)]
pub struct SignatureFile {
    /// selector -> method name
    #[serde(default)]
    pub methods: HashMap<String, String>,

    #[serde(default)]
    pub events: Vec<EventSpec>,
}

/// One `[[events]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct EventSpec {
    /// Optional; checked against the hash of the declared signature
    #[serde(default)]
    pub topic: Option<String>,
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

/// Hash-map backed lookup tables
#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
    methods: HashMap<String, String>,
    events: HashMap<String, EventDescriptor>,
}

const BUILTIN_METHODS: &[(&str, &str)] = &[
    ("0xa9059cbb", "transfer"),
    ("0x23b872dd", "transferFrom"),
    ("0x095ea7b3", "approve"),
    ("0x70a08231", "balanceOf"),
    ("0xdd62ed3e", "allowance"),
    ("0x18160ddd", "totalSupply"),
    ("0x313ce567", "decimals"),
    ("0xd0e30db0", "deposit"),
    ("0x2e1a7d4d", "withdraw"),
    ("0x42842e0e", "safeTransferFrom"),
    ("0xa22cb465", "setApprovalForAll"),
    ("0x38ed1739", "swapExactTokensForTokens"),
    ("0xac9650d8", "multicall"),
];

const BUILTIN_EVENTS: &[&str] = &[
    "event Transfer(address indexed from, address indexed to, uint256 value)",
    "event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
    "event Approval(address indexed owner, address indexed spender, uint256 value)",
    "event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId)",
    "event ApprovalForAll(address indexed owner, address indexed operator, bool approved)",
    "event Deposit(address indexed dst, uint256 wad)",
    "event Withdrawal(address indexed src, uint256 wad)",
    "event Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to)",
    "event Sync(uint112 reserve0, uint112 reserve1)",
];

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with common token signatures
    pub fn builtin() -> Self {
        let mut table = Self::new();

        for (selector, name) in BUILTIN_METHODS {
            table.insert_method(selector, *name);
        }

        let events = BUILTIN_EVENTS.iter().filter_map(|signature| {
            Event::parse(signature)
                .map_err(|e| warn!("Skipping builtin event {signature:?}: {e}"))
                .ok()
        });
        table.insert_event_group(events);

        table
    }

    pub fn insert_method(&mut self, selector: &str, name: impl Into<String>) {
        self.methods.insert(selector.to_ascii_lowercase(), name.into());
    }

    pub fn insert_event(&mut self, topic: &str, descriptor: EventDescriptor) {
        self.events.insert(topic.to_ascii_lowercase(), descriptor);
    }

    /// Insert events keyed by their selector, one descriptor per selector
    fn insert_event_group(&mut self, events: impl IntoIterator<Item = Event>) {
        let mut by_topic: HashMap<String, Vec<Event>> = HashMap::new();
        for event in events {
            by_topic
                .entry(format!("{:#x}", event.selector()))
                .or_default()
                .push(event);
        }

        for (topic, variants) in by_topic {
            let name = variants
                .first()
                .map(|event| event.name.clone())
                .unwrap_or_default();
            self.insert_event(&topic, EventDescriptor::from_events(name, variants));
        }
    }

    /// Add every entry of a signature file, overriding existing ones
    ///
    /// # Errors
    /// * `SignatureError::InvalidEntry` - Malformed selector, topic or parameter,
    ///   or a topic that isn't the hash of the declared signature
    pub fn extend(&mut self, file: SignatureFile) -> Result<(), SignatureError> {
        for (selector, name) in file.methods {
            if !is_hex_id(&selector, SELECTOR_HEX_LEN) {
                return Err(SignatureError::InvalidEntry(format!(
                    "selector {selector:?} is not 0x followed by {SELECTOR_HEX_LEN} hex digits"
                )));
            }
            self.insert_method(&selector, name);
        }

        let mut events = Vec::with_capacity(file.events.len());
        for entry in file.events {
            let event = event_from_params(&entry.name, &entry.params)?;

            if let Some(topic) = &entry.topic {
                if !is_hex_id(topic, WORD_HEX_LEN) {
                    return Err(SignatureError::InvalidEntry(format!(
                        "topic {:?} for event {} is not a 32-byte hash",
                        topic, entry.name
                    )));
                }
                let computed = format!("{:#x}", event.selector());
                if !topic.eq_ignore_ascii_case(&computed) {
                    return Err(SignatureError::InvalidEntry(format!(
                        "topic {} for event {} does not match {} = {}",
                        topic,
                        entry.name,
                        event.signature(),
                        computed
                    )));
                }
            }

            events.push(event);
        }
        self.insert_event_group(events);

        debug!(
            "Signature table now holds {} methods and {} events",
            self.methods.len(),
            self.events.len()
        );
        Ok(())
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl SignatureLookup for SignatureTable {
    fn method_name(&self, selector: &str) -> Option<&str> {
        self.methods.get(selector).map(String::as_str)
    }

    fn event_descriptor(&self, topic: &str) -> Option<&EventDescriptor> {
        self.events.get(topic)
    }
}

/// Parse a signature file from TOML text
pub fn parse_signatures(contents: &str) -> Result<SignatureFile, SignatureError> {
    Ok(toml::from_str(contents)?)
}

/// Load a signature file from disk
///
/// # Errors
/// * `SignatureError::IoError` - If file cannot be read
/// * `SignatureError::TomlError` - If TOML is invalid
pub fn load_signatures(path: impl AsRef<Path>) -> Result<SignatureFile, SignatureError> {
    let contents = fs::read_to_string(path)?;
    parse_signatures(&contents)
}

fn is_hex_id(value: &str, hex_len: usize) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == hex_len && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}
