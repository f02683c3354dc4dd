//! Decorate a stitched call tree with method names and decoded events.

use super::lookup::SignatureLookup;
use crate::parser::call_tree::{AttachedLog, CallTree, DecodedEvent};
use crate::utils::config::{SELECTOR_HEX_LEN, UNKNOWN_METHOD};
use log::debug;

/// Counters from one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub resolved_methods: usize,
    pub unresolved_methods: usize,
    pub decoded_events: usize,
    pub raw_events: usize,
}

/// First four bytes of a call's input as a lower-case `0x` selector
///
/// Returns `None` when the input is missing or shorter than a selector.
pub fn selector_of(input: Option<&str>) -> Option<String> {
    let input = input?;
    let hex = input.strip_prefix("0x").unwrap_or(input);
    let selector = hex.get(..SELECTOR_HEX_LEN)?;
    Some(format!("0x{}", selector.to_ascii_lowercase()))
}

/// Human label for a call input: the resolved name, the raw selector, or `unknown`
pub fn method_label<L: SignatureLookup + ?Sized>(input: Option<&str>, lookup: &L) -> String {
    match selector_of(input) {
        Some(selector) => lookup
            .method_name(&selector)
            .map(str::to_string)
            .unwrap_or(selector),
        None => UNKNOWN_METHOD.to_string(),
    }
}

/// Decode an attached log via its first topic
///
/// Logs with an unknown topic, or whose topics and data don't fit the known
/// event, pass through raw.
pub fn decode_log<L: SignatureLookup + ?Sized>(log: &AttachedLog, lookup: &L) -> DecodedEvent {
    let descriptor = log
        .topics
        .first()
        .and_then(|topic| lookup.event_descriptor(&topic.to_ascii_lowercase()));

    if let Some(descriptor) = descriptor {
        match descriptor.parse(&log.as_receipt_log()) {
            Some(params) => {
                return DecodedEvent::Decoded {
                    name: descriptor.name.clone(),
                    params,
                }
            }
            None => debug!(
                "Log {} matches {} by topic but does not decode",
                log.log_index, descriptor.name
            ),
        }
    }

    DecodedEvent::Raw {
        topics: log.topics.clone(),
        data: log.data.clone(),
    }
}

/// Fill in `method` on every node and `event` on every attached log
///
/// **Public** - main entry point for enrichment; never fails
pub fn enrich_tree<L: SignatureLookup + ?Sized>(tree: &mut CallTree, lookup: &L) -> EnrichStats {
    let mut stats = EnrichStats::default();

    tree.for_each_mut(|node| {
        let label = method_label(node.input.as_deref(), lookup);
        let resolved = selector_of(node.input.as_deref())
            .is_some_and(|selector| lookup.method_name(&selector).is_some());
        if resolved {
            stats.resolved_methods += 1;
        } else {
            stats.unresolved_methods += 1;
        }
        node.method = Some(label);

        for log in &mut node.logs {
            let event = decode_log(log, lookup);
            match event {
                DecodedEvent::Decoded { .. } => stats.decoded_events += 1,
                DecodedEvent::Raw { .. } => stats.raw_events += 1,
            }
            log.event = Some(event);
        }
    });

    debug!(
        "Enriched tree: {} methods resolved, {} unresolved, {} events decoded, {} raw",
        stats.resolved_methods, stats.unresolved_methods, stats.decoded_events, stats.raw_events
    );

    stats
}
