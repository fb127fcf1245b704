//! Extension registry discovery.
//!
//! The event hub publishes its shared state whenever the set of registered
//! extensions changes. The most recent such event owned by the hub carries
//! the registry under `metadata["state.data"].extensions`.
//!
//! Only the `lookback` most recent hub shared-state events are scanned. If
//! more hub events than that arrive between registry updates the true latest
//! state can be missed; the bound is configurable for that reason.

use crate::matcher::DEFAULT_EVENT_KIND;
use crate::selector::select_iter;
use assurance_core::{Event, ExtensionRegistry, MatchDescriptor};
use serde_json::Value;
use tracing::debug;

pub const HUB_EVENT_TYPE: &str = "com.adobe.eventtype.hub";
pub const SHARED_STATE_SOURCE: &str = "com.adobe.eventsource.sharedstate";
pub const HUB_STATE_OWNER: &str = "com.adobe.module.eventhub";

/// Default number of hub shared-state events scanned.
pub const DEFAULT_LOOKBACK: usize = 100;

const STATE_OWNER_KEYS: [&str; 2] = ["stateowner", "stateOwner"];

/// The registry published by the most recent hub shared-state event, using
/// the `"generic"` classifier for hub events.
pub fn resolve_registry(events: &[Event], lookback: usize) -> Option<ExtensionRegistry> {
    resolve_registry_kind(events, lookback, DEFAULT_EVENT_KIND)
}

/// [`resolve_registry`] with an explicit coarse classifier.
///
/// Returns `None` when no hub-owned shared-state event is found within the
/// lookback, or when that event carries no usable extensions object. A
/// `lookback` of 0 scans nothing and always returns `None`.
pub fn resolve_registry_kind(
    events: &[Event],
    lookback: usize,
    kind: &str,
) -> Option<ExtensionRegistry> {
    if lookback == 0 {
        debug!("Registry lookback is 0, nothing scanned");
        return None;
    }
    let descriptor = MatchDescriptor::new(HUB_EVENT_TYPE, SHARED_STATE_SOURCE)
        .with_count(i64::try_from(lookback).unwrap_or(i64::MAX));

    let latest = select_iter(events, &descriptor, kind).find(|e| is_hub_owned(e))?;
    debug!(uuid = %latest.uuid, "Found hub shared state");

    let extensions = latest
        .metadata()?
        .get("state.data")?
        .get("extensions")?;
    let registry = ExtensionRegistry::from_value(extensions);
    if registry.is_none() {
        debug!(uuid = %latest.uuid, "Hub shared state has no extensions object");
    }
    registry
}

fn is_hub_owned(event: &Event) -> bool {
    let Some(data) = event.data() else {
        return false;
    };
    STATE_OWNER_KEYS
        .iter()
        .filter_map(|k| data.get(*k).and_then(Value::as_str))
        .any(|owner| owner.eq_ignore_ascii_case(HUB_STATE_OWNER))
}
