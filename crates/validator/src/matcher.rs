//! Event matching against a [`MatchDescriptor`].

use assurance_core::{Event, MatchDescriptor};

/// Coarse classifier carried by SDK events.
pub const DEFAULT_EVENT_KIND: &str = "generic";

/// Does `event` satisfy `descriptor`? Uses the default `"generic"` classifier.
pub fn matches(event: &Event, descriptor: &MatchDescriptor) -> bool {
    matches_kind(event, descriptor, DEFAULT_EVENT_KIND)
}

/// Does `event` satisfy `descriptor`, expecting the coarse classifier `kind`?
///
/// All comparisons are case-insensitive. Invalid events (no type or no
/// source) never match. An absent or empty descriptor name is a wildcard;
/// a present name requires the event to carry an equal name.
pub fn matches_kind(event: &Event, descriptor: &MatchDescriptor, kind: &str) -> bool {
    let (Some(event_type), Some(event_source)) = (event.event_type(), event.event_source()) else {
        return false;
    };

    if !eq_ci(&event.kind, kind)
        || !eq_ci(event_type, &descriptor.event_type)
        || !eq_ci(event_source, &descriptor.source)
    {
        return false;
    }

    match descriptor.name_filter() {
        None => true,
        Some(name) => event.event_name().is_some_and(|n| eq_ci(n, name)),
    }
}

fn eq_ci(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
