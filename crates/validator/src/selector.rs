//! Selects the most recent events matching a descriptor.
//!
//! Events are expected most recent first. Selection is an order-preserving
//! filter truncated to `descriptor.limit()` survivors, and stops scanning as
//! soon as the limit is reached.

use crate::matcher::{DEFAULT_EVENT_KIND, matches_kind};
use assurance_core::{Event, MatchDescriptor};

/// Select up to `descriptor.limit()` matching events, in store order.
pub fn select(events: &[Event], descriptor: &MatchDescriptor) -> Vec<Event> {
    select_kind(events, descriptor, DEFAULT_EVENT_KIND)
}

/// [`select`] with an explicit coarse classifier.
pub fn select_kind(events: &[Event], descriptor: &MatchDescriptor, kind: &str) -> Vec<Event> {
    select_iter(events, descriptor, kind).cloned().collect()
}

/// Lazy form of [`select_kind`], borrowing from the snapshot.
pub fn select_iter<'a>(
    events: &'a [Event],
    descriptor: &'a MatchDescriptor,
    kind: &'a str,
) -> impl Iterator<Item = &'a Event> + 'a {
    events
        .iter()
        .filter(move |e| matches_kind(e, descriptor, kind))
        .take(descriptor.limit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assurance_core::{DEFAULT_EVENT_COUNT, EventPayload};

    fn event(uuid: &str, event_type: &str, source: &str) -> Event {
        Event {
            uuid: uuid.into(),
            timestamp: 0,
            kind: "generic".into(),
            payload: Some(EventPayload {
                event_type: Some(event_type.into()),
                event_source: Some(source.into()),
                ..Default::default()
            }),
        }
    }

    fn edge(uuid: &str) -> Event {
        event(uuid, "com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent")
    }

    fn other(uuid: &str) -> Event {
        event(uuid, "com.adobe.eventtype.lifecycle", "com.adobe.eventsource.responsecontent")
    }

    #[test]
    fn selects_most_recent_matches_in_order() {
        // 5 matching interleaved with 3 non-matching, most recent first.
        let events = vec![
            other("o1"),
            edge("e1"),
            edge("e2"),
            other("o2"),
            edge("e3"),
            edge("e4"),
            other("o3"),
            edge("e5"),
        ];
        let descriptor = MatchDescriptor::new("com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent")
            .with_count(2);

        let selected = select(&events, &descriptor);
        let uuids: Vec<_> = selected.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["e1", "e2"]);
    }

    #[test]
    fn result_is_an_ordered_subsequence() {
        let events: Vec<Event> = (0..20)
            .map(|i| if i % 3 == 0 { other(&format!("o{i}")) } else { edge(&format!("e{i}")) })
            .collect();
        let descriptor = MatchDescriptor::new("com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent")
            .with_count(5);

        let selected = select(&events, &descriptor);
        assert_eq!(selected.len(), 5);

        let positions: Vec<usize> = selected
            .iter()
            .map(|s| events.iter().position(|e| e.uuid == s.uuid).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn default_count_is_ten() {
        let events: Vec<Event> = (0..25).map(|i| edge(&format!("e{i}"))).collect();
        for count in [None, Some(0), Some(-3)] {
            let descriptor = MatchDescriptor {
                count,
                ..MatchDescriptor::new("com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent")
            };
            assert_eq!(select(&events, &descriptor).len(), DEFAULT_EVENT_COUNT);
        }
    }

    #[test]
    fn empty_input_or_no_match_is_empty() {
        let descriptor = MatchDescriptor::new("com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent");
        assert!(select(&[], &descriptor).is_empty());
        assert!(select(&[other("o1"), other("o2")], &descriptor).is_empty());
    }

    #[test]
    fn iterator_stops_at_limit() {
        let events: Vec<Event> = (0..100).map(|i| edge(&format!("e{i}"))).collect();
        let descriptor = MatchDescriptor::new("com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent")
            .with_count(3);
        let mut it = select_iter(&events, &descriptor, "generic");
        assert_eq!(it.by_ref().count(), 3);
        assert!(it.next().is_none());
    }
}
