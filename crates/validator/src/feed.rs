//! Event feed — the push-style bridge from the inspection host.
//!
//! The host calls the [`PluginHandler`] callbacks whenever its view changes:
//! the full event list, the user's selected events, session details, and the
//! latest validation result. The feed keeps each as part of an immutable
//! [`FeedSnapshot`] and publishes it on a watch channel, so a validation run
//! always works on one consistent snapshot while newer pushes queue up
//! behind it.

use assurance_core::EventStore;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

/// Callbacks the inspection host invokes.
pub trait PluginHandler: Send + Sync {
    /// Plugin start-up with the host's settings.
    fn init(&self, settings: Value);

    /// The full list of captured events.
    fn receive_events(&self, events: Vec<Value>);

    /// The events the user currently has selected.
    fn receive_selected_events(&self, events: Vec<Value>);

    /// Session details (client, device, app).
    fn receive_session(&self, session: Value);

    /// A validation result produced by the host.
    fn receive_validation(&self, validation: Value);
}

/// Order in which the host delivers events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Everything the host has pushed so far.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Incremented on every push.
    pub version: u64,
    pub settings: Option<Value>,
    pub events: EventStore,
    pub selected: EventStore,
    pub session: Option<Value>,
    pub validation: Option<Value>,
}

/// A [`PluginHandler`] that records pushes as snapshots.
pub struct EventFeed {
    order: FeedOrder,
    tx: watch::Sender<FeedSnapshot>,
}

impl EventFeed {
    pub fn new(order: FeedOrder) -> Self {
        let (tx, _) = watch::channel(FeedSnapshot::default());
        Self { order, tx }
    }

    /// The latest snapshot. Cheap: event lists are shared, not copied.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.tx.borrow().clone()
    }

    /// Be notified of every push.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    fn store(&self, events: Vec<Value>) -> EventStore {
        let store = EventStore::from_values(events);
        match self.order {
            FeedOrder::NewestFirst => store,
            FeedOrder::OldestFirst => EventStore::from_chronological(store.events().to_vec()),
        }
    }

    fn push(&self, what: &str, update: impl FnOnce(&mut FeedSnapshot)) {
        self.tx.send_modify(|snapshot| {
            update(snapshot);
            snapshot.version += 1;
            debug!(version = snapshot.version, what, "Feed updated");
        });
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new(FeedOrder::default())
    }
}

impl PluginHandler for EventFeed {
    fn init(&self, settings: Value) {
        info!("Event feed initialised");
        self.push("settings", |s| s.settings = Some(settings));
    }

    fn receive_events(&self, events: Vec<Value>) {
        let store = self.store(events);
        info!(events = store.len(), "Received events");
        self.push("events", |s| s.events = store);
    }

    fn receive_selected_events(&self, events: Vec<Value>) {
        let store = self.store(events);
        self.push("selected", |s| s.selected = store);
    }

    fn receive_session(&self, session: Value) {
        self.push("session", |s| s.session = Some(session));
    }

    fn receive_validation(&self, validation: Value) {
        self.push("validation", |s| s.validation = Some(validation));
    }
}
