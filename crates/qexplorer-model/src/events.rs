//! Synchronous change notifications.
//!
//! Observers are plain callbacks registered on the model's [`EventBus`].
//! Delivery happens inline, in registration order, before the mutating call
//! returns.

use std::fmt;

use crate::id::{CollectionId, EntityId};

/// A change to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// An entity was constructed. Fired before its name is made unique and
    /// before any confirmation, so a cancelled item fires only this.
    ItemCreated {
        collection: CollectionId,
        entity: EntityId,
    },
    /// A constructed entity was committed as a child of its collection.
    ItemAdded {
        collection: CollectionId,
        entity: EntityId,
    },
    /// An entity was removed.
    ItemRemoved {
        collection: CollectionId,
        entity: EntityId,
        name: String,
    },
    /// An entity's display name changed.
    NameChanged {
        entity: EntityId,
        old: String,
        new: String,
    },
    /// A field value changed.
    FieldChanged { entity: EntityId, key: String },
}

impl ModelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ModelEvent::ItemCreated { .. } => EventKind::ItemCreated,
            ModelEvent::ItemAdded { .. } => EventKind::ItemAdded,
            ModelEvent::ItemRemoved { .. } => EventKind::ItemRemoved,
            ModelEvent::NameChanged { .. } => EventKind::NameChanged,
            ModelEvent::FieldChanged { .. } => EventKind::FieldChanged,
        }
    }
}

/// Discriminant of [`ModelEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemCreated,
    ItemAdded,
    ItemRemoved,
    NameChanged,
    FieldChanged,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&ModelEvent)>;

struct Subscriber {
    id: SubscriptionId,
    filter: Option<EventKind>,
    callback: Callback,
}

/// Callback lists keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe every event.
    pub fn subscribe(&mut self, callback: impl FnMut(&ModelEvent) + 'static) -> SubscriptionId {
        self.add(None, Box::new(callback))
    }

    /// Observe events of one kind only.
    pub fn subscribe_kind(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&ModelEvent) + 'static,
    ) -> SubscriptionId {
        self.add(Some(kind), Box::new(callback))
    }

    /// Drop a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub(crate) fn emit(&mut self, event: &ModelEvent) {
        let kind = event.kind();
        for sub in &mut self.subscribers {
            if sub.filter.is_none_or(|f| f == kind) {
                (sub.callback)(event);
            }
        }
    }

    fn add(&mut self, filter: Option<EventKind>, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            callback,
        });
        id
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
