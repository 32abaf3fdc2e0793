//! Remote event store boundary.
//!
//! The store is the single source of truth for a user's events. It hands out
//! ids and timestamps, accepts whole-document creates and field-level
//! updates, and pushes a complete ordered `Snapshot` to every live
//! `Subscription` of that user whenever one of their documents changes.

mod local;

pub use local::LocalStore;

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::NeoResult;
use crate::event::{CalendarEvent, EventFields, EventId, EventPatch};
use crate::session::UserId;

pub trait EventStore: Send + Sync {
    /// Create a document and return its new id. Stamps created and updated.
    fn create_event(
        &self,
        user: &UserId,
        fields: EventFields,
    ) -> impl Future<Output = NeoResult<EventId>> + Send;

    /// Merge `patch` into an existing document and stamp updated.
    fn update_event(
        &self,
        user: &UserId,
        id: &str,
        patch: EventPatch,
    ) -> impl Future<Output = NeoResult<()>> + Send;

    /// Remove a document permanently.
    fn delete_event(&self, user: &UserId, id: &str) -> impl Future<Output = NeoResult<()>> + Send;

    /// Start receiving snapshots of the user's collection, ordered by start.
    /// The current collection is delivered first.
    fn subscribe(&self, user: &UserId) -> NeoResult<Subscription>;
}

/// A complete, consistent view of one user's events, ordered by start time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    events: Vec<CalendarEvent>,
}

impl Snapshot {
    pub fn new(mut events: Vec<CalendarEvent>) -> Self {
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Snapshot { events }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<CalendarEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Live feed of snapshots. Dropping it (or calling `unsubscribe`) releases
/// the registration in the store.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Snapshot>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Subscription {
            receiver,
            release: Some(Box::new(release)),
        }
    }

    /// Wait for the next snapshot. `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Next snapshot that has already been delivered, without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {
        drop(self)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}
