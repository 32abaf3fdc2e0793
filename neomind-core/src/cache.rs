//! Live in-memory mirror of the signed-in user's events.
//!
//! The cache has exactly one writer: snapshots arriving on its store
//! subscription. Each snapshot replaces the whole collection, then every
//! registered listener is called synchronously with the new contents.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use slotmap::{SlotMap, new_key_type};

use crate::event::CalendarEvent;
use crate::session::Session;
use crate::store::{EventStore, Snapshot, Subscription};

new_key_type! {
    pub struct ListenerKey;
}

type Listener = Arc<dyn Fn(&[CalendarEvent]) + Send + Sync>;
type Listeners = Mutex<SlotMap<ListenerKey, Listener>>;

fn lock(listeners: &Listeners) -> MutexGuard<'_, SlotMap<ListenerKey, Listener>> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// No subscription has been opened yet.
    Detached,
    /// Subscribed, waiting for the first snapshot.
    Loading,
    Live,
    /// The subscription could not be opened; the cache is empty.
    Failed,
    /// The subscription was released.
    Closed,
}

/// Deregisters its listener when dropped.
#[must_use = "the listener is removed as soon as the guard is dropped"]
pub struct ListenerGuard {
    listeners: Weak<Listeners>,
    key: ListenerKey,
}

impl ListenerGuard {
    pub fn key(&self) -> ListenerKey {
        self.key
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).remove(self.key);
        }
    }
}

pub struct EventCache {
    events: Vec<CalendarEvent>,
    generation: u64,
    status: CacheStatus,
    last_error: Option<String>,
    subscription: Option<Subscription>,
    listeners: Arc<Listeners>,
}

impl Default for EventCache {
    fn default() -> Self {
        EventCache::new()
    }
}

impl EventCache {
    pub fn new() -> Self {
        EventCache {
            events: Vec::new(),
            generation: 0,
            status: CacheStatus::Detached,
            last_error: None,
            subscription: None,
            listeners: Arc::new(Mutex::new(SlotMap::with_key())),
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id.as_deref() == Some(id))
    }

    /// Bumped on every snapshot (and on failure), so derived views can tell
    /// whether they are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> CacheStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == CacheStatus::Loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Open the subscription for `session`'s user, replacing any previous one.
    ///
    /// Failure is not retried: it is logged and the cache stays empty.
    pub fn attach<S: EventStore>(&mut self, store: &S, session: &Session) {
        if let Some(previous) = self.subscription.take() {
            previous.unsubscribe();
        }

        match store.subscribe(&session.user_id) {
            Ok(subscription) => {
                log::info!("Subscribed to events for {}", session.user_id);
                self.subscription = Some(subscription);
                self.status = CacheStatus::Loading;
                self.last_error = None;
                self.sync_pending();
            }
            Err(e) => {
                log::error!("Error fetching events for {}: {}", session.user_id, e);
                self.last_error = Some(e.to_string());
                self.replace(Vec::new(), CacheStatus::Failed);
            }
        }
    }

    /// Release the subscription. Safe to call when nothing is attached.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            self.status = CacheStatus::Closed;
            log::info!("Released event subscription");
        }
    }

    /// Wait for the next snapshot and apply it.
    /// Returns false when there is no live subscription.
    pub async fn sync(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };

        match subscription.next().await {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => {
                log::warn!("Event subscription closed by the store");
                self.subscription = None;
                self.status = CacheStatus::Closed;
                false
            }
        }
    }

    /// Apply every snapshot that has already arrived, without waiting.
    pub fn sync_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(snapshot) = self.subscription.as_mut().and_then(|s| s.try_next()) {
            self.apply_snapshot(snapshot);
            applied += 1;
        }
        applied
    }

    /// Replace the collection with `snapshot`. Nothing from the previous
    /// collection survives.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.replace(snapshot.into_events(), CacheStatus::Live);
    }

    fn replace(&mut self, events: Vec<CalendarEvent>, status: CacheStatus) {
        self.events = events;
        self.generation += 1;
        self.status = status;
        self.notify();
    }

    /// Register `callback`; it runs after every replacement of the collection.
    pub fn on_change(
        &self,
        callback: impl Fn(&[CalendarEvent]) + Send + Sync + 'static,
    ) -> ListenerGuard {
        let key = lock(&self.listeners).insert(Arc::new(callback));
        ListenerGuard {
            listeners: Arc::downgrade(&self.listeners),
            key,
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn notify(&self) {
        // Collect first so a callback may register or drop listeners.
        let listeners: Vec<Listener> = lock(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener(&self.events);
        }
    }
}

impl Drop for EventCache {
    fn drop(&mut self) {
        self.detach();
    }
}
