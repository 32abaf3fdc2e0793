//! In-process event store with optional JSON persistence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use tokio::sync::mpsc;

use crate::error::{NeoError, NeoResult};
use crate::event::{CalendarEvent, EventFields, EventId, EventPatch};
use crate::session::UserId;
use crate::store::{EventStore, Snapshot, Subscription};

new_key_type! {
    struct SubscriberKey;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEvent {
    fields: EventFields,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

type Collections = HashMap<UserId, BTreeMap<EventId, StoredEvent>>;

#[derive(Default)]
struct Inner {
    collections: Collections,
    subscribers: HashMap<UserId, SlotMap<SubscriberKey, mpsc::UnboundedSender<Snapshot>>>,
    last_timestamp: Option<DateTime<Utc>>,
    offline: bool,
    denied: HashSet<UserId>,
    data_file: Option<PathBuf>,
}

impl Inner {
    /// Server clock: wall time, but never equal to or behind the last stamp.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(stamp);
        stamp
    }

    fn check_online(&self) -> NeoResult<()> {
        if self.offline {
            return Err(NeoError::StoreUnavailable("event store is offline".into()));
        }
        Ok(())
    }

    fn snapshot(&self, user: &UserId) -> Snapshot {
        let events = self
            .collections
            .get(user)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| {
                        CalendarEvent::from_document(
                            id.clone(),
                            doc.fields.clone(),
                            doc.created,
                            doc.updated,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        Snapshot::new(events)
    }

    /// Push the user's current collection to every live subscriber and
    /// forget the ones whose receiver is gone.
    fn publish(&mut self, user: &UserId) {
        let snapshot = self.snapshot(user);
        if let Some(subscribers) = self.subscribers.get_mut(user) {
            subscribers.retain(|_, tx| tx.send(snapshot.clone()).is_ok());
        }
    }

    fn persist(&self) {
        let Some(path) = &self.data_file else {
            return;
        };
        if let Err(e) = write_collections(path, &self.collections) {
            log::error!("Failed to persist events to {}: {}", path.display(), e);
        }
    }

    fn commit(&mut self, user: &UserId) {
        self.persist();
        self.publish(user);
    }
}

fn write_collections(path: &Path, collections: &Collections) -> NeoResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(collections)?;

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}

/// Event store kept in process memory.
///
/// Every user has their own collection; nothing is visible across users.
/// When opened with a data file, each committed write is flushed to disk and
/// the file is reloaded on the next `open`.
#[derive(Clone, Default)]
pub struct LocalStore {
    inner: Arc<Mutex<Inner>>,
}

impl LocalStore {
    pub fn new() -> Self {
        LocalStore::default()
    }

    /// Open a store backed by `path`, loading it if it already exists.
    pub fn open(path: impl Into<PathBuf>) -> NeoResult<Self> {
        let path = path.into();
        let collections: Collections = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Collections::new()
        };

        let last_timestamp = collections
            .values()
            .flat_map(|docs| docs.values().map(|d| d.updated))
            .max();

        let inner = Inner {
            collections,
            last_timestamp,
            data_file: Some(path),
            ..Inner::default()
        };
        Ok(LocalStore {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subscribe and write fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Refuse subscriptions for `user`.
    pub fn deny(&self, user: &UserId) {
        self.lock().denied.insert(user.clone());
    }

    pub fn allow(&self, user: &UserId) {
        self.lock().denied.remove(user);
    }

    /// Number of live subscriptions held for `user`.
    pub fn subscriber_count(&self, user: &UserId) -> usize {
        self.lock().subscribers.get(user).map_or(0, |s| s.len())
    }

    /// Current collection for `user`, as a subscriber would receive it.
    pub fn snapshot(&self, user: &UserId) -> Snapshot {
        self.lock().snapshot(user)
    }
}

impl EventStore for LocalStore {
    async fn create_event(&self, user: &UserId, fields: EventFields) -> NeoResult<EventId> {
        let mut inner = self.lock();
        inner.check_online()?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = inner.next_timestamp();
        inner.collections.entry(user.clone()).or_default().insert(
            id.clone(),
            StoredEvent {
                fields,
                created: now,
                updated: now,
            },
        );

        log::debug!("Created event {} for {}", id, user);
        inner.commit(user);
        Ok(id)
    }

    async fn update_event(&self, user: &UserId, id: &str, patch: EventPatch) -> NeoResult<()> {
        let mut inner = self.lock();
        inner.check_online()?;

        let now = inner.next_timestamp();
        let doc = inner
            .collections
            .get_mut(user)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| NeoError::EventNotFound(id.to_string()))?;
        patch.apply_to(&mut doc.fields);
        doc.updated = now;

        log::debug!("Updated event {} for {}", id, user);
        inner.commit(user);
        Ok(())
    }

    async fn delete_event(&self, user: &UserId, id: &str) -> NeoResult<()> {
        let mut inner = self.lock();
        inner.check_online()?;

        let removed = inner
            .collections
            .get_mut(user)
            .and_then(|docs| docs.remove(id))
            .is_some();

        if removed {
            log::debug!("Deleted event {} for {}", id, user);
            inner.commit(user);
        }
        Ok(())
    }

    fn subscribe(&self, user: &UserId) -> NeoResult<Subscription> {
        let mut inner = self.lock();
        inner.check_online()?;
        if inner.denied.contains(user) {
            return Err(NeoError::PermissionDenied(user.to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // Unbounded receiver is still alive here, send cannot fail
        let _ = tx.send(inner.snapshot(user));
        let key = inner.subscribers.entry(user.clone()).or_default().insert(tx);

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let owner = user.clone();
        Ok(Subscription::new(rx, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(subscribers) = inner.subscribers.get_mut(&owner) {
                subscribers.remove(key);
                if subscribers.is_empty() {
                    inner.subscribers.remove(&owner);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Category;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn fields(title: &str, start: &str) -> EventFields {
        EventFields {
            title: title.into(),
            description: None,
            start: at(start),
            end: at(start) + Duration::hours(1),
            all_day: false,
            category: Some(Category::Work),
            completed: false,
        }
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let store = LocalStore::new();
        let id = store
            .create_event(&alice(), fields("Standup", "2025-08-11T09:00:00Z"))
            .await
            .unwrap();

        let snapshot = store.snapshot(&alice());
        let event = &snapshot.events()[0];
        assert_eq!(event.id.as_deref(), Some(id.as_str()));
        assert!(event.created.is_some());
        assert_eq!(event.created, event.updated);
    }

    #[tokio::test]
    async fn update_merges_fields_and_bumps_updated() {
        let store = LocalStore::new();
        let id = store
            .create_event(&alice(), fields("Standup", "2025-08-11T09:00:00Z"))
            .await
            .unwrap();
        let before = store.snapshot(&alice()).events()[0].clone();

        let patch = EventPatch {
            title: Some("Daily standup".into()),
            ..EventPatch::default()
        };
        store.update_event(&alice(), &id, patch).await.unwrap();

        let after = store.snapshot(&alice()).events()[0].clone();
        assert_eq!(after.title, "Daily standup");
        assert_eq!(after.category, before.category);
        assert_eq!(after.start, before.start);
        assert_eq!(after.created, before.created);
        assert!(after.updated > before.updated);
    }

    #[tokio::test]
    async fn update_of_missing_document_fails() {
        let store = LocalStore::new();
        let err = store
            .update_event(&alice(), "nope", EventPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NeoError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn subscription_receives_current_collection_then_changes() {
        let store = LocalStore::new();
        store
            .create_event(&alice(), fields("Standup", "2025-08-11T09:00:00Z"))
            .await
            .unwrap();

        let mut subscription = store.subscribe(&alice()).unwrap();
        assert_eq!(subscription.next().await.unwrap().len(), 1);

        store
            .create_event(&alice(), fields("Gym", "2025-08-10T18:00:00Z"))
            .await
            .unwrap();
        let second = subscription.next().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second.events()[0].title, "Gym");
    }

    #[tokio::test]
    async fn users_do_not_see_each_other() {
        let store = LocalStore::new();
        let bob = UserId::new("bob");
        let mut bobs = store.subscribe(&bob).unwrap();
        assert!(bobs.next().await.unwrap().is_empty());

        store
            .create_event(&alice(), fields("Standup", "2025-08-11T09:00:00Z"))
            .await
            .unwrap();

        assert!(bobs.try_next().is_none());
        assert!(store.snapshot(&bob).is_empty());
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = LocalStore::new();
        let id = store
            .create_event(&alice(), fields("Standup", "2025-08-11T09:00:00Z"))
            .await
            .unwrap();

        store.delete_event(&alice(), &id).await.unwrap();
        assert!(store.snapshot(&alice()).is_empty());
    }

    #[test]
    fn dropping_subscription_releases_registration() {
        let store = LocalStore::new();
        let first = store.subscribe(&alice()).unwrap();
        let second = store.subscribe(&alice()).unwrap();
        assert_eq!(store.subscriber_count(&alice()), 2);

        drop(first);
        assert_eq!(store.subscriber_count(&alice()), 1);
        second.unsubscribe();
        assert_eq!(store.subscriber_count(&alice()), 0);
    }

    #[tokio::test]
    async fn offline_store_rejects_subscribe_and_writes() {
        let store = LocalStore::new();
        store.set_offline(true);

        assert!(matches!(
            store.subscribe(&alice()),
            Err(NeoError::StoreUnavailable(_))
        ));
        assert!(
            store
                .create_event(&alice(), fields("Standup", "2025-08-11T09:00:00Z"))
                .await
                .is_err()
        );
    }

    #[test]
    fn denied_user_cannot_subscribe() {
        let store = LocalStore::new();
        store.deny(&alice());
        assert!(matches!(
            store.subscribe(&alice()),
            Err(NeoError::PermissionDenied(_))
        ));

        store.allow(&alice());
        assert!(store.subscribe(&alice()).is_ok());
    }

    #[tokio::test]
    async fn timestamps_are_strictly_increasing() {
        let store = LocalStore::new();
        let mut stamps = Vec::new();
        for n in 0..5 {
            store
                .create_event(&alice(), fields(&format!("E{}", n), "2025-08-11T09:00:00Z"))
                .await
                .unwrap();
        }
        for event in store.snapshot(&alice()).events() {
            stamps.push(event.created.unwrap());
        }
        stamps.sort();
        stamps.dedup();
        assert_eq!(stamps.len(), 5);
    }

    #[tokio::test]
    async fn persisted_store_reloads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let store = LocalStore::open(&path).unwrap();
        let id = store
            .create_event(&alice(), fields("Standup", "2025-08-11T09:00:00Z"))
            .await
            .unwrap();
        drop(store);

        let reopened = LocalStore::open(&path).unwrap();
        let snapshot = reopened.snapshot(&alice());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.events()[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(snapshot.events()[0].title, "Standup");
    }
}
