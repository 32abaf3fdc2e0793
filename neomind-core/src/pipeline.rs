//! The single write path for calendar events.
//!
//! Creates, form edits and drag/resize moves all go through
//! `MutationPipeline::save`. The pipeline never touches the event cache:
//! the store's next snapshot is what makes a write visible.

use std::sync::Arc;

use serde::Serialize;

use crate::error::NeoResult;
use crate::event::{CalendarEvent, EventId, EventPatch};
use crate::session::{Session, UserId};
use crate::store::EventStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum MutationOutcome {
    Created(EventId),
    Updated(EventId),
}

impl MutationOutcome {
    pub fn id(&self) -> &str {
        match self {
            MutationOutcome::Created(id) | MutationOutcome::Updated(id) => id,
        }
    }
}

pub struct MutationPipeline<S> {
    store: Arc<S>,
    user: UserId,
}

impl<S: EventStore> MutationPipeline<S> {
    pub fn new(store: Arc<S>, session: &Session) -> Self {
        MutationPipeline {
            store,
            user: session.user_id.clone(),
        }
    }

    /// Write `event`. With an id this is a field-level update carrying the
    /// full record; without one it creates a new document.
    pub async fn save(&self, event: &CalendarEvent) -> NeoResult<MutationOutcome> {
        if let Err(e) = event.validate() {
            log::error!("Refusing to save event '{}': {}", event.title, e);
            return Err(e);
        }

        let result = match &event.id {
            Some(id) => self
                .store
                .update_event(&self.user, id, EventPatch::from(event))
                .await
                .map(|()| MutationOutcome::Updated(id.clone())),
            None => self
                .store
                .create_event(&self.user, event.fields())
                .await
                .map(MutationOutcome::Created),
        };

        result.inspect_err(|e| log::error!("Error saving event '{}': {}", event.title, e))
    }

    /// Remove an event permanently.
    pub async fn delete(&self, id: &str) -> NeoResult<()> {
        self.store
            .delete_event(&self.user, id)
            .await
            .inspect_err(|e| log::error!("Error deleting event {}: {}", id, e))
    }
}
