//! Calendar event types.
//!
//! A `CalendarEvent` is the record the rest of the crate passes around: the
//! cache mirrors a list of them, the filter narrows it, the surface edits one
//! at a time, and the pipeline writes it back. The store itself only ever
//! sees `EventFields` (on creation) and `EventPatch` (on update).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NeoError, NeoResult};

/// Store-assigned document identifier.
pub type EventId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Learning,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Work,
        Category::Personal,
        Category::Learning,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Learning => "learning",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = NeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NeoError::InvalidEvent(format!("Unknown category '{}'", s)))
    }
}

/// A calendar event. `id` is `None` until the store has accepted it once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub completed: bool,

    // Server-assigned, read-only for clients
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl CalendarEvent {
    /// A transient event that has never been saved.
    pub fn draft(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        CalendarEvent {
            id: None,
            title: String::new(),
            description: None,
            start,
            end,
            all_day: false,
            category: None,
            completed: false,
            created: None,
            updated: None,
        }
    }

    /// Rebuild an event from a stored document.
    pub fn from_document(
        id: EventId,
        fields: EventFields,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    ) -> Self {
        CalendarEvent {
            id: Some(id),
            title: fields.title,
            description: fields.description,
            start: fields.start,
            end: fields.end,
            all_day: fields.all_day,
            category: fields.category,
            completed: fields.completed,
            created: Some(created),
            updated: Some(updated),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Category used for display. Events saved without one show as personal.
    pub fn display_category(&self) -> Category {
        self.category.unwrap_or(Category::Personal)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Same event with new bounds; every other field is passed through.
    pub fn with_bounds(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        CalendarEvent {
            start,
            end,
            ..self.clone()
        }
    }

    /// Check the record before it is written.
    pub fn validate(&self) -> NeoResult<()> {
        if self.title.trim().is_empty() {
            return Err(NeoError::InvalidEvent("title must not be empty".into()));
        }
        if self.end < self.start {
            return Err(NeoError::InvalidTimeRange {
                start: self.start.to_rfc3339(),
                end: self.end.to_rfc3339(),
            });
        }
        Ok(())
    }

    /// True when the event starts or ends on `day` in the given time zone.
    pub fn occurs_on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> bool {
        self.start.with_timezone(tz).date_naive() == day
            || self.end.with_timezone(tz).date_naive() == day
    }

    /// True when the event intersects the half-open window `[from, to)`.
    /// An event ending exactly at `from` does not; a zero-length event counts
    /// when its instant falls inside the window.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        if self.start == self.end {
            return self.start >= from && self.start < to;
        }
        self.start < to && self.end > from
    }

    /// The writable document body of this event.
    pub fn fields(&self) -> EventFields {
        EventFields {
            title: self.title.clone(),
            description: self.description.clone(),
            start: self.start,
            end: self.end,
            all_day: self.all_day,
            category: self.category,
            completed: self.completed,
        }
    }
}

/// Document body as written on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub category: Option<Category>,
    pub completed: bool,
}

/// Field-level update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub category: Option<Option<Category>>,
    pub completed: Option<bool>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    pub fn apply_to(&self, fields: &mut EventFields) {
        if let Some(title) = &self.title {
            fields.title = title.clone();
        }
        if let Some(description) = &self.description {
            fields.description = description.clone();
        }
        if let Some(start) = self.start {
            fields.start = start;
        }
        if let Some(end) = self.end {
            fields.end = end;
        }
        if let Some(all_day) = self.all_day {
            fields.all_day = all_day;
        }
        if let Some(category) = self.category {
            fields.category = category;
        }
        if let Some(completed) = self.completed {
            fields.completed = completed;
        }
    }
}

impl From<&CalendarEvent> for EventPatch {
    /// A patch carrying every writable field of the record.
    fn from(event: &CalendarEvent) -> Self {
        EventPatch {
            title: Some(event.title.clone()),
            description: Some(event.description.clone()),
            start: Some(event.start),
            end: Some(event.end),
            all_day: Some(event.all_day),
            category: Some(event.category),
            completed: Some(event.completed),
        }
    }
}
