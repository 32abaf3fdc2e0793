//! The event edit form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NeoError, NeoResult};
use crate::event::{CalendarEvent, Category, EventId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit { id: EventId },
}

/// Partial form input, as sent by a client. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FormInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub all_day: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Form state bound to one event.
///
/// In edit mode the time bounds are read-only; they can only be changed by
/// dragging or resizing the event on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventForm {
    #[serde(flatten)]
    mode: FormMode,
    title: String,
    description: Option<String>,
    category: Option<Category>,
    all_day: bool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(skip)]
    original: CalendarEvent,
}

impl EventForm {
    /// Form for a draft. Every field is editable and the category starts out
    /// as personal unless the draft already has one.
    pub fn create(draft: CalendarEvent) -> Self {
        EventForm {
            mode: FormMode::Create,
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category.or(Some(Category::Personal)),
            all_day: draft.all_day,
            start: draft.start,
            end: draft.end,
            original: draft,
        }
    }

    /// Form for a saved event, pre-filled with its fields.
    pub fn edit(event: &CalendarEvent) -> NeoResult<Self> {
        let id = event.id.clone().ok_or_else(|| {
            NeoError::InvalidEvent(format!("'{}' has not been saved yet", event.title))
        })?;

        Ok(EventForm {
            mode: FormMode::Edit { id },
            title: event.title.clone(),
            description: event.description.clone(),
            category: event.category,
            all_day: event.all_day,
            start: event.start,
            end: event.end,
            original: event.clone(),
        })
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn event_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Edit { id } => Some(id),
            FormMode::Create => None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn all_day(&self) -> bool {
        self.all_day
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// An empty description is stored as none.
    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = Some(category);
    }

    pub fn set_all_day(&mut self, all_day: bool) {
        self.all_day = all_day;
    }

    pub fn set_start(&mut self, start: DateTime<Utc>) -> NeoResult<()> {
        if self.is_edit() {
            return Err(NeoError::ReadOnlyField("start"));
        }
        self.start = start;
        Ok(())
    }

    pub fn set_end(&mut self, end: DateTime<Utc>) -> NeoResult<()> {
        if self.is_edit() {
            return Err(NeoError::ReadOnlyField("end"));
        }
        self.end = end;
        Ok(())
    }

    /// Apply client input. Time bounds sent for an existing event are
    /// rejected before any field is touched.
    pub fn apply(&mut self, input: FormInput) -> NeoResult<()> {
        if self.is_edit() {
            if input.start.is_some_and(|s| s != self.start) {
                return Err(NeoError::ReadOnlyField("start"));
            }
            if input.end.is_some_and(|e| e != self.end) {
                return Err(NeoError::ReadOnlyField("end"));
            }
        }

        if let Some(title) = input.title {
            self.set_title(title);
        }
        if let Some(description) = input.description {
            self.set_description(description);
        }
        if let Some(category) = input.category {
            self.set_category(category);
        }
        if let Some(all_day) = input.all_day {
            self.set_all_day(all_day);
        }
        if !self.is_edit() {
            if let Some(start) = input.start {
                self.start = start;
            }
            if let Some(end) = input.end {
                self.end = end;
            }
        }
        Ok(())
    }

    /// The record to hand to the write path. Fields the form does not show
    /// are carried over from the event it was opened with.
    ///
    /// A title typed into the form is trimmed; an untouched title is sent
    /// back as stored.
    pub fn submission(&self) -> NeoResult<CalendarEvent> {
        let (start, end) = match self.mode {
            FormMode::Edit { .. } => (self.original.start, self.original.end),
            FormMode::Create => (self.start, self.end),
        };

        let title = if self.title == self.original.title {
            self.title.clone()
        } else {
            self.title.trim().to_string()
        };

        let event = CalendarEvent {
            title,
            description: self.description.clone(),
            category: self.category,
            all_day: self.all_day,
            start,
            end,
            ..self.original.clone()
        };
        event.validate()?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn saved() -> CalendarEvent {
        CalendarEvent {
            id: Some("evt1".into()),
            title: "Standup".into(),
            category: Some(Category::Work),
            created: Some(at("2025-08-01T00:00:00Z")),
            updated: Some(at("2025-08-01T00:00:00Z")),
            ..CalendarEvent::draft(at("2025-08-11T09:00:00Z"), at("2025-08-11T09:30:00Z"))
        }
    }

    #[test]
    fn edit_requires_a_saved_event() {
        let draft = CalendarEvent::draft(at("2025-08-11T09:00:00Z"), at("2025-08-11T10:00:00Z"));
        assert!(EventForm::edit(&draft).is_err());
    }

    #[test]
    fn edit_form_keeps_time_bounds_read_only() {
        let mut form = EventForm::edit(&saved()).unwrap();

        assert!(matches!(
            form.set_start(at("2025-08-11T11:00:00Z")),
            Err(NeoError::ReadOnlyField("start"))
        ));
        assert!(matches!(
            form.set_end(at("2025-08-11T12:00:00Z")),
            Err(NeoError::ReadOnlyField("end"))
        ));
        assert_eq!(form.start(), at("2025-08-11T09:00:00Z"));
    }

    #[test]
    fn apply_rejects_bound_changes_without_partial_edits() {
        let mut form = EventForm::edit(&saved()).unwrap();
        let input = FormInput {
            title: Some("Renamed".into()),
            start: Some(at("2025-08-11T11:00:00Z")),
            ..FormInput::default()
        };

        assert!(form.apply(input).is_err());
        assert_eq!(form.title(), "Standup");
    }

    #[test]
    fn apply_accepts_unchanged_bounds_on_edit() {
        let mut form = EventForm::edit(&saved()).unwrap();
        let input = FormInput {
            title: Some("Renamed".into()),
            start: Some(at("2025-08-11T09:00:00Z")),
            end: Some(at("2025-08-11T09:30:00Z")),
            ..FormInput::default()
        };

        form.apply(input).unwrap();
        assert_eq!(form.title(), "Renamed");
    }

    #[test]
    fn unchanged_edit_submits_the_same_record() {
        let form = EventForm::edit(&saved()).unwrap();
        assert_eq!(form.submission().unwrap(), saved());
    }

    #[test]
    fn unchanged_edit_keeps_stored_title_whitespace() {
        let padded = CalendarEvent {
            title: " Standup ".into(),
            ..saved()
        };
        let form = EventForm::edit(&padded).unwrap();
        let event = form.submission().unwrap();
        assert_eq!(event, padded);
        assert_eq!(EventForm::edit(&event).unwrap().submission().unwrap(), padded);
    }

    #[test]
    fn edited_title_is_trimmed() {
        let mut form = EventForm::edit(&saved()).unwrap();
        form.set_title("  Retro  ");
        assert_eq!(form.submission().unwrap().title, "Retro");
    }

    #[test]
    fn create_form_defaults_category_to_personal() {
        let draft = CalendarEvent::draft(at("2025-08-11T09:00:00Z"), at("2025-08-11T10:00:00Z"));
        let form = EventForm::create(draft);
        assert_eq!(form.category(), Some(Category::Personal));
        assert!(!form.is_edit());
    }

    #[test]
    fn create_form_edits_every_field() {
        let draft = CalendarEvent::draft(at("2025-08-11T09:00:00Z"), at("2025-08-11T10:00:00Z"));
        let mut form = EventForm::create(draft);

        form.set_title("Deep work");
        form.set_description("");
        form.set_category(Category::Learning);
        form.set_start(at("2025-08-11T13:00:00Z")).unwrap();
        form.set_end(at("2025-08-11T15:00:00Z")).unwrap();

        let event = form.submission().unwrap();
        assert_eq!(event.id, None);
        assert_eq!(event.title, "Deep work");
        assert_eq!(event.description, None);
        assert_eq!(event.category, Some(Category::Learning));
        assert_eq!(event.start, at("2025-08-11T13:00:00Z"));
    }

    #[test]
    fn submission_rejects_empty_title() {
        let draft = CalendarEvent::draft(at("2025-08-11T09:00:00Z"), at("2025-08-11T10:00:00Z"));
        let form = EventForm::create(draft);
        assert!(form.submission().is_err());
    }
}
