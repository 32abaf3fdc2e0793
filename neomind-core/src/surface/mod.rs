//! Calendar interaction surface.
//!
//! Holds the view state of the calendar grid (view mode, anchor date and the
//! current selection) and turns gestures into records for the write path.
//! It never writes anything itself.

mod form;
mod view;

pub use form::{EventForm, FormInput, FormMode};
pub use view::{CalendarView, Navigate, VisibleRange};

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{NeoError, NeoResult};
use crate::event::CalendarEvent;

/// Length of an event created from a point click or the new-event button.
pub fn default_event_length() -> Duration {
    Duration::hours(1)
}

/// What the user currently has open.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", content = "form", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    /// A saved event, opened for editing.
    Existing(EventForm),
    /// A draft built from an empty slot or the new-event button.
    NewSlot(EventForm),
}

impl Selection {
    pub fn form(&self) -> Option<&EventForm> {
        match self {
            Selection::None => None,
            Selection::Existing(form) | Selection::NewSlot(form) => Some(form),
        }
    }

    fn form_mut(&mut self) -> Option<&mut EventForm> {
        match self {
            Selection::None => None,
            Selection::Existing(form) | Selection::NewSlot(form) => Some(form),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarSurface {
    view: CalendarView,
    anchor: NaiveDate,
    selection: Selection,
}

impl CalendarSurface {
    pub fn new(view: CalendarView, anchor: NaiveDate) -> Self {
        CalendarSurface {
            view,
            anchor,
            selection: Selection::None,
        }
    }

    pub fn view(&self) -> CalendarView {
        self.view
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn form(&self) -> Option<&EventForm> {
        self.selection.form()
    }

    pub fn form_mut(&mut self) -> Option<&mut EventForm> {
        self.selection.form_mut()
    }

    pub fn is_form_open(&self) -> bool {
        self.selection.form().is_some()
    }

    pub fn visible_range(&self) -> VisibleRange {
        VisibleRange::new(self.view, self.anchor)
    }

    /// Click on a rendered event.
    pub fn select_event(&mut self, event: &CalendarEvent) -> NeoResult<&EventForm> {
        let form = EventForm::edit(event)?;
        self.selection = Selection::Existing(form);
        self.form().ok_or(NeoError::NoOpenForm)
    }

    /// Click or drag over empty grid space. A point click (no end, or an end
    /// equal to the start) gets the default one-hour length.
    pub fn select_slot(&mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> &EventForm {
        let (start, end) = match end {
            Some(end) if end > start => (start, end),
            Some(end) if end < start => (end, start),
            _ => (start, start + default_event_length()),
        };
        self.open_draft(CalendarEvent::draft(start, end))
    }

    /// New-event button: a draft starting at the next whole hour.
    pub fn new_event(&mut self, now: DateTime<Utc>) -> &EventForm {
        let length = default_event_length();
        let start = now
            .duration_trunc(length)
            .map(|hour| hour + length)
            .unwrap_or(now);
        self.open_draft(CalendarEvent::draft(start, start + length))
    }

    fn open_draft(&mut self, draft: CalendarEvent) -> &EventForm {
        self.selection = Selection::NewSlot(EventForm::create(draft));
        match &self.selection {
            Selection::NewSlot(form) => form,
            _ => unreachable!("selection was just set to a new slot"),
        }
    }

    /// Drag-move or resize of a rendered event: the full record with only
    /// the bounds replaced. The selection is left alone.
    pub fn move_event(
        &self,
        event: &CalendarEvent,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> NeoResult<CalendarEvent> {
        if !event.is_persisted() {
            return Err(NeoError::InvalidEvent(format!(
                "'{}' has not been saved yet",
                event.title
            )));
        }
        Ok(event.with_bounds(start, end))
    }

    pub fn set_view(&mut self, view: CalendarView) {
        self.view = view;
    }

    pub fn navigate(&mut self, nav: Navigate, today: NaiveDate) {
        self.anchor = self.view.navigate(self.anchor, nav, today);
    }

    /// Take the validated record out of the open form. The form is closed
    /// whether or not it validates.
    pub fn take_submission(&mut self) -> NeoResult<CalendarEvent> {
        let form = self.selection.form().ok_or(NeoError::NoOpenForm)?;
        let submission = form.submission();
        self.close_form();
        submission
    }

    pub fn close_form(&mut self) {
        self.selection = Selection::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Category;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn surface() -> CalendarSurface {
        CalendarSurface::new(CalendarView::Week, NaiveDate::from_ymd_opt(2025, 8, 11).unwrap())
    }

    fn saved() -> CalendarEvent {
        CalendarEvent {
            id: Some("evt1".into()),
            title: "Standup".into(),
            description: Some("daily".into()),
            category: Some(Category::Work),
            ..CalendarEvent::draft(at("2025-08-11T09:00:00Z"), at("2025-08-11T09:30:00Z"))
        }
    }

    #[test]
    fn point_click_gets_one_hour() {
        let mut surface = surface();
        let start = at("2025-08-12T14:00:00Z");

        let form = surface.select_slot(start, Some(start));
        assert_eq!(form.end(), at("2025-08-12T15:00:00Z"));

        let form = surface.select_slot(start, None);
        assert_eq!(form.end(), at("2025-08-12T15:00:00Z"));
        assert!(matches!(surface.selection(), Selection::NewSlot(_)));
    }

    #[test]
    fn reversed_drag_is_normalised() {
        let mut surface = surface();
        let form = surface.select_slot(at("2025-08-12T16:00:00Z"), Some(at("2025-08-12T14:00:00Z")));
        assert_eq!(form.start(), at("2025-08-12T14:00:00Z"));
        assert_eq!(form.end(), at("2025-08-12T16:00:00Z"));
    }

    #[test]
    fn slot_draft_is_not_all_day_and_has_no_id() {
        let mut surface = surface();
        surface.select_slot(at("2025-08-12T14:00:00Z"), Some(at("2025-08-12T14:30:00Z")));
        let form = surface.form().unwrap();
        assert!(!form.all_day());
        assert!(form.event_id().is_none());
    }

    #[test]
    fn selecting_an_event_opens_edit_form() {
        let mut surface = surface();
        let form = surface.select_event(&saved()).unwrap();
        assert_eq!(form.event_id(), Some("evt1"));
        assert!(matches!(surface.selection(), Selection::Existing(_)));
    }

    #[test]
    fn new_event_starts_at_next_whole_hour() {
        let mut surface = surface();
        let form = surface.new_event(at("2025-08-11T09:17:42Z"));
        assert_eq!(form.start(), at("2025-08-11T10:00:00Z"));
        assert_eq!(form.end(), at("2025-08-11T11:00:00Z"));
    }

    #[test]
    fn move_changes_only_bounds() {
        let surface = surface();
        let event = saved();
        let moved = surface
            .move_event(&event, at("2025-08-12T10:00:00Z"), at("2025-08-12T11:00:00Z"))
            .unwrap();

        assert_eq!(moved.id, event.id);
        assert_eq!(moved.title, event.title);
        assert_eq!(moved.description, event.description);
        assert_eq!(moved.category, event.category);
        assert_eq!(moved.start, at("2025-08-12T10:00:00Z"));
        assert_eq!(moved.end, at("2025-08-12T11:00:00Z"));
    }

    #[test]
    fn move_leaves_selection_alone() {
        let mut surface = surface();
        surface.select_slot(at("2025-08-12T14:00:00Z"), None);
        surface
            .move_event(&saved(), at("2025-08-12T10:00:00Z"), at("2025-08-12T11:00:00Z"))
            .unwrap();
        assert!(surface.is_form_open());
    }

    #[test]
    fn view_switch_keeps_selection_and_anchor() {
        let mut surface = surface();
        surface.select_event(&saved()).unwrap();

        surface.set_view(CalendarView::Month);

        assert_eq!(surface.view(), CalendarView::Month);
        assert!(matches!(surface.selection(), Selection::Existing(_)));
        assert_eq!(surface.anchor(), NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
    }

    #[test]
    fn navigate_moves_anchor_by_view() {
        let mut surface = surface();
        surface.navigate(Navigate::Next, NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
        assert_eq!(surface.anchor(), NaiveDate::from_ymd_opt(2025, 8, 18).unwrap());
    }

    #[test]
    fn submission_closes_form() {
        let mut surface = surface();
        surface.select_slot(at("2025-08-12T14:00:00Z"), None);
        surface.form_mut().unwrap().set_title("Focus time");

        let event = surface.take_submission().unwrap();

        assert_eq!(event.title, "Focus time");
        assert_eq!(event.end, at("2025-08-12T15:00:00Z"));
        assert!(!surface.is_form_open());
    }

    #[test]
    fn invalid_submission_still_closes_form() {
        let mut surface = surface();
        surface.select_slot(at("2025-08-12T14:00:00Z"), None);

        assert!(surface.take_submission().is_err());
        assert!(!surface.is_form_open());
    }

    #[test]
    fn cancel_closes_form() {
        let mut surface = surface();
        surface.select_event(&saved()).unwrap();
        surface.close_form();
        assert_eq!(surface.selection(), &Selection::None);
    }

    #[test]
    fn submission_without_form_fails() {
        let mut surface = surface();
        assert!(matches!(
            surface.take_submission(),
            Err(NeoError::NoOpenForm)
        ));
    }
}
