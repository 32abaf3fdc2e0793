//! One signed-in user's scheduler: the event cache, its filtered projection,
//! the calendar surface and the write path, wired together.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::cache::{EventCache, ListenerGuard};
use crate::error::{NeoError, NeoResult};
use crate::event::CalendarEvent;
use crate::filter::{self, CategoryFilter, EventFilter, FilterView};
use crate::pipeline::{MutationOutcome, MutationPipeline};
use crate::review::{self, ReviewTask};
use crate::session::{AppContext, Session};
use crate::store::EventStore;
use crate::surface::{CalendarSurface, CalendarView, EventForm, FormInput, Navigate, Selection};

pub struct Scheduler<S> {
    context: AppContext,
    tz: Tz,
    cache: EventCache,
    view: FilterView,
    surface: CalendarSurface,
    pipeline: MutationPipeline<S>,
}

impl<S: EventStore> Scheduler<S> {
    /// Subscribe to the session user's events and show the week of `today`.
    pub fn open(store: Arc<S>, context: AppContext, tz: Tz, today: NaiveDate) -> Self {
        let mut cache = EventCache::new();
        cache.attach(store.as_ref(), &context.session);

        let pipeline = MutationPipeline::new(store, &context.session);

        Scheduler {
            context,
            tz,
            cache,
            view: FilterView::new(EventFilter::default()),
            surface: CalendarSurface::new(CalendarView::default(), today),
            pipeline,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn session(&self) -> &Session {
        &self.context.session
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    pub fn surface(&self) -> &CalendarSurface {
        &self.surface
    }

    pub fn filter(&self) -> &EventFilter {
        self.view.filter()
    }

    /// Wait for the next snapshot from the store.
    pub async fn sync(&mut self) -> bool {
        self.cache.sync().await
    }

    pub fn sync_pending(&mut self) -> usize {
        self.cache.sync_pending()
    }

    pub fn on_change(
        &self,
        callback: impl Fn(&[CalendarEvent]) + Send + Sync + 'static,
    ) -> ListenerGuard {
        self.cache.on_change(callback)
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.set_query(query);
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.view.set_category(category);
    }

    /// Cached events passing the current search and category filter.
    pub fn filtered(&mut self) -> &[CalendarEvent] {
        self.view.events(&self.cache)
    }

    /// Filtered events starting or ending on `now`'s local day.
    pub fn todays_events(&mut self, now: DateTime<Utc>) -> Vec<CalendarEvent> {
        let tz = self.tz;
        filter::todays_events(self.view.events(&self.cache), now, &tz)
    }

    /// Filtered events that fall in the visible grid range.
    pub fn events_in_view(&mut self) -> Vec<CalendarEvent> {
        let range = self.surface.visible_range();
        let tz = self.tz;
        range
            .events_in(self.view.events(&self.cache), &tz)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Review tasks for the Sunday-to-Saturday week containing `today`.
    pub fn review_tasks(&self, today: NaiveDate) -> Vec<ReviewTask> {
        let (first, last) = review::week_bounds(today);
        review::tasks_from_events(self.cache.events(), first, last, &self.tz)
    }

    pub fn selection(&self) -> &Selection {
        self.surface.selection()
    }

    pub fn select_event(&mut self, id: &str) -> NeoResult<&EventForm> {
        let event = self
            .cache
            .get(id)
            .cloned()
            .ok_or_else(|| NeoError::EventNotFound(id.to_string()))?;
        self.surface.select_event(&event)
    }

    pub fn select_slot(&mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> &EventForm {
        self.surface.select_slot(start, end)
    }

    pub fn new_event(&mut self, now: DateTime<Utc>) -> &EventForm {
        self.surface.new_event(now)
    }

    pub fn form(&self) -> Option<&EventForm> {
        self.surface.form()
    }

    pub fn form_mut(&mut self) -> Option<&mut EventForm> {
        self.surface.form_mut()
    }

    /// Apply partial input to the open form.
    pub fn update_form(&mut self, input: FormInput) -> NeoResult<&EventForm> {
        let form = self.surface.form_mut().ok_or(NeoError::NoOpenForm)?;
        form.apply(input)?;
        Ok(form)
    }

    /// Save the open form. The form is closed on every path.
    ///
    /// An invalid form is returned as an error. A failed write is logged and
    /// reported as `None`; the cache is left as the store last sent it.
    pub async fn submit(&mut self) -> NeoResult<Option<MutationOutcome>> {
        let event = self
            .surface
            .take_submission()
            .inspect_err(|e| log::error!("Discarding event form: {}", e))?;

        let outcome = self.pipeline.save(&event).await.ok();
        self.cache.sync_pending();
        Ok(outcome)
    }

    /// Write a whole record directly, bypassing the form.
    pub async fn save(&mut self, event: &CalendarEvent) -> NeoResult<MutationOutcome> {
        let outcome = self.pipeline.save(event).await;
        self.cache.sync_pending();
        outcome
    }

    pub fn cancel(&mut self) {
        self.surface.close_form();
    }

    /// Drag-move or resize a cached event. Failures are logged and reported
    /// as `None`; the grid keeps showing the last snapshot.
    pub async fn move_event(
        &mut self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<MutationOutcome> {
        let Some(event) = self.cache.get(id).cloned() else {
            log::warn!("Ignoring move of unknown event {}", id);
            return None;
        };

        let moved = match self.surface.move_event(&event, start, end) {
            Ok(moved) => moved,
            Err(e) => {
                log::error!("Cannot move '{}': {}", event.title, e);
                return None;
            }
        };

        let outcome = self.pipeline.save(&moved).await.ok();
        self.cache.sync_pending();
        outcome
    }

    /// Delete an event. A form open on it is closed.
    pub async fn delete_event(&mut self, id: &str) -> NeoResult<()> {
        self.pipeline.delete(id).await?;

        if self.surface.form().and_then(EventForm::event_id) == Some(id) {
            self.surface.close_form();
        }
        self.cache.sync_pending();
        Ok(())
    }

    pub fn set_view(&mut self, view: CalendarView) {
        self.surface.set_view(view);
    }

    pub fn navigate(&mut self, nav: Navigate, today: NaiveDate) {
        self.surface.navigate(nav, today);
    }

    /// Release the subscription and drop any open form.
    pub fn sign_out(&mut self) {
        log::info!("Signing out {}", self.context.session.user_id);
        self.surface.close_form();
        self.cache.detach();
    }
}
