//! Search and category filtering over the cached events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cache::EventCache;
use crate::error::NeoError;
use crate::event::{CalendarEvent, Category};

/// Category selector. `All` lets every event through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Exact match: an event without a category is only let through by `All`.
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => event.category == Some(*category),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = NeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: CategoryFilter,
}

impl EventFilter {
    pub fn new(query: impl Into<String>, category: CategoryFilter) -> Self {
        EventFilter {
            query: query.into(),
            category,
        }
    }

    /// Case-insensitive substring match on title or description, and the
    /// category selector. An empty query matches everything.
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        self.matches_query(event) && self.category.matches(event)
    }

    fn matches_query(&self, event: &CalendarEvent) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        event.title.to_lowercase().contains(&needle)
            || event
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// Events from `events` that pass `filter`, in their original order.
pub fn filter_events(events: &[CalendarEvent], filter: &EventFilter) -> Vec<CalendarEvent> {
    events.iter().filter(|e| filter.matches(e)).cloned().collect()
}

/// Events that start or end on `now`'s calendar day in `tz`.
pub fn todays_events<Tz: TimeZone>(
    events: &[CalendarEvent],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<CalendarEvent> {
    let today = now.with_timezone(tz).date_naive();
    events
        .iter()
        .filter(|e| e.occurs_on(today, tz))
        .cloned()
        .collect()
}

/// Filtered projection of an `EventCache`, recomputed only when the cache
/// generation or the filter has changed.
#[derive(Debug, Default)]
pub struct FilterView {
    filter: EventFilter,
    seen_generation: Option<u64>,
    events: Vec<CalendarEvent>,
}

impl FilterView {
    pub fn new(filter: EventFilter) -> Self {
        FilterView {
            filter,
            seen_generation: None,
            events: Vec::new(),
        }
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.filter.query {
            self.filter.query = query;
            self.seen_generation = None;
        }
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        if category != self.filter.category {
            self.filter.category = category;
            self.seen_generation = None;
        }
    }

    /// Filtered events for the cache's current contents.
    pub fn events(&mut self, cache: &EventCache) -> &[CalendarEvent] {
        if self.seen_generation != Some(cache.generation()) {
            self.events = filter_events(cache.events(), &self.filter);
            self.seen_generation = Some(cache.generation());
        }
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Snapshot;
    use chrono_tz::Europe::Berlin;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn event(title: &str, description: Option<&str>, category: Option<Category>) -> CalendarEvent {
        CalendarEvent {
            id: Some(title.to_lowercase()),
            title: title.into(),
            description: description.map(String::from),
            category,
            ..CalendarEvent::draft(at("2025-08-11T09:00:00Z"), at("2025-08-11T09:30:00Z"))
        }
    }

    fn sample() -> Vec<CalendarEvent> {
        vec![
            event("Standup", None, Some(Category::Work)),
            event("Gym", Some("leg day, then stand-up paddle"), Some(Category::Personal)),
            event("Rust book", Some("chapter 10"), Some(Category::Learning)),
            event("Errands", None, None),
        ]
    }

    #[test]
    fn standup_matches_in_all_but_not_in_personal() {
        let cache = vec![event("Standup", None, Some(Category::Work))];

        let all = filter_events(&cache, &EventFilter::new("stand", CategoryFilter::All));
        assert_eq!(all.len(), 1);

        let personal = filter_events(
            &cache,
            &EventFilter::new("stand", CategoryFilter::Only(Category::Personal)),
        );
        assert!(personal.is_empty());
    }

    #[test]
    fn empty_query_matches_everything() {
        let events = sample();
        assert_eq!(filter_events(&events, &EventFilter::default()).len(), events.len());
    }

    #[test]
    fn query_matches_description_case_insensitively() {
        let found = filter_events(&sample(), &EventFilter::new("CHAPTER", CategoryFilter::All));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Rust book");
    }

    #[test]
    fn filtered_result_is_a_matching_subset() {
        let events = sample();
        for query in ["", "stand", "a", "zzz"] {
            for category in [
                CategoryFilter::All,
                CategoryFilter::Only(Category::Work),
                CategoryFilter::Only(Category::Personal),
                CategoryFilter::Only(Category::Other),
            ] {
                let filter = EventFilter::new(query, category);
                let result = filter_events(&events, &filter);
                assert!(result.iter().all(|e| events.contains(e)));
                assert!(result.iter().all(|e| filter.matches(e)));
                assert_eq!(
                    result.len(),
                    events.iter().filter(|e| filter.matches(e)).count()
                );
            }
        }
    }

    #[test]
    fn uncategorised_events_only_pass_all() {
        let found = filter_events(
            &sample(),
            &EventFilter::new("errands", CategoryFilter::Only(Category::Personal)),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn category_filter_parses_all_and_categories() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "work".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Work)
        );
        assert!("sleep".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn todays_events_uses_local_day() {
        let late = CalendarEvent {
            id: Some("late".into()),
            title: "Late call".into(),
            // 22:30 UTC on the 10th is already the 11th in Berlin
            ..CalendarEvent::draft(at("2025-08-10T22:30:00Z"), at("2025-08-10T23:00:00Z"))
        };
        let events = vec![late, event("Standup", None, Some(Category::Work))];

        let now = at("2025-08-11T08:00:00Z");
        assert_eq!(todays_events(&events, now, &Berlin).len(), 2);
        assert_eq!(todays_events(&events, now, &Utc).len(), 1);
    }

    #[test]
    fn view_recomputes_on_new_generation_or_filter_change() {
        let mut cache = EventCache::new();
        cache.apply_snapshot(Snapshot::new(sample()));

        let mut view = FilterView::new(EventFilter::new("stand", CategoryFilter::All));
        assert_eq!(view.events(&cache).len(), 2);

        view.set_category(CategoryFilter::Only(Category::Work));
        assert_eq!(view.events(&cache).len(), 1);

        cache.apply_snapshot(Snapshot::default());
        assert!(view.events(&cache).is_empty());
    }
}
