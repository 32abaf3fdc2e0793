//! Grid view modes, navigation and the visible date window.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NeoError;
use crate::event::CalendarEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Month,
    #[default]
    Week,
    Day,
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CalendarView::Month => "month",
            CalendarView::Week => "week",
            CalendarView::Day => "day",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CalendarView {
    type Err = NeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(CalendarView::Month),
            "week" => Ok(CalendarView::Week),
            "day" => Ok(CalendarView::Day),
            other => Err(NeoError::InvalidEvent(format!("Unknown view '{}'", other))),
        }
    }
}

/// Toolbar and drill-down navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "date", rename_all = "snake_case")]
pub enum Navigate {
    Previous,
    Next,
    Today,
    Date(NaiveDate),
}

impl CalendarView {
    /// Anchor date after `nav`. Previous/next move by one month, one week or
    /// one day depending on the view.
    pub fn navigate(&self, anchor: NaiveDate, nav: Navigate, today: NaiveDate) -> NaiveDate {
        let moved = match nav {
            Navigate::Today => return today,
            Navigate::Date(date) => return date,
            Navigate::Next => match self {
                CalendarView::Month => anchor.checked_add_months(Months::new(1)),
                CalendarView::Week => anchor.checked_add_days(Days::new(7)),
                CalendarView::Day => anchor.checked_add_days(Days::new(1)),
            },
            Navigate::Previous => match self {
                CalendarView::Month => anchor.checked_sub_months(Months::new(1)),
                CalendarView::Week => anchor.checked_sub_days(Days::new(7)),
                CalendarView::Day => anchor.checked_sub_days(Days::new(1)),
            },
        };
        moved.unwrap_or(anchor)
    }
}

/// Days shown by a view around its anchor: `first_day` inclusive,
/// `end_day` exclusive. Weeks start on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibleRange {
    pub view: CalendarView,
    pub first_day: NaiveDate,
    pub end_day: NaiveDate,
}

impl VisibleRange {
    pub fn new(view: CalendarView, anchor: NaiveDate) -> Self {
        let (first_day, end_day) = match view {
            CalendarView::Month => {
                let first = anchor.with_day(1).unwrap_or(anchor);
                (first, first.checked_add_months(Months::new(1)).unwrap_or(first))
            }
            CalendarView::Week => {
                let back = u64::from(anchor.weekday().num_days_from_sunday());
                let first = anchor.checked_sub_days(Days::new(back)).unwrap_or(anchor);
                (first, first.checked_add_days(Days::new(7)).unwrap_or(first))
            }
            CalendarView::Day => (anchor, anchor.succ_opt().unwrap_or(anchor)),
        };
        VisibleRange {
            view,
            first_day,
            end_day,
        }
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        day >= self.first_day && day < self.end_day
    }

    /// The window as UTC instants, from local midnight to local midnight.
    pub fn bounds<Tz: TimeZone>(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        (local_midnight(self.first_day, tz), local_midnight(self.end_day, tz))
    }

    /// Events that overlap the window, in their original order.
    pub fn events_in<'a, Tz: TimeZone>(
        &self,
        events: &'a [CalendarEvent],
        tz: &Tz,
    ) -> Vec<&'a CalendarEvent> {
        let (from, to) = self.bounds(tz);
        events.iter().filter(|e| e.overlaps(from, to)).collect()
    }
}

fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight skipped by a DST jump; fall back to the UTC reading
        .unwrap_or_else(|| midnight.and_utc())
}
