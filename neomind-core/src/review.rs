//! Weekly review numbers and the plain-text lists fed to the review generator.

use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTask {
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewGoal {
    pub title: String,
    pub achieved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyStats {
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub goals_achieved: usize,
    pub total_goals: usize,
    /// 0 to 10, the share of completed tasks.
    pub productivity_score: u8,
}

impl WeeklyStats {
    pub fn compute(tasks: &[ReviewTask], goals: &[ReviewGoal]) -> Self {
        let completed_tasks = tasks.iter().filter(|t| t.completed).count();
        let total_tasks = tasks.len();

        let productivity_score = if total_tasks == 0 {
            0
        } else {
            let ratio = completed_tasks as f64 / total_tasks as f64;
            (ratio * 10.0).round().min(10.0) as u8
        };

        WeeklyStats {
            completed_tasks,
            total_tasks,
            goals_achieved: goals.iter().filter(|g| g.achieved).count(),
            total_goals: goals.len(),
            productivity_score,
        }
    }

    pub fn rating(&self) -> &'static str {
        match self.productivity_score {
            8.. => "Excellent",
            6..=7 => "Good",
            _ => "Needs Improvement",
        }
    }
}

/// First (Sunday) and last (Saturday) day of the week containing `today`.
pub fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    (first, first + Duration::days(6))
}

/// `- [x] title` per completed task, `- [ ] title` otherwise.
pub fn tasks_text(tasks: &[ReviewTask]) -> String {
    tasks
        .iter()
        .map(|t| format!("- [{}] {}", if t.completed { 'x' } else { ' ' }, t.title))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn goals_text(goals: &[ReviewGoal]) -> String {
    goals
        .iter()
        .map(|g| format!("- {} {}", if g.achieved { "✅" } else { "❌" }, g.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Review tasks for events starting between `first` and `last` (inclusive,
/// local days in `tz`).
pub fn tasks_from_events<Tz: TimeZone>(
    events: &[CalendarEvent],
    first: NaiveDate,
    last: NaiveDate,
    tz: &Tz,
) -> Vec<ReviewTask> {
    events
        .iter()
        .filter(|e| {
            let day = e.start.with_timezone(tz).date_naive();
            day >= first && day <= last
        })
        .map(|e| ReviewTask {
            title: e.title.clone(),
            completed: e.completed,
        })
        .collect()
}
