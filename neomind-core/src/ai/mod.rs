//! Text transforms backed by a language model.
//!
//! Callers only see the `TextGenerator` trait. When no API key is configured
//! the client answers with fixed placeholder content so the rest of the app
//! keeps working offline.

mod openai;

pub use openai::OpenAiClient;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NeoResult;

/// One step of a goal roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub step: u32,
    pub title: String,
    pub description: String,
}

impl RoadmapStep {
    pub fn new(step: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        RoadmapStep {
            step,
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Simulated latency of placeholder responses.
    pub placeholder_delay: Duration,
}

impl AiSettings {
    /// A key is usable if it is present, non-blank and not the stock
    /// placeholder value.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(str::trim)
            .is_some_and(|key| !key.is_empty() && key != UNSET_API_KEY)
    }
}

static UNSET_API_KEY: &str = "YOUR_OPENAI_API_KEY";

pub trait TextGenerator: Send + Sync {
    /// One or two sentence summary of a note.
    fn summarize(&self, text: &str) -> impl Future<Output = NeoResult<String>> + Send;

    /// Break a goal down into ordered, actionable steps.
    fn plan_roadmap(
        &self,
        goal: &str,
    ) -> impl Future<Output = NeoResult<Vec<RoadmapStep>>> + Send;

    /// Markdown review of a week, built from a task list and free-form notes.
    fn weekly_review(
        &self,
        tasks: &str,
        notes: &str,
    ) -> impl Future<Output = NeoResult<String>> + Send;
}

pub static PLACEHOLDER_SUMMARY: &str = "This is a placeholder AI summary.";

pub static PLACEHOLDER_REVIEW: &str = "**Weekly Review Summary:**

**Accomplishments:**
- Placeholder Task 1
- Placeholder Task 2

**Key Insights:**
- Placeholder insight from notes.

**Plan for Next Week:**
- Focus on placeholder objective.";

pub fn placeholder_roadmap() -> Vec<RoadmapStep> {
    vec![
        RoadmapStep::new(
            1,
            "Understand the Basics",
            "This is a placeholder step to learn the fundamentals.",
        ),
        RoadmapStep::new(
            2,
            "Build a Simple Project",
            "Apply your knowledge by building a small application.",
        ),
        RoadmapStep::new(3, "Deploy and Share", "Share your project with the world."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> AiSettings {
        AiSettings {
            api_key: api_key.map(String::from),
            model: "gpt-3.5-turbo".into(),
            endpoint: "http://localhost/v1/chat/completions".into(),
            placeholder_delay: Duration::from_secs(1),
        }
    }

    #[test]
    fn stock_or_blank_keys_are_not_configured() {
        assert!(!settings(None).has_api_key());
        assert!(!settings(Some("")).has_api_key());
        assert!(!settings(Some("  ")).has_api_key());
        assert!(!settings(Some("YOUR_OPENAI_API_KEY")).has_api_key());
        assert!(settings(Some("sk-test")).has_api_key());
    }

    #[test]
    fn placeholder_roadmap_is_numbered_in_order() {
        let steps = placeholder_roadmap();
        assert_eq!(
            steps.iter().map(|s| s.step).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(steps[0].title, "Understand the Basics");
    }
}
