//! AI helper endpoints

use axum::{Json, Router, extract::State, routing::post};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use neomind_core::ai::{RoadmapStep, TextGenerator};
use neomind_core::review::{self, ReviewGoal, ReviewTask, WeeklyStats};

use crate::routes::AppError;
use crate::state::{AppState, today};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/summarize", post(summarize))
        .route("/ai/roadmap", post(roadmap))
        .route("/ai/review", post(weekly_review))
}

#[derive(Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// POST /ai/summarize - One or two sentence summary of a note
async fn summarize(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let summary = state.ai().summarize(&req.text).await?;
    Ok(Json(SummarizeResponse { summary }))
}

#[derive(Deserialize)]
pub struct RoadmapRequest {
    pub goal: String,
}

/// POST /ai/roadmap - Break a goal into steps
async fn roadmap(
    State(state): State<AppState>,
    Json(req): Json<RoadmapRequest>,
) -> Result<Json<Vec<RoadmapStep>>, AppError> {
    Ok(Json(state.ai().plan_roadmap(&req.goal).await?))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    /// Defaults to this week's calendar events.
    pub tasks: Option<Vec<ReviewTask>>,
    #[serde(default)]
    pub goals: Vec<ReviewGoal>,
    /// Defaults to the goal list.
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub stats: WeeklyStats,
    pub rating: &'static str,
    pub review: String,
}

/// POST /ai/review - Weekly review with its summary numbers
async fn weekly_review(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let (today, calendar_tasks) = {
        let scheduler = state.scheduler().await;
        let today = today(&scheduler);
        (today, scheduler.review_tasks(today))
    };
    let (week_start, week_end) = review::week_bounds(today);

    let tasks = req.tasks.unwrap_or(calendar_tasks);
    let notes = req.notes.unwrap_or_else(|| review::goals_text(&req.goals));
    let stats = WeeklyStats::compute(&tasks, &req.goals);

    let review = state
        .ai()
        .weekly_review(&review::tasks_text(&tasks), &notes)
        .await?;

    Ok(Json(ReviewResponse {
        week_start,
        week_end,
        stats,
        rating: stats.rating(),
        review,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, call};

    #[tokio::test]
    async fn summarize_falls_back_to_placeholder() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/ai/summarize", Some(json!({"text": "notes"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "This is a placeholder AI summary.");
    }

    #[tokio::test]
    async fn roadmap_falls_back_to_three_steps() {
        let app = app();
        let (_, steps) = call(&app, Method::POST, "/ai/roadmap", Some(json!({"goal": "Learn Rust"}))).await;
        assert_eq!(steps.as_array().unwrap().len(), 3);
        assert_eq!(steps[0]["step"], 1);
    }

    #[tokio::test]
    async fn review_scores_given_tasks() {
        let app = app();
        let body = json!({
            "tasks": [
                {"title": "Ship", "completed": true},
                {"title": "Docs", "completed": false}
            ],
            "goals": [{"title": "Milestone", "achieved": true}]
        });

        let (status, review) = call(&app, Method::POST, "/ai/review", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(review["stats"]["completed_tasks"], 1);
        assert_eq!(review["stats"]["productivity_score"], 5);
        assert_eq!(review["stats"]["goals_achieved"], 1);
        assert!(review["review"].as_str().unwrap().contains("Weekly Review"));
    }
}
