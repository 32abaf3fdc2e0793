//! Event list and write endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use neomind_core::{CalendarEvent, CategoryFilter, MutationOutcome, NeoError};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(save_event))
        .route("/events/today", get(todays_events))
        .route("/events/{id}", delete(delete_event))
        .route("/events/{id}/bounds", put(move_event))
        .route("/events/visible", get(visible_events))
        .route("/events/{id}/complete", post(complete_event))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub category: Option<CategoryFilter>,
}

/// GET /events - Cached events through the search and category filter.
/// Query parameters replace the stored filter when present.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<CalendarEvent>> {
    let mut scheduler = state.scheduler().await;
    if let Some(q) = query.q {
        scheduler.set_query(q);
    }
    if let Some(category) = query.category {
        scheduler.set_category(category);
    }
    Json(scheduler.filtered().to_vec())
}

/// GET /events/today
async fn todays_events(State(state): State<AppState>) -> Json<Vec<CalendarEvent>> {
    let mut scheduler = state.scheduler().await;
    Json(scheduler.todays_events(Utc::now()))
}

/// GET /events/visible - Filtered events inside the current grid range
async fn visible_events(State(state): State<AppState>) -> Json<Vec<CalendarEvent>> {
    let mut scheduler = state.scheduler().await;
    Json(scheduler.events_in_view())
}

/// POST /events - Create or update a whole record
async fn save_event(
    State(state): State<AppState>,
    Json(event): Json<CalendarEvent>,
) -> Result<Json<MutationOutcome>, AppError> {
    let mut scheduler = state.scheduler().await;
    let outcome = scheduler.save(&event).await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct BoundsRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// PUT /events/:id/bounds - Drag-move or resize. A rejected move answers
/// `null` and the grid keeps the stored bounds.
async fn move_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<BoundsRequest>,
) -> Json<Option<MutationOutcome>> {
    let mut scheduler = state.scheduler().await;
    Json(scheduler.move_event(&id, req.start, req.end).await)
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    #[serde(default = "default_true")]
    pub completed: bool,
}

fn default_true() -> bool {
    true
}

/// POST /events/:id/complete - Tick an event off for the weekly review
async fn complete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<MutationOutcome>, AppError> {
    let mut scheduler = state.scheduler().await;
    let mut event = scheduler
        .cache()
        .get(&id)
        .cloned()
        .ok_or_else(|| NeoError::EventNotFound(id.clone()))?;
    event.completed = req.completed;
    let outcome = scheduler.save(&event).await?;
    Ok(Json(outcome))
}

/// DELETE /events/:id
async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut scheduler = state.scheduler().await;
    scheduler.delete_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
