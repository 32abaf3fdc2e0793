//! Grid selection and the event form

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use neomind_core::MutationOutcome;
use neomind_core::surface::{FormInput, Selection};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/selection", get(get_selection))
        .route("/selection/event/{id}", post(select_event))
        .route("/selection/slot", post(select_slot))
        .route("/selection/new", post(new_event))
        .route("/form", put(update_form))
        .route("/form/submit", post(submit_form))
        .route("/form/cancel", post(cancel_form))
}

/// GET /selection
async fn get_selection(State(state): State<AppState>) -> Json<Selection> {
    let scheduler = state.scheduler().await;
    Json(scheduler.selection().clone())
}

/// POST /selection/event/:id - Open the edit form for a cached event
async fn select_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Selection>, AppError> {
    let mut scheduler = state.scheduler().await;
    scheduler.select_event(&id)?;
    Ok(Json(scheduler.selection().clone()))
}

#[derive(Deserialize)]
pub struct SlotRequest {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// POST /selection/slot - Click or drag over empty grid space
async fn select_slot(
    State(state): State<AppState>,
    Json(req): Json<SlotRequest>,
) -> Json<Selection> {
    let mut scheduler = state.scheduler().await;
    scheduler.select_slot(req.start, req.end);
    Json(scheduler.selection().clone())
}

/// POST /selection/new - The new-event button
async fn new_event(State(state): State<AppState>) -> Json<Selection> {
    let mut scheduler = state.scheduler().await;
    scheduler.new_event(Utc::now());
    Json(scheduler.selection().clone())
}

/// PUT /form - Edit fields of the open form
async fn update_form(
    State(state): State<AppState>,
    Json(input): Json<FormInput>,
) -> Result<Json<Selection>, AppError> {
    let mut scheduler = state.scheduler().await;
    scheduler.update_form(input)?;
    Ok(Json(scheduler.selection().clone()))
}

/// POST /form/submit - Save the open form. A failed write answers `null`;
/// the form is closed either way.
async fn submit_form(
    State(state): State<AppState>,
) -> Result<Json<Option<MutationOutcome>>, AppError> {
    let mut scheduler = state.scheduler().await;
    let outcome = scheduler.submit().await?;
    Ok(Json(outcome))
}

/// POST /form/cancel
async fn cancel_form(State(state): State<AppState>) -> Json<Selection> {
    let mut scheduler = state.scheduler().await;
    scheduler.cancel();
    Json(scheduler.selection().clone())
}
