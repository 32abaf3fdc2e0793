//! Calendar view mode and navigation

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use neomind_core::surface::{CalendarView, Navigate, VisibleRange};
use neomind_core::{CalendarEvent, LocalStore, Scheduler};

use crate::state::{AppState, today};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/view", get(get_view).put(set_view))
        .route("/navigate", post(navigate))
}

#[derive(Serialize)]
pub struct ViewState {
    pub view: CalendarView,
    pub anchor: NaiveDate,
    pub range: VisibleRange,
    pub events: Vec<CalendarEvent>,
}

impl ViewState {
    fn of(scheduler: &mut Scheduler<LocalStore>) -> Self {
        let surface = scheduler.surface();
        let (view, anchor, range) = (surface.view(), surface.anchor(), surface.visible_range());
        ViewState {
            view,
            anchor,
            range,
            events: scheduler.events_in_view(),
        }
    }
}

/// GET /view
async fn get_view(State(state): State<AppState>) -> Json<ViewState> {
    let mut scheduler = state.scheduler().await;
    Json(ViewState::of(&mut scheduler))
}

#[derive(Deserialize)]
pub struct SetViewRequest {
    pub view: CalendarView,
}

/// PUT /view - Switch between month, week and day
async fn set_view(
    State(state): State<AppState>,
    Json(req): Json<SetViewRequest>,
) -> Json<ViewState> {
    let mut scheduler = state.scheduler().await;
    scheduler.set_view(req.view);
    Json(ViewState::of(&mut scheduler))
}

/// POST /navigate - Previous, next, today or a specific date
async fn navigate(State(state): State<AppState>, Json(nav): Json<Navigate>) -> Json<ViewState> {
    let mut scheduler = state.scheduler().await;
    let today = today(&scheduler);
    scheduler.navigate(nav, today);
    Json(ViewState::of(&mut scheduler))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, call};

    #[tokio::test]
    async fn default_view_is_the_week() {
        let app = app();
        let (status, view) = call(&app, Method::GET, "/view", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["view"], "week");
        assert_eq!(view["anchor"], "2025-08-11");
    }

    #[tokio::test]
    async fn switching_view_keeps_anchor() {
        let app = app();
        let (_, view) = call(&app, Method::PUT, "/view", Some(json!({"view": "month"}))).await;
        assert_eq!(view["view"], "month");
        assert_eq!(view["anchor"], "2025-08-11");
    }

    #[tokio::test]
    async fn navigation_steps_and_jumps() {
        let app = app();

        let (_, view) = call(&app, Method::POST, "/navigate", Some(json!({"action": "next"}))).await;
        assert_eq!(view["anchor"], "2025-08-18");

        let body = json!({"action": "date", "date": "2025-12-25"});
        let (_, view) = call(&app, Method::POST, "/navigate", Some(body)).await;
        assert_eq!(view["anchor"], "2025-12-25");
    }

    #[tokio::test]
    async fn unknown_view_is_rejected() {
        let app = app();
        let (status, _) = call(&app, Method::PUT, "/view", Some(json!({"view": "year"}))).await;
        assert!(status.is_client_error());
    }
}
