//! Signed-in session info

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use neomind_core::{CacheStatus, Session, Theme};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/session", get(get_session))
}

#[derive(Serialize)]
pub struct SessionInfo {
    #[serde(flatten)]
    pub session: Session,
    pub theme: Theme,
    pub timezone: String,
    pub status: CacheStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /session
async fn get_session(State(state): State<AppState>) -> Json<SessionInfo> {
    let scheduler = state.scheduler().await;
    let context = scheduler.context();
    Json(SessionInfo {
        session: context.session.clone(),
        theme: context.theme,
        timezone: scheduler.timezone().name().to_string(),
        status: scheduler.cache().status(),
        last_error: scheduler.cache().last_error().map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use crate::routes::test_support::{app, call};

    #[tokio::test]
    async fn session_reports_user_and_live_cache() {
        let app = app();
        let (_, session) = call(&app, Method::GET, "/session", None).await;

        assert_eq!(session["user_id"], "alice");
        assert_eq!(session["display_name"], "Alice");
        assert_eq!(session["theme"], "light");
        assert_eq!(session["timezone"], "UTC");
        assert_eq!(session["status"], "live");
    }
}
