pub mod ai;
pub mod events;
pub mod selection;
pub mod session;
pub mod view;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use neomind_core::NeoError;

use crate::state::AppState;

/// The full HTTP surface with open CORS for the local front end.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(events::router())
        .merge(view::router())
        .merge(selection::router())
        .merge(session::router())
        .merge(ai::router())
        .with_state(state)
        .layer(cors)
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<NeoError>() {
            Some(NeoError::EventNotFound(_)) => StatusCode::NOT_FOUND,
            Some(
                NeoError::InvalidEvent(_)
                | NeoError::InvalidTimeRange { .. }
                | NeoError::ReadOnlyField(_),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(NeoError::NoOpenForm) => StatusCode::CONFLICT,
            Some(NeoError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            Some(NeoError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Some(NeoError::Ai(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self.0);
        }
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
