use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Failures surfaced to clients. Each variant maps to one fixed message; upstream detail is
/// never exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    FetchEarthquakes,
    FetchEarthquakeDetails,
    Internal,
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: &'static str,
}

impl AppError {
    pub fn message(self) -> &'static str {
        match self {
            AppError::FetchEarthquakes => "Failed to fetch earthquake data",
            AppError::FetchEarthquakeDetails => "Failed to fetch earthquake details",
            AppError::Internal => "Something went wrong!",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message(),
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
