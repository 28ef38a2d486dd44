use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::AppState;
use crate::models::Query;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `POST /api/query`: a [`crate::service::QueryReport`] as JSON.
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<Query>, JsonRejection>,
) -> Response {
    let query = match payload {
        Ok(Json(query)) => query,
        Err(rejection) => {
            tracing::debug!("Rejected query body: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    match state.service.answer(&query).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            let status = if e.is_per_query() {
                StatusCode::BAD_REQUEST
            } else {
                tracing::error!("Query failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(ErrorBody { error: e.to_string() })).into_response()
        }
    }
}

pub async fn facilities(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.index().facilities().to_vec())
}

pub async fn map(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.map_view(None))
}
