//! services/api/src/web/format.rs
//!
//! Source reformatting endpoint.

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::{
    errors::{bad_request, error_response, HandlerError},
    state::AppState,
};

#[derive(Deserialize, ToSchema)]
pub struct FormatRequest {
    pub source: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "text".to_string()
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FormatResponse {
    pub formatted: String,
}

/// POST /format - Ask the AI service to reformat source text
#[utoipa::path(
    post,
    path = "/format",
    request_body = FormatRequest,
    responses(
        (status = 200, description = "Reformatted source", body = FormatResponse),
        (status = 400, description = "Empty source"),
        (status = 502, description = "AI service failure")
    )
)]
pub async fn format_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FormatRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if req.source.trim().is_empty() {
        return Err(bad_request("Nothing to format"));
    }
    let formatted = state
        .format_adapter
        .reformat(&req.source, &req.language)
        .await
        .map_err(error_response)?;
    Ok(Json(FormatResponse { formatted }))
}
