//! services/api/src/web/plans.rs
//!
//! Study-plan endpoints: generate, list, fetch, save and toggle tasks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use study_companion_core::{
    domain::{Curriculum, PlanRequest, StudyPlan},
    history::PlanHistory,
};
use tracing::info;
use utoipa::ToSchema;

use crate::web::{
    errors::{bad_request, error_response, require_user, HandlerError},
    state::{AppState, TabState},
};

pub const MAX_PLAN_WEEKS: u32 = 52;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GeneratePlanRequest {
    #[schema(value_type = String, example = "IGCSE")]
    pub curriculum: Curriculum,
    pub subject: String,
    pub goal: String,
    pub weeks: u32,
}

impl GeneratePlanRequest {
    fn validate(self) -> Result<PlanRequest, HandlerError> {
        if self.subject.trim().is_empty() {
            return Err(bad_request("Subject is required"));
        }
        if self.weeks == 0 || self.weeks > MAX_PLAN_WEEKS {
            return Err(bad_request(format!(
                "Weeks must be between 1 and {}",
                MAX_PLAN_WEEKS
            )));
        }
        Ok(PlanRequest {
            curriculum: self.curriculum,
            subject: self.subject.trim().to_string(),
            goal: self.goal.trim().to_string(),
            weeks: self.weeks,
        })
    }
}

/// 0-based position of a task inside a plan.
#[derive(Deserialize, ToSchema)]
pub struct ToggleTaskRequest {
    pub week: usize,
    pub day: usize,
    pub task: usize,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /plans - Generate a plan with the AI service and save it
#[utoipa::path(
    post,
    path = "/plans",
    request_body = GeneratePlanRequest,
    responses(
        (status = 201, description = "Plan generated and saved"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 429, description = "AI service rate limited"),
        (status = 502, description = "AI service failure")
    )
)]
pub async fn generate_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = state.record_store(&tab);
    let username = require_user(&store).await?;
    let request = req.validate()?;

    let generated = state
        .plan_adapter
        .generate_plan(&request)
        .await
        .map_err(error_response)?;
    let plan = StudyPlan::from_generated(&request, generated);

    PlanHistory::new(store)
        .save(&plan)
        .await
        .map_err(error_response)?;
    info!("Saved generated plan {} for '{}'", plan.id, username);

    Ok((StatusCode::CREATED, Json(plan)))
}

/// GET /plans - The signed-in user's plans, most recent first
#[utoipa::path(
    get,
    path = "/plans",
    responses((status = 200, description = "Plan history (empty when signed out)"))
)]
pub async fn list_plans_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
) -> impl IntoResponse {
    Json(PlanHistory::new(state.record_store(&tab)).load_history().await)
}

/// GET /plans/{id} - One plan
#[utoipa::path(
    get,
    path = "/plans/{id}",
    params(("id" = String, Path, description = "Plan id")),
    responses(
        (status = 200, description = "The plan"),
        (status = 404, description = "No such plan")
    )
)]
pub async fn get_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let plan = PlanHistory::new(state.record_store(&tab))
        .find(&id)
        .await
        .map_err(error_response)?;
    Ok(Json(plan))
}

/// PUT /plans/{id} - Save a plan, replacing any plan with the same id
#[utoipa::path(
    put,
    path = "/plans/{id}",
    params(("id" = String, Path, description = "Plan id")),
    request_body(content = serde_json::Value, description = "The full plan, as returned by GET /plans/{id}"),
    responses(
        (status = 200, description = "Plan saved"),
        (status = 400, description = "Body id does not match the path"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn save_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Path(id): Path<String>,
    Json(plan): Json<StudyPlan>,
) -> Result<impl IntoResponse, HandlerError> {
    if plan.id != id {
        return Err(bad_request("Plan id cannot be changed"));
    }
    PlanHistory::new(state.record_store(&tab))
        .save(&plan)
        .await
        .map_err(error_response)?;
    Ok(Json(plan))
}

/// POST /plans/{id}/toggle - Flip one task's completed flag
#[utoipa::path(
    post,
    path = "/plans/{id}/toggle",
    params(("id" = String, Path, description = "Plan id")),
    request_body = ToggleTaskRequest,
    responses(
        (status = 200, description = "The updated plan"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such plan or task")
    )
)]
pub async fn toggle_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Path(id): Path<String>,
    Json(req): Json<ToggleTaskRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = state.record_store(&tab);
    require_user(&store).await?;

    let history = PlanHistory::new(store);
    let plan = history.find(&id).await.map_err(error_response)?;
    let updated = history
        .toggle_task(&plan, req.week, req.day, req.task)
        .await
        .map_err(error_response)?;
    Ok(Json(updated))
}
