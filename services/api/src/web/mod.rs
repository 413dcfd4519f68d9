pub mod auth;
pub mod chat;
pub mod errors;
pub mod format;
pub mod middleware;
pub mod plans;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::attach_tab;
pub use state::{AppState, TabRegistry, TabState};

/// Images travel as data URLs inside JSON bodies.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the API router. Every route runs behind the tab middleware.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/plans",
            post(plans::generate_plan_handler).get(plans::list_plans_handler),
        )
        .route(
            "/plans/{id}",
            get(plans::get_plan_handler).put(plans::save_plan_handler),
        )
        .route("/plans/{id}/toggle", post(plans::toggle_task_handler))
        .route("/tutor/sessions", get(chat::list_tutor_sessions_handler))
        .route("/tutor/start", post(chat::start_tutor_handler))
        .route("/tutor/messages", post(chat::tutor_message_handler))
        .route("/companion/history", get(chat::companion_history_handler))
        .route("/companion/messages", post(chat::companion_message_handler))
        .route("/format", post(format::format_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            attach_tab,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state)
}
