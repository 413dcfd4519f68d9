//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{auth, chat, format, plans};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        plans::generate_plan_handler,
        plans::list_plans_handler,
        plans::get_plan_handler,
        plans::save_plan_handler,
        plans::toggle_task_handler,
        chat::list_tutor_sessions_handler,
        chat::start_tutor_handler,
        chat::tutor_message_handler,
        chat::companion_history_handler,
        chat::companion_message_handler,
        format::format_handler,
    ),
    components(
        schemas(
            auth::CredentialsRequest,
            auth::AuthResponse,
            plans::GeneratePlanRequest,
            plans::ToggleTaskRequest,
            chat::StartTutorRequest,
            chat::SendMessageRequest,
            format::FormatRequest,
            format::FormatResponse,
        )
    ),
    tags(
        (name = "Study Companion API", description = "Study plans, AI tutor and companion chat, and saved history.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_describes_plan_save_body() {
        let doc = ApiDoc::openapi();
        let plan = doc.paths.paths.get("/plans/{id}").expect("plan path");
        let put = plan.put.as_ref().expect("PUT operation");
        assert!(put.request_body.is_some());
        assert!(doc.paths.paths.contains_key("/companion/messages"));
    }
}
