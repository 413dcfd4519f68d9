//! services/api/src/web/chat.rs
//!
//! Tutor and companion chat endpoints. Replies are streamed to the client as
//! Server-Sent Events and the conversation is saved once the stream ends.

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Extension, Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use study_companion_core::{
    chat::{Conversation, ConversationKind},
    domain::Curriculum,
    history::{CompanionHistory, TutorHistory},
    ports::PortResult,
    store::RecordStore,
};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::web::{
    errors::{bad_request, error_response, require_user, HandlerError},
    protocol::StreamEvent,
    state::{AppState, TabState, Thread},
};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct StartTutorRequest {
    #[schema(value_type = String, example = "AP")]
    pub curriculum: Curriculum,
    pub subject: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: String,
    /// Optional image as a data URL.
    pub image: Option<String>,
}

//=========================================================================================
// Tutor Handlers
//=========================================================================================

/// GET /tutor/sessions - Every saved tutor session
#[utoipa::path(
    get,
    path = "/tutor/sessions",
    responses((status = 200, description = "Saved tutor sessions (empty when signed out)"))
)]
pub async fn list_tutor_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
) -> impl IntoResponse {
    Json(TutorHistory::new(state.record_store(&tab)).sessions().await)
}

/// POST /tutor/start - Open the tutor for a curriculum and subject
///
/// Resumes the saved session for the pair when there is one.
#[utoipa::path(
    post,
    path = "/tutor/start",
    request_body = StartTutorRequest,
    responses(
        (status = 200, description = "Messages of the opened conversation"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn start_tutor_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Json(req): Json<StartTutorRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = state.record_store(&tab);
    require_user(&store).await?;
    if req.subject.trim().is_empty() {
        return Err(bad_request("Subject is required"));
    }

    let subject = req.subject.trim().to_string();
    let saved = TutorHistory::new(store)
        .session(req.curriculum, &subject)
        .await;
    let conversation = match saved {
        Some(session) => Conversation::resume(
            ConversationKind::Tutor {
                curriculum: req.curriculum,
                subject,
            },
            session.messages,
        ),
        None => Conversation::tutor(req.curriculum, subject),
    };

    let messages = conversation.messages().to_vec();
    *tab.tutor.lock().await = Some(conversation);
    Ok(Json(messages))
}

/// POST /tutor/messages - Send a message to the tutor and stream the reply
#[utoipa::path(
    post,
    path = "/tutor/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "text/event-stream of reply chunks"),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "No tutor conversation open")
    )
)]
pub async fn tutor_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HandlerError> {
    relay_reply(state, tab, Thread::Tutor, req).await
}

//=========================================================================================
// Companion Handlers
//=========================================================================================

/// GET /companion/history - The saved companion thread
#[utoipa::path(
    get,
    path = "/companion/history",
    responses((status = 200, description = "Companion messages (empty when signed out)"))
)]
pub async fn companion_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
) -> impl IntoResponse {
    Json(CompanionHistory::new(state.record_store(&tab)).load().await)
}

/// POST /companion/messages - Send a message to the companion and stream the reply
#[utoipa::path(
    post,
    path = "/companion/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "text/event-stream of reply chunks"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn companion_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HandlerError> {
    {
        let mut companion = tab.companion.lock().await;
        if companion.is_none() {
            let saved = CompanionHistory::new(state.record_store(&tab)).load().await;
            *companion = Some(Conversation::resume(ConversationKind::Companion, saved));
        }
    }
    relay_reply(state, tab, Thread::Companion, req).await
}

//=========================================================================================
// Streaming
//=========================================================================================

/// Saves a finished conversation through the matching history manager.
async fn persist(store: &RecordStore, conversation: &Conversation) -> PortResult<()> {
    match conversation.kind() {
        ConversationKind::Tutor {
            curriculum,
            subject,
        } => {
            TutorHistory::new(store.clone())
                .save(*curriculum, subject, conversation.messages())
                .await
        }
        ConversationKind::Companion => {
            CompanionHistory::new(store.clone())
                .save(conversation.messages())
                .await
        }
    }
}

/// Asks the chat service for a reply to the user's turn and relays the chunks
/// as they arrive, appending each one to the tab's conversation. The user's
/// turn is only kept once the reply stream has opened.
async fn relay_reply(
    state: Arc<AppState>,
    tab: Arc<TabState>,
    thread: Thread,
    req: SendMessageRequest,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HandlerError> {
    let store = state.record_store(&tab);
    let username = require_user(&store).await?;
    if req.text.trim().is_empty() && req.image.is_none() {
        return Err(bad_request("Message is empty"));
    }

    // 1. Build the next turn on a copy so a refused request leaves the tab untouched
    let mut snapshot = tab
        .thread(thread)
        .lock()
        .await
        .clone()
        .ok_or_else(|| {
            (
                StatusCode::CONFLICT,
                "Start a tutor session first".to_string(),
            )
        })?;
    snapshot.push_user(req.text, req.image);

    // 2. Open the reply stream
    let mut chunks = state
        .chat_adapter
        .stream_reply(&snapshot)
        .await
        .map_err(error_response)?;
    info!("Relaying {:?} reply for '{}'", thread, username);

    // 3. The stream is open, so the user's turn becomes part of the conversation
    snapshot.begin_reply();
    *tab.thread(thread).lock().await = Some(snapshot);

    // 4. Forward chunks in arrival order, then save
    let events = async_stream::stream! {
        while let Some(item) = chunks.next().await {
            match item {
                Ok(text) => {
                    if let Some(conversation) = tab.thread(thread).lock().await.as_mut() {
                        conversation.append_to_reply(&text);
                    }
                    yield Ok::<Event, Infallible>(StreamEvent::Chunk { text }.to_sse());
                }
                Err(e) => {
                    warn!("Reply stream failed: {}", e);
                    yield Ok::<Event, Infallible>(StreamEvent::Error { message: e.to_string() }.to_sse());
                    break;
                }
            }
        }

        let finished = {
            let mut guard = tab.thread(thread).lock().await;
            if let Some(conversation) = guard.as_mut() {
                conversation.abandon_reply();
            }
            guard.clone()
        };
        if let Some(conversation) = finished {
            if let Err(e) = persist(&store, &conversation).await {
                warn!("Failed to save conversation: {}", e);
                yield Ok::<Event, Infallible>(StreamEvent::Error { message: e.to_string() }.to_sse());
            }
        }

        yield Ok::<Event, Infallible>(StreamEvent::Done.to_sse());
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
