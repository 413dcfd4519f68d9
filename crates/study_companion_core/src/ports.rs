//! crates/study_companion_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the storage backend and the generative-AI provider.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::chat::Conversation;
use crate::domain::{GeneratedPlan, PlanRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The message shown for both an unknown username and a wrong password.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// A generic error type for all port and core operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Username already exists")]
    DuplicateUser,
    #[error("Password must be at least 6 characters long")]
    WeakPassword,
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,
    #[error("You must be logged in to do that")]
    NotAuthenticated,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("{}", .0.user_message())]
    Ai(AiFailure),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// AI Failure Classification
//=========================================================================================

/// Broad categories of failures from the generative-AI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiFailure {
    Offline,
    RateLimited,
    ServerError,
    Blocked,
    MalformedResponse,
    Unknown,
}

impl AiFailure {
    /// Classifies a provider error by inspecting its text.
    pub fn classify(error_text: &str) -> Self {
        let text = error_text.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

        if has(&["429", "rate limit", "quota", "resource_exhausted", "too many requests"]) {
            AiFailure::RateLimited
        } else if has(&["safety", "blocked", "content_filter", "prohibited"]) {
            AiFailure::Blocked
        } else if has(&["failed to fetch", "network", "offline", "connection", "dns", "timed out"]) {
            AiFailure::Offline
        } else if has(&["500", "502", "503", "504", "internal", "unavailable", "overloaded"]) {
            AiFailure::ServerError
        } else if has(&["json", "parse", "deserialize", "unexpected token", "malformed"]) {
            AiFailure::MalformedResponse
        } else {
            AiFailure::Unknown
        }
    }

    /// A message suitable for showing to the student inline.
    pub fn user_message(&self) -> &'static str {
        match self {
            AiFailure::Offline => {
                "Couldn't reach the AI service. Check your internet connection and try again."
            }
            AiFailure::RateLimited => {
                "The AI service is receiving too many requests right now. Please wait a moment and try again."
            }
            AiFailure::ServerError => {
                "The AI service ran into a problem on its end. Please try again shortly."
            }
            AiFailure::Blocked => {
                "The response was blocked by the AI service's safety filters. Try rephrasing your request."
            }
            AiFailure::MalformedResponse => {
                "The AI service returned a response we couldn't understand. Please try again."
            }
            AiFailure::Unknown => "Something went wrong while talking to the AI service.",
        }
    }
}

impl From<AiFailure> for PortError {
    fn from(failure: AiFailure) -> Self {
        PortError::Ai(failure)
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A string key-value storage area, modelled on browser storage.
///
/// The persistent area holds the `users-db` slot; each client gets its own
/// volatile area holding the `session` slot.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;

    /// Removes every key in the area.
    async fn clear(&self) -> PortResult<()>;
}

/// A stream of incremental reply text.
pub type TextStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

#[async_trait]
pub trait StudyPlanService: Send + Sync {
    /// Generates the weekly breakdown and title for a plan request.
    async fn generate_plan(&self, request: &PlanRequest) -> PortResult<GeneratedPlan>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Streams the model's reply to the conversation's latest user turn.
    async fn stream_reply(&self, conversation: &Conversation) -> PortResult<TextStream>;
}

#[async_trait]
pub trait SourceFormattingService: Send + Sync {
    /// Returns `source` reformatted by the model.
    async fn reformat(&self, source: &str, language: &str) -> PortResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognises_each_category() {
        assert_eq!(
            AiFailure::classify("status 429: RESOURCE_EXHAUSTED"),
            AiFailure::RateLimited
        );
        assert_eq!(
            AiFailure::classify("http error: error sending request: connection refused"),
            AiFailure::Offline
        );
        assert_eq!(AiFailure::classify("503 Service Unavailable"), AiFailure::ServerError);
        assert_eq!(
            AiFailure::classify("Response was blocked due to SAFETY"),
            AiFailure::Blocked
        );
        assert_eq!(
            AiFailure::classify("failed to deserialize api response: expected value"),
            AiFailure::MalformedResponse
        );
        assert_eq!(AiFailure::classify("teapot"), AiFailure::Unknown);
    }

    #[test]
    fn ai_error_displays_user_message() {
        let err = PortError::from(AiFailure::RateLimited);
        assert_eq!(err.to_string(), AiFailure::RateLimited.user_message());
    }

    #[test]
    fn invalid_credentials_uses_shared_message() {
        assert_eq!(
            PortError::InvalidCredentials.to_string(),
            INVALID_CREDENTIALS_MESSAGE
        );
    }
}
