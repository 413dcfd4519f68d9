pub mod chat_llm;
pub mod format_llm;
pub mod plan_llm;
pub mod storage;

pub use chat_llm::OpenAiChatAdapter;
pub use format_llm::OpenAiFormatAdapter;
pub use plan_llm::OpenAiPlanAdapter;
pub use storage::FileStore;

use async_openai::error::OpenAIError;
use study_companion_core::ports::{AiFailure, PortError};
use tracing::error;

/// Maps a provider error to a classified AI failure, logging the raw error.
pub(crate) fn ai_error(e: OpenAIError) -> PortError {
    let text = e.to_string();
    let failure = AiFailure::classify(&text);
    error!("AI request failed ({:?}): {}", failure, text);
    PortError::Ai(failure)
}
