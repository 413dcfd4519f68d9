//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the streaming chat adapter used by both the tutor and
//! the companion. It implements the `ChatService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use study_companion_core::{
    chat::Conversation,
    domain::{ChatMessage, Role},
    ports::{ChatService, PortError, PortResult, TextStream},
};
use tracing::info;

use crate::adapters::ai_error;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn builder_error(e: OpenAIError) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Converts one stored turn into a request message.
fn to_request_message(message: &ChatMessage) -> PortResult<ChatCompletionRequestMessage> {
    match message.role {
        Role::Model => Ok(ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.text.clone())
            .build()
            .map_err(builder_error)?
            .into()),
        Role::User => {
            let Some(image) = &message.image else {
                return Ok(ChatCompletionRequestUserMessageArgs::default()
                    .content(message.text.clone())
                    .build()
                    .map_err(builder_error)?
                    .into());
            };

            let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(message.text.clone())
                    .build()
                    .map_err(builder_error)?
                    .into(),
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(image.clone())
                            .build()
                            .map_err(builder_error)?,
                    )
                    .build()
                    .map_err(builder_error)?
                    .into(),
            ];
            Ok(ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()
                .map_err(builder_error)?
                .into())
        }
    }
}

/// Builds the full message list: system instruction, then every non-empty turn.
fn build_messages(conversation: &Conversation) -> PortResult<Vec<ChatCompletionRequestMessage>> {
    let mut messages = vec![ChatCompletionRequestSystemMessageArgs::default()
        .content(conversation.system_instruction())
        .build()
        .map_err(builder_error)?
        .into()];

    for message in conversation.messages() {
        if message.role == Role::Model && message.text.is_empty() {
            continue;
        }
        messages.push(to_request_message(message)?);
    }
    Ok(messages)
}

//=========================================================================================
// `ChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatService for OpenAiChatAdapter {
    async fn stream_reply(&self, conversation: &Conversation) -> PortResult<TextStream> {
        if conversation.latest_user_message().is_none() {
            return Err(PortError::Unexpected(
                "Conversation has no user message to reply to".to_string(),
            ));
        }
        info!(
            "Streaming reply for {:?} ({} turns)",
            conversation.kind(),
            conversation.messages().len()
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(build_messages(conversation)?)
            .stream(true)
            .build()
            .map_err(builder_error)?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(ai_error)?;

        let chunks = stream.filter_map(|item| async move {
            match item {
                Ok(response) => {
                    let text: String = response
                        .choices
                        .into_iter()
                        .filter_map(|choice| choice.delta.content)
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(ai_error(e))),
            }
        });

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_companion_core::domain::Curriculum;

    #[test]
    fn build_messages_starts_with_system_and_skips_empty_replies() {
        let mut convo = Conversation::tutor(Curriculum::Gcse, "Chemistry");
        convo.push_user("What is a mole?", None);
        convo.begin_reply();

        let messages = build_messages(&convo).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn model_turns_become_assistant_messages() {
        let mut convo = Conversation::companion();
        convo.push_user("hi", None);
        convo.append_to_reply("hey!");
        convo.push_user("look", Some("data:image/png;base64,AAAA".to_string()));

        let messages = build_messages(&convo).unwrap();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }
}
