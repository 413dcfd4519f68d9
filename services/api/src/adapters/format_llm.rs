//! services/api/src/adapters/format_llm.rs
//!
//! This module contains the adapter that asks the LLM to tidy up source text.
//! It implements the `SourceFormattingService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use study_companion_core::{
    formatting::extract_fenced_block,
    ports::{AiFailure, PortError, PortResult, SourceFormattingService},
};

use crate::adapters::ai_error;

pub struct OpenAiFormatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiFormatAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl SourceFormattingService for OpenAiFormatAdapter {
    async fn reformat(&self, source: &str, language: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content("You are a code formatter. Reformat the given source using the conventional style for its language. Do not change behaviour, names or comments. Reply with the formatted source in a single fenced code block and nothing else.")
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Language: {}\n\n```{}\n{}\n```", language, language, source))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(ai_error)?;

        let reply = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(PortError::Ai(AiFailure::MalformedResponse))?;

        Ok(extract_fenced_block(&reply))
    }
}
