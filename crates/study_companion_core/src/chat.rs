//! crates/study_companion_core/src/chat.rs
//!
//! Explicit chat session objects. A `Conversation` is owned by whoever drives
//! the chat (one per client and kind) and is handed to the `ChatService` for
//! each turn.

use crate::domain::{ChatMessage, Curriculum, Role};

const TUTOR_INSTRUCTIONS: &str = r#"You are a patient, encouraging tutor for a student studying {subject} under the {curriculum} curriculum.

- Explain ideas step by step, at the level the {curriculum} syllabus expects.
- Prefer guiding questions over handing out final answers to homework.
- When the student sends an image, read it carefully (it is usually a worked problem or a page of notes) and refer to what you see.
- Use markdown for structure and LaTeX-style notation for maths when it helps.
- Stay on {subject} unless the student clearly asks to change topic."#;

const COMPANION_INSTRUCTIONS: &str = r#"You are a friendly study companion. Chat casually, keep the student company while they work, cheer them on and help them take sensible breaks.

- Keep replies short and warm, like a friend texting back.
- If the student asks a real academic question, answer it briefly and suggest the tutor for deeper help.
- Never lecture. Never guilt-trip."#;

/// What a conversation is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationKind {
    Tutor { curriculum: Curriculum, subject: String },
    Companion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    kind: ConversationKind,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn tutor(curriculum: Curriculum, subject: impl Into<String>) -> Self {
        Self::resume(
            ConversationKind::Tutor {
                curriculum,
                subject: subject.into(),
            },
            Vec::new(),
        )
    }

    pub fn companion() -> Self {
        Self::resume(ConversationKind::Companion, Vec::new())
    }

    /// Continues a previously saved conversation.
    pub fn resume(kind: ConversationKind, messages: Vec<ChatMessage>) -> Self {
        Self { kind, messages }
    }

    pub fn kind(&self) -> &ConversationKind {
        &self.kind
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn system_instruction(&self) -> String {
        match &self.kind {
            ConversationKind::Tutor {
                curriculum,
                subject,
            } => TUTOR_INSTRUCTIONS
                .replace("{curriculum}", curriculum.as_str())
                .replace("{subject}", subject),
            ConversationKind::Companion => COMPANION_INSTRUCTIONS.to_string(),
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>, image: Option<String>) {
        self.messages.push(ChatMessage::user(text, image));
    }

    /// Opens an empty model turn for streamed chunks to be appended to.
    pub fn begin_reply(&mut self) {
        self.messages.push(ChatMessage::model(String::new()));
    }

    /// Appends a streamed chunk to the open model turn, opening one if needed.
    pub fn append_to_reply(&mut self, chunk: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Model => last.text.push_str(chunk),
            _ => self.messages.push(ChatMessage::model(chunk)),
        }
    }

    /// Drops a trailing model turn that never received any text.
    pub fn abandon_reply(&mut self) {
        if self
            .messages
            .last()
            .is_some_and(|m| m.role == Role::Model && m.text.is_empty())
        {
            self.messages.pop();
        }
    }

    /// The latest user turn, i.e. the one a reply is being requested for.
    pub fn latest_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }
}
