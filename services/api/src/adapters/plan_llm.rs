//! services/api/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the study-plan generating LLM.
//! It implements the `StudyPlanService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are an experienced teacher who writes realistic, well-paced study plans.

Rules:
- Follow the official syllabus of the requested curriculum for the subject.
- Produce exactly the requested number of weeks, numbered from 1.
- Each week has a short topic focus and a list of days. Use weekday names for the days.
- Each day has 2 to 4 concrete, checkable tasks (e.g. "Complete past paper 2019 Q1-Q4", not "study hard").
- Build toward the student's goal, leaving the final week for revision and practice papers.
- The title is short (at most 8 words) and names the subject."#;

const USER_INPUT_TEMPLATE: &str = r#"Curriculum: {curriculum}
Subject: {subject}
Goal: {goal}
Number of weeks: {weeks}

Write the study plan."#;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use study_companion_core::{
    domain::{DailyTasks, GeneratedPlan, PlanRequest, Task, WeeklyPlan},
    formatting::extract_fenced_block,
    ports::{AiFailure, PortError, PortResult, StudyPlanService},
};
use tracing::{error, info};

use crate::adapters::ai_error;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StudyPlanService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPlanAdapter {
    /// Creates a new `OpenAiPlanAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// Structured Reply
//=========================================================================================

/// The JSON schema the model must answer with. Tasks are plain strings here.
fn plan_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "weeklyPlans": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "week": { "type": "integer" },
                        "topicFocus": { "type": "string" },
                        "dailyTasks": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "day": { "type": "string" },
                                    "tasks": { "type": "array", "items": { "type": "string" } }
                                },
                                "required": ["day", "tasks"]
                            }
                        }
                    },
                    "required": ["week", "topicFocus", "dailyTasks"]
                }
            }
        },
        "required": ["title", "weeklyPlans"]
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanReply {
    title: String,
    weekly_plans: Vec<WeekReply>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekReply {
    week: u32,
    topic_focus: String,
    daily_tasks: Vec<DayReply>,
}

#[derive(Deserialize)]
struct DayReply {
    day: String,
    tasks: Vec<String>,
}

impl PlanReply {
    fn to_domain(self) -> GeneratedPlan {
        GeneratedPlan {
            title: self.title,
            weekly_plans: self
                .weekly_plans
                .into_iter()
                .map(|w| WeeklyPlan {
                    week: w.week,
                    topic_focus: w.topic_focus,
                    daily_tasks: w
                        .daily_tasks
                        .into_iter()
                        .map(|d| DailyTasks {
                            day: d.day,
                            tasks: d.tasks.into_iter().map(Task::new).collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Parses the model's JSON, tolerating a surrounding code fence.
fn parse_plan_reply(raw: &str) -> PortResult<GeneratedPlan> {
    let body = extract_fenced_block(raw);
    let reply: PlanReply = serde_json::from_str(&body).map_err(|e| {
        error!("Plan reply was not valid JSON: {}", e);
        PortError::Ai(AiFailure::MalformedResponse)
    })?;
    if reply.weekly_plans.is_empty() {
        error!("Plan reply contained no weeks");
        return Err(PortError::Ai(AiFailure::MalformedResponse));
    }
    Ok(reply.to_domain())
}

//=========================================================================================
// `StudyPlanService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyPlanService for OpenAiPlanAdapter {
    async fn generate_plan(&self, request: &PlanRequest) -> PortResult<GeneratedPlan> {
        info!(
            "Generating {}-week {} {} plan",
            request.weeks, request.curriculum, request.subject
        );

        let user_input = USER_INPUT_TEMPLATE
            .replace("{curriculum}", request.curriculum.as_str())
            .replace("{subject}", &request.subject)
            .replace("{goal}", &request.goal)
            .replace("{weeks}", &request.weeks.to_string());

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_input)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: Some("A week-by-week study plan".to_string()),
                    name: "study_plan".to_string(),
                    schema: Some(plan_schema()),
                    strict: None,
                },
            })
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(ai_error)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(PortError::Ai(AiFailure::MalformedResponse))?;

        parse_plan_reply(&content)
    }
}
