//! crates/study_companion_core/src/domain.rs
//!
//! Defines the core data structures for the application: study plans, chat
//! messages and tutor sessions. These are the shapes callers work with; the
//! persisted shape (including legacy forms) lives in `records`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The fixed set of curricula a student can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curriculum {
    #[serde(rename = "IB")]
    Ib,
    #[serde(rename = "AP")]
    Ap,
    #[serde(rename = "A-Level")]
    ALevel,
    #[serde(rename = "IGCSE")]
    Igcse,
    #[serde(rename = "GCSE")]
    Gcse,
    #[serde(rename = "CBSE")]
    Cbse,
    #[serde(rename = "General")]
    General,
}

impl Curriculum {
    pub const ALL: [Curriculum; 7] = [
        Curriculum::Ib,
        Curriculum::Ap,
        Curriculum::ALevel,
        Curriculum::Igcse,
        Curriculum::Gcse,
        Curriculum::Cbse,
        Curriculum::General,
    ];

    /// The serialized tag, e.g. `"A-Level"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Curriculum::Ib => "IB",
            Curriculum::Ap => "AP",
            Curriculum::ALevel => "A-Level",
            Curriculum::Igcse => "IGCSE",
            Curriculum::Gcse => "GCSE",
            Curriculum::Cbse => "CBSE",
            Curriculum::General => "General",
        }
    }
}

impl fmt::Display for Curriculum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Curriculum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Curriculum::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown curriculum '{}'", s))
    }
}

/// A single to-do item inside a day of a study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }
}

/// The tasks for one day of a week. The day label is free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTasks {
    pub day: String,
    pub tasks: Vec<Task>,
}

/// One week of a study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    /// 1-based.
    pub week: u32,
    pub topic_focus: String,
    pub daily_tasks: Vec<DailyTasks>,
}

/// An AI-generated study plan owned by one user.
///
/// `id` is assigned once at creation and is the only key used to decide
/// whether a save replaces an existing plan or inserts a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub curriculum: Curriculum,
    pub subject: String,
    pub goal: String,
    pub title: String,
    pub weeks: u32,
    pub weekly_plans: Vec<WeeklyPlan>,
}

impl StudyPlan {
    /// Builds a new plan from a generation request and the model's output,
    /// assigning a fresh id and the current time.
    pub fn from_generated(request: &PlanRequest, generated: GeneratedPlan) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            curriculum: request.curriculum,
            subject: request.subject.clone(),
            goal: request.goal.clone(),
            title: generated.title,
            weeks: request.weeks,
            weekly_plans: generated.weekly_plans,
        }
    }

    /// Looks up a task by its week, day and task indices (all 0-based).
    pub fn task_mut(&mut self, week: usize, day: usize, task: usize) -> Option<&mut Task> {
        self.weekly_plans
            .get_mut(week)?
            .daily_tasks
            .get_mut(day)?
            .tasks
            .get_mut(task)
    }
}

/// What a student asks for when requesting a new plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub curriculum: Curriculum,
    pub subject: String,
    pub goal: String,
    pub weeks: u32,
}

/// The part of a plan produced by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPlan {
    pub title: String,
    pub weekly_plans: Vec<WeeklyPlan>,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single chat turn. `image` holds an optional data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            image: None,
        }
    }
}

/// A saved tutor conversation. At most one exists per (curriculum, subject).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorSession {
    pub curriculum: Curriculum,
    pub subject: String,
    pub last_updated: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl TutorSession {
    pub fn is_for(&self, curriculum: Curriculum, subject: &str) -> bool {
        self.curriculum == curriculum && self.subject == subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curriculum_tags_round_trip_through_from_str() {
        for c in Curriculum::ALL {
            assert_eq!(c.as_str().parse::<Curriculum>().unwrap(), c);
        }
        assert!("Bachelors".parse::<Curriculum>().is_err());
    }

    #[test]
    fn curriculum_serializes_as_its_tag() {
        let json = serde_json::to_string(&Curriculum::ALevel).unwrap();
        assert_eq!(json, "\"A-Level\"");
    }

    #[test]
    fn chat_message_omits_missing_image() {
        let json = serde_json::to_value(ChatMessage::model("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "model", "text": "hi" }));
    }

    #[test]
    fn from_generated_copies_request_fields() {
        let request = PlanRequest {
            curriculum: Curriculum::Ib,
            subject: "Chemistry".to_string(),
            goal: "Pass paper 2".to_string(),
            weeks: 2,
        };
        let generated = GeneratedPlan {
            title: "Chem sprint".to_string(),
            weekly_plans: vec![],
        };
        let plan = StudyPlan::from_generated(&request, generated);
        assert_eq!(plan.subject, "Chemistry");
        assert_eq!(plan.weeks, 2);
        assert_eq!(plan.title, "Chem sprint");
        assert!(Uuid::parse_str(&plan.id).is_ok());
    }
}
