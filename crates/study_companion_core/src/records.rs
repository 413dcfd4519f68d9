//! crates/study_companion_core/src/records.rs
//!
//! The persisted shape of the `users-db` slot.
//!
//! These structs mirror the JSON exactly as it is stored, including the legacy
//! form where a task is a bare string. They are converted to domain types with
//! `to_domain()` when read; the stored form is only replaced when a plan is
//! saved again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::{ChatMessage, Curriculum, DailyTasks, StudyPlan, Task, TutorSession, WeeklyPlan};

/// The whole `users-db` mapping, keyed by username.
///
/// Each entry is decoded on its own. An entry that does not fit `UserRecord`
/// is kept as raw JSON and written back untouched, so one bad record never
/// hides or erases the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserMap {
    records: BTreeMap<String, UserRecord>,
    unreadable: BTreeMap<String, Value>,
}

impl UserMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.records.get(username)
    }

    /// True for readable and unreadable entries alike.
    pub fn contains_key(&self, username: &str) -> bool {
        self.records.contains_key(username) || self.unreadable.contains_key(username)
    }

    pub fn insert(&mut self, username: String, record: UserRecord) {
        self.unreadable.remove(&username);
        self.records.insert(username, record);
    }

    pub fn len(&self) -> usize {
        self.records.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.unreadable.is_empty()
    }

    /// Usernames whose stored entry could not be decoded.
    pub fn unreadable(&self) -> impl Iterator<Item = &str> {
        self.unreadable.keys().map(String::as_str)
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredEntry<'a> {
    Record(&'a UserRecord),
    Raw(&'a Value),
}

impl Serialize for UserMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records = self
            .records
            .iter()
            .map(|(name, record)| (name, StoredEntry::Record(record)));
        let raw = self
            .unreadable
            .iter()
            .map(|(name, value)| (name, StoredEntry::Raw(value)));
        serializer.collect_map(records.chain(raw))
    }
}

impl<'de> Deserialize<'de> for UserMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut users = UserMap::new();
        for (username, value) in entries {
            match UserRecord::deserialize(&value) {
                Ok(record) => {
                    users.records.insert(username, record);
                }
                Err(e) => {
                    warn!("Keeping unreadable record for '{}' as is: {}", username, e);
                    users.unreadable.insert(username, value);
                }
            }
        }
        Ok(users)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub password_hash: String,
    #[serde(default)]
    pub study_plans: Vec<PlanRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_sessions: Option<Vec<TutorSession>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_history: Option<Vec<ChatMessage>>,
}

impl UserRecord {
    /// A fresh record with empty plan and history lists.
    pub fn new(password_hash: String) -> Self {
        Self {
            password_hash,
            study_plans: Vec::new(),
            tutor_sessions: Some(Vec::new()),
            companion_history: Some(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub curriculum: Curriculum,
    pub subject: String,
    pub goal: String,
    pub title: String,
    pub weeks: u32,
    pub weekly_plans: Vec<WeekRecord>,
}

impl PlanRecord {
    pub fn to_domain(&self) -> StudyPlan {
        StudyPlan {
            id: self.id.clone(),
            created_at: self.created_at,
            curriculum: self.curriculum,
            subject: self.subject.clone(),
            goal: self.goal.clone(),
            title: self.title.clone(),
            weeks: self.weeks,
            weekly_plans: self.weekly_plans.iter().map(WeekRecord::to_domain).collect(),
        }
    }
}

impl From<StudyPlan> for PlanRecord {
    fn from(plan: StudyPlan) -> Self {
        Self {
            id: plan.id,
            created_at: plan.created_at,
            curriculum: plan.curriculum,
            subject: plan.subject,
            goal: plan.goal,
            title: plan.title,
            weeks: plan.weeks,
            weekly_plans: plan.weekly_plans.into_iter().map(WeekRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRecord {
    pub week: u32,
    pub topic_focus: String,
    pub daily_tasks: Vec<DayRecord>,
}

impl WeekRecord {
    fn to_domain(&self) -> WeeklyPlan {
        WeeklyPlan {
            week: self.week,
            topic_focus: self.topic_focus.clone(),
            daily_tasks: self.daily_tasks.iter().map(DayRecord::to_domain).collect(),
        }
    }
}

impl From<WeeklyPlan> for WeekRecord {
    fn from(week: WeeklyPlan) -> Self {
        Self {
            week: week.week,
            topic_focus: week.topic_focus,
            daily_tasks: week.daily_tasks.into_iter().map(DayRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub day: String,
    pub tasks: Vec<TaskRecord>,
}

impl DayRecord {
    fn to_domain(&self) -> DailyTasks {
        DailyTasks {
            day: self.day.clone(),
            tasks: self.tasks.iter().map(TaskRecord::to_domain).collect(),
        }
    }
}

impl From<DailyTasks> for DayRecord {
    fn from(day: DailyTasks) -> Self {
        Self {
            day: day.day,
            tasks: day.tasks.into_iter().map(TaskRecord::Current).collect(),
        }
    }
}

/// A stored task: either the current object form or a legacy bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskRecord {
    Legacy(String),
    Current(Task),
}

impl TaskRecord {
    fn to_domain(&self) -> Task {
        match self {
            TaskRecord::Legacy(text) => Task::new(text.clone()),
            TaskRecord::Current(task) => task.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_plan_json() -> serde_json::Value {
        json!({
            "id": "p1",
            "createdAt": "2026-01-05T09:00:00Z",
            "curriculum": "GCSE",
            "subject": "Biology",
            "goal": "Grade 9",
            "title": "Cells and more",
            "weeks": 1,
            "weeklyPlans": [{
                "week": 1,
                "topicFocus": "Cells",
                "dailyTasks": [{
                    "day": "Monday",
                    "tasks": ["Read chapter 1", { "text": "Flashcards", "completed": true }]
                }]
            }]
        })
    }

    #[test]
    fn legacy_tasks_normalize_on_read() {
        let record: PlanRecord = serde_json::from_value(legacy_plan_json()).unwrap();
        let plan = record.to_domain();
        let tasks = &plan.weekly_plans[0].daily_tasks[0].tasks;
        assert_eq!(tasks[0], Task::new("Read chapter 1"));
        assert_eq!(
            tasks[1],
            Task {
                text: "Flashcards".to_string(),
                completed: true
            }
        );
    }

    #[test]
    fn legacy_shape_survives_reserialization() {
        let record: PlanRecord = serde_json::from_value(legacy_plan_json()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, legacy_plan_json());
    }

    #[test]
    fn unreadable_record_is_kept_beside_readable_ones() {
        let raw = json!({
            "alice": { "passwordHash": "a" },
            "carol": { "passwordHash": "c", "studyPlans": [{ "id": "broken" }] }
        });
        let mut users: UserMap = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.get("alice").is_some());
        assert!(users.get("carol").is_none());
        assert!(users.contains_key("carol"));
        assert_eq!(users.unreadable().collect::<Vec<_>>(), vec!["carol"]);

        users.insert("bob".to_string(), UserRecord::new("b".to_string()));
        let written = serde_json::to_value(&users).unwrap();
        assert_eq!(written["carol"], raw["carol"]);
        assert_eq!(written["alice"]["passwordHash"], "a");
        assert_eq!(written["bob"]["passwordHash"], "b");
    }

    #[test]
    fn task_without_completed_flag_reads_as_incomplete() {
        let task: TaskRecord = serde_json::from_value(json!({ "text": "x" })).unwrap();
        assert_eq!(task.to_domain(), Task::new("x"));
    }

    #[test]
    fn user_record_tolerates_missing_optional_lists() {
        let record: UserRecord =
            serde_json::from_value(json!({ "passwordHash": "abc" })).unwrap();
        assert!(record.study_plans.is_empty());
        assert!(record.tutor_sessions.is_none());
        assert!(record.companion_history.is_none());
    }
}
