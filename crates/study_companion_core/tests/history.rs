//! History flows exercised against in-memory storage.

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use study_companion_core::store::USERS_DB_KEY;
use study_companion_core::{
    Auth, ChatMessage, CompanionHistory, Curriculum, DailyTasks, KeyValueStore, MemoryStore,
    PlanHistory, PortError, RecordStore, StudyPlan, Task, TutorHistory, WeeklyPlan,
};

struct Harness {
    persistent: Arc<MemoryStore>,
    store: RecordStore,
}

impl Harness {
    async fn signed_in(username: &str) -> Self {
        let persistent = Arc::new(MemoryStore::new());
        let store = RecordStore::new(persistent.clone(), Arc::new(MemoryStore::new()));
        Auth::new(store.clone())
            .sign_up(username, "secret1")
            .await
            .unwrap();
        Self { persistent, store }
    }

    fn anonymous() -> Self {
        let persistent = Arc::new(MemoryStore::new());
        let store = RecordStore::new(persistent.clone(), Arc::new(MemoryStore::new()));
        Self { persistent, store }
    }

    fn plans(&self) -> PlanHistory {
        PlanHistory::new(self.store.clone())
    }
}

fn plan(id: &str, title: &str) -> StudyPlan {
    StudyPlan {
        id: id.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        curriculum: Curriculum::Igcse,
        subject: "Physics".to_string(),
        goal: "Ace the mock".to_string(),
        title: title.to_string(),
        weeks: 1,
        weekly_plans: vec![WeeklyPlan {
            week: 1,
            topic_focus: "Forces".to_string(),
            daily_tasks: vec![DailyTasks {
                day: "Monday".to_string(),
                tasks: vec![Task::new("Newton's laws"), Task::new("Past paper Q3")],
            }],
        }],
    }
}

fn messages(n: usize) -> Vec<ChatMessage> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                ChatMessage::user(format!("question {}", i), None)
            } else {
                ChatMessage::model(format!("answer {}", i))
            }
        })
        .collect()
}

#[tokio::test]
async fn saving_new_plan_puts_it_first() {
    let h = Harness::signed_in("alice").await;
    h.plans().save(&plan("a", "First")).await.unwrap();
    h.plans().save(&plan("b", "Second")).await.unwrap();

    let history = h.plans().load_history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, "b");
    assert_eq!(history[1].id, "a");
}

#[tokio::test]
async fn saving_existing_id_replaces_in_place() {
    let h = Harness::signed_in("alice").await;
    h.plans().save(&plan("a", "First")).await.unwrap();
    h.plans().save(&plan("b", "Second")).await.unwrap();

    h.plans().save(&plan("a", "First, revised")).await.unwrap();

    let history = h.plans().load_history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].id, "a");
    assert_eq!(history[1].title, "First, revised");
}

#[tokio::test]
async fn saving_without_session_is_rejected() {
    let h = Harness::anonymous();
    let err = h.plans().save(&plan("a", "First")).await.unwrap_err();
    assert!(matches!(err, PortError::NotAuthenticated));
    assert!(h.plans().load_history().await.is_empty());
}

#[tokio::test]
async fn toggling_twice_restores_the_plan() {
    let h = Harness::signed_in("alice").await;
    let original = plan("a", "First");
    h.plans().save(&original).await.unwrap();

    let once = h.plans().toggle_task(&original, 0, 0, 1).await.unwrap();
    assert!(once.weekly_plans[0].daily_tasks[0].tasks[1].completed);
    assert!(!once.weekly_plans[0].daily_tasks[0].tasks[0].completed);
    assert_eq!(h.plans().find("a").await.unwrap(), once);

    let twice = h.plans().toggle_task(&once, 0, 0, 1).await.unwrap();
    assert_eq!(twice, original);
    assert_eq!(h.plans().load_history().await, vec![original]);
}

#[tokio::test]
async fn toggling_missing_task_is_not_found() {
    let h = Harness::signed_in("alice").await;
    let original = plan("a", "First");
    let err = h.plans().toggle_task(&original, 0, 3, 0).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn legacy_string_tasks_are_upgraded_on_read_only() {
    let h = Harness::signed_in("alice").await;
    let stored = json!({
        "alice": {
            "passwordHash": study_companion_core::hash::password_digest("secret1"),
            "studyPlans": [{
                "id": "old",
                "createdAt": "2025-09-01T12:00:00Z",
                "curriculum": "CBSE",
                "subject": "Maths",
                "goal": "Board exams",
                "title": "Legacy plan",
                "weeks": 1,
                "weeklyPlans": [{
                    "week": 1,
                    "topicFocus": "Algebra",
                    "dailyTasks": [{ "day": "Tue", "tasks": ["Factorise", "Quadratics"] }]
                }]
            }]
        }
    })
    .to_string();
    h.persistent.set(USERS_DB_KEY, &stored).await.unwrap();

    let history = h.plans().load_history().await;
    let tasks = &history[0].weekly_plans[0].daily_tasks[0].tasks;
    assert_eq!(tasks, &vec![Task::new("Factorise"), Task::new("Quadratics")]);

    let raw = h.persistent.get(USERS_DB_KEY).await.unwrap().unwrap();
    assert_eq!(raw, stored);
}

#[tokio::test]
async fn tutor_session_is_unique_per_pair() {
    let h = Harness::signed_in("alice").await;
    let tutor = TutorHistory::new(h.store.clone());

    tutor.save(Curriculum::Ib, "History", &messages(2)).await.unwrap();
    tutor.save(Curriculum::Ib, "Physics", &messages(2)).await.unwrap();
    tutor.save(Curriculum::Ib, "History", &messages(4)).await.unwrap();

    let sessions = tutor.sessions().await;
    assert_eq!(sessions.len(), 2);
    let history = tutor.session(Curriculum::Ib, "History").await.unwrap();
    assert_eq!(history.messages.len(), 4);
    assert!(tutor.session(Curriculum::Ap, "History").await.is_none());
}

#[tokio::test]
async fn tutor_session_with_one_message_is_not_saved() {
    let h = Harness::signed_in("alice").await;
    let tutor = TutorHistory::new(h.store.clone());
    tutor.save(Curriculum::Ib, "History", &messages(1)).await.unwrap();
    assert!(tutor.sessions().await.is_empty());
}

#[tokio::test]
async fn companion_history_threshold_and_overwrite() {
    let h = Harness::signed_in("alice").await;
    let companion = CompanionHistory::new(h.store.clone());

    companion.save(&messages(3)).await.unwrap();
    assert_eq!(companion.load().await, messages(3));

    companion.save(&messages(1)).await.unwrap();
    assert_eq!(companion.load().await, messages(3));

    companion.save(&messages(2)).await.unwrap();
    assert_eq!(companion.load().await, messages(2));
}

#[tokio::test]
async fn reads_are_empty_when_signed_out() {
    let h = Harness::anonymous();
    assert!(TutorHistory::new(h.store.clone()).sessions().await.is_empty());
    assert!(CompanionHistory::new(h.store.clone()).load().await.is_empty());
}

#[tokio::test]
async fn history_is_scoped_to_current_user() {
    let h = Harness::signed_in("alice").await;
    h.plans().save(&plan("a", "Alice's")).await.unwrap();

    let auth = Auth::new(h.store.clone());
    auth.sign_up("bob", "secret2").await.unwrap();
    assert!(h.plans().load_history().await.is_empty());

    auth.login("alice", "secret1").await.unwrap();
    assert_eq!(h.plans().load_history().await.len(), 1);
}
