//! crates/study_companion_core/src/history/plans.rs
//!
//! Study-plan persistence.

use tracing::info;

use crate::domain::StudyPlan;
use crate::ports::{PortError, PortResult};
use crate::records::PlanRecord;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct PlanHistory {
    store: RecordStore,
}

impl PlanHistory {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Replaces the plan with the same id in place, or inserts it at the front.
    pub async fn save(&self, plan: &StudyPlan) -> PortResult<()> {
        let (mut users, username, mut record) = self
            .store
            .load_current()
            .await
            .ok_or(PortError::NotAuthenticated)?;

        let stored = PlanRecord::from(plan.clone());
        match record.study_plans.iter_mut().find(|p| p.id == plan.id) {
            Some(existing) => *existing = stored,
            None => {
                info!("Saving new plan '{}' for '{}'", plan.id, username);
                record.study_plans.insert(0, stored);
            }
        }

        users.insert(username, record);
        self.store.save_all(&users).await
    }

    /// The current user's plans, most recent first, with legacy task entries
    /// read as incomplete tasks. The stored shape is left untouched.
    pub async fn load_history(&self) -> Vec<StudyPlan> {
        match self.store.load_current().await {
            Some((_, _, record)) => record.study_plans.iter().map(PlanRecord::to_domain).collect(),
            None => Vec::new(),
        }
    }

    pub async fn find(&self, id: &str) -> PortResult<StudyPlan> {
        self.load_history()
            .await
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Plan {} not found", id)))
    }

    /// Flips one task's `completed` flag on a copy of `plan`, saves the whole
    /// copy and returns it. Indices are 0-based.
    pub async fn toggle_task(
        &self,
        plan: &StudyPlan,
        week: usize,
        day: usize,
        task: usize,
    ) -> PortResult<StudyPlan> {
        let mut updated = plan.clone();
        let target = updated.task_mut(week, day, task).ok_or_else(|| {
            PortError::NotFound(format!(
                "Task {}/{}/{} not found in plan {}",
                week, day, task, plan.id
            ))
        })?;
        target.completed = !target.completed;

        self.save(&updated).await?;
        Ok(updated)
    }
}
