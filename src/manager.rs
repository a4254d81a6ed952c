//! Goal Lifecycle Manager
//!
//! Owns the central id-indexed goal table and the persistence delegate.
//! Creation is gated by the covenant validator; every mutation appends a
//! journal record, never overwriting earlier snapshots.
//!
//! Goals reference each other only by id. Children are resolved through
//! the table, so parent/child links can never form ownership cycles.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::covenant::CovenantValidator;
use crate::error::{CoreError, CoreResult};
use crate::goal::{Goal, GoalStatus, GoalType};
use crate::memory::{JournalEntry, MemoryDelegate};

/// Outcome of goal creation; covenant rejection is data, not an error
#[derive(Debug)]
pub enum GoalDecision {
    Approved(Goal),
    Rejected { goal: Goal, reason: String },
}

impl GoalDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, GoalDecision::Approved(_))
    }

    pub fn goal(&self) -> &Goal {
        match self {
            GoalDecision::Approved(goal) => goal,
            GoalDecision::Rejected { goal, .. } => goal,
        }
    }

    pub fn into_goal(self) -> Goal {
        match self {
            GoalDecision::Approved(goal) => goal,
            GoalDecision::Rejected { goal, .. } => goal,
        }
    }
}

/// Goal CRUD + lifecycle with covenant gating and journal persistence
pub struct GoalManager {
    goals: RwLock<HashMap<String, Goal>>,
    memory: Arc<dyn MemoryDelegate>,
    covenant: Arc<dyn CovenantValidator>,
}

impl GoalManager {
    pub fn new(memory: Arc<dyn MemoryDelegate>, covenant: Arc<dyn CovenantValidator>) -> Self {
        Self {
            goals: RwLock::new(HashMap::new()),
            memory,
            covenant,
        }
    }

    /// Create a goal, synchronously gated by the covenant validator
    ///
    /// A rejected goal is still persisted (flagged unapproved, kept
    /// Pending forever) and reported back with the reason.
    pub async fn create_goal(
        &self,
        goal_type: GoalType,
        description: &str,
        priority: i32,
        parent_id: Option<&str>,
    ) -> CoreResult<GoalDecision> {
        let mut goal = Goal::new(goal_type, description, priority);
        goal.parent_goal_id = parent_id.map(|s| s.to_string());

        let verdict = self.covenant.validate_action("create_goal", description).await;

        if !verdict.approved {
            goal.covenant_approval = false;
            warn!("Goal rejected by covenant: {} ({})", description, verdict.reason);
            self.persist(&goal, "goal_rejected").await?;
            self.insert(goal.clone(), parent_id).await;
            return Ok(GoalDecision::Rejected {
                goal,
                reason: verdict.reason,
            });
        }

        let scores = self.covenant.evaluate_alignment(description).await;
        goal.alignment = scores.clamped();
        goal.covenant_approval = true;

        self.persist(&goal, "goal_created").await?;
        self.insert(goal.clone(), parent_id).await;

        info!(
            "Created goal {} [{}] p{}: {}",
            goal.id,
            goal.goal_type.as_str(),
            goal.priority,
            goal.description
        );
        Ok(GoalDecision::Approved(goal))
    }

    /// Persist a new snapshot of an existing goal
    ///
    /// Every call appends a fresh journal record; the audit trail keeps
    /// all prior snapshots.
    pub async fn update_goal(&self, goal: Goal) -> CoreResult<Goal> {
        {
            let goals = self.goals.read().await;
            if !goals.contains_key(&goal.id) {
                return Err(CoreError::GoalNotFound(goal.id.clone()));
            }
        }

        self.persist(&goal, "goal_updated").await?;

        let mut goals = self.goals.write().await;
        goals.insert(goal.id.clone(), goal.clone());
        Ok(goal)
    }

    /// Move an approved Pending goal into InProgress
    ///
    /// Unapproved goals can never be promoted.
    pub async fn promote(&self, goal_id: &str) -> CoreResult<Goal> {
        let updated = {
            let mut goals = self.goals.write().await;
            let goal = goals
                .get_mut(goal_id)
                .ok_or_else(|| CoreError::GoalNotFound(goal_id.to_string()))?;

            if !goal.covenant_approval {
                return Err(CoreError::CovenantRejected(goal_id.to_string()));
            }
            if goal.status != GoalStatus::Pending {
                return Ok(goal.clone());
            }
            goal.set_status(GoalStatus::InProgress);
            goal.clone()
        };

        self.persist(&updated, "goal_updated").await?;
        Ok(updated)
    }

    /// Terminal transition; `status` must be Completed, Failed or Cancelled
    pub async fn complete_goal(&self, goal_id: &str, status: GoalStatus) -> CoreResult<Goal> {
        if !status.is_terminal() {
            return Err(CoreError::Config(format!(
                "complete_goal requires a terminal status, got {}",
                status.as_str()
            )));
        }

        let updated = {
            let mut goals = self.goals.write().await;
            let goal = goals
                .get_mut(goal_id)
                .ok_or_else(|| CoreError::GoalNotFound(goal_id.to_string()))?;
            goal.set_status(status);
            goal.clone()
        };

        self.persist(&updated, "goal_completed").await?;
        info!("Goal {} finished as {}", goal_id, status.as_str());
        Ok(updated)
    }

    /// Roll task outcomes into goal progress
    ///
    /// All tasks failed fails the goal; all completed completes it;
    /// anything in between is partial progress. The coordinator never
    /// decides goal fate.
    pub async fn apply_task_outcomes(
        &self,
        goal_id: &str,
        completed: usize,
        failed: usize,
        total: usize,
    ) -> CoreResult<Goal> {
        let updated = {
            let mut goals = self.goals.write().await;
            let goal = goals
                .get_mut(goal_id)
                .ok_or_else(|| CoreError::GoalNotFound(goal_id.to_string()))?;

            if total > 0 && failed == total {
                goal.set_status(GoalStatus::Failed);
            } else if total > 0 && completed == total {
                goal.set_status(GoalStatus::Completed);
            } else if total > 0 {
                goal.set_progress(completed as f64 / total as f64);
            }
            goal.clone()
        };

        self.persist(&updated, "goal_progress").await?;
        debug!(
            "Goal {} progress {:.2} ({}/{} tasks, {} failed)",
            goal_id, updated.progress, completed, total, failed
        );
        Ok(updated)
    }

    pub async fn get_goal(&self, goal_id: &str) -> Option<Goal> {
        self.goals.read().await.get(goal_id).cloned()
    }

    pub async fn list_goals(&self) -> Vec<Goal> {
        self.goals.read().await.values().cloned().collect()
    }

    /// Goals still Pending or InProgress
    pub async fn list_open_goals(&self) -> Vec<Goal> {
        self.goals
            .read()
            .await
            .values()
            .filter(|g| g.status.is_open())
            .cloned()
            .collect()
    }

    /// Resolve children through the table - id lookups, not pointers
    pub async fn get_child_goals(&self, parent_id: &str) -> Vec<Goal> {
        let goals = self.goals.read().await;
        let Some(parent) = goals.get(parent_id) else {
            return Vec::new();
        };
        parent
            .child_goal_ids
            .iter()
            .filter_map(|id| goals.get(id))
            .cloned()
            .collect()
    }

    async fn insert(&self, goal: Goal, parent_id: Option<&str>) {
        let mut goals = self.goals.write().await;
        if let Some(parent_id) = parent_id {
            if let Some(parent) = goals.get_mut(parent_id) {
                parent.child_goal_ids.push(goal.id.clone());
            }
        }
        goals.insert(goal.id.clone(), goal);
    }

    async fn persist(&self, goal: &Goal, kind: &str) -> CoreResult<()> {
        let snapshot =
            serde_json::to_string(goal).map_err(|e| CoreError::Storage(e.to_string()))?;
        self.memory
            .store_entry(JournalEntry::new(kind, &goal.id, &snapshot))
            .await
            .map_err(|e| CoreError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covenant::{AlignmentScores, OpenCovenant, Verdict};
    use crate::memory::SqliteJournal;
    use async_trait::async_trait;

    /// Validator rejecting descriptions that contain a marker word
    struct MarkerCovenant;

    #[async_trait]
    impl CovenantValidator for MarkerCovenant {
        async fn validate_action(&self, _action: &str, context: &str) -> Verdict {
            if context.contains("forbidden") {
                Verdict::reject("violates covenant")
            } else {
                Verdict::approve()
            }
        }

        async fn evaluate_alignment(&self, _text: &str) -> AlignmentScores {
            AlignmentScores {
                wisdom: 1.3,
                compassion: 0.7,
                truth: -0.2,
            }
        }
    }

    fn manager_with(covenant: Arc<dyn CovenantValidator>) -> GoalManager {
        let journal = Arc::new(SqliteJournal::in_memory().unwrap());
        GoalManager::new(journal, covenant)
    }

    #[tokio::test]
    async fn test_create_goal_approved_with_clamped_alignment() {
        let manager = manager_with(Arc::new(MarkerCovenant));

        let decision = manager
            .create_goal(GoalType::Development, "Build the sync layer", 6, None)
            .await
            .unwrap();

        assert!(decision.is_approved());
        let goal = decision.goal();
        assert!(goal.covenant_approval);
        assert_eq!(goal.alignment.wisdom, 1.0);
        assert_eq!(goal.alignment.truth, 0.0);
    }

    #[tokio::test]
    async fn test_rejected_goal_persisted_but_never_promoted() {
        let manager = manager_with(Arc::new(MarkerCovenant));

        let decision = manager
            .create_goal(GoalType::Autonomous, "do the forbidden thing", 9, None)
            .await
            .unwrap();

        let goal_id = match decision {
            GoalDecision::Rejected { ref goal, ref reason } => {
                assert!(!goal.covenant_approval);
                assert_eq!(goal.status, GoalStatus::Pending);
                assert!(!reason.is_empty());
                goal.id.clone()
            }
            GoalDecision::Approved(_) => panic!("expected rejection"),
        };

        // still in the table, still pending
        assert!(manager.get_goal(&goal_id).await.is_some());

        // promotion is refused
        let result = manager.promote(&goal_id).await;
        assert!(matches!(result, Err(CoreError::CovenantRejected(_))));
        assert_eq!(
            manager.get_goal(&goal_id).await.unwrap().status,
            GoalStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_update_goal_appends_audit_records() {
        let journal = Arc::new(SqliteJournal::in_memory().unwrap());
        let manager = GoalManager::new(journal.clone(), Arc::new(OpenCovenant));

        let mut goal = manager
            .create_goal(GoalType::Maintenance, "rotate journals", 4, None)
            .await
            .unwrap()
            .into_goal();

        goal.set_progress(0.4);
        manager.update_goal(goal.clone()).await.unwrap();
        goal.set_progress(0.8);
        manager.update_goal(goal.clone()).await.unwrap();

        // one creation record plus one record per update
        let records = journal.search_entries(&goal.id, None).await.unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_update_unknown_goal_errors() {
        let manager = manager_with(Arc::new(OpenCovenant));
        let orphan = Goal::new(GoalType::Learning, "never created", 5);
        assert!(matches!(
            manager.update_goal(orphan).await,
            Err(CoreError::GoalNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_child_goals_resolved_by_id() {
        let manager = manager_with(Arc::new(OpenCovenant));

        let parent = manager
            .create_goal(GoalType::Development, "parent goal", 5, None)
            .await
            .unwrap()
            .into_goal();

        let child_a = manager
            .create_goal(GoalType::Development, "child a", 5, Some(&parent.id))
            .await
            .unwrap()
            .into_goal();
        let child_b = manager
            .create_goal(GoalType::Development, "child b", 5, Some(&parent.id))
            .await
            .unwrap()
            .into_goal();

        let children = manager.get_child_goals(&parent.id).await;
        let ids: Vec<&str> = children.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec![child_a.id.as_str(), child_b.id.as_str()]);

        // back-reference is a weak id, not a pointer
        assert_eq!(children[0].parent_goal_id.as_deref(), Some(parent.id.as_str()));
    }

    #[tokio::test]
    async fn test_apply_task_outcomes_policy() {
        let manager = manager_with(Arc::new(OpenCovenant));

        let goal = manager
            .create_goal(GoalType::Development, "three tasks", 5, None)
            .await
            .unwrap()
            .into_goal();
        manager.promote(&goal.id).await.unwrap();

        // partial completion keeps the goal open
        let updated = manager.apply_task_outcomes(&goal.id, 1, 1, 3).await.unwrap();
        assert_eq!(updated.status, GoalStatus::InProgress);
        assert!(updated.progress > 0.3 && updated.progress < 0.4);

        // all completed completes the goal
        let updated = manager.apply_task_outcomes(&goal.id, 3, 0, 3).await.unwrap();
        assert_eq!(updated.status, GoalStatus::Completed);
        assert_eq!(updated.progress, 1.0);

        // all failed fails another goal
        let doomed = manager
            .create_goal(GoalType::Development, "doomed", 5, None)
            .await
            .unwrap()
            .into_goal();
        let updated = manager.apply_task_outcomes(&doomed.id, 0, 2, 2).await.unwrap();
        assert_eq!(updated.status, GoalStatus::Failed);
        assert!(updated.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_complete_goal_requires_terminal_status() {
        let manager = manager_with(Arc::new(OpenCovenant));
        let goal = manager
            .create_goal(GoalType::Learning, "study graphs", 5, None)
            .await
            .unwrap()
            .into_goal();

        assert!(matches!(
            manager.complete_goal(&goal.id, GoalStatus::InProgress).await,
            Err(CoreError::Config(_))
        ));

        let done = manager
            .complete_goal(&goal.id, GoalStatus::Cancelled)
            .await
            .unwrap();
        assert!(done.completed_at.is_some());
    }
}
