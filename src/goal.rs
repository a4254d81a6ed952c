//! Goal Entity
//!
//! A goal is the top-level unit of autonomous work: discovered by the
//! scanner, structured by the generator, executed as a task graph.
//! Lifecycle: Pending -> InProgress -> {Completed, Failed, Cancelled}.
//!
//! Two invariants are enforced by `set_status`, the only status mutator:
//! - `completed_at` is set iff the status is terminal
//! - `progress == 1.0` iff the status is Completed

use serde::{Deserialize, Serialize};

use crate::covenant::AlignmentScores;

/// Goal category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalType {
    Development,
    Maintenance,
    Learning,
    Integration,
    Optimization,
    Covenant,
    Autonomous,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Development => "development",
            GoalType::Maintenance => "maintenance",
            GoalType::Learning => "learning",
            GoalType::Integration => "integration",
            GoalType::Optimization => "optimization",
            GoalType::Covenant => "covenant",
            GoalType::Autonomous => "autonomous",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" => Some(GoalType::Development),
            "maintenance" => Some(GoalType::Maintenance),
            "learning" => Some(GoalType::Learning),
            "integration" => Some(GoalType::Integration),
            "optimization" => Some(GoalType::Optimization),
            "covenant" => Some(GoalType::Covenant),
            "autonomous" => Some(GoalType::Autonomous),
            _ => None,
        }
    }
}

/// Goal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Pending => "pending",
            GoalStatus::InProgress => "in_progress",
            GoalStatus::Completed => "completed",
            GoalStatus::Failed => "failed",
            GoalStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(GoalStatus::Pending),
            "in_progress" => Some(GoalStatus::InProgress),
            "completed" => Some(GoalStatus::Completed),
            "failed" => Some(GoalStatus::Failed),
            "cancelled" => Some(GoalStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GoalStatus::Completed | GoalStatus::Failed | GoalStatus::Cancelled
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self, GoalStatus::Pending | GoalStatus::InProgress)
    }
}

/// Priority bounds for goals (higher = more urgent)
pub const MIN_GOAL_PRIORITY: i32 = 1;
pub const MAX_GOAL_PRIORITY: i32 = 10;

/// A tracked goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub goal_type: GoalType,
    pub description: String,
    pub status: GoalStatus,
    /// 1-10, higher = more urgent; clamped at construction
    pub priority: i32,
    /// 0.0-1.0; reaches 1.0 only through completion
    pub progress: f64,
    pub alignment: AlignmentScores,
    /// Weak back-reference; the central table owns all goals
    pub parent_goal_id: Option<String>,
    /// Lookup keys only, never owning pointers
    pub child_goal_ids: Vec<String>,
    pub success_criteria: Vec<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    /// Set once at creation by the covenant validator
    pub covenant_approval: bool,
}

impl Goal {
    /// Create a new pending goal
    pub fn new(goal_type: GoalType, description: &str, priority: i32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            goal_type,
            description: description.to_string(),
            status: GoalStatus::Pending,
            priority: priority.clamp(MIN_GOAL_PRIORITY, MAX_GOAL_PRIORITY),
            progress: 0.0,
            alignment: AlignmentScores::default(),
            parent_goal_id: None,
            child_goal_ids: Vec::new(),
            success_criteria: Vec::new(),
            created_at: chrono::Utc::now().timestamp(),
            completed_at: None,
            covenant_approval: false,
        }
    }

    /// Transition to a new status, maintaining the completed_at and
    /// progress invariants
    pub fn set_status(&mut self, status: GoalStatus) {
        self.status = status;
        if status.is_terminal() {
            if self.completed_at.is_none() {
                self.completed_at = Some(chrono::Utc::now().timestamp());
            }
            if status == GoalStatus::Completed {
                self.progress = 1.0;
            }
        } else {
            self.completed_at = None;
        }
    }

    /// Update progress, capped below 1.0 for non-completed goals
    pub fn set_progress(&mut self, progress: f64) {
        if self.status == GoalStatus::Completed {
            self.progress = 1.0;
        } else {
            self.progress = progress.clamp(0.0, 1.0).min(0.99);
        }
    }

    /// Replace alignment scores, clamping each component into [0.0, 1.0]
    pub fn update_alignment(&mut self, wisdom: f64, compassion: f64, truth: f64) {
        self.alignment = AlignmentScores {
            wisdom,
            compassion,
            truth,
        }
        .clamped();
    }

    /// Short format for listings
    pub fn format_short(&self) -> String {
        format!(
            "[{}] p{} {} ({})",
            self.goal_type.as_str(),
            self.priority,
            self.description,
            self.status.as_str()
        )
    }
}
