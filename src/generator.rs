//! Goal Generator
//!
//! Turns opportunity descriptions into structured goals. Type and
//! priority come from keyword heuristics; success criteria come from a
//! reasoning call with a deterministic fallback. Goals the manager
//! rejects are dropped silently - callers must not assume the output
//! batch matches the input length.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::CoreResult;
use crate::goal::{Goal, GoalType};
use crate::manager::{GoalDecision, GoalManager};
use crate::router::{ModelRouter, RouteConstraints, TaskCategory};

// Keyword tables for goal-type inference; first match wins
static MAINTENANCE_KEYWORDS: &[&str] = &[
    "maintain", "maintenance", "clean", "rotate", "prune", "backup",
    "upgrade", "housekeeping", "stale",
];

static LEARNING_KEYWORDS: &[&str] = &[
    "learn", "study", "research", "explore", "understand", "read up",
];

static INTEGRATION_KEYWORDS: &[&str] = &[
    "integrate", "integration", "connect", "bridge", "sync", "webhook",
];

static OPTIMIZATION_KEYWORDS: &[&str] = &[
    "optimize", "optimization", "speed up", "performance", "reduce cost",
    "latency", "shrink",
];

static COVENANT_KEYWORDS: &[&str] = &["covenant", "alignment", "reflect", "ethic"];

static URGENT_KEYWORDS: &[&str] = &["urgent", "critical", "immediately", "broken", "outage"];
static IMPORTANT_KEYWORDS: &[&str] = &["important", "must", "soon", "needed"];
static MINOR_KEYWORDS: &[&str] = &["someday", "minor", "nice to have", "eventually"];

/// Infer the goal type from a description
pub fn infer_goal_type(description: &str) -> GoalType {
    let lower = description.to_lowercase();

    if contains_any(&lower, COVENANT_KEYWORDS) {
        GoalType::Covenant
    } else if contains_any(&lower, MAINTENANCE_KEYWORDS) {
        GoalType::Maintenance
    } else if contains_any(&lower, LEARNING_KEYWORDS) {
        GoalType::Learning
    } else if contains_any(&lower, INTEGRATION_KEYWORDS) {
        GoalType::Integration
    } else if contains_any(&lower, OPTIMIZATION_KEYWORDS) {
        GoalType::Optimization
    } else {
        GoalType::Development
    }
}

/// Infer a 1-10 priority from urgency cues
pub fn infer_priority(description: &str) -> i32 {
    let lower = description.to_lowercase();

    if contains_any(&lower, URGENT_KEYWORDS) {
        9
    } else if contains_any(&lower, IMPORTANT_KEYWORDS) {
        7
    } else if contains_any(&lower, MINOR_KEYWORDS) {
        2
    } else {
        5
    }
}

fn contains_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| lower.contains(kw))
}

/// Description -> structured Goal via the manager
pub struct GoalGenerator {
    manager: Arc<GoalManager>,
    router: Arc<ModelRouter>,
}

impl GoalGenerator {
    pub fn new(manager: Arc<GoalManager>, router: Arc<ModelRouter>) -> Self {
        Self { manager, router }
    }

    /// Create a goal per description; rejected goals are omitted
    pub async fn generate_goals(&self, descriptions: &[String]) -> CoreResult<Vec<Goal>> {
        let mut goals = Vec::with_capacity(descriptions.len());

        for description in descriptions {
            let goal_type = infer_goal_type(description);
            let priority = infer_priority(description);
            let criteria = self.draft_success_criteria(description).await;

            match self
                .manager
                .create_goal(goal_type, description, priority, None)
                .await?
            {
                GoalDecision::Approved(mut goal) => {
                    goal.success_criteria = criteria;
                    let goal = self.manager.update_goal(goal).await?;
                    goals.push(goal);
                }
                GoalDecision::Rejected { reason, .. } => {
                    // silent drop; the journal already holds the record
                    debug!("Generator dropped rejected goal ({}): {}", reason, description);
                }
            }
        }

        Ok(goals)
    }

    /// Ask the reasoning backend for measurable success criteria; fall
    /// back to a deterministic pair when the call fails
    async fn draft_success_criteria(&self, description: &str) -> Vec<String> {
        let prompt = format!(
            "List up to four measurable success criteria for this goal, \
             one per line, no numbering:\n{}",
            description
        );
        let constraints = RouteConstraints {
            estimated_input_tokens: 256,
            estimated_output_tokens: 256,
            required_capabilities: Vec::new(),
        };

        match self
            .router
            .invoke(TaskCategory::Reasoning, &constraints, &prompt)
            .await
        {
            Ok(response) => {
                let criteria = parse_criteria(&response.content);
                if criteria.is_empty() {
                    fallback_criteria(description)
                } else {
                    criteria
                }
            }
            Err(e) => {
                warn!("Criteria drafting failed ({}), using fallback", e);
                fallback_criteria(description)
            }
        }
    }
}

fn parse_criteria(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
                .to_string()
        })
        .filter(|line| line.len() > 3)
        .take(4)
        .collect()
}

fn fallback_criteria(description: &str) -> Vec<String> {
    vec![
        format!("Observable outcome addresses: {}", description),
        "No regressions in existing behavior".to_string(),
    ]
}
