//! Goal Engine
//!
//! One discovery cycle: scan -> generate -> prioritize. The engine never
//! touches persistence or task execution itself; it also decomposes a
//! goal's plan into the task chain the coordinator consumes.

use tracing::debug;

use crate::coordinator::{Task, TaskPriority};
use crate::error::CoreResult;
use crate::generator::GoalGenerator;
use crate::goal::Goal;
use crate::prioritizer::GoalPrioritizer;
use crate::router::classify_description;
use crate::scanner::EnvironmentalScanner;

pub struct GoalEngine {
    scanner: EnvironmentalScanner,
    generator: GoalGenerator,
    prioritizer: GoalPrioritizer,
}

impl GoalEngine {
    pub fn new(
        scanner: EnvironmentalScanner,
        generator: GoalGenerator,
        prioritizer: GoalPrioritizer,
    ) -> Self {
        Self {
            scanner,
            generator,
            prioritizer,
        }
    }

    /// Run one discovery cycle, returning the prioritized goal queue
    ///
    /// An empty scan short-circuits before the generator runs; an empty
    /// generation short-circuits before the prioritizer. Both are part
    /// of the contract, not optimizations.
    pub async fn run_cycle(&self) -> CoreResult<Vec<Goal>> {
        let descriptions = self.scanner.scan_environment().await?;
        if descriptions.is_empty() {
            debug!("Scan empty, cycle ends");
            return Ok(Vec::new());
        }

        let goals = self.generator.generate_goals(&descriptions).await?;
        if goals.is_empty() {
            debug!("No goals survived generation, cycle ends");
            return Ok(Vec::new());
        }

        Ok(self.prioritizer.prioritize_goals(goals))
    }

    /// Split a goal description into the coordinator's task chain
    ///
    /// " then " separates sequential stages; " and " separates parallel
    /// parts within a stage. Every part of a stage depends on every part
    /// of the previous stage.
    pub fn decompose_goal(&self, goal: &Goal) -> Vec<Task> {
        let priority = TaskPriority::from_goal_priority(goal.priority);
        let mut tasks: Vec<Task> = Vec::new();
        let mut previous_stage: Vec<String> = Vec::new();

        for stage in goal.description.split(" then ") {
            let mut current_stage = Vec::new();

            for part in stage.split(" and ") {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }

                let task = Task::new(part, classify_description(part), priority)
                    .with_dependencies(&previous_stage);
                current_stage.push(task.id.clone());
                tasks.push(task);
            }

            if !current_stage.is_empty() {
                previous_stage = current_stage;
            }
        }

        if tasks.is_empty() {
            tasks.push(Task::new(
                &goal.description,
                classify_description(&goal.description),
                priority,
            ));
        }

        tasks
    }
}
