//! Execution Engine Interface
//!
//! The unit the coordinator retries and cancels around. Implementations
//! must tolerate at-least-once delivery: a retried operation may have
//! partially run before.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::coordinator::Task;
use crate::router::{ModelRouter, RouteConstraints};

/// External collaborator that performs one unit of work
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Execute a task once; the coordinator owns retry/backoff policy
    async fn execute_operation(&self, task: &Task) -> Result<String>;
}

/// Engine that runs every task as a reasoning call through the router
///
/// Router service errors (fallback chain exhausted) surface as plain
/// execution failures here, so they fall under the task's retry policy.
pub struct RoutedExecutionEngine {
    router: Arc<ModelRouter>,
}

impl RoutedExecutionEngine {
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl ExecutionEngine for RoutedExecutionEngine {
    async fn execute_operation(&self, task: &Task) -> Result<String> {
        let constraints = RouteConstraints {
            // rough prompt-size estimate; four chars per token
            estimated_input_tokens: (task.description.len() as u64 / 4) + 256,
            estimated_output_tokens: 1024,
            required_capabilities: Vec::new(),
        };

        debug!(
            "Executing task {} as {} call",
            task.id,
            task.category.as_str()
        );

        let response = self
            .router
            .invoke(task.category, &constraints, &task.description)
            .await?;

        Ok(response.content)
    }
}
