//! Task Coordinator
//!
//! Schedules and executes the task graph decomposed from an active goal:
//! - Dependency resolution over a validated DAG
//! - Priority-first dispatch with bounded concurrency
//! - Retry with exponential backoff
//! - Cooperative cancellation
//!
//! All status transitions happen under the single task-registry lock, so
//! "become ready" and "dispatch" decisions cannot race.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::execution::ExecutionEngine;
use crate::router::TaskCategory;

/// Task priority - a coarser scale than the goal's 1-10 integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// The one mapping between the goal scale (1-10) and the task scale:
    /// 1-3 -> Low, 4-7 -> Medium, 8-10 -> High
    pub fn from_goal_priority(priority: i32) -> Self {
        match priority {
            i32::MIN..=3 => TaskPriority::Low,
            4..=7 => TaskPriority::Medium,
            _ => TaskPriority::High,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// An executable unit decomposed from a goal's plan
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub category: TaskCategory,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// Task ids that must be Completed before this task is eligible
    pub dependencies: Vec<String>,
    pub attempt_count: u32,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    /// Schedule-order tie-breaker for equal priorities
    pub(crate) seq: u64,
}

impl Task {
    pub fn new(description: &str, category: TaskCategory, priority: TaskPriority) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            description: description.to_string(),
            priority,
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            attempt_count: 0,
            last_error: None,
            created_at: chrono::Utc::now().timestamp(),
            completed_at: None,
            seq: 0,
        }
    }

    pub fn with_dependency(mut self, task_id: &str) -> Self {
        self.dependencies.push(task_id.to_string());
        self
    }

    pub fn with_dependencies(mut self, task_ids: &[String]) -> Self {
        self.dependencies.extend(task_ids.iter().cloned());
        self
    }
}

/// Coordinator tuning knobs
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Bounded fan-out for parallel task execution
    pub max_concurrent: usize,
    /// Attempts per task before it is marked failed
    pub max_retries: u32,
    /// Backoff base; attempt n waits base * 2^(n-1)
    pub retry_base_delay: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent: config.max_concurrent_tasks,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        }
    }
}

/// Outcome summary for one scheduling run
#[derive(Debug, Clone, Default)]
pub struct CoordinatorReport {
    /// Task ids in dispatch order
    pub execution_order: Vec<String>,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Pending tasks whose dependencies can no longer complete
    pub blocked: usize,
}

impl CoordinatorReport {
    pub fn total_finished(&self) -> usize {
        self.completed + self.failed + self.cancelled
    }
}

/// Task dependency scheduler
pub struct TaskCoordinator {
    config: CoordinatorConfig,
    tasks: Arc<RwLock<HashMap<String, Task>>>,
    engine: Arc<dyn ExecutionEngine>,
    semaphore: Arc<Semaphore>,
    next_seq: Arc<RwLock<u64>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskCoordinator {
    pub fn new(config: CoordinatorConfig, engine: Arc<dyn ExecutionEngine>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            config,
            tasks: Arc::new(RwLock::new(HashMap::new())),
            engine,
            next_seq: Arc::new(RwLock::new(0)),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Register a task for execution
    ///
    /// Fails with a configuration error if the dependency set reaches
    /// back to the task itself - validated here, never at execute time.
    /// Dependencies on ids not scheduled yet are allowed; the task stays
    /// ineligible until they resolve.
    pub async fn schedule_task(&self, mut task: Task) -> CoreResult<String> {
        let mut tasks = self.tasks.write().await;

        if Self::creates_cycle(&tasks, &task) {
            return Err(CoreError::CycleDetected(task.id.clone()));
        }

        let mut seq = self.next_seq.write().await;
        task.seq = *seq;
        *seq += 1;

        let task_id = task.id.clone();
        debug!(
            "Scheduled task {} ({}, {} deps)",
            task_id,
            task.priority.as_str(),
            task.dependencies.len()
        );
        tasks.insert(task_id.clone(), task);
        Ok(task_id)
    }

    /// Depth-first walk along dependency edges from the candidate; any
    /// path returning to the candidate's id is a cycle
    fn creates_cycle(tasks: &HashMap<String, Task>, candidate: &Task) -> bool {
        let mut stack: Vec<&str> = candidate.dependencies.iter().map(|s| s.as_str()).collect();
        let mut visited: HashSet<&str> = HashSet::new();

        while let Some(id) = stack.pop() {
            if id == candidate.id {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(task) = tasks.get(id) {
                stack.extend(task.dependencies.iter().map(|s| s.as_str()));
            }
        }
        false
    }

    /// Drain the ready set until nothing more can run
    ///
    /// Each pass computes the ready set (Pending tasks with every
    /// dependency Completed), dispatches it highest-priority-first under
    /// the bounded fan-out, waits for the wave, and recomputes. Tasks
    /// scheduled mid-wave join the next recomputation.
    pub async fn execute_pending_tasks(&self) -> CoreResult<CoordinatorReport> {
        let mut report = CoordinatorReport::default();

        loop {
            if *self.shutdown_rx.borrow() {
                info!("Coordinator shutdown requested, stopping dispatch");
                break;
            }

            let ready_ids = self.ready_set().await;
            if ready_ids.is_empty() {
                break;
            }

            let mut handles = Vec::with_capacity(ready_ids.len());
            for task_id in ready_ids {
                // Fan-out bound: waits here when the pool is full, which
                // keeps dispatch order equal to priority order
                let permit = self
                    .semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| CoreError::Service(e.to_string()))?;

                if !self.mark_dispatched(&task_id).await {
                    // cancelled (or otherwise moved on) since the ready
                    // set was computed
                    continue;
                }
                report.execution_order.push(task_id.clone());

                let tasks = Arc::clone(&self.tasks);
                let engine = Arc::clone(&self.engine);
                let config = self.config.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    run_with_retries(tasks, engine, &config, &task_id, config.max_retries).await
                }));
            }

            for joined in futures_util::future::join_all(handles).await {
                match joined {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!("Task execution error: {}", e),
                    Err(e) => warn!("Task join error: {}", e),
                }
            }
        }

        let tasks = self.tasks.read().await;
        for task in tasks.values() {
            match task.status {
                TaskStatus::Completed => report.completed += 1,
                TaskStatus::Failed => report.failed += 1,
                TaskStatus::Cancelled => report.cancelled += 1,
                TaskStatus::Pending => report.blocked += 1,
                TaskStatus::InProgress => {}
            }
        }

        info!(
            "Coordinator run finished: {} completed, {} failed, {} cancelled, {} blocked",
            report.completed, report.failed, report.cancelled, report.blocked
        );
        Ok(report)
    }

    /// Pending tasks whose every dependency is Completed, highest
    /// priority first, schedule order within equal priorities
    async fn ready_set(&self) -> Vec<String> {
        let tasks = self.tasks.read().await;

        let completed: HashSet<&str> = tasks
            .values()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.id.as_str())
            .collect();

        let mut ready: Vec<&Task> = tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| t.dependencies.iter().all(|d| completed.contains(d.as_str())))
            .collect();

        ready.sort_by_key(|t| (Reverse(t.priority), t.seq));
        ready.iter().map(|t| t.id.clone()).collect()
    }

    /// Flip Pending -> InProgress under the registry lock; false when the
    /// task is no longer dispatchable
    async fn mark_dispatched(&self, task_id: &str) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(task_id) {
            Some(task) if task.status == TaskStatus::Pending => {
                task.status = TaskStatus::InProgress;
                true
            }
            _ => false,
        }
    }

    /// Execute one task with the configured retry budget
    pub async fn execute_task(&self, task_id: &str) -> CoreResult<TaskStatus> {
        self.execute_task_with_retries(task_id, self.config.max_retries)
            .await
    }

    /// Execute one task, retrying with exponential backoff up to
    /// `max_retries` attempts
    pub async fn execute_task_with_retries(
        &self,
        task_id: &str,
        max_retries: u32,
    ) -> CoreResult<TaskStatus> {
        {
            let mut tasks = self.tasks.write().await;
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;
            if task.status == TaskStatus::Pending {
                task.status = TaskStatus::InProgress;
            }
        }

        run_with_retries(
            Arc::clone(&self.tasks),
            Arc::clone(&self.engine),
            &self.config,
            task_id,
            max_retries,
        )
        .await
    }

    /// Cooperatively cancel a task
    ///
    /// Pending/InProgress becomes Cancelled (returns true); a terminal
    /// task is left alone (returns false). An in-flight external call is
    /// not interrupted, but no further retries or dependent unlocking
    /// happen for this task.
    pub async fn cancel_task(&self, task_id: &str) -> CoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;

        match task.status {
            TaskStatus::Pending | TaskStatus::InProgress => {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(chrono::Utc::now().timestamp());
                info!("Task {} cancelled", task_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Stop dispatching new waves; in-flight tasks finish their attempt
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn get_task(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    pub async fn list_tasks(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    pub async fn pending_count(&self) -> usize {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .count()
    }
}

/// Attempt loop shared by wave dispatch and direct execution
///
/// One engine invocation per attempt; failure increments attempt_count
/// and backs off base * 2^(attempt-1) until the retry budget is spent.
/// A cancellation observed between attempts abandons the task.
async fn run_with_retries(
    tasks: Arc<RwLock<HashMap<String, Task>>>,
    engine: Arc<dyn ExecutionEngine>,
    config: &CoordinatorConfig,
    task_id: &str,
    max_retries: u32,
) -> CoreResult<TaskStatus> {
    let max_retries = max_retries.max(1);

    loop {
        let snapshot = {
            let tasks = tasks.read().await;
            let task = tasks
                .get(task_id)
                .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;
            if task.status == TaskStatus::Cancelled {
                debug!("Task {} cancelled, abandoning retries", task_id);
                return Ok(TaskStatus::Cancelled);
            }
            task.clone()
        };

        match engine.execute_operation(&snapshot).await {
            Ok(_) => {
                let mut tasks = tasks.write().await;
                if let Some(task) = tasks.get_mut(task_id) {
                    // a cancel that landed during the call wins
                    if task.status != TaskStatus::Cancelled {
                        task.status = TaskStatus::Completed;
                        task.completed_at = Some(chrono::Utc::now().timestamp());
                    }
                    return Ok(task.status);
                }
                return Err(CoreError::TaskNotFound(task_id.to_string()));
            }
            Err(e) => {
                let attempt = {
                    let mut tasks = tasks.write().await;
                    let task = tasks
                        .get_mut(task_id)
                        .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;
                    task.attempt_count += 1;
                    task.last_error = Some(e.to_string());

                    if task.attempt_count >= max_retries {
                        task.status = TaskStatus::Failed;
                        task.completed_at = Some(chrono::Utc::now().timestamp());
                        warn!(
                            "Task {} failed after {} attempts: {}",
                            task_id, task.attempt_count, e
                        );
                        return Ok(TaskStatus::Failed);
                    }
                    task.attempt_count
                };

                let delay = config.retry_base_delay * 2u32.pow(attempt.saturating_sub(1));
                debug!(
                    "Task {} attempt {} failed ({}), retrying in {:?}",
                    task_id, attempt, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Engine recording execution order, with optional scripted failures
    struct RecordingEngine {
        order: Mutex<Vec<String>>,
        calls: AtomicU32,
        /// fail the first N calls for every task
        fail_first: u32,
    }

    impl RecordingEngine {
        fn new() -> Self {
            Self {
                order: Mutex::new(Vec::new()),
                calls: AtomicU32::new(0),
                fail_first: 0,
            }
        }

        fn failing_first(n: u32) -> Self {
            Self {
                order: Mutex::new(Vec::new()),
                calls: AtomicU32::new(0),
                fail_first: n,
            }
        }

        fn order(&self) -> Vec<String> {
            self.order.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExecutionEngine for RecordingEngine {
        async fn execute_operation(&self, task: &Task) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push(task.description.clone());

            if call < self.fail_first {
                anyhow::bail!("scripted failure {}", call);
            }
            Ok(format!("done: {}", task.description))
        }
    }

    fn fast_config(max_concurrent: usize) -> CoordinatorConfig {
        CoordinatorConfig {
            max_concurrent,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    fn task(desc: &str, priority: TaskPriority) -> Task {
        Task::new(desc, TaskCategory::Reasoning, priority)
    }

    #[test]
    fn test_priority_mapping_from_goal_scale() {
        assert_eq!(TaskPriority::from_goal_priority(1), TaskPriority::Low);
        assert_eq!(TaskPriority::from_goal_priority(3), TaskPriority::Low);
        assert_eq!(TaskPriority::from_goal_priority(4), TaskPriority::Medium);
        assert_eq!(TaskPriority::from_goal_priority(7), TaskPriority::Medium);
        assert_eq!(TaskPriority::from_goal_priority(8), TaskPriority::High);
        assert_eq!(TaskPriority::from_goal_priority(10), TaskPriority::High);
    }

    #[tokio::test]
    async fn test_cycle_detected_at_schedule_time() {
        let engine = Arc::new(RecordingEngine::new());
        let coordinator = TaskCoordinator::new(fast_config(2), engine.clone());

        let a = task("a", TaskPriority::Medium);
        let a_id = a.id.clone();

        // b depends on a, a depends on b: the second schedule must fail
        let b = task("b", TaskPriority::Medium).with_dependency(&a_id);
        let b_id = b.id.clone();
        let a = a.with_dependency(&b_id);

        coordinator.schedule_task(b).await.unwrap();
        let result = coordinator.schedule_task(a).await;
        assert!(matches!(result, Err(CoreError::CycleDetected(_))));

        // nothing ran
        assert!(engine.order().is_empty());
    }

    #[tokio::test]
    async fn test_self_dependency_is_a_cycle() {
        let coordinator =
            TaskCoordinator::new(fast_config(2), Arc::new(RecordingEngine::new()));

        let mut t = task("self", TaskPriority::Low);
        let id = t.id.clone();
        t = t.with_dependency(&id);

        assert!(matches!(
            coordinator.schedule_task(t).await,
            Err(CoreError::CycleDetected(_))
        ));
    }

    #[tokio::test]
    async fn test_priority_order_independent_tasks() {
        let engine = Arc::new(RecordingEngine::new());
        // fan-out of one makes engine call order equal dispatch order
        let coordinator = TaskCoordinator::new(fast_config(1), engine.clone());

        // scheduled in reverse priority order
        coordinator
            .schedule_task(task("low", TaskPriority::Low))
            .await
            .unwrap();
        coordinator
            .schedule_task(task("medium", TaskPriority::Medium))
            .await
            .unwrap();
        coordinator
            .schedule_task(task("high", TaskPriority::High))
            .await
            .unwrap();

        let report = coordinator.execute_pending_tasks().await.unwrap();

        assert_eq!(engine.order(), vec!["high", "medium", "low"]);
        assert_eq!(report.completed, 3);
    }

    #[tokio::test]
    async fn test_dependency_chain_order() {
        let engine = Arc::new(RecordingEngine::new());
        let coordinator = TaskCoordinator::new(fast_config(4), engine.clone());

        let a = task("a", TaskPriority::Low);
        let a_id = a.id.clone();
        let b = task("b", TaskPriority::Medium).with_dependency(&a_id);
        let b_id = b.id.clone();
        let c = task("c", TaskPriority::High).with_dependency(&b_id);

        // scheduled in reverse: c, b, a
        coordinator.schedule_task(c).await.unwrap();
        coordinator.schedule_task(b).await.unwrap();
        coordinator.schedule_task(a).await.unwrap();

        let report = coordinator.execute_pending_tasks().await.unwrap();

        assert_eq!(engine.order(), vec!["a", "b", "c"]);
        assert_eq!(report.completed, 3);
    }

    #[tokio::test]
    async fn test_execution_requires_completed_dependencies() {
        let engine = Arc::new(RecordingEngine::failing_first(3));
        let coordinator = TaskCoordinator::new(fast_config(2), engine.clone());

        // a exhausts its retry budget, so b must never run
        let a = task("a", TaskPriority::Medium);
        let a_id = a.id.clone();
        let b = task("b", TaskPriority::Medium).with_dependency(&a_id);
        let b_id = b.id.clone();

        coordinator.schedule_task(a).await.unwrap();
        coordinator.schedule_task(b).await.unwrap();

        let report = coordinator.execute_pending_tasks().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.blocked, 1);
        assert!(!engine.order().contains(&"b".to_string()));
        assert_eq!(
            coordinator.get_task(&b_id).await.unwrap().status,
            TaskStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let engine = Arc::new(RecordingEngine::failing_first(2));
        let coordinator = TaskCoordinator::new(fast_config(1), engine.clone());

        let t = task("flaky", TaskPriority::Medium);
        let id = coordinator.schedule_task(t).await.unwrap();

        let status = coordinator.execute_task_with_retries(&id, 3).await.unwrap();

        assert_eq!(status, TaskStatus::Completed);
        // failed twice, succeeded on the third call
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);

        let stored = coordinator.get_task(&id).await.unwrap();
        assert_eq!(stored.attempt_count, 2);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_retries_exhausted_marks_failed() {
        let engine = Arc::new(RecordingEngine::failing_first(99));
        let coordinator = TaskCoordinator::new(fast_config(1), engine.clone());

        let id = coordinator
            .schedule_task(task("doomed", TaskPriority::Low))
            .await
            .unwrap();

        let status = coordinator.execute_task_with_retries(&id, 3).await.unwrap();
        assert_eq!(status, TaskStatus::Failed);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);

        let stored = coordinator.get_task(&id).await.unwrap();
        assert_eq!(stored.attempt_count, 3);
        assert!(stored.last_error.is_some());
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_pending_task_never_dispatched() {
        let engine = Arc::new(RecordingEngine::new());
        let coordinator = TaskCoordinator::new(fast_config(2), engine.clone());

        let id = coordinator
            .schedule_task(task("cancel me", TaskPriority::High))
            .await
            .unwrap();

        assert!(coordinator.cancel_task(&id).await.unwrap());

        let report = coordinator.execute_pending_tasks().await.unwrap();

        assert!(engine.order().is_empty());
        assert_eq!(report.cancelled, 1);
        let stored = coordinator.get_task(&id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Cancelled);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_terminal_task_is_noop() {
        let engine = Arc::new(RecordingEngine::new());
        let coordinator = TaskCoordinator::new(fast_config(1), engine);

        let id = coordinator
            .schedule_task(task("quick", TaskPriority::Low))
            .await
            .unwrap();
        coordinator.execute_pending_tasks().await.unwrap();

        assert!(!coordinator.cancel_task(&id).await.unwrap());
        assert_eq!(
            coordinator.get_task(&id).await.unwrap().status,
            TaskStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_unknown_task_errors() {
        let coordinator =
            TaskCoordinator::new(fast_config(1), Arc::new(RecordingEngine::new()));
        assert!(matches!(
            coordinator.cancel_task("nope").await,
            Err(CoreError::TaskNotFound(_))
        ));
        assert!(matches!(
            coordinator.execute_task("nope").await,
            Err(CoreError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_diamond_dependencies() {
        // d depends on b and c, which both depend on a
        let engine = Arc::new(RecordingEngine::new());
        let coordinator = TaskCoordinator::new(fast_config(4), engine.clone());

        let a = task("a", TaskPriority::Medium);
        let a_id = a.id.clone();
        let b = task("b", TaskPriority::Medium).with_dependency(&a_id);
        let c = task("c", TaskPriority::Medium).with_dependency(&a_id);
        let d = task("d", TaskPriority::Medium)
            .with_dependencies(&[b.id.clone(), c.id.clone()]);

        coordinator.schedule_task(a).await.unwrap();
        coordinator.schedule_task(b).await.unwrap();
        coordinator.schedule_task(c).await.unwrap();
        coordinator.schedule_task(d).await.unwrap();

        let report = coordinator.execute_pending_tasks().await.unwrap();
        assert_eq!(report.completed, 4);

        let order = engine.order();
        assert_eq!(order.first().map(String::as_str), Some("a"));
        assert_eq!(order.last().map(String::as_str), Some("d"));
    }
}
