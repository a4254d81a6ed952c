//! Solace Autonomy Core
//!
//! Goal/task orchestration core for the Solace companion platform.
//!
//! # Features
//!
//! - **Goal Lifecycle**: covenant-gated creation, append-only journal audit
//! - **Discovery Cycle**: scan -> generate -> prioritize
//! - **Task Coordination**: DAG scheduling, bounded fan-out, retry/backoff
//! - **Model Routing**: cost/quality scoring with a daily-budget downgrade
//!
//! # Architecture
//!
//! ```text
//! Scanner ──► descriptions ──► Generator ──► Goals ──► Prioritizer
//!                                  │                        │
//!                            GoalManager ◄── progress ── GoalEngine
//!                                  │                        │
//!                              Journal               TaskCoordinator
//!                                                           │
//!                                                     ModelRouter ──► Backend
//! ```
//!
//! Front ends (chat, Discord, REST) consume only the manager's CRUD
//! surface and the engine's `run_cycle`; coordinator and router
//! internals stay private to the core.

pub mod config;
pub mod coordinator;
pub mod covenant;
pub mod engine;
pub mod error;
pub mod execution;
pub mod generator;
pub mod goal;
pub mod llm;
pub mod manager;
pub mod memory;
pub mod prioritizer;
pub mod router;
pub mod scanner;

pub use config::Config;
pub use coordinator::{
    CoordinatorConfig, CoordinatorReport, Task, TaskCoordinator, TaskPriority, TaskStatus,
};
pub use covenant::{AlignmentScores, CovenantValidator, OpenCovenant, Verdict};
pub use engine::GoalEngine;
pub use error::{CoreError, CoreResult};
pub use execution::{ExecutionEngine, RoutedExecutionEngine};
pub use generator::GoalGenerator;
pub use goal::{Goal, GoalStatus, GoalType};
pub use llm::{HttpBackend, LlmBackend, LlmResponse};
pub use manager::{GoalDecision, GoalManager};
pub use memory::{JournalEntry, MemoryDelegate, SqliteJournal};
pub use prioritizer::GoalPrioritizer;
pub use router::{
    ModelRouter, ModelSpec, ModelUsage, RouteConstraints, RouterState, TaskCategory,
};
pub use scanner::{EnvironmentalScanner, OpportunitySource, StaticSource};
