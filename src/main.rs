//! Solace Autonomy Core - Entry Point
//!
//! Runs the autonomy loop: one discovery cycle per interval, then the
//! top goal's task chain through the coordinator. Ctrl-C stops new
//! dispatch and lets in-flight work finish its attempt.

use std::sync::Arc;

use solace_core::{
    Config, CoordinatorConfig, EnvironmentalScanner, GoalEngine, GoalGenerator, GoalManager,
    GoalPrioritizer, GoalStatus, HttpBackend, ModelRouter, OpenCovenant, RoutedExecutionEngine,
    SqliteJournal, StaticSource, TaskCoordinator,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Solace Autonomy Core v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let journal = Arc::new(SqliteJournal::open(&config.db_path)?);
    let covenant = Arc::new(OpenCovenant);
    let manager = Arc::new(GoalManager::new(journal, covenant));

    let backend = Arc::new(HttpBackend::from_config(&config));
    if !backend.is_available() {
        warn!("SOLACE_API_KEY not set; reasoning calls will fail over to fallbacks");
    }
    let router = Arc::new(ModelRouter::new(
        ModelRouter::default_models(),
        config.daily_budget_usd,
        &config.budget_tier_model,
        backend,
    ));

    let mut scanner = EnvironmentalScanner::new(manager.clone());
    scanner.add_source(Box::new(StaticSource::new(
        "bootstrap",
        vec![
            "Summarize yesterday's journal activity".to_string(),
            "Prune stale journal records".to_string(),
        ],
    )));

    let generator = GoalGenerator::new(manager.clone(), router.clone());
    let engine = GoalEngine::new(scanner, generator, GoalPrioritizer::new());

    let execution = Arc::new(RoutedExecutionEngine::new(router.clone()));
    let coordinator = Arc::new(TaskCoordinator::new(
        CoordinatorConfig::from_config(&config),
        execution,
    ));

    let mut ticker = tokio::time::interval(config.cycle_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = run_once(&engine, &manager, &coordinator).await {
                    warn!("Cycle failed: {}", e);
                }
                info!("Daily spend: ${:.2}", router.daily_spend());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                coordinator.shutdown();
                break;
            }
        }
    }

    Ok(())
}

/// One autonomy pass: discover goals, execute the top goal's task chain,
/// roll the outcomes back into the goal
async fn run_once(
    engine: &GoalEngine,
    manager: &Arc<GoalManager>,
    coordinator: &Arc<TaskCoordinator>,
) -> anyhow::Result<()> {
    let goals = engine.run_cycle().await?;
    info!("Cycle produced {} goals", goals.len());

    let Some(top) = goals.first() else {
        return Ok(());
    };

    manager.promote(&top.id).await?;

    let tasks = engine.decompose_goal(top);
    let total = tasks.len();
    for task in tasks {
        coordinator.schedule_task(task).await?;
    }

    let report = coordinator.execute_pending_tasks().await?;
    let goal = manager
        .apply_task_outcomes(&top.id, report.completed, report.failed, total)
        .await?;

    info!(
        "Goal {} now {} (progress {:.2})",
        goal.id,
        goal.status.as_str(),
        goal.progress
    );

    if goal.status == GoalStatus::Failed {
        warn!("Goal {} failed: {} of {} tasks failed", goal.id, report.failed, total);
    }

    Ok(())
}
