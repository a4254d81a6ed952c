//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// Orchestration core configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the bundled HTTP backend (optional - mocks don't need it)
    pub api_key: Option<String>,

    /// Base URL for the HTTP backend
    pub api_url: Option<String>,

    /// SQLite database path for the goal journal
    pub db_path: PathBuf,

    /// Maximum concurrent task executions
    pub max_concurrent_tasks: usize,

    /// Retry attempts per task before it is marked failed
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries
    pub retry_base_delay: Duration,

    /// Daily spend budget in USD
    pub daily_budget_usd: f64,

    /// Model forced once spend crosses 90% of the daily budget
    pub budget_tier_model: String,

    /// Interval between autonomy cycles (binary only)
    pub cycle_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            db_path: PathBuf::from("solace.db"),
            max_concurrent_tasks: 4,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            daily_budget_usd: 35.0,
            budget_tier_model: "haiku-lite".to_string(),
            cycle_interval: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> CoreResult<Self> {
        let defaults = Self::default();

        let api_key = std::env::var("SOLACE_API_KEY").ok();
        let api_url = std::env::var("SOLACE_API_URL").ok();

        let db_path = std::env::var("SOLACE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let max_concurrent_tasks = parse_var("SOLACE_MAX_CONCURRENT", defaults.max_concurrent_tasks)?;
        if max_concurrent_tasks == 0 {
            return Err(CoreError::Config(
                "SOLACE_MAX_CONCURRENT must be at least 1".to_string(),
            ));
        }

        let max_retries = parse_var("SOLACE_MAX_RETRIES", defaults.max_retries)?;

        let retry_base_delay = Duration::from_millis(parse_var(
            "SOLACE_RETRY_BASE_MS",
            defaults.retry_base_delay.as_millis() as u64,
        )?);

        let daily_budget_usd = parse_var("SOLACE_DAILY_BUDGET_USD", defaults.daily_budget_usd)?;
        if daily_budget_usd <= 0.0 {
            return Err(CoreError::Config(
                "SOLACE_DAILY_BUDGET_USD must be positive".to_string(),
            ));
        }

        let budget_tier_model =
            std::env::var("SOLACE_BUDGET_MODEL").unwrap_or(defaults.budget_tier_model);

        let cycle_interval = Duration::from_secs(parse_var(
            "SOLACE_CYCLE_INTERVAL_SECS",
            defaults.cycle_interval.as_secs(),
        )?);

        Ok(Self {
            api_key,
            api_url,
            db_path,
            max_concurrent_tasks,
            max_retries,
            retry_base_delay,
            daily_budget_usd,
            budget_tier_model,
            cycle_interval,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> CoreResult<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| CoreError::Config(format!("{} has invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
