//! Environmental Scanner
//!
//! Surfaces candidate opportunity descriptions from registered sources.
//! Candidates already covered by an open goal are dropped via substring
//! matching (not semantic) - the sole anti-flooding control.

use std::sync::Arc;
use tracing::debug;

use crate::error::CoreResult;
use crate::manager::GoalManager;

/// A probe that proposes opportunity descriptions
pub trait OpportunitySource: Send + Sync {
    fn name(&self) -> &str;
    fn probe(&self) -> Vec<String>;
}

/// Fixed list of opportunities; used by the binary's bootstrap probes
/// and by tests
pub struct StaticSource {
    name: String,
    items: Vec<String>,
}

impl StaticSource {
    pub fn new(name: &str, items: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            items,
        }
    }
}

impl OpportunitySource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self) -> Vec<String> {
        self.items.clone()
    }
}

/// Opportunity discovery with duplicate suppression
pub struct EnvironmentalScanner {
    manager: Arc<GoalManager>,
    sources: Vec<Box<dyn OpportunitySource>>,
}

impl EnvironmentalScanner {
    pub fn new(manager: Arc<GoalManager>) -> Self {
        Self {
            manager,
            sources: Vec::new(),
        }
    }

    pub fn add_source(&mut self, source: Box<dyn OpportunitySource>) {
        self.sources.push(source);
    }

    /// Collect candidate descriptions, dropping any that substring-match
    /// an open (Pending/InProgress) goal or an earlier candidate
    pub async fn scan_environment(&self) -> CoreResult<Vec<String>> {
        let open_goals = self.manager.list_open_goals().await;
        let open_lower: Vec<String> = open_goals
            .iter()
            .map(|g| g.description.to_lowercase())
            .collect();

        let mut surfaced: Vec<String> = Vec::new();

        for source in &self.sources {
            for candidate in source.probe() {
                let trimmed = candidate.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let lower = trimmed.to_lowercase();

                let duplicate_of_goal = open_lower
                    .iter()
                    .any(|g| g.contains(&lower) || lower.contains(g.as_str()));
                let duplicate_in_batch = surfaced
                    .iter()
                    .any(|s| s.to_lowercase() == lower);

                if duplicate_of_goal || duplicate_in_batch {
                    debug!("Dropping duplicate candidate from {}: {}", source.name(), trimmed);
                    continue;
                }

                surfaced.push(trimmed.to_string());
            }
        }

        debug!("Scan surfaced {} candidates", surfaced.len());
        Ok(surfaced)
    }
}
