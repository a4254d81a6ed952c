//! Covenant Validator Interface
//!
//! The covenant validator is an external collaborator that gates goal
//! creation and scores goal descriptions along three alignment axes.
//! The core treats it as opaque: it only consumes the verdict and the
//! clamped scores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Alignment scores attached to a goal, each in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentScores {
    pub wisdom: f64,
    pub compassion: f64,
    pub truth: f64,
}

impl Default for AlignmentScores {
    fn default() -> Self {
        Self {
            wisdom: 0.5,
            compassion: 0.5,
            truth: 0.5,
        }
    }
}

impl AlignmentScores {
    /// Clamp every component into [0.0, 1.0]
    pub fn clamped(self) -> Self {
        Self {
            wisdom: self.wisdom.clamp(0.0, 1.0),
            compassion: self.compassion.clamp(0.0, 1.0),
            truth: self.truth.clamp(0.0, 1.0),
        }
    }

    pub fn mean(&self) -> f64 {
        (self.wisdom + self.compassion + self.truth) / 3.0
    }
}

/// Outcome of a covenant check
#[derive(Debug, Clone)]
pub struct Verdict {
    pub approved: bool,
    pub reason: String,
}

impl Verdict {
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: String::new(),
        }
    }

    pub fn reject(reason: &str) -> Self {
        Self {
            approved: false,
            reason: reason.to_string(),
        }
    }
}

/// External policy-check collaborator gating goal approval
#[async_trait]
pub trait CovenantValidator: Send + Sync {
    /// Check whether an action is permitted; rejection is data, not an error
    async fn validate_action(&self, action: &str, context: &str) -> Verdict;

    /// Score a text along the three alignment axes; the caller clamps
    async fn evaluate_alignment(&self, text: &str) -> AlignmentScores;
}

/// Permissive validator used when no real covenant service is wired
pub struct OpenCovenant;

#[async_trait]
impl CovenantValidator for OpenCovenant {
    async fn validate_action(&self, _action: &str, _context: &str) -> Verdict {
        Verdict::approve()
    }

    async fn evaluate_alignment(&self, _text: &str) -> AlignmentScores {
        AlignmentScores::default()
    }
}
