use crate::models::issue::Issue;
use serde::{Deserialize, Serialize};

/// One row of a score breakdown. `subtotal` is already rounded to 2 places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub weight: f64,
    pub classification: String,
    pub raw_score: f64,
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: f64,
    pub breakdown: Vec<CategoryScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Low,
    Attention,
    High,
    Critical,
}

/// Lower bounds of the attention/high/critical bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBands {
    pub attention: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            attention: 25.0,
            high: 50.0,
            critical: 75.0,
        }
    }
}

impl ScoreBand {
    pub fn from_score(score: f64, bands: &ScoreBands) -> Self {
        match score {
            s if s < bands.attention => ScoreBand::Low,
            s if s < bands.high => ScoreBand::Attention,
            s if s < bands.critical => ScoreBand::High,
            _ => ScoreBand::Critical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredIssue {
    #[serde(flatten)]
    pub issue: Issue,
    pub workflow_status: String,
    pub total_score: f64,
    pub breakdown: Vec<CategoryScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<ScoreBand>,
    /// 1-based position inside the batch it was ranked in. Not an identifier.
    pub priority_rank: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessorIssue {
    #[serde(flatten)]
    pub scored: ScoredIssue,
    pub completion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectGroup {
    pub project: String,
    pub issues: Vec<SuccessorIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessorView {
    pub origin: Issue,
    pub origin_score: ScoreResult,
    pub successors: Vec<SuccessorIssue>,
    pub by_project: Vec<ProjectGroup>,
    pub linked_count: usize,
    pub completed_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectHealth {
    Stable,
    Unstable,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project: String,
    pub open: usize,
    pub open_on_time: usize,
    pub open_overdue: usize,
    pub closed: usize,
    pub closed_on_time: usize,
    pub closed_late: usize,
    pub health: ProjectHealth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_use_lower_bounds() {
        let bands = ScoreBands::default();
        assert_eq!(ScoreBand::from_score(0.0, &bands), ScoreBand::Low);
        assert_eq!(ScoreBand::from_score(24.99, &bands), ScoreBand::Low);
        assert_eq!(ScoreBand::from_score(25.0, &bands), ScoreBand::Attention);
        assert_eq!(ScoreBand::from_score(50.0, &bands), ScoreBand::High);
        assert_eq!(ScoreBand::from_score(75.0, &bands), ScoreBand::Critical);
        assert_eq!(ScoreBand::from_score(410.5, &bands), ScoreBand::Critical);
    }
}
