use crate::models::score::{ScoreBand, ScoreBands, ScoredIssue};

/// Sort a batch by descending total score and number it from 1.
///
/// The sort is stable: equal totals keep their input order.
pub fn rank(mut issues: Vec<ScoredIssue>) -> Vec<ScoredIssue> {
    issues.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    for (index, issue) in issues.iter_mut().enumerate() {
        issue.priority_rank = Some(index + 1);
    }
    issues
}

pub fn assign_bands(issues: &mut [ScoredIssue], bands: &ScoreBands) {
    for issue in issues {
        issue.band = Some(ScoreBand::from_score(issue.total_score, bands));
    }
}
