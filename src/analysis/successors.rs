use crate::analysis::completion::completion_text;
use crate::analysis::ranking::{assign_bands, rank};
use crate::analysis::score::{compute_score, score_issue};
use crate::analysis::sources::IssueGraph;
use crate::error::{EngineError, EngineResult};
use crate::models::category::ScoringInputs;
use crate::models::issue::{Issue, IssueStatus};
use crate::models::score::{ProjectGroup, ScoreBands, SuccessorIssue, SuccessorView};
use chrono::NaiveDate;

/// Resolve `reference` (ticket number first, then internal id) to the origin issue.
pub fn resolve_origin<G: IssueGraph + ?Sized>(graph: &G, reference: i64) -> EngineResult<Issue> {
    let id = graph.resolve_ticket_number(reference)?.unwrap_or(reference);
    graph
        .find_issue(id)?
        .ok_or_else(|| EngineError::OriginNotFound(reference.to_string()))
}

/// Score and rank the direct successors of `origin`. Only one hop is followed,
/// so cycles in the relation cannot cause repeated work.
pub fn score_successors<G: IssueGraph + ?Sized>(
    graph: &G,
    origin: Issue,
    inputs: &ScoringInputs,
    today: NaiveDate,
    bands: &ScoreBands,
    date_format: &str,
) -> EngineResult<SuccessorView> {
    let mut ids = graph.successor_ids(origin.id)?;
    ids.sort_unstable();
    ids.dedup();

    let destinations = if ids.is_empty() {
        Vec::new()
    } else {
        graph.find_issues(&ids)?
    };

    let mut ranked = rank(
        destinations
            .into_iter()
            .map(|issue| score_issue(issue, inputs, today))
            .collect(),
    );
    assign_bands(&mut ranked, bands);

    let successors: Vec<SuccessorIssue> = ranked
        .into_iter()
        .map(|scored| SuccessorIssue {
            completion: completion_text(&scored.issue, date_format),
            scored,
        })
        .collect();

    let origin_score = compute_score(&origin, inputs, today);
    let completed_count = successors
        .iter()
        .filter(|s| s.scored.issue.status == IssueStatus::Closed)
        .count();

    Ok(SuccessorView {
        origin,
        origin_score,
        linked_count: successors.len(),
        completed_count,
        by_project: group_by_project(&successors),
        successors,
    })
}

fn group_by_project(successors: &[SuccessorIssue]) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    for successor in successors {
        let project = &successor.scored.issue.project;
        match groups.iter_mut().find(|g| &g.project == project) {
            Some(group) => group.issues.push(successor.clone()),
            None => groups.push(ProjectGroup {
                project: project.clone(),
                issues: vec![successor.clone()],
            }),
        }
    }
    groups
}
