use crate::analysis::ranking::{assign_bands, rank};
use crate::analysis::score::{compute_score, score_issue};
use crate::analysis::sources::ClassificationSource;
use crate::analysis::summary::summarize_projects;
use crate::commands::db;
use crate::commands::settings::load_effective_settings;
use crate::error::{EngineError, EngineResult};
use crate::models::category::ScoringInputs;
use crate::models::issue::IssueFilter;
use crate::models::score::{ProjectSummary, ScoreResult, ScoredIssue};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueBreakdown {
    pub id: i64,
    pub ticket_number: i64,
    pub title: String,
    #[serde(flatten)]
    pub score: ScoreResult,
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Fetch client scores, label scores and category weights in parallel.
///
/// Each read runs on its own blocking task and connection; scoring starts
/// only once all three have completed.
pub async fn load_scoring_inputs(data_dir: &str) -> EngineResult<ScoringInputs> {
    let clients_dir = data_dir.to_string();
    let labels_dir = data_dir.to_string();
    let weights_dir = data_dir.to_string();

    let clients = tokio::task::spawn_blocking(move || -> EngineResult<_> {
        db::get_db_connection(&clients_dir)?.client_scores()
    });
    let labels = tokio::task::spawn_blocking(move || -> EngineResult<_> {
        db::get_db_connection(&labels_dir)?.label_scores()
    });
    let weights = tokio::task::spawn_blocking(move || -> EngineResult<_> {
        db::get_db_connection(&weights_dir)?.category_weights()
    });

    let (clients, labels, weights) = tokio::try_join!(clients, labels, weights)?;

    Ok(ScoringInputs {
        client_scores: clients?,
        label_scores: labels?,
        weights: weights?,
    })
}

pub async fn get_ranked_issues(data_dir: String, filter: IssueFilter) -> EngineResult<Vec<ScoredIssue>> {
    get_ranked_issues_internal(&data_dir, &filter, today()).await
}

pub async fn get_ranked_issues_internal(
    data_dir: &str,
    filter: &IssueFilter,
    today: NaiveDate,
) -> EngineResult<Vec<ScoredIssue>> {
    let settings = load_effective_settings(data_dir)?;
    let issues = {
        let conn = db::get_db_connection(data_dir)?;
        db::load_open_issues(&conn, filter)?
    };
    let inputs = load_scoring_inputs(data_dir).await?;

    let mut ranked = rank(
        issues
            .into_iter()
            .map(|issue| score_issue(issue, &inputs, today))
            .collect(),
    );
    assign_bands(&mut ranked, &settings.score_bands);

    log::info!(
        "ranked {} open issues (project: {})",
        ranked.len(),
        filter.project.as_deref().unwrap_or("all")
    );
    Ok(ranked)
}

pub async fn get_issue_breakdown(data_dir: String, id: i64) -> EngineResult<IssueBreakdown> {
    get_issue_breakdown_internal(&data_dir, id, today()).await
}

pub async fn get_issue_breakdown_internal(
    data_dir: &str,
    id: i64,
    today: NaiveDate,
) -> EngineResult<IssueBreakdown> {
    let issue = {
        let conn = db::get_db_connection(data_dir)?;
        db::load_issue(&conn, id)?.ok_or(EngineError::IssueNotFound(id))?
    };
    let inputs = load_scoring_inputs(data_dir).await?;

    Ok(IssueBreakdown {
        id: issue.id,
        ticket_number: issue.ticket_number,
        title: issue.title.clone(),
        score: compute_score(&issue, &inputs, today),
    })
}

pub async fn get_project_summary(
    data_dir: String,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> EngineResult<Vec<ProjectSummary>> {
    get_project_summary_internal(&data_dir, from, to, today())
}

pub fn get_project_summary_internal(
    data_dir: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> EngineResult<Vec<ProjectSummary>> {
    let settings = load_effective_settings(data_dir)?;
    let conn = db::get_db_connection(data_dir)?;
    let issues = db::load_issues_in_period(&conn, from, to)?;
    Ok(summarize_projects(&issues, today, settings.critical_overdue_ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::{Issue, IssueStatus};

    fn issue(id: i64, client: &str, labels: &[&str]) -> Issue {
        Issue {
            id,
            ticket_number: id + 100,
            title: format!("issue {id}"),
            project: "Projetos".to_string(),
            repository: String::new(),
            client_code: client.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            status: IssueStatus::Opened,
            opened_at: None,
            due_date: None,
            closed_at: None,
            responsible: String::new(),
            link: String::new(),
        }
    }

    fn seeded_dir() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("temp dir");
        let data_dir = dir.path().to_string_lossy().to_string();
        let conn = db::get_db_connection(&data_dir).expect("db");
        conn.execute_batch(
            "INSERT INTO client_scores (client_code, score) VALUES ('ACME', 10);
             INSERT INTO label_scores (label, score) VALUES ('Impacto / Alto', 10);",
        )
        .expect("seed");
        db::upsert_issues(
            &conn,
            &[issue(1, "", &[]), issue(2, "ACME", &[]), issue(3, "ACME", &["Impacto / Alto"])],
        )
        .expect("issues");
        (dir, data_dir)
    }

    #[tokio::test]
    async fn loads_all_three_classification_maps() {
        let (_tmp, data_dir) = seeded_dir();
        let inputs = load_scoring_inputs(&data_dir).await.expect("inputs");
        assert_eq!(inputs.client_scores.get("ACME"), Some(&10.0));
        assert_eq!(inputs.label_scores.get("Impacto / Alto"), Some(&10.0));
        assert_eq!(inputs.weights.get("Cliente"), Some(30.0));
    }

    #[tokio::test]
    async fn ranks_dashboard_batch_and_assigns_bands() {
        let (_tmp, data_dir) = seeded_dir();
        let ranked = get_ranked_issues_internal(&data_dir, &IssueFilter::default(), today())
            .await
            .expect("ranked");

        let order: Vec<(i64, Option<usize>)> =
            ranked.iter().map(|s| (s.issue.id, s.priority_rank)).collect();
        assert_eq!(order, vec![(3, Some(1)), (2, Some(2)), (1, Some(3))]);
        assert!(ranked.iter().all(|s| s.band.is_some()));
        assert_eq!(ranked[0].total_score, 3.5);
    }

    #[tokio::test]
    async fn breakdown_of_unknown_issue_is_not_found() {
        let (_tmp, data_dir) = seeded_dir();
        let err = get_issue_breakdown_internal(&data_dir, 42, today())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::IssueNotFound(42)));

        let found = get_issue_breakdown_internal(&data_dir, 2, today())
            .await
            .expect("breakdown");
        assert_eq!(found.score.total_score, 3.0);
        assert_eq!(found.score.breakdown.len(), 5);
    }
}
