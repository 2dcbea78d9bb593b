use crate::models::issue::{Issue, IssueStatus};
use crate::models::score::{ProjectHealth, ProjectSummary};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Per-project open/closed and on-time/late counts, sorted by project name.
pub fn summarize_projects(
    issues: &[Issue],
    today: NaiveDate,
    critical_overdue_ratio: f64,
) -> Vec<ProjectSummary> {
    let mut counts: BTreeMap<&str, [usize; 6]> = BTreeMap::new();

    for issue in issues {
        let entry = counts.entry(issue.project.as_str()).or_default();
        match issue.status {
            IssueStatus::Opened => {
                entry[0] += 1;
                match issue.due_date {
                    Some(due) if due < today => entry[2] += 1,
                    _ => entry[1] += 1,
                }
            }
            IssueStatus::Closed => {
                entry[3] += 1;
                match (issue.closed_at, issue.due_date) {
                    (Some(closed), Some(due)) if closed > due => entry[5] += 1,
                    _ => entry[4] += 1,
                }
            }
            IssueStatus::Unknown => {}
        }
    }

    counts
        .into_iter()
        .map(|(project, c)| ProjectSummary {
            project: project.to_string(),
            open: c[0],
            open_on_time: c[1],
            open_overdue: c[2],
            closed: c[3],
            closed_on_time: c[4],
            closed_late: c[5],
            health: project_health(c[0], c[2], critical_overdue_ratio),
        })
        .collect()
}

pub fn project_health(open: usize, overdue: usize, critical_overdue_ratio: f64) -> ProjectHealth {
    if open == 0 || overdue == 0 {
        return ProjectHealth::Stable;
    }
    if overdue as f64 / open as f64 > critical_overdue_ratio {
        ProjectHealth::Critical
    } else {
        ProjectHealth::Unstable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).expect("valid date")
    }

    fn issue(project: &str, status: IssueStatus, due: Option<u32>, closed: Option<u32>) -> Issue {
        Issue {
            id: 0,
            ticket_number: 0,
            title: String::new(),
            project: project.to_string(),
            repository: String::new(),
            client_code: String::new(),
            labels: Vec::new(),
            status,
            opened_at: None,
            due_date: due.map(date),
            closed_at: closed.map(date),
            responsible: String::new(),
            link: String::new(),
        }
    }

    #[test]
    fn counts_open_and_closed_by_deadline() {
        let issues = vec![
            issue("QA", IssueStatus::Opened, Some(10), None),
            issue("QA", IssueStatus::Opened, Some(20), None),
            issue("QA", IssueStatus::Opened, None, None),
            issue("QA", IssueStatus::Closed, Some(10), Some(12)),
            issue("QA", IssueStatus::Closed, Some(10), Some(10)),
            issue("CMO", IssueStatus::Closed, None, Some(3)),
        ];

        let summary = summarize_projects(&issues, date(20), 0.2);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].project, "CMO");
        assert_eq!(summary[0].health, ProjectHealth::Stable);

        let qa = &summary[1];
        assert_eq!((qa.open, qa.open_on_time, qa.open_overdue), (3, 2, 1));
        assert_eq!((qa.closed, qa.closed_on_time, qa.closed_late), (2, 1, 1));
        assert_eq!(qa.health, ProjectHealth::Critical);
    }

    #[test]
    fn health_thresholds() {
        assert_eq!(project_health(0, 0, 0.2), ProjectHealth::Stable);
        assert_eq!(project_health(10, 0, 0.2), ProjectHealth::Stable);
        assert_eq!(project_health(10, 2, 0.2), ProjectHealth::Unstable);
        assert_eq!(project_health(10, 3, 0.2), ProjectHealth::Critical);
    }
}
