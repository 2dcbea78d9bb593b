use crate::models::issue::{Issue, IssueStatus};

/// Human-readable completion status shown next to a successor issue.
pub fn completion_text(issue: &Issue, date_format: &str) -> String {
    match issue.status {
        IssueStatus::Closed => match issue.closed_at {
            Some(closed) => format!("Concluído em {}", closed.format(date_format)),
            None => "Concluído em data não informada".to_string(),
        },
        IssueStatus::Opened => match issue.due_date {
            Some(due) => format!("Expectativa de conclusão {}", due.format(date_format)),
            None => "Sem expectativa de conclusão".to_string(),
        },
        IssueStatus::Unknown => "Sem informação de conclusão".to_string(),
    }
}
