use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Opened,
    Closed,
    #[serde(other)]
    Unknown,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Opened => "opened",
            IssueStatus::Closed => "closed",
            IssueStatus::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "opened" | "open" => IssueStatus::Opened,
            "closed" => IssueStatus::Closed,
            _ => IssueStatus::Unknown,
        }
    }
}

/// Issue mirrored from the external tracker. Read-only to the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub ticket_number: i64,
    #[serde(default)]
    pub title: String,
    pub project: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub client_code: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub status: IssueStatus,
    #[serde(default)]
    pub opened_at: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub closed_at: Option<NaiveDate>,
    #[serde(default)]
    pub responsible: String,
    #[serde(default)]
    pub link: String,
}

/// Directed "leads to" relation between two issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessorEdge {
    pub origin_id: i64,
    pub destination_id: i64,
}

/// Caller-side selection of the issues fed to the dashboard ranking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFilter {
    pub project: Option<String>,
    pub opened_from: Option<NaiveDate>,
    pub opened_to: Option<NaiveDate>,
}
