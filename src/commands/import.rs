use crate::commands::db;
use crate::error::{EngineError, EngineResult};
use crate::models::issue::{Issue, SuccessorEdge};
use serde::{Deserialize, Serialize};

/// Snapshot produced by the tracker sync: issues plus their successor links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueBundle {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub links: Vec<SuccessorEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub issues: usize,
    pub links: usize,
}

pub async fn import_issues(data_dir: String, bundle_path: String) -> EngineResult<ImportReport> {
    let raw = std::fs::read_to_string(&bundle_path)?;
    let bundle: IssueBundle = serde_json::from_str(&raw)
        .map_err(|e| EngineError::InvalidInput(format!("{bundle_path}: {e}")))?;
    import_bundle(&data_dir, &bundle)
}

pub fn import_bundle(data_dir: &str, bundle: &IssueBundle) -> EngineResult<ImportReport> {
    let conn = db::get_db_connection(data_dir)?;
    db::upsert_issues(&conn, &bundle.issues)?;
    db::link_issues(&conn, &bundle.links)?;

    log::info!(
        "imported {} issues and {} successor links",
        bundle.issues.len(),
        bundle.links.len()
    );
    Ok(ImportReport {
        issues: bundle.issues.len(),
        links: bundle.links.len(),
    })
}
