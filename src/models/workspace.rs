use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDirMeta {
    pub path: String,
    pub issue_count: usize,
    pub open_issue_count: usize,
    pub link_count: usize,
    pub category_count: usize,
}
