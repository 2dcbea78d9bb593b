use crate::error::EngineResult;
use crate::models::category::CategoryWeights;
use crate::models::issue::Issue;
use std::collections::HashMap;

/// Read side of the classification store. Misses are simply absent entries.
pub trait ClassificationSource {
    fn client_scores(&self) -> EngineResult<HashMap<String, f64>>;
    fn label_scores(&self) -> EngineResult<HashMap<String, f64>>;
    fn category_weights(&self) -> EngineResult<CategoryWeights>;
}

/// Issue lookups and the one-hop successor relation.
pub trait IssueGraph {
    /// Internal id of the issue carrying this external ticket number.
    fn resolve_ticket_number(&self, ticket_number: i64) -> EngineResult<Option<i64>>;
    fn find_issue(&self, id: i64) -> EngineResult<Option<Issue>>;
    fn successor_ids(&self, id: i64) -> EngineResult<Vec<i64>>;
    /// Issues for `ids`, in the order the source considers natural.
    fn find_issues(&self, ids: &[i64]) -> EngineResult<Vec<Issue>>;
}
