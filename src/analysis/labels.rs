/// Fallback shown when an issue carries no `Status / ...` label.
pub const UNDEFINED_WORKFLOW_STATUS: &str = "Status não definido";

/// Return the value of the first label of the form `"<prefix> / <value>"`,
/// or an empty string when no label belongs to `prefix`.
pub fn extract_classification(labels: &[String], prefix: &str) -> String {
    let marker = format!("{prefix} / ");
    labels
        .iter()
        .find_map(|label| label.strip_prefix(marker.as_str()))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Full label key used by the label score table.
pub fn label_key(prefix: &str, classification: &str) -> String {
    format!("{prefix} / {classification}")
}

/// Workflow status taken from the first `Status / ...` label.
pub fn workflow_status(labels: &[String]) -> String {
    labels
        .iter()
        .find(|label| label.starts_with("Status /"))
        .cloned()
        .unwrap_or_else(|| UNDEFINED_WORKFLOW_STATUS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_value_after_prefix() {
        let set = labels(&["Impacto / Alto", "Urgência / Média"]);
        assert_eq!(extract_classification(&set, "Urgência"), "Média");
        assert_eq!(extract_classification(&set, "Impacto"), "Alto");
    }

    #[test]
    fn first_match_in_array_order_wins() {
        let set = labels(&["Urgência / Baixo", "Urgência / Alto"]);
        assert_eq!(extract_classification(&set, "Urgência"), "Baixo");
    }

    #[test]
    fn prefix_must_match_exactly_with_separator() {
        let set = labels(&["Urgência/Alto", "Urgências / Alto", "urgência / Alto", "Urgencia / Alto"]);
        assert_eq!(extract_classification(&set, "Urgência"), "");
    }

    #[test]
    fn missing_category_yields_empty_string() {
        assert_eq!(extract_classification(&[], "Complexidade"), "");
    }

    #[test]
    fn workflow_status_falls_back_when_absent() {
        assert_eq!(workflow_status(&labels(&["Impacto / Alto"])), UNDEFINED_WORKFLOW_STATUS);
        assert_eq!(
            workflow_status(&labels(&["Impacto / Alto", "Status / Em andamento"])),
            "Status / Em andamento"
        );
    }
}
