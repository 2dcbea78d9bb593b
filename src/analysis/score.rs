use crate::analysis::{deadline, labels};
use crate::models::category::{Category, ScoringInputs};
use crate::models::issue::Issue;
use crate::models::score::{CategoryScore, ScoreResult, ScoredIssue};
use chrono::NaiveDate;

/// Round to 2 decimal places, deciding on the exact binary value of `value`
/// with ties away from zero. `0.475` is stored just below the midpoint and
/// becomes `0.47`; `0.125` is an exact tie and becomes `0.13`.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let magnitude = value.abs();

    // `mul_add` rounds once, so the sign of `magnitude * k - n` is exact.
    let mut cents = (magnitude * 100.0).floor();
    if magnitude.mul_add(100.0, -cents) < 0.0 {
        cents -= 1.0;
    } else if magnitude.mul_add(100.0, -(cents + 1.0)) >= 0.0 {
        cents += 1.0;
    }
    if magnitude.mul_add(200.0, -(2.0 * cents + 1.0)) >= 0.0 {
        cents += 1.0;
    }

    let rounded = cents / 100.0;
    if value < 0.0 {
        -rounded
    } else {
        rounded
    }
}

/// Score an issue across the five built-in categories.
///
/// Every subtotal is rounded before summing, and the sum is rounded again.
/// Missing client, label or weight data contributes zero (or the default
/// weight) instead of failing.
pub fn compute_score(issue: &Issue, inputs: &ScoringInputs, today: NaiveDate) -> ScoreResult {
    let breakdown: Vec<CategoryScore> = Category::ALL
        .iter()
        .map(|category| category_score(*category, issue, inputs, today))
        .collect();

    let total_score = round2(breakdown.iter().map(|entry| entry.subtotal).sum());

    ScoreResult {
        total_score,
        breakdown,
    }
}

/// Score an issue and wrap it for ranking. The rank is left unset.
pub fn score_issue(issue: Issue, inputs: &ScoringInputs, today: NaiveDate) -> ScoredIssue {
    let ScoreResult {
        total_score,
        breakdown,
    } = compute_score(&issue, inputs, today);

    ScoredIssue {
        workflow_status: labels::workflow_status(&issue.labels),
        issue,
        total_score,
        breakdown,
        band: None,
        priority_rank: None,
    }
}

fn category_score(
    category: Category,
    issue: &Issue,
    inputs: &ScoringInputs,
    today: NaiveDate,
) -> CategoryScore {
    let (classification, raw_score) = match category {
        Category::Cliente => {
            let score = inputs
                .client_scores
                .get(&issue.client_code)
                .copied()
                .unwrap_or(0.0);
            (issue.client_code.clone(), score)
        }
        Category::Prazo => {
            let display = issue
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            (display, deadline::deadline_score(issue.due_date, today))
        }
        Category::Urgencia | Category::Complexidade | Category::Impacto => {
            let value = labels::extract_classification(&issue.labels, category.name());
            let score = if value.is_empty() {
                0.0
            } else {
                inputs
                    .label_scores
                    .get(&labels::label_key(category.name(), &value))
                    .copied()
                    .unwrap_or(0.0)
            };
            (value, score)
        }
    };

    let weight = inputs.weights.weight_for(category);

    CategoryScore {
        category: category.name().to_string(),
        weight,
        classification,
        raw_score,
        subtotal: round2(raw_score * weight / 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::CategoryWeights;
    use crate::models::issue::IssueStatus;
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).expect("valid date")
    }

    fn issue(client: &str, labels: &[&str], due: Option<NaiveDate>) -> Issue {
        Issue {
            id: 1,
            ticket_number: 101,
            title: "Falha na integração".to_string(),
            project: "Sustentação".to_string(),
            repository: "erp".to_string(),
            client_code: client.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            status: IssueStatus::Opened,
            opened_at: None,
            due_date: due,
            closed_at: None,
            responsible: "Indefinido".to_string(),
            link: String::new(),
        }
    }

    fn inputs() -> ScoringInputs {
        ScoringInputs {
            client_scores: HashMap::from([("ACME".to_string(), 8.0)]),
            label_scores: HashMap::from([
                ("Urgência / Alto".to_string(), 7.5),
                ("Complexidade / Baixo".to_string(), 2.5),
                ("Impacto / Alto".to_string(), 10.0),
            ]),
            weights: CategoryWeights::default(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn overdue_issue_with_labels_matches_reference_breakdown() {
        let due = today() - chrono::Duration::days(15);
        let subject = issue("ACME", &["Urgência / Alto", "Complexidade / Baixo"], Some(due));

        let result = compute_score(&subject, &inputs(), today());
        let subtotals: Vec<f64> = result.breakdown.iter().map(|c| c.subtotal).collect();
        let names: Vec<&str> = result.breakdown.iter().map(|c| c.category.as_str()).collect();

        assert_eq!(names, vec!["Cliente", "Prazo", "Urgência", "Complexidade", "Impacto"]);
        assert_eq!(result.breakdown[1].raw_score, 20.0);
        assert!(close(subtotals[0], 2.4));
        assert!(close(subtotals[1], 6.0));
        assert!(close(subtotals[2], 1.5));
        assert!(close(subtotals[3], 0.38));
        assert!(close(subtotals[4], 0.0));
        assert!(close(result.total_score, 10.28));
        assert_eq!(result.breakdown[2].classification, "Alto");
        assert_eq!(result.breakdown[4].classification, "");
    }

    #[test]
    fn empty_weight_map_uses_default_table() {
        let result = compute_score(&issue("ACME", &[], None), &inputs(), today());
        let weights: Vec<f64> = result.breakdown.iter().map(|c| c.weight).collect();
        assert_eq!(weights, vec![30.0, 30.0, 20.0, 15.0, 5.0]);
    }

    #[test]
    fn unknown_client_without_labels_or_due_date_scores_zero() {
        let result = compute_score(&issue("NOPE", &[], None), &inputs(), today());
        assert_eq!(result.total_score, 0.0);
        assert!(result.breakdown.iter().all(|c| c.raw_score == 0.0));
    }

    #[test]
    fn unscored_label_value_contributes_zero() {
        let subject = issue("NOPE", &["Urgência / Inexistente"], None);
        let result = compute_score(&subject, &inputs(), today());
        assert_eq!(result.breakdown[2].classification, "Inexistente");
        assert_eq!(result.breakdown[2].raw_score, 0.0);
    }

    #[test]
    fn subtotals_are_rounded_before_summing() {
        let mut scoring = inputs();
        scoring.label_scores.insert("Urgência / Baixo".to_string(), 2.5);
        scoring.weights.insert("Urgência", 15.0);
        let subject = issue("NOPE", &["Urgência / Baixo", "Complexidade / Baixo"], None);

        let result = compute_score(&subject, &scoring, today());

        // 0.375 + 0.375 would round to 0.75; rounded subtotals sum to 0.76.
        assert!(close(result.total_score, 0.76));
    }

    #[test]
    fn round2_decides_on_the_stored_binary_value() {
        let cases = [
            (9.5 * 5.0 / 100.0, 0.47),
            (0.5 * 15.0 / 100.0, 0.07),
            (2.3 * 15.0 / 100.0, 0.34),
            (7.1 * 15.0 / 100.0, 1.06),
            (2.5 * 15.0 / 100.0, 0.38),
            (0.125, 0.13),
            (-0.125, -0.13),
            (2.4, 2.4),
            (0.0, 0.0),
        ];
        for (value, expected) in cases {
            assert_eq!(round2(value), expected, "round2({value})");
        }
    }

    #[test]
    fn near_midpoint_subtotals_round_down_and_total_sums_them() {
        let mut scoring = inputs();
        scoring.label_scores.insert("Impacto / Médio".to_string(), 9.5);
        scoring.label_scores.insert("Complexidade / Mínima".to_string(), 0.5);
        scoring.label_scores.insert("Urgência / Média".to_string(), 2.3);
        scoring.weights.insert("Urgência", 15.0);
        let subject = issue(
            "NOPE",
            &["Impacto / Médio", "Complexidade / Mínima", "Urgência / Média"],
            None,
        );

        let result = compute_score(&subject, &scoring, today());
        let subtotals: Vec<f64> = result.breakdown.iter().map(|c| c.subtotal).collect();

        assert_eq!(subtotals, vec![0.0, 0.0, 0.34, 0.07, 0.47]);
        assert_eq!(result.total_score, 0.88);
    }

    #[test]
    fn weights_are_not_normalized() {
        let mut scoring = inputs();
        for category in Category::ALL {
            scoring.weights.insert(category.name(), 100.0);
        }
        let subject = issue("ACME", &["Impacto / Alto"], None);

        let result = compute_score(&subject, &scoring, today());
        assert!(close(result.total_score, 18.0));
    }

    #[test]
    fn score_issue_derives_workflow_status_and_leaves_rank_unset() {
        let subject = issue("ACME", &["Status / Em teste"], None);
        let scored = score_issue(subject, &inputs(), today());
        assert_eq!(scored.workflow_status, "Status / Em teste");
        assert!(scored.priority_rank.is_none());
        assert!(close(scored.total_score, 2.4));
    }
}
