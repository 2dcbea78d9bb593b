use chrono::NaiveDate;

/// Whole calendar days between `due` and `today`. Positive when overdue.
pub fn days_overdue(due: NaiveDate, today: NaiveDate) -> i64 {
    today.signed_duration_since(due).num_days()
}

/// Piecewise escalation of the overdue penalty (0–10: ×1, 10–20: ×2,
/// 20–30: ×3, beyond: ×5). Not clamped.
pub fn decay_score(days_overdue: i64) -> f64 {
    let d = days_overdue;
    let score = if d <= 0 {
        0
    } else if d <= 10 {
        d
    } else if d <= 20 {
        10 + (d - 10) * 2
    } else if d <= 30 {
        30 + (d - 20) * 3
    } else {
        60 + (d - 30) * 5
    };
    score as f64
}

/// Overdue score for a nullable due date; zero when absent, today or ahead.
pub fn deadline_score(due: Option<NaiveDate>, today: NaiveDate) -> f64 {
    due.map(|due| decay_score(days_overdue(due, today)))
        .unwrap_or(0.0)
}
