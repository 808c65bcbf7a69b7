//! Tenure stability: rewards long unbroken tenures over frequent short stints,
//! independently of total experience.

/// Tenure points for one relevant role, bucketed by whole months:
/// <6 → 0.25, [6,12) → 0.5, [12,24) → 1.0, [24,36) → 1.5, ≥36 → 2.0
pub fn tenure_points(months: u32) -> f64 {
    match months {
        0..=5 => 0.25,
        6..=11 => 0.5,
        12..=23 => 1.0,
        24..=35 => 1.5,
        _ => 2.0,
    }
}

/// Average tenure points × 100, capped at 100. No roles scores 0.
///
/// Takes one tenure per relevant role; overlapping roles are not merged first.
pub fn stability_score(tenure_months: &[u32]) -> f64 {
    if tenure_months.is_empty() {
        return 0.0;
    }
    let total: f64 = tenure_months.iter().copied().map(tenure_points).sum();
    (total / tenure_months.len() as f64 * 100.0).min(100.0)
}
