use chrono::{DateTime, Duration, Utc};

use crate::model::cycle::{BurndownPoint, Cycle, SprintWindow};
use crate::util::round1;

/// Allowed drift between a cycle's bounds and the configured sprint window.
pub const WINDOW_TOLERANCE_DAYS: i64 = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CyclePair {
    pub current: Option<Cycle>,
    pub next: Option<Cycle>,
}

fn within_tolerance(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).num_seconds().abs() <= WINDOW_TOLERANCE_DAYS * 86_400
}

/// Pick the cycle matching `window` and its chronological successor.
///
/// Cycles are sorted by start (id breaks ties) so the result does not depend on input order.
/// Without a window match, the latest-started cycle containing `now` is current.
pub fn resolve_cycles(cycles: &[Cycle], window: &SprintWindow, now: DateTime<Utc>) -> CyclePair {
    let mut sorted: Vec<&Cycle> = cycles.iter().collect();
    sorted.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id)));

    let target_start = window.start_utc();
    let target_end = window.end_utc();

    let matched = sorted.iter().position(|c| {
        within_tolerance(c.starts_at, target_start) && within_tolerance(c.ends_at, target_end)
    });
    let current_idx = matched.or_else(|| sorted.iter().rposition(|c| c.contains(now)));

    match current_idx {
        Some(idx) => CyclePair {
            current: Some(sorted[idx].clone()),
            next: sorted.get(idx + 1).map(|c| (*c).clone()),
        },
        None => CyclePair::default(),
    }
}

/// Remaining scope per recorded day plus an ideal line that decays linearly over the whole sprint.
pub fn burndown(cycle: &Cycle) -> Vec<BurndownPoint> {
    let scope = &cycle.scope_history;
    let Some(&initial) = scope.first() else {
        return Vec::new();
    };
    let sprint_days = cycle.total_days() as f64;

    scope
        .iter()
        .zip(cycle.completed_scope_history.iter())
        .enumerate()
        .map(|(i, (&total, &done))| {
            let day = cycle.starts_at + Duration::days(i as i64);
            let ideal = (initial - (initial / sprint_days) * i as f64).max(0.0);
            BurndownPoint {
                day: day.format("%b %d").to_string(),
                remaining: (total - done).max(0.0),
                ideal: round1(ideal),
            }
        })
        .collect()
}
