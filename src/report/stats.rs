use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::cycle::{BurndownPoint, Cycle};
use crate::model::issue::{Issue, UNASSIGNED};
use crate::snapshot::CycleSnapshot;
use crate::util::round1;
use crate::util::text::truncate;

pub const BLOCKED_LABEL: &str = "blocked";

/// `100 * part / whole` to one decimal, or 0 when there is nothing to divide by.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        round1(100.0 * part / whole)
    }
}

pub fn is_blocked(issue: &Issue) -> bool {
    issue.has_label(BLOCKED_LABEL)
}

/// In progress with no update for more than `threshold_days` whole days.
pub fn is_stale(issue: &Issue, now: DateTime<Utc>, threshold_days: i64) -> bool {
    if !issue.is_started() {
        return false;
    }
    issue
        .updated_at
        .map(|updated| (now - updated).num_days() > threshold_days)
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineerRollup {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub points: f64,
    pub done_points: f64,
}

/// Current-sprint progress for one pod. A pod without a current cycle is all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct PodStats {
    pub pod: String,
    pub color: String,
    pub cycle_name: Option<String>,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub canceled: usize,
    pub total_pts: f64,
    pub done_pts: f64,
    pub pct_tickets: f64,
    pub pct_points: f64,
    pub engineers: BTreeMap<String, EngineerRollup>,
    pub blocked: Vec<Issue>,
    pub stale: Vec<Issue>,
    pub burndown: Vec<BurndownPoint>,
}

impl PodStats {
    pub fn from_cycle(
        pod: &str,
        color: &str,
        current: Option<&CycleSnapshot>,
        now: DateTime<Utc>,
        stale_days: i64,
    ) -> Self {
        let issues: &[Issue] = current.map(|c| c.issues.as_slice()).unwrap_or(&[]);

        let total = issues.len();
        let completed = issues.iter().filter(|i| i.is_completed()).count();
        let in_progress = issues.iter().filter(|i| i.is_started()).count();
        let canceled = issues.iter().filter(|i| i.is_canceled()).count();
        let total_pts: f64 = issues.iter().map(Issue::points).sum();
        let done_pts: f64 = issues
            .iter()
            .filter(|i| i.is_completed())
            .map(Issue::points)
            .sum();

        let mut engineers: BTreeMap<String, EngineerRollup> = BTreeMap::new();
        for issue in issues {
            let entry = engineers.entry(issue.assignee_name().to_string()).or_default();
            entry.total += 1;
            entry.points += issue.points();
            if issue.is_completed() {
                entry.completed += 1;
                entry.done_points += issue.points();
            } else if issue.is_started() {
                entry.in_progress += 1;
            }
        }

        Self {
            pod: pod.to_string(),
            color: color.to_string(),
            cycle_name: current.map(|c| c.cycle.display_name()),
            total,
            completed,
            in_progress,
            canceled,
            total_pts,
            done_pts,
            pct_tickets: percentage(completed as f64, total as f64),
            pct_points: percentage(done_pts, total_pts),
            engineers,
            blocked: issues.iter().filter(|i| is_blocked(i)).cloned().collect(),
            stale: issues
                .iter()
                .filter(|i| is_stale(i, now, stale_days))
                .cloned()
                .collect(),
            burndown: current.map(|c| c.burndown.clone()).unwrap_or_default(),
        }
    }

    pub fn has_cycle(&self) -> bool {
        self.cycle_name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanRollup {
    pub total: usize,
    pub points: f64,
}

/// Planned work for one pod's next cycle, issues ranked heaviest first.
#[derive(Debug, Clone, PartialEq)]
pub struct NextSprintStats {
    pub pod: String,
    pub color: String,
    pub cycle: Cycle,
    pub total: usize,
    pub total_pts: f64,
    pub engineers: BTreeMap<String, PlanRollup>,
    pub issues: Vec<Issue>,
}

impl NextSprintStats {
    pub fn from_cycle(pod: &str, color: &str, next: &CycleSnapshot) -> Self {
        let mut engineers: BTreeMap<String, PlanRollup> = BTreeMap::new();
        for issue in &next.issues {
            let entry = engineers.entry(issue.assignee_name().to_string()).or_default();
            entry.total += 1;
            entry.points += issue.points();
        }

        let mut issues = next.issues.clone();
        sort_heaviest_first(&mut issues, Issue::points);

        Self {
            pod: pod.to_string(),
            color: color.to_string(),
            cycle: next.cycle.clone(),
            total: next.issues.len(),
            total_pts: next.issues.iter().map(Issue::points).sum(),
            engineers,
            issues,
        }
    }

    /// Named engineers only; unassigned work is left out of per-engineer charts.
    pub fn named_engineers(&self) -> impl Iterator<Item = (&String, &PlanRollup)> {
        self.engineers.iter().filter(|(name, _)| name.as_str() != UNASSIGNED)
    }
}

/// Stable descending sort, so equal weights keep fetch order.
fn sort_heaviest_first<T>(items: &mut [T], weight: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| weight(b).partial_cmp(&weight(a)).unwrap_or(Ordering::Equal));
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParetoEntry {
    pub label: String,
    pub title: String,
    pub pts: f64,
    pub pod: String,
    pub color: String,
    pub cumulative_pct: f64,
}

/// Rank next-sprint issues from every pod by points, keep the top `top_n`, and compute the
/// cumulative share of the kept set's points at each rank.
pub fn pareto(next: &[NextSprintStats], top_n: usize) -> Vec<ParetoEntry> {
    let mut entries: Vec<ParetoEntry> = next
        .iter()
        .flat_map(|ns| {
            ns.issues.iter().map(move |issue| ParetoEntry {
                label: issue.identifier.clone(),
                title: truncate(&issue.title, 50),
                pts: issue.points(),
                pod: ns.pod.clone(),
                color: ns.color.clone(),
                cumulative_pct: 0.0,
            })
        })
        .collect();
    sort_heaviest_first(&mut entries, |e| e.pts);
    entries.truncate(top_n);

    let kept_total: f64 = entries.iter().map(|e| e.pts).sum();
    let mut running = 0.0;
    for entry in &mut entries {
        running += entry.pts;
        entry.cumulative_pct = percentage(running, kept_total);
    }
    entries
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedIssue {
    pub pod: String,
    pub issue: Issue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallStats {
    pub total: usize,
    pub completed: usize,
    pub total_pts: f64,
    pub done_pts: f64,
    pub pct_tickets: f64,
    pub pct_points: f64,
    pub active_pods: usize,
    pub blocked: Vec<FlaggedIssue>,
    pub stale: Vec<FlaggedIssue>,
}

impl OverallStats {
    pub fn from_pods(pods: &[PodStats]) -> Self {
        let total: usize = pods.iter().map(|p| p.total).sum();
        let completed: usize = pods.iter().map(|p| p.completed).sum();
        let total_pts: f64 = pods.iter().map(|p| p.total_pts).sum();
        let done_pts: f64 = pods.iter().map(|p| p.done_pts).sum();

        let flag = |pick: fn(&PodStats) -> &Vec<Issue>| -> Vec<FlaggedIssue> {
            pods.iter()
                .flat_map(|p| {
                    pick(p).iter().map(move |issue| FlaggedIssue {
                        pod: p.pod.clone(),
                        issue: issue.clone(),
                    })
                })
                .collect()
        };

        Self {
            total,
            completed,
            total_pts,
            done_pts,
            pct_tickets: percentage(completed as f64, total as f64),
            pct_points: percentage(done_pts, total_pts),
            active_pods: pods.iter().filter(|p| p.has_cycle()).count(),
            blocked: flag(|p| &p.blocked),
            stale: flag(|p| &p.stale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap()
    }

    fn issue(id: &str, state: &str, estimate: Option<f64>) -> Issue {
        serde_json::from_value(serde_json::json!({
            "id": id, "identifier": id, "title": format!("Title of {id}"),
            "state": { "name": state, "type": state },
            "estimate": estimate
        }))
        .unwrap()
    }

    fn with_assignee(mut i: Issue, name: &str) -> Issue {
        i.assignee = Some(crate::model::issue::Assignee {
            name: name.into(),
            email: None,
        });
        i
    }

    fn cycle_snapshot(issues: Vec<Issue>) -> CycleSnapshot {
        CycleSnapshot {
            cycle: serde_json::from_value(serde_json::json!({
                "id": "c1", "name": "Sprint 7",
                "startsAt": "2026-02-11T00:00:00Z", "endsAt": "2026-02-24T00:00:00Z"
            }))
            .unwrap(),
            issues,
            burndown: vec![],
        }
    }

    #[test]
    fn wallet_scenario_counts_and_percentages() {
        let snap = cycle_snapshot(vec![
            issue("WAL-1", "completed", Some(3.0)),
            issue("WAL-2", "completed", Some(5.0)),
            issue("WAL-3", "started", Some(2.0)),
            issue("WAL-4", "backlog", Some(1.0)),
            issue("WAL-5", "cancelled", Some(4.0)),
        ]);
        let stats = PodStats::from_cycle("Wallet", "#ec4899", Some(&snap), now(), 3);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.canceled, 1);
        assert_eq!(stats.done_pts, 8.0);
        assert_eq!(stats.total_pts, 15.0);
        assert_eq!(stats.pct_tickets, 40.0);
        assert_eq!(stats.pct_points, 53.3);
        assert_eq!(stats.cycle_name.as_deref(), Some("Sprint 7"));
    }

    #[test]
    fn missing_estimates_count_as_zero() {
        let snap = cycle_snapshot(vec![
            issue("A-1", "completed", None),
            issue("A-2", "started", Some(2.0)),
        ]);
        let stats = PodStats::from_cycle("A", "#000", Some(&snap), now(), 3);
        assert_eq!(stats.total_pts, 2.0);
        assert_eq!(stats.done_pts, 0.0);
        assert_eq!(stats.pct_points, 0.0);
        assert_eq!(stats.pct_tickets, 50.0);
    }

    #[test]
    fn no_current_cycle_is_zero_filled() {
        let stats = PodStats::from_cycle("Cards", "#3b82f6", None, now(), 3);
        assert!(!stats.has_cycle());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.pct_tickets, 0.0);
        assert_eq!(stats.pct_points, 0.0);
        assert!(stats.engineers.is_empty());
        assert!(stats.burndown.is_empty());
    }

    #[test]
    fn bucket_counts_never_exceed_total() {
        let states = ["completed", "started", "canceled", "unstarted", "backlog", "triage"];
        let issues: Vec<Issue> = states
            .iter()
            .cycle()
            .take(20)
            .enumerate()
            .map(|(n, s)| issue(&format!("X-{n}"), s, Some(n as f64)))
            .collect();
        let stats = PodStats::from_cycle("X", "#000", Some(&cycle_snapshot(issues)), now(), 3);
        assert!(stats.completed + stats.in_progress + stats.canceled <= stats.total);
        assert!((0.0..=100.0).contains(&stats.pct_tickets));
        assert!((0.0..=100.0).contains(&stats.pct_points));
    }

    #[test]
    fn engineers_rollup_by_assignee() {
        let snap = cycle_snapshot(vec![
            with_assignee(issue("A-1", "completed", Some(3.0)), "Ana"),
            with_assignee(issue("A-2", "started", Some(2.0)), "Ana"),
            issue("A-3", "unstarted", Some(1.0)),
        ]);
        let stats = PodStats::from_cycle("A", "#000", Some(&snap), now(), 3);
        let ana = &stats.engineers["Ana"];
        assert_eq!((ana.total, ana.completed, ana.in_progress), (2, 1, 1));
        assert_eq!((ana.points, ana.done_points), (5.0, 3.0));
        assert_eq!(stats.engineers[UNASSIGNED].total, 1);
    }

    #[test]
    fn blocked_label_matches_case_insensitively() {
        let mut blocked = issue("B-1", "started", Some(1.0));
        blocked.labels.0 = vec!["BLOCKED".into()];
        let mut partial = issue("B-2", "started", Some(1.0));
        partial.labels.0 = vec!["blocked-by-vendor".into()];
        assert!(is_blocked(&blocked));
        assert!(!is_blocked(&partial));
    }

    #[test]
    fn stale_requires_started_and_old_update() {
        let mut old = issue("S-1", "started", None);
        old.updated_at = Some(now() - Duration::days(4));
        let mut edge = issue("S-2", "started", None);
        edge.updated_at = Some(now() - Duration::days(3) - Duration::hours(23));
        let mut done = issue("S-3", "completed", None);
        done.updated_at = Some(now() - Duration::days(10));
        let never = issue("S-4", "started", None);

        assert!(is_stale(&old, now(), 3));
        assert!(!is_stale(&edge, now(), 3));
        assert!(!is_stale(&done, now(), 3));
        assert!(!is_stale(&never, now(), 3));
        assert!(is_stale(&edge, now(), 2));
    }

    #[test]
    fn next_sprint_ranks_heaviest_first_keeping_ties_in_order() {
        let snap = cycle_snapshot(vec![
            issue("N-1", "unstarted", Some(2.0)),
            issue("N-2", "unstarted", Some(8.0)),
            issue("N-3", "unstarted", None),
            issue("N-4", "unstarted", Some(2.0)),
        ]);
        let next = NextSprintStats::from_cycle("Wallet", "#ec4899", &snap);
        let order: Vec<&str> = next.issues.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(order, vec!["N-2", "N-1", "N-4", "N-3"]);
        assert_eq!(next.total, 4);
        assert_eq!(next.total_pts, 12.0);
        assert_eq!(next.engineers[UNASSIGNED].points, 12.0);
        assert_eq!(next.named_engineers().count(), 0);
    }

    #[test]
    fn pareto_cumulative_is_monotone_and_ends_at_100() {
        let a = NextSprintStats::from_cycle(
            "A",
            "#111",
            &cycle_snapshot(vec![issue("A-1", "unstarted", Some(5.0)), issue("A-2", "unstarted", Some(1.0))]),
        );
        let b = NextSprintStats::from_cycle(
            "B",
            "#222",
            &cycle_snapshot(vec![issue("B-1", "unstarted", Some(3.0)), issue("B-2", "unstarted", Some(3.0))]),
        );
        let ranked = pareto(&[a, b], 25);
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].label, "A-1");
        assert_eq!(ranked[1].label, "B-1");
        assert_eq!(ranked[1].pod, "B");
        assert!(ranked.windows(2).all(|w| w[1].cumulative_pct >= w[0].cumulative_pct));
        assert_eq!(ranked.last().unwrap().cumulative_pct, 100.0);
    }

    #[test]
    fn pareto_percentages_are_of_the_truncated_set() {
        let next = NextSprintStats::from_cycle(
            "A",
            "#111",
            &cycle_snapshot(vec![
                issue("A-1", "unstarted", Some(6.0)),
                issue("A-2", "unstarted", Some(2.0)),
                issue("A-3", "unstarted", Some(2.0)),
            ]),
        );
        let ranked = pareto(&[next], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].cumulative_pct, 75.0);
        assert_eq!(ranked[1].cumulative_pct, 100.0);
        assert!(pareto(&[], 25).is_empty());
    }

    #[test]
    fn overall_sums_and_flattens_with_pod_names() {
        let mut blocked = issue("W-1", "started", Some(2.0));
        blocked.labels.0 = vec!["Blocked".into()];
        let wallet = PodStats::from_cycle(
            "Wallet",
            "#ec4899",
            Some(&cycle_snapshot(vec![blocked, issue("W-2", "completed", Some(2.0))])),
            now(),
            3,
        );
        let cards = PodStats::from_cycle("Cards", "#3b82f6", None, now(), 3);
        let overall = OverallStats::from_pods(&[wallet, cards]);

        assert_eq!(overall.total, 2);
        assert_eq!(overall.completed, 1);
        assert_eq!(overall.pct_tickets, 50.0);
        assert_eq!(overall.pct_points, 50.0);
        assert_eq!(overall.active_pods, 1);
        assert_eq!(overall.blocked.len(), 1);
        assert_eq!(overall.blocked[0].pod, "Wallet");
        assert!(overall.stale.is_empty());
    }

    #[test]
    fn overall_of_nothing_is_zero() {
        let overall = OverallStats::from_pods(&[]);
        assert_eq!(overall, OverallStats::default());
    }
}
