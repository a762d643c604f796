pub mod cycles;
pub mod linear;
pub mod sheets;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::cycle::{Cycle, SprintWindow};
use crate::model::issue::Issue;
use crate::model::team::Team;
use crate::snapshot::{CycleSnapshot, PodSnapshot, TrackerSnapshot};

#[async_trait]
pub trait IssueTracker: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_cycles(&self, team_id: &str) -> Result<Vec<Cycle>>;
    async fn fetch_cycle_issues(&self, cycle_id: &str) -> Result<Vec<Issue>>;
    /// Backlog and unstarted issues not planned into any cycle, highest priority first.
    async fn fetch_team_backlog(&self, team_id: &str) -> Result<Vec<Issue>>;
}

#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Rows of cell strings for an `'Tab'!A:Z` style range.
    async fn fetch_range(&self, range: &str) -> Result<Vec<Vec<String>>>;
}

#[cfg(test)]
pub mod tests;

/// Resolve a team's current and next cycles and fetch their issues.
pub async fn fetch_pod(
    tracker: &dyn IssueTracker,
    team: &Team,
    window: &SprintWindow,
    now: DateTime<Utc>,
) -> Result<PodSnapshot> {
    let cycles = tracker.fetch_cycles(&team.id).await?;
    let pair = cycles::resolve_cycles(&cycles, window, now);
    let mut pod = PodSnapshot::default();

    match pair.current {
        Some(cycle) => {
            let issues = tracker.fetch_cycle_issues(&cycle.id).await?;
            tracing::info!("  Current: {} issues", issues.len());
            let burndown = cycles::burndown(&cycle);
            pod.current = Some(CycleSnapshot {
                cycle,
                issues,
                burndown,
            });
        }
        None => {
            tracing::warn!("No current cycle found for {}", team.name);
            pod.backlog = tracker.fetch_team_backlog(&team.id).await?;
            tracing::info!("  Backlog: {} issues", pod.backlog.len());
        }
    }

    match pair.next {
        Some(cycle) => {
            let issues = tracker.fetch_cycle_issues(&cycle.id).await?;
            tracing::info!("  Next: {} issues", issues.len());
            pod.next = Some(CycleSnapshot {
                cycle,
                issues,
                burndown: Vec::new(),
            });
        }
        None => tracing::info!("  No next cycle found for {}", team.name),
    }

    Ok(pod)
}

/// Fetch every team in turn. A team whose fetch fails is logged and recorded with no data.
pub async fn collect_pods(
    tracker: &dyn IssueTracker,
    teams: &[Team],
    window: &SprintWindow,
    now: DateTime<Utc>,
) -> TrackerSnapshot {
    let mut pods = BTreeMap::new();
    for team in teams {
        tracing::info!("Fetching {}...", team.name);
        let pod = match fetch_pod(tracker, team, window, now).await {
            Ok(pod) => pod,
            Err(e) => {
                tracing::warn!("{} fetch failed for {}: {e:#}", tracker.name(), team.name);
                PodSnapshot::default()
            }
        };
        pods.insert(team.name.clone(), pod);
    }

    TrackerSnapshot {
        generated_at: Some(now),
        sprint: Some(window.clone()),
        pods,
    }
}
