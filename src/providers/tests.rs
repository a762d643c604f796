use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::sheets::fetch_sheet_snapshot;
use super::{collect_pods, fetch_pod, IssueTracker, SheetSource};
use crate::config::{ColumnMap, SheetsConfig};
use crate::model::cycle::{Cycle, SprintWindow};
use crate::model::issue::Issue;
use crate::model::readiness::{ReadinessTable, READY_FOR_ENG};
use crate::model::team::Team;
use crate::snapshot::PodSnapshot;

/// A tracker serving canned cycles and issues, recording every call.
#[derive(Default)]
struct MockTracker {
    cycles: HashMap<String, Vec<Cycle>>,
    issues: HashMap<String, Vec<Issue>>,
    backlog: Vec<Issue>,
    failing_teams: Vec<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTracker {
    fn with_cycles(mut self, team_id: &str, cycles: Vec<Cycle>) -> Self {
        self.cycles.insert(team_id.into(), cycles);
        self
    }

    fn with_issues(mut self, cycle_id: &str, issues: Vec<Issue>) -> Self {
        self.issues.insert(cycle_id.into(), issues);
        self
    }

    fn with_backlog(mut self, issues: Vec<Issue>) -> Self {
        self.backlog = issues;
        self
    }

    fn with_failure(mut self, team_id: &str) -> Self {
        self.failing_teams.push(team_id.into());
        self
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn fetch_cycles(&self, team_id: &str) -> Result<Vec<Cycle>> {
        self.calls.lock().unwrap().push(format!("cycles:{team_id}"));
        if self.failing_teams.iter().any(|t| t == team_id) {
            anyhow::bail!("Mock failure");
        }
        Ok(self.cycles.get(team_id).cloned().unwrap_or_default())
    }

    async fn fetch_cycle_issues(&self, cycle_id: &str) -> Result<Vec<Issue>> {
        self.calls.lock().unwrap().push(format!("issues:{cycle_id}"));
        Ok(self.issues.get(cycle_id).cloned().unwrap_or_default())
    }

    async fn fetch_team_backlog(&self, team_id: &str) -> Result<Vec<Issue>> {
        self.calls.lock().unwrap().push(format!("backlog:{team_id}"));
        Ok(self.backlog.clone())
    }
}

/// A sheet serving canned ranges; unknown ranges fail like a denied request.
struct MockSheet {
    ranges: HashMap<String, Vec<Vec<String>>>,
}

#[async_trait]
impl SheetSource for MockSheet {
    async fn fetch_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        self.ranges
            .get(range)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("HTTP 403 for {range}"))
    }
}

fn at(m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, m, d, 0, 0, 0).unwrap()
}

fn make_cycle(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Cycle {
    Cycle {
        id: id.into(),
        name: Some(format!("Sprint {id}")),
        number: None,
        starts_at: start,
        ends_at: end,
        progress: None,
        scope_history: vec![10.0, 10.0],
        completed_scope_history: vec![0.0, 4.0],
    }
}

fn make_issue(identifier: &str, state_type: &str) -> Issue {
    serde_json::from_value(serde_json::json!({
        "id": format!("uuid-{identifier}"),
        "identifier": identifier,
        "title": format!("Issue {identifier}"),
        "state": { "name": state_type, "type": state_type },
        "estimate": 2
    }))
    .unwrap()
}

fn team(name: &str, id: &str) -> Team {
    Team::new(name, id, name, "#ec4899")
}

#[tokio::test]
async fn fetch_pod_loads_current_and_next() {
    let tracker = MockTracker::default()
        .with_cycles(
            "t-wal",
            vec![
                make_cycle("c3", at(2, 25), at(3, 10)),
                make_cycle("c2", at(2, 11), at(2, 24)),
            ],
        )
        .with_issues("c2", vec![make_issue("WAL-1", "started")])
        .with_issues("c3", vec![make_issue("WAL-2", "unstarted"), make_issue("WAL-3", "backlog")]);

    let pod = fetch_pod(&tracker, &team("Wallet", "t-wal"), &SprintWindow::default(), at(2, 15))
        .await
        .unwrap();

    let current = pod.current.unwrap();
    assert_eq!(current.cycle.id, "c2");
    assert_eq!(current.issues.len(), 1);
    assert_eq!(current.burndown.len(), 2);
    assert_eq!(current.burndown[1].remaining, 6.0);
    assert_eq!(pod.next.unwrap().issues.len(), 2);
    assert!(pod.backlog.is_empty());
    assert!(!tracker.calls.lock().unwrap().iter().any(|c| c.starts_with("backlog")));
}

#[tokio::test]
async fn pod_without_current_cycle_fetches_backlog() {
    let tracker = MockTracker::default()
        .with_cycles("t-acc", vec![make_cycle("old", at(1, 1), at(1, 14))])
        .with_backlog(vec![make_issue("ACC-9", "backlog")]);

    let pod = fetch_pod(&tracker, &team("Accounting", "t-acc"), &SprintWindow::default(), at(2, 15))
        .await
        .unwrap();

    assert!(pod.current.is_none());
    assert!(pod.next.is_none());
    assert_eq!(pod.backlog.len(), 1);
    assert_eq!(
        tracker.calls.lock().unwrap().as_slice(),
        &["cycles:t-acc", "backlog:t-acc"]
    );
}

#[tokio::test]
async fn failing_team_does_not_stop_the_others() {
    let tracker = MockTracker::default()
        .with_failure("t-mp")
        .with_cycles("t-wal", vec![make_cycle("c2", at(2, 11), at(2, 24))])
        .with_issues("c2", vec![make_issue("WAL-1", "completed")]);

    let teams = vec![team("Megapod", "t-mp"), team("Wallet", "t-wal")];
    let snapshot = collect_pods(&tracker, &teams, &SprintWindow::default(), at(2, 15)).await;

    assert_eq!(snapshot.pods.len(), 2);
    assert_eq!(snapshot.pods["Megapod"], PodSnapshot::default());
    assert!(snapshot.pods["Wallet"].current.is_some());
    assert_eq!(snapshot.sprint, Some(SprintWindow::default()));
    let calls = tracker.calls.lock().unwrap();
    assert_eq!(calls[0], "cycles:t-mp");
    assert_eq!(calls[1], "cycles:t-wal");
}

#[tokio::test]
async fn sheet_snapshot_from_reachable_sheet() {
    let mut cells: Vec<String> = vec!["Instant Payouts".into(), "Payments".into()];
    cells.resize(13, String::new());
    cells.push("TODO - needs spec".into());
    let sheet = MockSheet {
        ranges: HashMap::from([
            (
                "'R1 2026 Initiatives'!A:Z".to_string(),
                vec![vec!["Initiative".to_string()], cells],
            ),
            (
                "'Pillar Weekly Update'!A:Z".to_string(),
                (0..8).map(|i| vec![format!("row {i}")]).collect(),
            ),
        ]),
    };

    let snap = fetch_sheet_snapshot(
        &sheet,
        "sheet-1",
        &SheetsConfig::default(),
        &ColumnMap::default(),
        &ReadinessTable::default(),
        at(2, 15),
    )
    .await;

    assert!(!snap.access_error);
    assert_eq!(snap.total_count, 1);
    assert_eq!(snap.by_stage[READY_FOR_ENG].len(), 1);
    assert_eq!(snap.ready_for_eng.len(), 1);
    assert_eq!(snap.pillar_weekly_rows.len(), 5);
}

#[tokio::test]
async fn sheet_transport_error_yields_access_error_snapshot() {
    let sheet = MockSheet {
        ranges: HashMap::new(),
    };
    let snap = fetch_sheet_snapshot(
        &sheet,
        "sheet-1",
        &SheetsConfig::default(),
        &ColumnMap::default(),
        &ReadinessTable::default(),
        at(2, 15),
    )
    .await;

    assert!(snap.access_error);
    assert!(snap.initiatives.is_empty());
    assert!(snap.pillar_weekly_rows.is_empty());
    assert_eq!(snap.sheet_id, "sheet-1");
}
