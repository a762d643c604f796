pub mod charts;
pub mod html;
pub mod stats;
pub mod theme;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::model::cycle::SprintWindow;
use crate::model::initiative::Initiative;
use crate::model::issue::Issue;
use crate::model::readiness::STAGE_ORDER;
use crate::model::team::Team;
use crate::snapshot::{SheetSnapshot, TrackerSnapshot};
use stats::{pareto, NextSprintStats, OverallStats, ParetoEntry, PodStats};

/// Inputs to aggregation that come from configuration rather than snapshots.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub teams: Vec<Team>,
    pub sprint: SprintWindow,
    pub stale_days: i64,
    pub pareto_top_n: usize,
    pub service_account: Option<String>,
}

impl ReportOptions {
    pub fn from_config(config: &AppConfig, service_account: Option<String>) -> Self {
        Self {
            teams: config.teams.clone(),
            sprint: config.sprint.clone(),
            stale_days: config.report.stale_days,
            pareto_top_n: config.report.pareto_top_n,
            service_account,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageGroup {
    pub label: String,
    pub known: bool,
    pub initiatives: Vec<Initiative>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitiativeView {
    /// The sheet could not be read; the report explains how to share it.
    AccessError { service_account: Option<String> },
    Empty,
    Stages(Vec<StageGroup>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacklogSection {
    pub pod: String,
    pub color: String,
    pub issues: Vec<Issue>,
}

/// Everything the renderer draws, computed once from the two snapshots.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub sprint_label: String,
    pub pods: Vec<PodStats>,
    pub overall: OverallStats,
    pub next: Vec<NextSprintStats>,
    pub next_sprint_label: Option<String>,
    pub pareto: Vec<ParetoEntry>,
    pub backlog: Vec<BacklogSection>,
    pub initiatives: InitiativeView,
    pub initiative_total: usize,
    pub ready_for_eng: usize,
    pub waiting_info: usize,
    pub stale_days: i64,
}

impl Dashboard {
    pub fn build(
        tracker: &TrackerSnapshot,
        sheet: &SheetSnapshot,
        options: &ReportOptions,
        now: DateTime<Utc>,
    ) -> Self {
        let mut pods = Vec::new();
        let mut next = Vec::new();
        let mut backlog = Vec::new();

        for name in ordered_pod_names(tracker, &options.teams) {
            let Some(pod) = tracker.pods.get(&name) else {
                continue;
            };
            let color = theme::pod_color(options.teams.iter().find(|t| t.name == name));

            pods.push(PodStats::from_cycle(
                &name,
                &color,
                pod.current.as_ref(),
                now,
                options.stale_days,
            ));
            if let Some(cycle) = pod.next.as_ref().filter(|c| !c.issues.is_empty()) {
                next.push(NextSprintStats::from_cycle(&name, &color, cycle));
            }
            if pod.current.is_none() && !pod.backlog.is_empty() {
                backlog.push(BacklogSection {
                    pod: name.clone(),
                    color,
                    issues: pod.backlog.clone(),
                });
            }
        }

        let sprint = tracker.sprint.as_ref().unwrap_or(&options.sprint);

        Self {
            generated_at: now,
            sprint_label: sprint.display_label(),
            overall: OverallStats::from_pods(&pods),
            next_sprint_label: next.first().map(|n| n.cycle.date_range_label()),
            pareto: pareto(&next, options.pareto_top_n),
            pods,
            next,
            backlog,
            initiatives: initiative_view(sheet, options.service_account.clone()),
            initiative_total: sheet.total_count,
            ready_for_eng: sheet.ready_for_eng.len(),
            waiting_info: sheet.waiting_info.len(),
            stale_days: options.stale_days,
        }
    }

    /// Pods that have a current cycle, in display order.
    pub fn active_pods(&self) -> impl Iterator<Item = &PodStats> {
        self.pods.iter().filter(|p| p.has_cycle())
    }

    pub fn next_total(&self) -> usize {
        self.next.iter().map(|n| n.total).sum()
    }

    pub fn next_total_pts(&self) -> f64 {
        self.next.iter().map(|n| n.total_pts).sum()
    }

    /// Named engineers with planned work, each counted once across pods.
    pub fn next_engineers(&self) -> BTreeSet<&str> {
        self.next
            .iter()
            .flat_map(|n| n.named_engineers().map(|(name, _)| name.as_str()))
            .collect()
    }
}

/// Configured teams first, in configured order, then any other pods found in the snapshot.
fn ordered_pod_names(tracker: &TrackerSnapshot, teams: &[Team]) -> Vec<String> {
    let mut names: Vec<String> = teams
        .iter()
        .filter(|t| tracker.pods.contains_key(&t.name))
        .map(|t| t.name.clone())
        .collect();
    for name in tracker.pods.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

fn initiative_view(sheet: &SheetSnapshot, service_account: Option<String>) -> InitiativeView {
    if sheet.access_error {
        return InitiativeView::AccessError { service_account };
    }
    if sheet.by_stage.is_empty() {
        return InitiativeView::Empty;
    }

    let mut groups: Vec<StageGroup> = STAGE_ORDER
        .iter()
        .filter_map(|label| {
            let items = sheet.by_stage.get(*label).filter(|v| !v.is_empty())?;
            Some(StageGroup {
                label: label.to_string(),
                known: true,
                initiatives: items.clone(),
            })
        })
        .collect();

    // Free-form stages follow in the order they first appear in the sheet.
    let mut free_form: Vec<&str> = Vec::new();
    for init in &sheet.initiatives {
        let stage = init.eng_readiness_stage.as_str();
        if !STAGE_ORDER.contains(&stage) && !free_form.contains(&stage) {
            free_form.push(stage);
        }
    }
    for stage in sheet.by_stage.keys() {
        if !STAGE_ORDER.contains(&stage.as_str()) && !free_form.contains(&stage.as_str()) {
            free_form.push(stage);
        }
    }
    for stage in free_form {
        if let Some(items) = sheet.by_stage.get(stage).filter(|v| !v.is_empty()) {
            groups.push(StageGroup {
                label: stage.to_string(),
                known: false,
                initiatives: items.clone(),
            });
        }
    }

    InitiativeView::Stages(groups)
}
