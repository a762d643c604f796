use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::cycle::{BurndownPoint, Cycle, SprintWindow};
use crate::model::initiative::Initiative;
use crate::model::issue::Issue;

/// Everything fetched from the tracker in one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sprint: Option<SprintWindow>,
    #[serde(default)]
    pub pods: BTreeMap<String, PodSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSnapshot {
    #[serde(default)]
    pub current: Option<CycleSnapshot>,
    #[serde(default)]
    pub next: Option<CycleSnapshot>,
    /// Unplanned backlog, fetched only for pods without a current cycle.
    #[serde(default)]
    pub backlog: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSnapshot {
    pub cycle: Cycle,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub burndown: Vec<BurndownPoint>,
}

/// Everything read from the initiatives sheet in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSnapshot {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sheet_id: String,
    #[serde(default)]
    pub initiatives: Vec<Initiative>,
    #[serde(default)]
    pub by_stage: BTreeMap<String, Vec<Initiative>>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub ready_for_eng: Vec<Initiative>,
    #[serde(default)]
    pub waiting_info: Vec<Initiative>,
    #[serde(default)]
    pub pillar_weekly_rows: Vec<Vec<String>>,
    #[serde(default = "default_access_error")]
    pub access_error: bool,
}

fn default_access_error() -> bool {
    true
}

/// No sheet data at all reads as an access failure so the report shows the access notice.
impl Default for SheetSnapshot {
    fn default() -> Self {
        Self {
            generated_at: None,
            sheet_id: String::new(),
            initiatives: Vec::new(),
            by_stage: BTreeMap::new(),
            total_count: 0,
            ready_for_eng: Vec::new(),
            waiting_info: Vec::new(),
            pillar_weekly_rows: Vec::new(),
            access_error: true,
        }
    }
}

impl SheetSnapshot {
    /// Group parsed initiatives. `access_error` is set when the sheet yielded no rows at all.
    pub fn from_initiatives(
        sheet_id: &str,
        row_count: usize,
        initiatives: Vec<Initiative>,
        pillar_weekly_rows: Vec<Vec<String>>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut by_stage: BTreeMap<String, Vec<Initiative>> = BTreeMap::new();
        for init in &initiatives {
            by_stage
                .entry(init.eng_readiness_stage.clone())
                .or_default()
                .push(init.clone());
        }
        let ready_for_eng = initiatives
            .iter()
            .filter(|i| i.is_ready_for_eng)
            .cloned()
            .collect();
        let waiting_info = initiatives
            .iter()
            .filter(|i| i.is_waiting_info)
            .cloned()
            .collect();

        Self {
            generated_at: Some(generated_at),
            sheet_id: sheet_id.to_string(),
            total_count: initiatives.len(),
            initiatives,
            by_stage,
            ready_for_eng,
            waiting_info,
            pillar_weekly_rows,
            access_error: row_count == 0,
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read a snapshot, treating a missing, empty, or unreadable file as "no data".
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            tracing::warn!("{} not found, rendering without it", path.display());
            return T::default();
        }
    };
    if contents.trim().is_empty() {
        tracing::warn!("{} is empty, rendering without it", path.display());
        return T::default();
    }
    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{} could not be parsed ({e}), rendering without it", path.display());
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initiative(name: &str, stage: &str, ready: bool, waiting: bool) -> Initiative {
        Initiative {
            row: 2,
            name: name.into(),
            eng_readiness_stage: stage.into(),
            is_ready_for_eng: ready,
            is_waiting_info: waiting,
            ..Initiative::default()
        }
    }

    #[test]
    fn missing_file_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let tracker: TrackerSnapshot = load_or_default(&dir.path().join("linear_data.json"));
        assert!(tracker.pods.is_empty());
        let sheet: SheetSnapshot = load_or_default(&dir.path().join("sheets_data.json"));
        assert!(sheet.access_error);
        assert!(sheet.initiatives.is_empty());
    }

    #[test]
    fn empty_and_malformed_files_are_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "  \n").unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let a: TrackerSnapshot = load_or_default(&empty);
        let b: TrackerSnapshot = load_or_default(&bad);
        assert!(a.pods.is_empty() && b.pods.is_empty());
    }

    #[test]
    fn write_then_load_keeps_pods() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("linear_data.json");
        let mut snapshot = TrackerSnapshot {
            generated_at: Some(Utc::now()),
            sprint: Some(SprintWindow::default()),
            pods: BTreeMap::new(),
        };
        snapshot.pods.insert("Wallet".into(), PodSnapshot::default());
        write_json(&path, &snapshot).unwrap();

        let loaded: TrackerSnapshot = load_or_default(&path);
        assert_eq!(loaded.pods.len(), 1);
        assert!(loaded.pods["Wallet"].current.is_none());
        assert_eq!(loaded.sprint, Some(SprintWindow::default()));
    }

    #[test]
    fn sheet_snapshot_groups_and_flags() {
        let inits = vec![
            initiative("Payouts", "Design Pending", false, false),
            initiative("Ledger", "Ready for Engineering (Not Yet Picked Up)", true, false),
            initiative("KYC", "Design Pending", false, true),
        ];
        let snap = SheetSnapshot::from_initiatives("sheet-1", 4, inits, vec![], Utc::now());
        assert_eq!(snap.total_count, 3);
        assert_eq!(snap.by_stage["Design Pending"].len(), 2);
        assert_eq!(snap.ready_for_eng.len(), 1);
        assert_eq!(snap.waiting_info[0].name, "KYC");
        assert!(!snap.access_error);
    }

    #[test]
    fn no_rows_means_access_error() {
        let snap = SheetSnapshot::from_initiatives("sheet-1", 0, vec![], vec![], Utc::now());
        assert!(snap.access_error);
        assert_eq!(snap.total_count, 0);
    }

    #[test]
    fn sheet_snapshot_without_access_flag_defaults_to_error() {
        let snap: SheetSnapshot = serde_json::from_str(r#"{"sheet_id": "s"}"#).unwrap();
        assert!(snap.access_error);
    }
}
