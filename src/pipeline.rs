use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::error::ReportError;
use crate::providers::linear::LinearClient;
use crate::providers::sheets::{self, SheetsAuth, SheetsClient};
use crate::providers::{collect_pods, IssueTracker, SheetSource};
use crate::report::{html, Dashboard, ReportOptions};
use crate::snapshot::{self, SheetSnapshot, TrackerSnapshot};

/// Outcome of a full run. Fetch stages may fail without failing the run.
#[derive(Debug)]
pub struct RunSummary {
    pub linear_ok: bool,
    pub sheets_ok: bool,
    pub report_path: PathBuf,
}

fn linear_key(config: &AppConfig) -> Result<String> {
    config
        .linear
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ReportError::MissingCredential("LINEAR_API_KEY").into())
}

fn sheet_target(config: &AppConfig) -> Result<(String, SheetsAuth)> {
    let sheet_id = config
        .sheets
        .sheet_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or(ReportError::MissingCredential("GOOGLE_SHEET_ID"))?;
    let auth = SheetsAuth::from_config(&config.sheets)
        .ok_or(ReportError::MissingCredential("GOOGLE_API_KEY or GOOGLE_ACCESS_TOKEN"))?;
    Ok((sheet_id, auth))
}

/// Fetch every configured team from Linear and write the tracker snapshot.
pub async fn fetch_linear(config: &AppConfig) -> Result<PathBuf> {
    let client = LinearClient::new(linear_key(config)?)?;
    write_tracker_snapshot(&client, config, Utc::now()).await
}

pub async fn write_tracker_snapshot(
    tracker: &dyn IssueTracker,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let snapshot = collect_pods(tracker, &config.teams, &config.sprint, now).await;
    let path = config.report.linear_snapshot_path();
    snapshot::write_json(&path, &snapshot)?;
    tracing::info!("Saved {}", path.display());
    Ok(path)
}

/// Read the initiatives sheet and write the sheet snapshot. Returns whether the sheet was readable.
pub async fn fetch_sheets(config: &AppConfig) -> Result<bool> {
    let (sheet_id, auth) = sheet_target(config)?;
    let client = SheetsClient::new(sheet_id, auth)?;
    write_sheet_snapshot(&client, client.sheet_id(), config, Utc::now()).await
}

pub async fn write_sheet_snapshot(
    source: &dyn SheetSource,
    sheet_id: &str,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<bool> {
    let snapshot = sheets::fetch_sheet_snapshot(
        source,
        sheet_id,
        &config.sheets,
        &config.columns,
        &config.readiness_table(),
        now,
    )
    .await;
    let path = config.report.sheet_snapshot_path();
    snapshot::write_json(&path, &snapshot)?;
    tracing::info!(
        "Saved {} ({} initiatives, {} ready for eng, {} waiting on info)",
        path.display(),
        snapshot.total_count,
        snapshot.ready_for_eng.len(),
        snapshot.waiting_info.len()
    );
    if snapshot.access_error {
        tracing::warn!("Sheet {sheet_id} was not readable; the report will show the access notice");
    }
    Ok(!snapshot.access_error)
}

/// The sheet step of a full run. A failed fetch leaves an access-error snapshot behind so the
/// render that follows never picks up an older run's initiatives.
async fn sheets_stage(config: &AppConfig, now: DateTime<Utc>) -> bool {
    match fetch_sheets(config).await {
        Ok(readable) => readable,
        Err(e) => {
            tracing::warn!("Sheet fetch failed: {e:#}");
            let fallback = SheetSnapshot {
                generated_at: Some(now),
                sheet_id: config.sheets.sheet_id.clone().unwrap_or_default(),
                ..SheetSnapshot::default()
            };
            let path = config.report.sheet_snapshot_path();
            if let Err(e) = snapshot::write_json(&path, &fallback) {
                tracing::warn!("Could not reset {}: {e:#}", path.display());
            }
            false
        }
    }
}

/// Build the HTML report from whatever snapshots exist on disk.
pub fn render(config: &AppConfig, now: DateTime<Utc>) -> Result<PathBuf> {
    let tracker: TrackerSnapshot = snapshot::load_or_default(&config.report.linear_snapshot_path());
    let sheet: SheetSnapshot = snapshot::load_or_default(&config.report.sheet_snapshot_path());

    let service_account = config
        .sheets
        .service_account_json
        .as_deref()
        .and_then(sheets::service_account_email);
    let options = ReportOptions::from_config(config, service_account);
    let dashboard = Dashboard::build(&tracker, &sheet, &options, now);
    let page = html::render(&dashboard);

    let path = config.report.report_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ReportError::Render(format!("{}: {e}", parent.display())))?;
    }
    std::fs::write(&path, page)
        .map_err(|e| ReportError::Render(format!("{}: {e}", path.display())))?;
    tracing::info!("Report written to {}", path.display());
    Ok(path)
}

/// Fetch both sources, then render. A missing Linear key is fatal up front; fetch failures
/// are warnings; a render failure fails the run.
pub async fn run_all(config: &AppConfig) -> Result<RunSummary> {
    linear_key(config)?;

    tracing::info!("Step 1/3: fetching Linear data");
    let linear_ok = match fetch_linear(config).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Linear fetch failed: {e:#}");
            false
        }
    };

    tracing::info!("Step 2/3: fetching sheet data");
    let sheets_ok = sheets_stage(config, Utc::now()).await;

    tracing::info!("Step 3/3: rendering report");
    let report_path = render(config, Utc::now())?;

    let status = |ok: bool| if ok { "OK" } else { "WARN" };
    tracing::info!("Linear: {}", status(linear_ok));
    tracing::info!("Sheets: {}", status(sheets_ok));

    Ok(RunSummary {
        linear_ok,
        sheets_ok,
        report_path,
    })
}
