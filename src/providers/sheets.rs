use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::SheetSource;
use crate::config::{ColumnMap, SheetsConfig};
use crate::error::{body_excerpt, ReportError};
use crate::model::initiative::Initiative;
use crate::model::readiness::{is_ready_for_eng, is_waiting_info, ReadinessTable};
use crate::snapshot::SheetSnapshot;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SERVICE: &str = "Sheets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PILLAR_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum SheetsAuth {
    ApiKey(String),
    /// OAuth access token, e.g. minted from a service account outside this tool.
    Bearer(String),
}

impl SheetsAuth {
    /// A bearer token is preferred over an API key when both are configured.
    pub fn from_config(config: &SheetsConfig) -> Option<Self> {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        present(&config.access_token)
            .map(SheetsAuth::Bearer)
            .or_else(|| present(&config.api_key).map(SheetsAuth::ApiKey))
    }
}

pub struct SheetsClient {
    sheet_id: String,
    auth: SheetsAuth,
    client: reqwest::Client,
}

impl SheetsClient {
    pub fn new(sheet_id: String, auth: SheetsAuth) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Sheets HTTP client")?;
        Ok(Self {
            sheet_id,
            auth,
            client,
        })
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `'Tab Name'!A:Z`
pub fn tab_range(tab: &str) -> String {
    format!("'{}'!A:Z", tab.replace('\'', "''"))
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn fetch_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{SHEETS_API_URL}/{}/values/{}",
            self.sheet_id,
            urlencoding::encode(range)
        );
        let request = match &self.auth {
            SheetsAuth::Bearer(token) => self.client.get(&url).bearer_auth(token),
            SheetsAuth::ApiKey(key) => self.client.get(&url).query(&[("key", key)]),
        };

        let resp = request.send().await.context("Sheets API request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ReportError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body: body_excerpt(&text),
            }
            .into());
        }

        let range: ValueRange = resp.json().await.context("Failed to parse Sheets response")?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

/// Zero-based index of a column letter (`A` → 0, `N` → 13, `AA` → 26).
pub fn column_index(letters: &str) -> Option<usize> {
    let mut idx: usize = 0;
    let mut seen = false;
    for c in letters.trim().chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        idx = idx.checked_mul(26)?.checked_add(digit)?;
        seen = true;
    }
    seen.then(|| idx - 1)
}

fn cell(row: &[String], letters: &str) -> String {
    column_index(letters)
        .and_then(|idx| row.get(idx))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Parse initiative rows. Row 0 is the header; rows without a name are skipped.
pub fn parse_initiatives(
    rows: &[Vec<String>],
    columns: &ColumnMap,
    table: &ReadinessTable,
) -> Vec<Initiative> {
    rows.iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, row)| {
            let name = cell(row, &columns.name);
            if name.is_empty() {
                return None;
            }
            let raw = cell(row, &columns.readiness);
            Some(Initiative {
                row: idx + 1,
                name,
                pillar: cell(row, &columns.pillar),
                status: cell(row, &columns.status),
                owner: cell(row, &columns.owner),
                description: cell(row, &columns.description),
                priority: cell(row, &columns.priority),
                target_date: cell(row, &columns.target_date),
                eng_readiness_stage: table.classify(&raw),
                is_ready_for_eng: is_ready_for_eng(&raw),
                is_waiting_info: is_waiting_info(&raw),
                eng_readiness_raw: raw,
            })
        })
        .collect()
}

/// Read the initiatives tab (and the optional pillar tab preview). Never fails: fetch errors
/// are logged and produce a snapshot flagged with `access_error`.
pub async fn fetch_sheet_snapshot(
    source: &dyn SheetSource,
    sheet_id: &str,
    config: &SheetsConfig,
    columns: &ColumnMap,
    table: &ReadinessTable,
    now: DateTime<Utc>,
) -> SheetSnapshot {
    tracing::info!("Fetching sheet tab: {}", config.tab);
    let rows = match source.fetch_range(&tab_range(&config.tab)).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Sheet fetch error: {e:#}");
            Vec::new()
        }
    };

    let initiatives = parse_initiatives(&rows, columns, table);
    tracing::info!("Parsed {} initiatives", initiatives.len());

    let mut pillar_rows = Vec::new();
    if let Some(pillar_tab) = &config.pillar_tab {
        match source.fetch_range(&tab_range(pillar_tab)).await {
            Ok(rows) => {
                tracing::info!("{pillar_tab}: {} rows", rows.len());
                pillar_rows = rows.into_iter().take(PILLAR_PREVIEW_ROWS).collect();
            }
            Err(e) => tracing::warn!("Could not fetch {pillar_tab}: {e:#}"),
        }
    }

    SheetSnapshot::from_initiatives(sheet_id, rows.len(), initiatives, pillar_rows, now)
}

/// The `client_email` of a service account key file, shown in the access notice.
pub fn service_account_email(path: &Path) -> Option<String> {
    #[derive(Deserialize)]
    struct ServiceAccount {
        client_email: String,
    }
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str::<ServiceAccount>(&contents)
        .ok()
        .map(|sa| sa.client_email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::readiness::{DESIGN_PENDING, READY_FOR_ENG, UNKNOWN_STAGE};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn full_row(name: &str, readiness: &str) -> Vec<String> {
        let mut cells = vec![
            name, "Payments", "Active", "Dana", "Instant payouts", "P1", "2026-03-31",
        ];
        cells.resize(13, "");
        cells.push(readiness);
        row(&cells)
    }

    #[test]
    fn column_letters_map_to_indexes() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("n"), Some(13));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn oversized_column_letters_are_rejected() {
        assert_eq!(column_index("ZZZZZZZZZZZZZZZ"), None);
        let rows = vec![row(&["header"]), row(&["Ledger v2"])];
        let columns = ColumnMap {
            owner: "ZZZZZZZZZZZZZZZ".into(),
            ..ColumnMap::default()
        };
        let inits = parse_initiatives(&rows, &columns, &ReadinessTable::default());
        assert_eq!(inits[0].owner, "");
    }

    #[test]
    fn parses_rows_by_position() {
        let rows = vec![
            row(&["Initiative", "Pillar", "Status"]),
            full_row("Instant Payouts", "TODO - needs spec"),
            full_row("  ", "Design"),
            full_row("Card Controls", "Design review"),
        ];
        let inits = parse_initiatives(&rows, &ColumnMap::default(), &ReadinessTable::default());
        assert_eq!(inits.len(), 2);

        let first = &inits[0];
        assert_eq!(first.row, 2);
        assert_eq!(first.pillar, "Payments");
        assert_eq!(first.target_date, "2026-03-31");
        assert_eq!(first.eng_readiness_stage, READY_FOR_ENG);
        assert!(first.is_ready_for_eng);
        assert!(!first.is_waiting_info);

        assert_eq!(inits[1].row, 4);
        assert_eq!(inits[1].eng_readiness_stage, DESIGN_PENDING);
    }

    #[test]
    fn short_rows_default_missing_cells() {
        let rows = vec![row(&["header"]), row(&["Ledger v2", "Core"])];
        let inits = parse_initiatives(&rows, &ColumnMap::default(), &ReadinessTable::default());
        assert_eq!(inits.len(), 1);
        assert_eq!(inits[0].owner, "");
        assert_eq!(inits[0].eng_readiness_raw, "");
        assert_eq!(inits[0].eng_readiness_stage, UNKNOWN_STAGE);
        assert!(!inits[0].is_ready_for_eng);
    }

    #[test]
    fn header_only_or_empty_sheet_has_no_initiatives() {
        let table = ReadinessTable::default();
        assert!(parse_initiatives(&[], &ColumnMap::default(), &table).is_empty());
        assert!(parse_initiatives(&[row(&["Initiative"])], &ColumnMap::default(), &table).is_empty());
    }

    #[test]
    fn range_quotes_tab_names() {
        assert_eq!(tab_range("R1 2026 Initiatives"), "'R1 2026 Initiatives'!A:Z");
        assert_eq!(tab_range("Dana's tab"), "'Dana''s tab'!A:Z");
    }

    #[test]
    fn non_string_cells_are_stringified() {
        assert_eq!(cell_to_string(serde_json::json!("x")), "x");
        assert_eq!(cell_to_string(serde_json::json!(3)), "3");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }

    #[test]
    fn bearer_token_preferred_over_api_key() {
        let mut config = SheetsConfig {
            api_key: Some("key".into()),
            ..SheetsConfig::default()
        };
        assert_eq!(SheetsAuth::from_config(&config), Some(SheetsAuth::ApiKey("key".into())));
        config.access_token = Some("tok".into());
        assert_eq!(SheetsAuth::from_config(&config), Some(SheetsAuth::Bearer("tok".into())));
        config.access_token = Some("  ".into());
        config.api_key = None;
        assert_eq!(SheetsAuth::from_config(&config), None);
    }

    #[test]
    fn reads_service_account_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa.json");
        std::fs::write(
            &path,
            r#"{"type": "service_account", "client_email": "ops@acme.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        assert_eq!(
            service_account_email(&path).as_deref(),
            Some("ops@acme.iam.gserviceaccount.com")
        );
        assert_eq!(service_account_email(&dir.path().join("missing.json")), None);
    }
}
