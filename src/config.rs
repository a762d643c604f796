use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::model::cycle::SprintWindow;
use crate::model::readiness::{KeywordRule, ReadinessTable};
use crate::model::team::{default_teams, Team};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub linear: LinearConfig,
    pub teams: Vec<Team>,
    pub sprint: SprintWindow,
    pub sheets: SheetsConfig,
    pub report: ReportConfig,
    pub columns: ColumnMap,
    /// Replaces the built-in readiness keyword table when set.
    pub readiness: Option<Vec<KeywordRule>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            linear: LinearConfig::default(),
            teams: default_teams(),
            sprint: SprintWindow::default(),
            sheets: SheetsConfig::default(),
            report: ReportConfig::default(),
            columns: ColumnMap::default(),
            readiness: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct LinearConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub sheet_id: Option<String>,
    pub api_key: Option<String>,
    /// OAuth access token minted from the service credential outside this tool.
    pub access_token: Option<String>,
    pub service_account_json: Option<PathBuf>,
    pub tab: String,
    pub pillar_tab: Option<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            sheet_id: None,
            api_key: None,
            access_token: None,
            service_account_json: None,
            tab: "R1 2026 Initiatives".into(),
            pillar_tab: Some("Pillar Weekly Update".into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub stale_days: i64,
    pub pareto_top_n: usize,
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            stale_days: 3,
            pareto_top_n: 25,
            output_dir: PathBuf::from("public"),
        }
    }
}

impl ReportConfig {
    pub fn linear_snapshot_path(&self) -> PathBuf {
        self.output_dir.join("data").join("linear_data.json")
    }

    pub fn sheet_snapshot_path(&self) -> PathBuf {
        self.output_dir.join("data").join("sheets_data.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("index.html")
    }
}

/// Sheet column letters for each initiative field. The layout is positional; header text is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub name: String,
    pub pillar: String,
    pub status: String,
    pub owner: String,
    pub description: String,
    pub priority: String,
    pub target_date: String,
    pub readiness: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            name: "A".into(),
            pillar: "B".into(),
            status: "C".into(),
            owner: "D".into(),
            description: "E".into(),
            priority: "F".into(),
            target_date: "G".into(),
            readiness: "N".into(),
        }
    }
}

impl AppConfig {
    pub fn readiness_table(&self) -> ReadinessTable {
        match &self.readiness {
            Some(rules) if !rules.is_empty() => ReadinessTable::new(rules.clone()),
            _ => ReadinessTable::default(),
        }
    }

    /// Overlay credentials and ids from the environment. Non-empty variables win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("LINEAR_API_KEY") {
            self.linear.api_key = Some(v);
        }
        if let Some(v) = var("GOOGLE_SHEET_ID") {
            self.sheets.sheet_id = Some(v);
        }
        if let Some(v) = var("GOOGLE_API_KEY") {
            self.sheets.api_key = Some(v);
        }
        if let Some(v) = var("GOOGLE_ACCESS_TOKEN") {
            self.sheets.access_token = Some(v);
        }
        if let Some(v) = var("GOOGLE_SA_JSON") {
            self.sheets.service_account_json = Some(PathBuf::from(v));
        }
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sprint-report")
}

fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).with_context(|| "Failed to parse config.toml")
}

/// Load the config file (explicit path or `~/.sprint-report/config.toml`), then the environment.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(config_path);
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        parse_config(&contents)?
    } else if explicit.is_some() {
        anyhow::bail!("Config file {} does not exist", path.display());
    } else {
        AppConfig::default()
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}
