use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::util::null_as_default;

/// A sprint as the tracker reports it. The two histories hold one cumulative value per elapsed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope_history: Vec<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_scope_history: Vec<f64>,
}

impl Cycle {
    pub fn display_name(&self) -> String {
        match (&self.name, self.number) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(number)) => format!("Cycle {number}"),
            _ => "Cycle ?".to_string(),
        }
    }

    /// Whole days from start to end, never less than one.
    pub fn total_days(&self) -> i64 {
        (self.ends_at - self.starts_at).num_days().max(1)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.starts_at <= instant && instant <= self.ends_at
    }

    pub fn date_range_label(&self) -> String {
        format!(
            "{} – {}",
            self.starts_at.format("%b %d"),
            self.ends_at.format("%b %d, %Y")
        )
    }
}

/// The sprint window the report is built for, as configured for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub label: String,
}

impl Default for SprintWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2026, 2, 11).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2026, 2, 24).unwrap_or(NaiveDate::MIN),
            label: String::new(),
        }
    }
}

impl SprintWindow {
    pub fn start_utc(&self) -> DateTime<Utc> {
        midnight_utc(self.start)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        midnight_utc(self.end)
    }

    /// The configured label, or one derived from the dates when none was set.
    pub fn display_label(&self) -> String {
        if !self.label.trim().is_empty() {
            return self.label.clone();
        }
        format!(
            "{} – {}",
            self.start.format("%b %d"),
            self.end.format("%b %d, %Y")
        )
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurndownPoint {
    pub day: String,
    pub remaining: f64,
    pub ideal: f64,
}
