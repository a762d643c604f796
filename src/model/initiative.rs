use serde::{Deserialize, Serialize};

/// One row of the initiatives sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Initiative {
    /// 1-based sheet row number; the header is row 1.
    pub row: usize,
    pub name: String,
    pub pillar: String,
    pub status: String,
    pub owner: String,
    pub description: String,
    pub priority: String,
    pub target_date: String,
    pub eng_readiness_raw: String,
    pub eng_readiness_stage: String,
    pub is_ready_for_eng: bool,
    pub is_waiting_info: bool,
}
