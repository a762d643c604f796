use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::null_as_default;

pub const UNASSIGNED: &str = "Unassigned";

/// Coarse workflow category of an issue state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StateType {
    Backlog,
    Unstarted,
    Started,
    Completed,
    Canceled,
    Other(String),
}

impl From<String> for StateType {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "backlog" => StateType::Backlog,
            "unstarted" => StateType::Unstarted,
            "started" => StateType::Started,
            "completed" | "done" => StateType::Completed,
            "canceled" | "cancelled" => StateType::Canceled,
            _ => StateType::Other(raw),
        }
    }
}

impl From<StateType> for String {
    fn from(kind: StateType) -> Self {
        match kind {
            StateType::Backlog => "backlog".into(),
            StateType::Unstarted => "unstarted".into(),
            StateType::Started => "started".into(),
            StateType::Completed => "completed".into(),
            StateType::Canceled => "canceled".into(),
            StateType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueState {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StateType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Label names, kept in the tracker's `{ "nodes": [{ "name": .. }] }` wire shape on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LabelConnection", into = "LabelConnection")]
pub struct Labels(pub Vec<String>);

#[derive(Serialize, Deserialize)]
struct LabelConnection {
    #[serde(default)]
    nodes: Vec<LabelNode>,
}

#[derive(Serialize, Deserialize)]
struct LabelNode {
    name: String,
}

impl From<LabelConnection> for Labels {
    fn from(conn: LabelConnection) -> Self {
        Labels(conn.nodes.into_iter().map(|l| l.name).collect())
    }
}

impl From<Labels> for LabelConnection {
    fn from(labels: Labels) -> Self {
        LabelConnection {
            nodes: labels.0.into_iter().map(|name| LabelNode { name }).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub state: IssueState,
    #[serde(default)]
    pub assignee: Option<Assignee>,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Issue {
    /// Story points, with a missing estimate counting as zero.
    pub fn points(&self) -> f64 {
        self.estimate.unwrap_or(0.0)
    }

    pub fn assignee_name(&self) -> &str {
        self.assignee
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or(UNASSIGNED)
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.0.iter().any(|l| l.eq_ignore_ascii_case(name))
    }

    pub fn is_completed(&self) -> bool {
        self.state.kind == StateType::Completed
    }

    pub fn is_started(&self) -> bool {
        self.state.kind == StateType::Started
    }

    pub fn is_canceled(&self) -> bool {
        self.state.kind == StateType::Canceled
    }

    pub fn priority_label(&self) -> Option<&'static str> {
        map_priority(self.priority)
    }
}

pub fn map_priority(p: Option<u8>) -> Option<&'static str> {
    match p {
        Some(1) => Some("Urgent"),
        Some(2) => Some("High"),
        Some(3) => Some("Medium"),
        Some(4) => Some("Low"),
        _ => None,
    }
}
