use serde::{Deserialize, Serialize};

/// A tracker team reported on as one pod of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Team {
    pub fn new(name: &str, id: &str, key: &str, color: &str) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            key: key.into(),
            color: Some(color.into()),
        }
    }
}

pub fn default_teams() -> Vec<Team> {
    vec![
        Team::new("Megapod", "3a1e40bd-511d-4a1f-8a43-ccb18c206aa6", "MP", "#6366f1"),
        Team::new("Accounting", "42b3b13f-0924-478e-99f3-74eb2d542c67", "ACC", "#f59e0b"),
        Team::new("AP", "a83ddef5-7178-4670-bf25-f75b5a6deceb", "PAY", "#10b981"),
        Team::new("Cards", "048e3e5a-5e37-4740-b78f-9acd81bc06f7", "CARDS", "#3b82f6"),
        Team::new("Wallet", "79a3bb37-a198-4434-b679-68af0907b353", "WAL", "#ec4899"),
    ]
}
