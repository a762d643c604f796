use serde::{Deserialize, Serialize};

pub const READY_FOR_ENG: &str = "Ready for Engineering (Not Yet Picked Up)";
pub const WAITING_INFO: &str = "Waiting More Info (Additional Work Needed)";
pub const BUSINESS_INTENT: &str = "Business Intent Not Defined";
pub const PRD_DISCUSSION: &str = "PRD In Discussion";
pub const DESIGN_PENDING: &str = "Design Pending";
pub const VENDOR_SELECTION: &str = "Vendor Selection In Progress";
pub const LEGAL_REVIEW: &str = "Legal / Compliance Review";
pub const UNKNOWN_STAGE: &str = "Unknown / Not Set";

/// Display order of the readiness taxonomy. Stages outside it are free-form labels.
pub const STAGE_ORDER: [&str; 8] = [
    READY_FOR_ENG,
    WAITING_INFO,
    BUSINESS_INTENT,
    PRD_DISCUSSION,
    DESIGN_PENDING,
    VENDOR_SELECTION,
    LEGAL_REVIEW,
    UNKNOWN_STAGE,
];

/// Matches raw readiness text containing `keyword`, ignoring case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub label: String,
}

impl KeywordRule {
    pub fn new(keyword: &str, label: &str) -> Self {
        Self {
            keyword: keyword.into(),
            label: label.into(),
        }
    }

    pub fn matches(&self, raw: &str) -> bool {
        raw.to_lowercase().contains(&self.keyword.to_lowercase())
    }
}

/// Ordered classification rules. The first matching rule wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessTable {
    rules: Vec<KeywordRule>,
}

impl Default for ReadinessTable {
    fn default() -> Self {
        Self::new(vec![
            KeywordRule::new("TODO", READY_FOR_ENG),
            KeywordRule::new("Waiting More Info", WAITING_INFO),
            KeywordRule::new("Business Intent", BUSINESS_INTENT),
            KeywordRule::new("PRD", PRD_DISCUSSION),
            KeywordRule::new("Design", DESIGN_PENDING),
            KeywordRule::new("Vendor", VENDOR_SELECTION),
            KeywordRule::new("Legal", LEGAL_REVIEW),
            KeywordRule::new("In Progress", "In Progress"),
            KeywordRule::new("Done", "Completed"),
        ])
    }
}

impl ReadinessTable {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// Map raw readiness text to a stage label. Total: empty text is `Unknown / Not Set`,
    /// unmatched text is its own stage.
    pub fn classify(&self, raw: &str) -> String {
        let value = raw.trim();
        if value.is_empty() {
            return UNKNOWN_STAGE.to_string();
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(value))
            .map(|rule| rule.label.clone())
            .unwrap_or_else(|| value.to_string())
    }
}

pub fn is_ready_for_eng(raw: &str) -> bool {
    raw.to_uppercase().contains("TODO")
}

pub fn is_waiting_info(raw: &str) -> bool {
    raw.to_lowercase().contains("waiting")
}
