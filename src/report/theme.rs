use crate::model::issue::StateType;
use crate::model::readiness::{
    BUSINESS_INTENT, DESIGN_PENDING, LEGAL_REVIEW, PRD_DISCUSSION, READY_FOR_ENG,
    VENDOR_SELECTION, WAITING_INFO,
};
use crate::model::team::Team;

pub const FALLBACK_COLOR: &str = "#94a3b8";
pub const IDEAL_LINE_COLOR: &str = "#cbd5e1";
pub const PARETO_LINE_COLOR: &str = "#ef4444";

pub fn pod_color(team: Option<&Team>) -> String {
    team.and_then(|t| t.color.clone())
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_COLOR.to_string())
}

/// `#rrggbb` plus an alpha suffix, for translucent chart fills.
pub fn with_alpha(color: &str, alpha_hex: &str) -> String {
    if color.len() == 7 && color.starts_with('#') {
        format!("{color}{alpha_hex}")
    } else {
        color.to_string()
    }
}

pub fn stage_tag(stage: &str) -> &'static str {
    match stage {
        READY_FOR_ENG => "tag-green",
        WAITING_INFO => "tag-yellow",
        BUSINESS_INTENT => "tag-red",
        PRD_DISCUSSION => "tag-blue",
        DESIGN_PENDING => "tag-purple",
        VENDOR_SELECTION | LEGAL_REVIEW => "tag-yellow",
        _ => "tag-gray",
    }
}

pub fn state_tag(kind: &StateType) -> &'static str {
    match kind {
        StateType::Completed => "tag-green",
        StateType::Started => "tag-blue",
        StateType::Canceled => "tag-gray",
        StateType::Unstarted => "tag-yellow",
        StateType::Backlog | StateType::Other(_) => "tag-gray",
    }
}

pub fn priority_tag(label: &str) -> &'static str {
    match label {
        "Urgent" => "tag-red",
        "High" => "tag-yellow",
        "Medium" => "tag-blue",
        _ => "tag-gray",
    }
}
