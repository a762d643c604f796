use serde::Serialize;
use serde_json::{json, Value};

use super::theme::{with_alpha, IDEAL_LINE_COLOR, PARETO_LINE_COLOR};
use super::Dashboard;

/// One Chart.js chart bound to a `<canvas>` id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub id: String,
    pub config: Value,
    /// Tooltip titles by data index, for charts whose axis labels are short keys.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub titles: Vec<String>,
    /// Axis whose ticks are shown as percentages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_axis: Option<String>,
}

impl ChartSpec {
    fn new(id: &str, config: Value) -> Self {
        Self {
            id: id.to_string(),
            config,
            titles: Vec::new(),
            percent_axis: None,
        }
    }
}

fn bar_options(stacked: bool) -> Value {
    json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": { "legend": { "position": "bottom" } },
        "scales": {
            "x": { "stacked": stacked },
            "y": { "stacked": stacked, "beginAtZero": true }
        }
    })
}

/// Remaining points per pod over the sprint, plus the first pod's ideal line.
pub fn burndown(dash: &Dashboard) -> Option<ChartSpec> {
    let pods: Vec<_> = dash.active_pods().filter(|p| !p.burndown.is_empty()).collect();
    let longest = pods.iter().max_by_key(|p| p.burndown.len())?;
    let labels: Vec<&str> = longest.burndown.iter().map(|b| b.day.as_str()).collect();

    let mut datasets: Vec<Value> = pods
        .iter()
        .map(|p| {
            json!({
                "label": p.pod,
                "data": p.burndown.iter().map(|b| b.remaining).collect::<Vec<_>>(),
                "borderColor": p.color,
                "backgroundColor": with_alpha(&p.color, "33"),
                "tension": 0.2,
                "fill": false
            })
        })
        .collect();

    if let Some(first) = pods.first() {
        datasets.push(json!({
            "label": format!("Ideal ({})", first.pod),
            "data": first.burndown.iter().map(|b| b.ideal).collect::<Vec<_>>(),
            "borderColor": IDEAL_LINE_COLOR,
            "borderDash": [6, 4],
            "pointRadius": 0,
            "fill": false
        }));
    }

    Some(ChartSpec::new(
        "burndownChart",
        json!({
            "type": "line",
            "data": { "labels": labels, "datasets": datasets },
            "options": {
                "responsive": true,
                "maintainAspectRatio": false,
                "plugins": { "legend": { "position": "bottom" } },
                "scales": { "y": { "beginAtZero": true, "title": { "display": true, "text": "Points remaining" } } }
            }
        }),
    ))
}

/// Done, in progress and open tickets per pod.
pub fn pod_tickets(dash: &Dashboard) -> Option<ChartSpec> {
    let pods: Vec<_> = dash.active_pods().collect();
    if pods.is_empty() {
        return None;
    }
    let labels: Vec<&str> = pods.iter().map(|p| p.pod.as_str()).collect();
    let open: Vec<usize> = pods
        .iter()
        .map(|p| p.total.saturating_sub(p.completed + p.in_progress + p.canceled))
        .collect();

    Some(ChartSpec::new(
        "podTicketsChart",
        json!({
            "type": "bar",
            "data": {
                "labels": labels,
                "datasets": [
                    { "label": "Done", "data": pods.iter().map(|p| p.completed).collect::<Vec<_>>(), "backgroundColor": "#10b981" },
                    { "label": "In Progress", "data": pods.iter().map(|p| p.in_progress).collect::<Vec<_>>(), "backgroundColor": "#3b82f6" },
                    { "label": "Open", "data": open, "backgroundColor": "#e2e8f0" }
                ]
            },
            "options": bar_options(true)
        }),
    ))
}

/// Completed against remaining story points per pod.
pub fn pod_points(dash: &Dashboard) -> Option<ChartSpec> {
    let pods: Vec<_> = dash.active_pods().collect();
    if pods.is_empty() {
        return None;
    }
    let labels: Vec<&str> = pods.iter().map(|p| p.pod.as_str()).collect();
    let colors: Vec<&str> = pods.iter().map(|p| p.color.as_str()).collect();
    let remaining: Vec<f64> = pods
        .iter()
        .map(|p| (p.total_pts - p.done_pts).max(0.0))
        .collect();

    Some(ChartSpec::new(
        "podPointsChart",
        json!({
            "type": "bar",
            "data": {
                "labels": labels,
                "datasets": [
                    { "label": "Done pts", "data": pods.iter().map(|p| p.done_pts).collect::<Vec<_>>(), "backgroundColor": colors },
                    { "label": "Remaining pts", "data": remaining, "backgroundColor": "#e2e8f0" }
                ]
            },
            "options": bar_options(true)
        }),
    ))
}

/// Planned tickets and points per pod for the next sprint.
pub fn next_pods(dash: &Dashboard) -> Option<ChartSpec> {
    if dash.next.is_empty() {
        return None;
    }
    let labels: Vec<&str> = dash.next.iter().map(|n| n.pod.as_str()).collect();
    let colors: Vec<&str> = dash.next.iter().map(|n| n.color.as_str()).collect();

    Some(ChartSpec::new(
        "nextPodsChart",
        json!({
            "type": "bar",
            "data": {
                "labels": labels,
                "datasets": [
                    { "label": "Tickets", "data": dash.next.iter().map(|n| n.total).collect::<Vec<_>>(), "backgroundColor": colors },
                    { "label": "Points", "data": dash.next.iter().map(|n| n.total_pts).collect::<Vec<_>>(), "backgroundColor": "#cbd5e1" }
                ]
            },
            "options": bar_options(false)
        }),
    ))
}

/// Planned points per engineer, stacked by pod.
pub fn engineer_points(dash: &Dashboard) -> Option<ChartSpec> {
    let engineers = dash.next_engineers();
    if engineers.is_empty() {
        return None;
    }

    let datasets: Vec<Value> = dash
        .next
        .iter()
        .map(|n| {
            let data: Vec<f64> = engineers
                .iter()
                .map(|eng| n.engineers.get(*eng).map(|r| r.points).unwrap_or(0.0))
                .collect();
            json!({ "label": n.pod, "data": data, "backgroundColor": n.color })
        })
        .collect();

    let mut options = bar_options(true);
    options["indexAxis"] = json!("y");

    Some(ChartSpec::new(
        "engineerPointsChart",
        json!({
            "type": "bar",
            "data": { "labels": engineers.into_iter().collect::<Vec<_>>(), "datasets": datasets },
            "options": options
        }),
    ))
}

/// Heaviest next-sprint issues as bars with the cumulative share as a line.
pub fn pareto(dash: &Dashboard) -> Option<ChartSpec> {
    if dash.pareto.is_empty() {
        return None;
    }
    let labels: Vec<&str> = dash.pareto.iter().map(|e| e.label.as_str()).collect();

    let mut spec = ChartSpec::new(
        "paretoChart",
        json!({
            "type": "bar",
            "data": {
                "labels": labels,
                "datasets": [
                    {
                        "type": "bar",
                        "label": "Points",
                        "data": dash.pareto.iter().map(|e| e.pts).collect::<Vec<_>>(),
                        "backgroundColor": dash.pareto.iter().map(|e| e.color.as_str()).collect::<Vec<_>>(),
                        "yAxisID": "y",
                        "order": 2
                    },
                    {
                        "type": "line",
                        "label": "Cumulative %",
                        "data": dash.pareto.iter().map(|e| e.cumulative_pct).collect::<Vec<_>>(),
                        "borderColor": PARETO_LINE_COLOR,
                        "pointRadius": 2,
                        "yAxisID": "y1",
                        "order": 1
                    }
                ]
            },
            "options": {
                "responsive": true,
                "maintainAspectRatio": false,
                "plugins": { "legend": { "position": "bottom" } },
                "scales": {
                    "y": { "beginAtZero": true, "title": { "display": true, "text": "Points" } },
                    "y1": { "position": "right", "min": 0, "max": 100, "grid": { "drawOnChartArea": false } }
                }
            }
        }),
    );
    spec.titles = dash
        .pareto
        .iter()
        .map(|e| format!("{} ({}): {}", e.label, e.pod, e.title))
        .collect();
    spec.percent_axis = Some("y1".into());
    Some(spec)
}

/// JSON made safe to embed in an inline `<script>`.
pub fn script_json(value: &impl Serialize) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

/// The inline script that instantiates every chart once Chart.js has loaded.
pub fn script_block(specs: &[ChartSpec]) -> String {
    format!(
        r#"<script>
(function () {{
  const specs = {};
  for (const spec of specs) {{
    const el = document.getElementById(spec.id);
    if (!el) continue;
    const cfg = spec.config;
    if (spec.titles) {{
      cfg.options.plugins.tooltip = {{ callbacks: {{ title: (items) => spec.titles[items[0].dataIndex] }} }};
    }}
    if (spec.percentAxis) {{
      cfg.options.scales[spec.percentAxis].ticks = {{ callback: (v) => v + '%' }};
    }}
    new Chart(el, cfg);
  }}
}})();
</script>"#,
        script_json(&specs)
    )
}
