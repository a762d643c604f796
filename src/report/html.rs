//! Static HTML report.
//!
//! One self-contained page: inline CSS, chart data embedded as script literals, and Chart.js
//! from a CDN as the only external asset. Rendering is a pure function of the [`Dashboard`].

use super::charts::{self, ChartSpec};
use super::stats::{FlaggedIssue, NextSprintStats, PodStats};
use super::theme::{priority_tag, stage_tag, state_tag};
use super::{BacklogSection, Dashboard, InitiativeView, StageGroup};
use crate::model::issue::Issue;
use crate::util::text::{escape_html, format_points, truncate};

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";
const FLAGS_PER_CARD: usize = 3;
const NEXT_ISSUES_PER_POD: usize = 10;

/// Render the whole report.
pub fn render(dash: &Dashboard) -> String {
    let burndown = charts::burndown(dash);
    let pod_tickets = charts::pod_tickets(dash);
    let pod_points = charts::pod_points(dash);
    let next_pods = charts::next_pods(dash);
    let engineer_points = charts::engineer_points(dash);
    let pareto = charts::pareto(dash);

    let current = render_current(dash, &[&burndown, &pod_tickets, &pod_points]);
    let next = render_next(dash, &[&next_pods, &engineer_points, &pareto]);

    let specs: Vec<ChartSpec> = [burndown, pod_tickets, pod_points, next_pods, engineer_points, pareto]
        .into_iter()
        .flatten()
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sprint Report - {sprint}</title>
    <style>{css}</style>
    <script src="{chart_js}"></script>
</head>
<body>
    <div class="container">
        {header}
        {current}
        {next}
        {initiatives}
        {footer}
    </div>
    {script}
</body>
</html>"#,
        sprint = escape_html(&dash.sprint_label),
        css = inline_css(),
        chart_js = CHART_JS_URL,
        header = render_header(dash),
        current = current,
        next = next,
        initiatives = render_initiatives(dash),
        footer = render_footer(dash),
        script = charts::script_block(&specs),
    )
}

fn render_header(dash: &Dashboard) -> String {
    format!(
        r#"<header>
    <h1>Sprint Ops Report</h1>
    <div class="meta">{sprint} • {pods} active pods</div>
</header>"#,
        sprint = escape_html(&dash.sprint_label),
        pods = dash.overall.active_pods,
    )
}

fn kpi_card(label: &str, value: &str, sub: &str) -> String {
    format!(
        r#"<div class="kpi"><h3>{label}</h3><div class="value">{value}</div><div class="sub">{sub}</div></div>"#,
        label = escape_html(label),
        value = escape_html(value),
        sub = escape_html(sub),
    )
}

/// A chart container, or nothing when the chart has no data.
fn chart_panel(spec: &Option<ChartSpec>, title: &str, wide: bool) -> String {
    match spec {
        Some(spec) => format!(
            r#"<div class="panel{wide}"><h3>{title}</h3><div class="chart"><canvas id="{id}"></canvas></div></div>"#,
            wide = if wide { " wide" } else { "" },
            title = escape_html(title),
            id = escape_html(&spec.id),
        ),
        None => String::new(),
    }
}

fn issue_link(issue: &Issue) -> String {
    let key = escape_html(&issue.identifier);
    match &issue.url {
        Some(url) => format!(r#"<a href="{}" target="_blank">{key}</a>"#, escape_html(url)),
        None => key,
    }
}

fn render_current(dash: &Dashboard, charts: &[&Option<ChartSpec>; 3]) -> String {
    let overall = &dash.overall;
    let kpis = [
        kpi_card(
            "Tickets done",
            &format!("{}%", overall.pct_tickets),
            &format!("{} of {}", overall.completed, overall.total),
        ),
        kpi_card(
            "Points done",
            &format!("{}%", overall.pct_points),
            &format!(
                "{} of {} pts",
                format_points(overall.done_pts),
                format_points(overall.total_pts)
            ),
        ),
        kpi_card("Blocked", &overall.blocked.len().to_string(), "labelled blocked"),
        kpi_card(
            "Stale",
            &overall.stale.len().to_string(),
            &format!("in progress, no update > {}d", dash.stale_days),
        ),
    ]
    .concat();

    let cards: String = dash
        .pods
        .iter()
        .map(|p| render_pod_card(p, dash.stale_days))
        .collect();

    let pods = if dash.pods.is_empty() {
        r#"<p class="notice">No tracker data. Run <code>sprint-report fetch-linear</code> first.</p>"#
            .to_string()
    } else {
        format!(r#"<div class="pods">{cards}</div>"#)
    };

    format!(
        r#"<section class="section">
    <h2>1. Current Sprint</h2>
    <div class="kpis">{kpis}</div>
    <div class="panels">{burndown}{tickets}{points}</div>
    {pods}
    {blocked}
    {stale}
</section>"#,
        burndown = chart_panel(charts[0], "Burndown", true),
        tickets = chart_panel(charts[1], "Tickets per pod", false),
        points = chart_panel(charts[2], "Points per pod", false),
        blocked = render_attention_table("Blocked issues", &overall.blocked),
        stale = render_attention_table(
            &format!("Stale issues (no update in more than {} days)", dash.stale_days),
            &overall.stale
        ),
    )
}

fn render_pod_card(pod: &PodStats, stale_days: i64) -> String {
    let Some(cycle_name) = &pod.cycle_name else {
        return format!(
            r#"<div class="pod" style="border-top-color:{color}">
    <h3>{name}</h3>
    <p class="muted">No current cycle</p>
    <div class="stats"><span>0 tickets</span><span>0 pts</span><span>0%</span></div>
</div>"#,
            color = escape_html(&pod.color),
            name = escape_html(&pod.pod),
        );
    };

    format!(
        r#"<div class="pod" style="border-top-color:{color}">
    <h3>{name} <span class="muted">{cycle}</span></h3>
    <div class="bar"><div style="width:{pct_pts}%;background:{color}"></div></div>
    <div class="stats">
        <span><strong>{completed}</strong>/{total} tickets ({pct_tickets}%)</span>
        <span><strong>{done_pts}</strong>/{total_pts} pts ({pct_pts}%)</span>
        <span>{in_progress} in progress</span>
        <span>{canceled} canceled</span>
    </div>
    {blocked}
    {stale}
</div>"#,
        color = escape_html(&pod.color),
        name = escape_html(&pod.pod),
        cycle = escape_html(cycle_name),
        completed = pod.completed,
        total = pod.total,
        pct_tickets = pod.pct_tickets,
        done_pts = format_points(pod.done_pts),
        total_pts = format_points(pod.total_pts),
        pct_pts = pod.pct_points,
        in_progress = pod.in_progress,
        canceled = pod.canceled,
        blocked = render_flag_list("Blocked", "tag-red", &pod.blocked),
        stale = render_flag_list(&format!("Stale > {stale_days}d"), "tag-yellow", &pod.stale),
    )
}

/// The first few flagged issues with a "+N more" tail.
fn render_flag_list(title: &str, tag: &str, issues: &[Issue]) -> String {
    if issues.is_empty() {
        return String::new();
    }
    let items: String = issues
        .iter()
        .take(FLAGS_PER_CARD)
        .map(|i| {
            format!(
                "<li>{} {}</li>",
                issue_link(i),
                escape_html(&truncate(&i.title, 60))
            )
        })
        .collect();
    let more = match issues.len().saturating_sub(FLAGS_PER_CARD) {
        0 => String::new(),
        n => format!(r#"<li class="muted">+{n} more</li>"#),
    };
    format!(
        r#"<div class="flags"><span class="tag {tag}">{title} ({count})</span><ul>{items}{more}</ul></div>"#,
        title = escape_html(title),
        count = issues.len(),
    )
}

fn render_attention_table(title: &str, flagged: &[FlaggedIssue]) -> String {
    if flagged.is_empty() {
        return String::new();
    }
    let rows: String = flagged
        .iter()
        .map(|f| {
            let updated = f
                .issue
                .updated_at
                .map(|u| u.format("%b %d").to_string())
                .unwrap_or_default();
            format!(
                "<tr><td>{pod}</td><td>{key}</td><td>{title}</td><td>{assignee}</td><td>{state}</td><td>{updated}</td></tr>",
                pod = escape_html(&f.pod),
                key = issue_link(&f.issue),
                title = escape_html(&truncate(&f.issue.title, 80)),
                assignee = escape_html(f.issue.assignee_name()),
                state = escape_html(&f.issue.state.name),
            )
        })
        .collect();
    format!(
        r#"<h3>{title}</h3>
<table>
    <thead><tr><th>Pod</th><th>Issue</th><th>Title</th><th>Assignee</th><th>State</th><th>Updated</th></tr></thead>
    <tbody>{rows}</tbody>
</table>"#,
        title = escape_html(title),
    )
}

fn render_next(dash: &Dashboard, charts: &[&Option<ChartSpec>; 3]) -> String {
    let label = dash.next_sprint_label.as_deref().unwrap_or("Next sprint");
    let backlog: String = dash.backlog.iter().map(render_backlog).collect();

    if dash.next.is_empty() {
        return format!(
            r#"<section class="section">
    <h2>2. Next Sprint</h2>
    <p class="notice">No next-sprint data yet. Cycles for the next sprint have not been planned or contain no issues.</p>
    {backlog}
</section>"#
        );
    }

    let heaviest = match dash.pareto.first() {
        Some(top) => kpi_card(
            "Heaviest ticket",
            &format!("{} pts", format_points(top.pts)),
            &format!("{} {}", top.label, top.title),
        ),
        None => String::new(),
    };
    let kpis = [
        kpi_card("Planned tickets", &dash.next_total().to_string(), label),
        kpi_card(
            "Planned points",
            &format_points(dash.next_total_pts()),
            &format!("{} pods", dash.next.len()),
        ),
        kpi_card(
            "Engineers",
            &dash.next_engineers().len().to_string(),
            "with planned work",
        ),
        heaviest,
    ]
    .concat();
    let pods: String = dash.next.iter().map(render_next_pod).collect();

    format!(
        r#"<section class="section">
    <h2>2. Next Sprint <span class="muted">{label}</span></h2>
    <div class="kpis">{kpis}</div>
    <div class="panels">{pods_chart}{engineers_chart}{pareto_chart}</div>
    {pods}
    {backlog}
</section>"#,
        label = escape_html(label),
        pods_chart = chart_panel(charts[0], "Tickets and points per pod", false),
        engineers_chart = chart_panel(charts[1], "Points per engineer", false),
        pareto_chart = chart_panel(
            charts[2],
            &format!("Top {} issues by points", dash.pareto.len()),
            true
        ),
    )
}

fn render_next_pod(next: &NextSprintStats) -> String {
    let rows: String = next
        .issues
        .iter()
        .take(NEXT_ISSUES_PER_POD)
        .map(issue_row)
        .collect();
    let more = match next.issues.len().saturating_sub(NEXT_ISSUES_PER_POD) {
        0 => String::new(),
        n => format!(r#"<p class="muted">+{n} more</p>"#),
    };
    format!(
        r#"<h3><span class="dot" style="background:{color}"></span>{pod} <span class="muted">{cycle} • {total} tickets • {pts} pts</span></h3>
<table>
    <thead><tr><th>Issue</th><th>Title</th><th>Assignee</th><th>State</th><th>Priority</th><th>Pts</th></tr></thead>
    <tbody>{rows}</tbody>
</table>
{more}"#,
        color = escape_html(&next.color),
        pod = escape_html(&next.pod),
        cycle = escape_html(&next.cycle.display_name()),
        total = next.total,
        pts = format_points(next.total_pts),
    )
}

fn issue_row(issue: &Issue) -> String {
    let priority = issue
        .priority_label()
        .map(|p| format!(r#"<span class="tag {}">{p}</span>"#, priority_tag(p)))
        .unwrap_or_default();
    format!(
        r#"<tr><td>{key}</td><td>{title}</td><td>{assignee}</td><td><span class="tag {state_tag}">{state}</span></td><td>{priority}</td><td>{pts}</td></tr>"#,
        key = issue_link(issue),
        title = escape_html(&truncate(&issue.title, 80)),
        assignee = escape_html(issue.assignee_name()),
        state_tag = state_tag(&issue.state.kind),
        state = escape_html(&issue.state.name),
        pts = issue.estimate.map(format_points).unwrap_or_else(|| "–".into()),
    )
}

fn render_backlog(section: &BacklogSection) -> String {
    let rows: String = section.issues.iter().map(issue_row).collect();
    format!(
        r#"<h3><span class="dot" style="background:{color}"></span>{pod} backlog <span class="muted">no current cycle • {count} unplanned issues</span></h3>
<table>
    <thead><tr><th>Issue</th><th>Title</th><th>Assignee</th><th>State</th><th>Priority</th><th>Pts</th></tr></thead>
    <tbody>{rows}</tbody>
</table>"#,
        color = escape_html(&section.color),
        pod = escape_html(&section.pod),
        count = section.issues.len(),
    )
}

fn render_initiatives(dash: &Dashboard) -> String {
    let body = match &dash.initiatives {
        InitiativeView::AccessError { service_account } => {
            let share_with = service_account
                .as_deref()
                .map(|email| format!("<code>{}</code>", escape_html(email)))
                .unwrap_or_else(|| "the service account used by this report".to_string());
            format!(
                r#"<div class="notice warn">
    <strong>Initiatives sheet not accessible.</strong>
    <p>Share the sheet with {share_with} (Viewer access), or set <code>GOOGLE_API_KEY</code> for a sheet readable by link, then run <code>sprint-report fetch-sheets</code> again.</p>
</div>"#
            )
        }
        InitiativeView::Empty => {
            r#"<p class="notice">The initiatives sheet has no initiatives.</p>"#.to_string()
        }
        InitiativeView::Stages(groups) => {
            let kpis = [
                kpi_card("Initiatives", &dash.initiative_total.to_string(), "in the sheet"),
                kpi_card("Ready for Eng", &dash.ready_for_eng.to_string(), "marked TODO"),
                kpi_card("Waiting on info", &dash.waiting_info.to_string(), "need more input"),
            ]
            .concat();
            let groups: String = groups.iter().map(render_stage_group).collect();
            format!(r#"<div class="kpis">{kpis}</div>{groups}"#)
        }
    };

    format!(
        r#"<section class="section">
    <h2>3. Initiatives by Engineering Readiness</h2>
    {body}
</section>"#
    )
}

fn render_stage_group(group: &StageGroup) -> String {
    let rows: String = group
        .initiatives
        .iter()
        .map(|i| {
            format!(
                "<tr><td><strong>{name}</strong>{description}</td><td>{pillar}</td><td>{owner}</td><td>{status}</td><td>{priority}</td><td>{target}</td><td>{raw}</td></tr>",
                name = escape_html(&i.name),
                description = if i.description.is_empty() {
                    String::new()
                } else {
                    format!(
                        r#"<br><span class="muted">{}</span>"#,
                        escape_html(&truncate(&i.description, 80))
                    )
                },
                pillar = escape_html(&i.pillar),
                owner = escape_html(&i.owner),
                status = escape_html(&i.status),
                priority = escape_html(&i.priority),
                target = escape_html(&i.target_date),
                raw = escape_html(&truncate(&i.eng_readiness_raw, 120)),
            )
        })
        .collect();
    format!(
        r#"<h3><span class="tag {tag}">{label}</span> <span class="muted">{count}</span></h3>
<table>
    <thead><tr><th>Initiative</th><th>Pillar</th><th>Owner</th><th>Status</th><th>Priority</th><th>Target</th><th>Readiness notes</th></tr></thead>
    <tbody>{rows}</tbody>
</table>"#,
        tag = if group.known { stage_tag(&group.label) } else { "tag-gray" },
        label = escape_html(&group.label),
        count = group.initiatives.len(),
    )
}

fn render_footer(dash: &Dashboard) -> String {
    format!(
        r#"<footer>Generated {}</footer>"#,
        dash.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; line-height: 1.5; color: #0f172a; background: #f8fafc; }
.container { max-width: 1400px; margin: 0 auto; padding: 2rem; }
header { margin-bottom: 2rem; padding-bottom: 1rem; border-bottom: 2px solid #e2e8f0; }
header h1 { font-size: 1.75rem; }
.meta, .muted { color: #64748b; font-size: 0.875rem; font-weight: 400; }
.section { margin-bottom: 3rem; }
.section h2 { font-size: 1.35rem; margin-bottom: 1rem; }
.section h3 { font-size: 1rem; margin: 1.25rem 0 0.5rem; }
.kpis { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 1rem; margin-bottom: 1.5rem; }
.kpi { background: #fff; padding: 1rem; border-radius: 0.5rem; border-left: 4px solid #6366f1; }
.kpi h3 { font-size: 0.8rem; margin: 0; color: #64748b; text-transform: uppercase; }
.kpi .value { font-size: 1.75rem; font-weight: 700; }
.kpi .sub { font-size: 0.8rem; color: #64748b; }
.panels { display: grid; grid-template-columns: repeat(2, 1fr); gap: 1rem; margin-bottom: 1.5rem; }
.panel { background: #fff; padding: 1rem; border-radius: 0.5rem; }
.panel.wide { grid-column: 1 / -1; }
.panel h3 { margin-top: 0; }
.chart { position: relative; height: 300px; }
.pods { display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 1rem; }
.pod { background: #fff; padding: 1rem; border-radius: 0.5rem; border-top: 4px solid #94a3b8; }
.pod h3 { margin-top: 0; }
.stats { display: flex; flex-wrap: wrap; gap: 0.75rem; font-size: 0.85rem; margin: 0.5rem 0; }
.bar { height: 6px; background: #e2e8f0; border-radius: 3px; overflow: hidden; }
.bar div { height: 100%; }
.flags ul { list-style: none; font-size: 0.85rem; margin-top: 0.25rem; }
.dot { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 0.4rem; }
table { width: 100%; border-collapse: collapse; background: #fff; font-size: 0.85rem; margin-bottom: 1rem; }
th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #e2e8f0; vertical-align: top; }
th { background: #f1f5f9; font-weight: 600; }
a { color: #4f46e5; text-decoration: none; }
.tag { display: inline-block; padding: 0.1rem 0.5rem; border-radius: 999px; font-size: 0.75rem; font-weight: 600; }
.tag-green { background: #dcfce7; color: #166534; }
.tag-yellow { background: #fef9c3; color: #854d0e; }
.tag-red { background: #fee2e2; color: #991b1b; }
.tag-blue { background: #dbeafe; color: #1e40af; }
.tag-purple { background: #f3e8ff; color: #6b21a8; }
.tag-gray { background: #f1f5f9; color: #475569; }
.notice { background: #fff; padding: 1rem; border-radius: 0.5rem; border-left: 4px solid #94a3b8; }
.notice.warn { border-left-color: #f59e0b; background: #fffbeb; }
.notice p { margin-top: 0.5rem; }
code { font-family: ui-monospace, monospace; font-size: 0.85em; }
footer { color: #94a3b8; font-size: 0.8rem; text-align: center; padding-top: 1rem; }
"#
}
