use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::IssueTracker;
use crate::error::{body_excerpt, ReportError};
use crate::model::cycle::Cycle;
use crate::model::issue::Issue;

const LINEAR_API_URL: &str = "https://api.linear.app/graphql";
const SERVICE: &str = "Linear";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LinearClient {
    api_key: String,
    client: reqwest::Client,
}

impl LinearClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Linear HTTP client")?;
        Ok(Self { api_key, client })
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let resp = self
            .client
            .post(LINEAR_API_URL)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Linear API request failed")?;

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

        let gql: GqlResponse<T> = resp.json().await.context("Failed to parse Linear response")?;
        gql.into_data()
    }
}

const CYCLES_QUERY: &str = r#"query TeamCycles($teamId: ID!) {
  cycles(filter: { team: { id: { eq: $teamId } } }, first: 20) {
    nodes {
      id name number startsAt endsAt progress
      completedScopeHistory scopeHistory
    }
  }
}"#;

const CYCLE_ISSUES_QUERY: &str = r#"query CycleIssues($cycleId: String!) {
  cycle(id: $cycleId) {
    issues(first: 250) {
      nodes {
        id title identifier
        state { name type }
        assignee { name email }
        estimate priority
        updatedAt startedAt completedAt createdAt
        labels { nodes { name } }
        url
      }
    }
  }
}"#;

const BACKLOG_QUERY: &str = r#"query TeamBacklog($teamId: ID!) {
  issues(
    filter: {
      team: { id: { eq: $teamId } }
      state: { type: { in: ["backlog", "unstarted"] } }
      cycle: { null: true }
    }
    first: 100
  ) {
    nodes {
      id title identifier
      state { name type }
      assignee { name }
      estimate priority
      updatedAt
      labels { nodes { name } }
      url
    }
  }
}"#;

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

impl<T> GqlResponse<T> {
    fn into_data(self) -> Result<T> {
        if !self.errors.is_empty() {
            let message = self
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ReportError::Query {
                service: SERVICE,
                message,
            }
            .into());
        }
        self.data
            .ok_or_else(|| ReportError::shape(SERVICE, "no data in response").into())
    }
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CyclesData {
    cycles: Connection<Cycle>,
}

#[derive(Debug, Deserialize)]
struct CycleIssuesData {
    cycle: Option<CycleIssues>,
}

#[derive(Debug, Deserialize)]
struct CycleIssues {
    issues: Connection<Issue>,
}

#[derive(Debug, Deserialize)]
struct BacklogData {
    issues: Connection<Issue>,
}

/// Urgent first, issues without a priority (0) last. Stable within a priority.
pub fn sort_by_priority(issues: &mut [Issue]) {
    issues.sort_by_key(|i| match i.priority {
        Some(p) if p > 0 => p,
        _ => u8::MAX,
    });
}

#[async_trait]
impl IssueTracker for LinearClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn fetch_cycles(&self, team_id: &str) -> Result<Vec<Cycle>> {
        let data: CyclesData = self
            .query(CYCLES_QUERY, serde_json::json!({ "teamId": team_id }))
            .await?;
        Ok(data.cycles.nodes)
    }

    async fn fetch_cycle_issues(&self, cycle_id: &str) -> Result<Vec<Issue>> {
        let data: CycleIssuesData = self
            .query(CYCLE_ISSUES_QUERY, serde_json::json!({ "cycleId": cycle_id }))
            .await?;
        let cycle = data
            .cycle
            .ok_or_else(|| ReportError::shape(SERVICE, format!("cycle {cycle_id} not found")))?;
        Ok(cycle.issues.nodes)
    }

    async fn fetch_team_backlog(&self, team_id: &str) -> Result<Vec<Issue>> {
        let data: BacklogData = self
            .query(BACKLOG_QUERY, serde_json::json!({ "teamId": team_id }))
            .await?;
        let mut issues = data.issues.nodes;
        sort_by_priority(&mut issues);
        Ok(issues)
    }
}
