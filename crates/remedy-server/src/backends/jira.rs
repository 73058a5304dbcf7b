use async_trait::async_trait;
use remedy_core::ticketing::{NewTicket, TicketRef, TicketingClient};
use remedy_core::{RemedyError, Result};
use serde::Deserialize;

/// Jira Cloud REST v3 issue creation, basic auth with an API token.
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    project_key: String,
    email: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

impl JiraClient {
    pub fn new(
        base_url: impl Into<String>,
        project_key: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_key: project_key.into(),
            email: email.into(),
            token: token.into(),
        }
    }

    fn issue_payload(&self, ticket: &NewTicket) -> serde_json::Value {
        serde_json::json!({
            "fields": {
                "project": { "key": self.project_key },
                "summary": ticket.summary,
                "description": ticket.body,
                "issuetype": { "name": ticket.issue_type },
                "priority": { "name": ticket.priority.as_str() },
                "labels": ticket.labels,
            }
        })
    }
}

#[async_trait]
impl TicketingClient for JiraClient {
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketRef> {
        let resp = self
            .client
            .post(format!("{}/rest/api/3/issue", self.base_url))
            .basic_auth(&self.email, Some(&self.token))
            .json(&self.issue_payload(ticket))
            .send()
            .await
            .map_err(|e| RemedyError::Ticketing(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| RemedyError::Ticketing(e.to_string()))?;
        if !status.is_success() {
            return Err(RemedyError::Ticketing(format!("{status}: {text}")));
        }
        let created: CreatedIssue = serde_json::from_str(&text)
            .map_err(|e| RemedyError::Ticketing(format!("unreadable response ({e}): {text}")))?;
        Ok(TicketRef(created.key))
    }
}
