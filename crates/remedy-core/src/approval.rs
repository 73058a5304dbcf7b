//! Approval gate for service-impacting actions.
//!
//! `restart`, `scale`, `rollback` and `drain` are never executed here. The
//! gate files a ticket describing the requested action and hands the key
//! back; fulfilment happens outside this process once a human approves.

use std::sync::Arc;

use crate::action::CanonicalAction;
use crate::adf::Document;
use crate::error::Result;
use crate::request::Target;
use crate::severity::{ticket_priority, Severity};
use crate::ticketing::{NewTicket, TicketRef, TicketingClient};

pub const DEFAULT_ISSUE_TYPE: &str = "Task";

pub fn default_labels() -> Vec<String> {
    vec![
        "security".to_string(),
        "remediation".to_string(),
        "approval-required".to_string(),
    ]
}

pub struct ApprovalGate {
    ticketing: Arc<dyn TicketingClient>,
    issue_type: String,
    labels: Vec<String>,
}

impl ApprovalGate {
    pub fn new(
        ticketing: Arc<dyn TicketingClient>,
        issue_type: impl Into<String>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            ticketing,
            issue_type: issue_type.into(),
            labels,
        }
    }

    /// Open an approval ticket. Ticketing failures propagate unchanged.
    pub async fn request_approval(
        &self,
        action: CanonicalAction,
        target: &Target,
        severity: Severity,
        issue: Option<&str>,
        description: Option<&str>,
    ) -> Result<TicketRef> {
        let ticket = self.build_ticket(action, target, severity, issue, description);
        let key = self.ticketing.create_ticket(&ticket).await?;
        tracing::info!(%action, service = ?target.service, ticket = %key, "approval requested");
        Ok(key)
    }

    pub fn build_ticket(
        &self,
        action: CanonicalAction,
        target: &Target,
        severity: Severity,
        issue: Option<&str>,
        description: Option<&str>,
    ) -> NewTicket {
        let service = target.service.as_deref().unwrap_or("unknown service");
        let summary = match issue {
            Some(issue) if !issue.trim().is_empty() => {
                format!("[Approval required] {action} {service}: {}", issue.trim())
            }
            _ => format!("[Approval required] {action} {service}"),
        };

        let mut body = description.map(Document::from_text).unwrap_or_default();
        if let Some(issue) = issue {
            body.push_paragraph(&format!("Triggering issue: {issue}"));
        }
        body.push_paragraph(&format!("Severity: {severity}"));
        match (action, target.replicas) {
            (CanonicalAction::Scale, Some(n)) => body.push_paragraph(&format!(
                "Requested action: scale service {service} to {n} replicas"
            )),
            _ => body.push_paragraph(&format!("Requested action: {action} service {service}")),
        }
        body.push_paragraph(
            "This action was not executed automatically and is awaiting human approval.",
        );

        let mut labels = self.labels.clone();
        let action_label = format!("action-{action}");
        if !labels.contains(&action_label) {
            labels.push(action_label);
        }

        NewTicket {
            summary,
            body,
            priority: ticket_priority(severity),
            issue_type: self.issue_type.clone(),
            labels,
        }
    }
}
