use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::ticketing::TicketRef;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
}

/// One inbound remediation, as received from a detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationRequest {
    /// Action name before normalization.
    pub action: String,
    pub severity: Severity,
    pub target: Target,
    pub issue: Option<String>,
    pub description: Option<String>,
    pub explicit_block: Option<bool>,
}

impl RemediationRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            severity: Severity::default(),
            target: Target::default(),
            issue: None,
            description: None,
            explicit_block: None,
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.target.ip = Some(ip.into());
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.target.service = Some(service.into());
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.target.replicas = Some(replicas);
        self
    }

    pub fn issue(mut self, issue: impl Into<String>) -> Self {
        self.issue = Some(issue.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn explicit_block(mut self, explicit: bool) -> Self {
        self.explicit_block = Some(explicit);
        self
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    PendingApproval,
    Skipped,
    NotFound,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationResult {
    pub status: ResultStatus,
    /// Result label: the canonical action, or `temp_block` for expiring blocks.
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unblock_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_ticket: Option<TicketRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RemediationResult {
    pub fn new(status: ResultStatus, action: impl Into<String>) -> Self {
        Self {
            status,
            action: action.into(),
            ip: None,
            service: None,
            replicas: None,
            unblock_at: None,
            permanent: None,
            jira_ticket: None,
            ips: None,
            message: None,
        }
    }

    /// Echo the request's target fields.
    pub fn with_target(mut self, target: &Target) -> Self {
        self.ip = target.ip.clone();
        self.service = target.service.clone();
        self.replicas = target.replicas;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
