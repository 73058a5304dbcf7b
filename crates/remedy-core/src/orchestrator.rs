//! Remediation dispatcher.
//!
//! A request is normalized, checked for the target fields its action needs,
//! and only then routed to the ledger, the approval gate, or the notifier.
//! Validation failures never reach a collaborator.

use std::net::IpAddr;
use std::sync::Arc;

use crate::action::{normalize, CanonicalAction, RequiredField};
use crate::approval::ApprovalGate;
use crate::error::{RemedyError, Result};
use crate::ledger::{BlockLedger, BlockOutcome, UnblockOutcome};
use crate::notify::Notifier;
use crate::request::{RemediationRequest, RemediationResult, ResultStatus};

pub struct Orchestrator {
    ledger: BlockLedger,
    gate: ApprovalGate,
    notifier: Arc<dyn Notifier>,
}

/// A request that passed validation, bound to its route.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Block { ip: String, explicit: bool },
    Unblock { ip: String },
    ListBlocked,
    Approval { action: CanonicalAction },
    Notify,
}

impl Orchestrator {
    pub fn new(ledger: BlockLedger, gate: ApprovalGate, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger,
            gate,
            notifier,
        }
    }

    pub fn ledger(&self) -> &BlockLedger {
        &self.ledger
    }

    pub async fn dispatch(&self, req: &RemediationRequest) -> Result<RemediationResult> {
        let command = prepare(req)?;
        tracing::debug!(raw = %req.action, ?command, severity = %req.severity, "routing remediation");

        match command {
            Command::Block { ip, explicit } => self.block(req, &ip, explicit).await,
            Command::Unblock { ip } => self.unblock(req, &ip).await,
            Command::ListBlocked => {
                let ips = self.ledger.list_blocked().await?;
                let mut result = RemediationResult::new(ResultStatus::Success, "list_blocked");
                result.ips = Some(ips);
                Ok(result)
            }
            Command::Approval { action } => {
                let key = self
                    .gate
                    .request_approval(
                        action,
                        &req.target,
                        req.severity,
                        req.issue.as_deref(),
                        req.description.as_deref(),
                    )
                    .await?;
                let mut result = RemediationResult::new(ResultStatus::PendingApproval, action.as_str())
                    .with_target(&req.target)
                    .with_message("approval ticket opened; action not executed");
                result.jira_ticket = Some(key);
                Ok(result)
            }
            Command::Notify => {
                self.notifier.send(&notification_text(req)).await?;
                Ok(RemediationResult::new(ResultStatus::Success, "notify")
                    .with_target(&req.target)
                    .with_message("notification sent"))
            }
        }
    }

    async fn block(
        &self,
        req: &RemediationRequest,
        ip: &str,
        explicit: bool,
    ) -> Result<RemediationResult> {
        let note = block_note(req);
        let outcome = self.ledger.block(ip, req.severity, explicit, &note).await?;
        let result = match outcome {
            BlockOutcome::Temporary { unblock_at, .. } => {
                let mut r = RemediationResult::new(ResultStatus::Success, "temp_block");
                r.unblock_at = Some(unblock_at);
                r
            }
            BlockOutcome::Permanent { .. } => {
                let mut r = RemediationResult::new(ResultStatus::Success, "block");
                r.permanent = Some(true);
                r
            }
            BlockOutcome::Skipped { reason } => {
                RemediationResult::new(ResultStatus::Skipped, "block").with_message(reason)
            }
        };
        Ok(result.with_target(&req.target))
    }

    async fn unblock(&self, req: &RemediationRequest, ip: &str) -> Result<RemediationResult> {
        let result = match self.ledger.unblock(ip).await? {
            UnblockOutcome::Removed { .. } => RemediationResult::new(ResultStatus::Success, "unblock"),
            UnblockOutcome::NotFound => RemediationResult::new(ResultStatus::NotFound, "unblock")
                .with_message(format!("no active block for {ip}")),
        };
        Ok(result.with_target(&req.target))
    }
}

fn prepare(req: &RemediationRequest) -> Result<Command> {
    let action =
        normalize(&req.action).ok_or_else(|| RemedyError::UnsupportedAction(req.action.clone()))?;

    match action.required_field() {
        Some(RequiredField::Ip) => {
            let ip = required(action, RequiredField::Ip, req.target.ip.as_deref())?;
            // Canonical form, so every spelling of one address shares a ledger key.
            let ip = ip
                .parse::<IpAddr>()
                .map_err(|_| RemedyError::InvalidTarget(format!("'{ip}' is not an IP address")))?
                .to_string();
            Ok(match action {
                CanonicalAction::Block => Command::Block {
                    ip,
                    explicit: req.explicit_block.unwrap_or(false),
                },
                _ => Command::Unblock { ip },
            })
        }
        Some(RequiredField::Service) => {
            required(action, RequiredField::Service, req.target.service.as_deref())?;
            Ok(Command::Approval { action })
        }
        None => Ok(match action {
            CanonicalAction::ListBlocked => Command::ListBlocked,
            _ => Command::Notify,
        }),
    }
}

fn required<'a>(
    action: CanonicalAction,
    field: RequiredField,
    value: Option<&'a str>,
) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RemedyError::MissingField {
            action: action.to_string(),
            field: field.as_str().to_string(),
        }),
    }
}

fn block_note(req: &RemediationRequest) -> String {
    match req.issue.as_deref() {
        Some(issue) => format!("remedy ({}): {issue}", req.severity),
        None => format!("remedy ({})", req.severity),
    }
}

fn notification_text(req: &RemediationRequest) -> String {
    let mut text = format!(
        "[{}] {}",
        req.severity.as_str().to_uppercase(),
        req.issue.as_deref().unwrap_or("Security alert")
    );
    if let Some(description) = req.description.as_deref() {
        text.push('\n');
        text.push_str(description);
    }
    if let Some(service) = req.target.service.as_deref() {
        text.push_str(&format!("\nservice: {service}"));
    }
    if let Some(ip) = req.target.ip.as_deref() {
        text.push_str(&format!("\nip: {ip}"));
    }
    text
}
