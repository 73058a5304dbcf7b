//! Canonical action vocabulary and the alias table that feeds it.
//!
//! Upstream detectors name the same remediation many ways (`block_ip`,
//! `ban_ip`, `restart_service`, ...). Everything past the normalizer works
//! with [`CanonicalAction`] only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RemedyError;

// ---------------------------------------------------------------------------
// CanonicalAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalAction {
    Block,
    Unblock,
    ListBlocked,
    Restart,
    Scale,
    Rollback,
    Drain,
    Notify,
}

/// Where the orchestrator sends a canonical action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Ledger,
    ApprovalGate,
    Notifier,
}

/// Target field an action cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Ip,
    Service,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Ledger => "ledger",
            Route::ApprovalGate => "approval_gate",
            Route::Notifier => "notifier",
        }
    }
}

impl RequiredField {
    pub fn as_str(self) -> &'static str {
        match self {
            RequiredField::Ip => "ip",
            RequiredField::Service => "service",
        }
    }
}

impl CanonicalAction {
    pub fn all() -> &'static [CanonicalAction] {
        &[
            CanonicalAction::Block,
            CanonicalAction::Unblock,
            CanonicalAction::ListBlocked,
            CanonicalAction::Restart,
            CanonicalAction::Scale,
            CanonicalAction::Rollback,
            CanonicalAction::Drain,
            CanonicalAction::Notify,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalAction::Block => "block",
            CanonicalAction::Unblock => "unblock",
            CanonicalAction::ListBlocked => "list_blocked",
            CanonicalAction::Restart => "restart",
            CanonicalAction::Scale => "scale",
            CanonicalAction::Rollback => "rollback",
            CanonicalAction::Drain => "drain",
            CanonicalAction::Notify => "notify",
        }
    }

    pub fn route(self) -> Route {
        match self {
            CanonicalAction::Block | CanonicalAction::Unblock | CanonicalAction::ListBlocked => {
                Route::Ledger
            }
            CanonicalAction::Restart
            | CanonicalAction::Scale
            | CanonicalAction::Rollback
            | CanonicalAction::Drain => Route::ApprovalGate,
            CanonicalAction::Notify => Route::Notifier,
        }
    }

    pub fn required_field(self) -> Option<RequiredField> {
        match self {
            CanonicalAction::Block | CanonicalAction::Unblock => Some(RequiredField::Ip),
            CanonicalAction::Restart
            | CanonicalAction::Scale
            | CanonicalAction::Rollback
            | CanonicalAction::Drain => Some(RequiredField::Service),
            CanonicalAction::ListBlocked | CanonicalAction::Notify => None,
        }
    }

    /// Service-impacting actions never execute here; they open a ticket.
    pub fn requires_approval(self) -> bool {
        self.route() == Route::ApprovalGate
    }
}

impl fmt::Display for CanonicalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CanonicalAction {
    type Err = RemedyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s).ok_or_else(|| RemedyError::UnsupportedAction(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Alias table
// ---------------------------------------------------------------------------

/// Legacy and detector-specific spellings. Canonical names are matched
/// separately so this table only lists the aliases.
pub const ALIASES: &[(&str, CanonicalAction)] = &[
    ("block_ip", CanonicalAction::Block),
    ("ban_ip", CanonicalAction::Block),
    ("temp_block", CanonicalAction::Block),
    ("temporary_block", CanonicalAction::Block),
    ("block_ip_temp", CanonicalAction::Block),
    ("unblock_ip", CanonicalAction::Unblock),
    ("unban_ip", CanonicalAction::Unblock),
    ("remove_block", CanonicalAction::Unblock),
    ("list_blocked_ips", CanonicalAction::ListBlocked),
    ("list_blocks", CanonicalAction::ListBlocked),
    ("blocked_ips", CanonicalAction::ListBlocked),
    ("restart_service", CanonicalAction::Restart),
    ("restart_pod", CanonicalAction::Restart),
    ("scale_service", CanonicalAction::Scale),
    ("scale_deployment", CanonicalAction::Scale),
    ("rollback_deployment", CanonicalAction::Rollback),
    ("rollback_service", CanonicalAction::Rollback),
    ("drain_node", CanonicalAction::Drain),
    ("drain_service", CanonicalAction::Drain),
    ("drain_traffic", CanonicalAction::Drain),
    ("trigger_alert", CanonicalAction::Notify),
    ("send_alert", CanonicalAction::Notify),
    ("alert", CanonicalAction::Notify),
    ("notify_team", CanonicalAction::Notify),
];

/// Resolve a raw action name. Matching ignores surrounding whitespace and
/// ASCII case. Unknown names yield `None`; nothing is guessed.
pub fn normalize(raw: &str) -> Option<CanonicalAction> {
    let key = raw.trim().to_ascii_lowercase();
    if let Some(action) = CanonicalAction::all()
        .iter()
        .find(|a| a.as_str() == key)
    {
        return Some(*action);
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, action)| *action)
}
