use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

use crate::adf::Document;
use crate::error::Result;
use crate::severity::TicketPriority;

/// Opaque ticket key issued by the ticketing service. Stored and forwarded,
/// never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketRef(pub String);

impl TicketRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicket {
    pub summary: String,
    pub body: Document,
    pub priority: TicketPriority,
    pub issue_type: String,
    pub labels: Vec<String>,
}

#[async_trait]
pub trait TicketingClient: Send + Sync {
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketRef>;
}

// ---------------------------------------------------------------------------
// DryRunTicketing
// ---------------------------------------------------------------------------

/// Issues sequential keys (`SEC-1`, `SEC-2`, ...) and keeps every ticket in
/// memory.
#[derive(Debug)]
pub struct DryRunTicketing {
    key_prefix: String,
    issued: Mutex<Vec<(TicketRef, NewTicket)>>,
}

impl DryRunTicketing {
    pub fn new(key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn issued(&self) -> Vec<(TicketRef, NewTicket)> {
        self.issued
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl TicketingClient for DryRunTicketing {
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketRef> {
        let mut issued = self.issued.lock().unwrap_or_else(|p| p.into_inner());
        let key = TicketRef(format!("{}-{}", self.key_prefix, issued.len() + 1));
        tracing::info!(ticket = %key, summary = %ticket.summary, "dry-run: ticket created");
        issued.push((key.clone(), ticket.clone()));
        Ok(key)
    }
}
