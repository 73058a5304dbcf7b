use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::RemedyError;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = RemedyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(RemedyError::InvalidSeverity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TicketPriority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketPriority {
    Highest,
    High,
    Medium,
    Low,
}

impl TicketPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::Highest => "Highest",
            TicketPriority::High => "High",
            TicketPriority::Medium => "Medium",
            TicketPriority::Low => "Low",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Policy functions
// ---------------------------------------------------------------------------

/// How long a block for `severity` lasts, in multiples of `unit`.
///
/// `None` means permanent: the block is never lifted automatically.
pub fn block_duration(severity: Severity, unit: Duration) -> Option<Duration> {
    match severity {
        Severity::Low => Some(unit),
        Severity::Medium => Some(unit * 2),
        Severity::High | Severity::Critical => None,
    }
}

pub fn ticket_priority(severity: Severity) -> TicketPriority {
    match severity {
        Severity::Critical => TicketPriority::Highest,
        Severity::High => TicketPriority::High,
        Severity::Medium => TicketPriority::Medium,
        Severity::Low => TicketPriority::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn durations_scale_with_unit() {
        assert_eq!(block_duration(Severity::Low, MINUTE), Some(MINUTE));
        assert_eq!(
            block_duration(Severity::Medium, MINUTE),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            block_duration(Severity::Medium, Duration::from_secs(3600)),
            Some(Duration::from_secs(7200))
        );
    }

    #[test]
    fn high_and_critical_are_permanent() {
        assert_eq!(block_duration(Severity::High, MINUTE), None);
        assert_eq!(block_duration(Severity::Critical, MINUTE), None);
    }

    #[test]
    fn priority_mapping() {
        assert_eq!(ticket_priority(Severity::Critical), TicketPriority::Highest);
        assert_eq!(ticket_priority(Severity::High), TicketPriority::High);
        assert_eq!(ticket_priority(Severity::Medium), TicketPriority::Medium);
        assert_eq!(ticket_priority(Severity::Low), TicketPriority::Low);
    }

    #[test]
    fn policy_is_total_and_deterministic() {
        for s in Severity::all() {
            assert_eq!(block_duration(*s, MINUTE), block_duration(*s, MINUTE));
            assert_eq!(ticket_priority(*s), ticket_priority(*s));
        }
    }

    #[test]
    fn default_is_medium() {
        assert_eq!(Severity::default(), Severity::Medium);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert!(matches!(
            "urgent".parse::<Severity>(),
            Err(RemedyError::InvalidSeverity(_))
        ));
    }
}
