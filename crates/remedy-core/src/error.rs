use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemedyError {
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("action '{action}' requires target.{field}")]
    MissingField { action: String, field: String },

    #[error("invalid severity '{0}': must be low, medium, high, or critical")]
    InvalidSeverity(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("enforcement backend error: {0}")]
    Enforcement(String),

    #[error("ticketing error: {0}")]
    Ticketing(String),

    #[error("notification error: {0}")]
    Notification(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("ledger store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RemedyError {
    /// Malformed input the caller can fix; no collaborator was invoked.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RemedyError::UnsupportedAction(_)
                | RemedyError::MissingField { .. }
                | RemedyError::InvalidSeverity(_)
                | RemedyError::InvalidTarget(_)
        )
    }

    /// A downstream collaborator (enforcement, ticketing, chat) failed.
    pub fn is_collaborator_error(&self) -> bool {
        matches!(
            self,
            RemedyError::Enforcement(_) | RemedyError::Ticketing(_) | RemedyError::Notification(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RemedyError>;
