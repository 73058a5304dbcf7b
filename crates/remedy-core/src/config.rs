use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::approval::{default_labels, DEFAULT_ISSUE_TYPE};
use crate::error::{RemedyError, Result};
use crate::ledger::{BlockPolicy, LedgerSettings};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// BlockConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockConfig {
    #[serde(default)]
    pub policy: BlockPolicy,
    /// Length of one severity unit in seconds.
    #[serde(default = "default_ttl_unit_secs")]
    pub ttl_unit_secs: u64,
}

fn default_ttl_unit_secs() -> u64 {
    60
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            policy: BlockPolicy::default(),
            ttl_unit_secs: default_ttl_unit_secs(),
        }
    }
}

impl BlockConfig {
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            ttl_unit: Duration::from_secs(self.ttl_unit_secs),
            policy: self.policy,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator configs
// ---------------------------------------------------------------------------

pub const DEFAULT_CLOUDFLARE_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnforcementConfig {
    #[default]
    DryRun,
    Cloudflare {
        zone_id: String,
        #[serde(default = "default_cloudflare_token_env")]
        api_token_env: String,
        #[serde(default = "default_cloudflare_base_url")]
        base_url: String,
    },
}

fn default_cloudflare_token_env() -> String {
    "CLOUDFLARE_API_TOKEN".to_string()
}

fn default_cloudflare_base_url() -> String {
    DEFAULT_CLOUDFLARE_BASE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketingConfig {
    DryRun {
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
    Jira {
        base_url: String,
        project_key: String,
        email: String,
        #[serde(default = "default_jira_token_env")]
        api_token_env: String,
        #[serde(default = "default_issue_type")]
        issue_type: String,
        #[serde(default = "default_labels")]
        labels: Vec<String>,
    },
}

fn default_key_prefix() -> String {
    "SEC".to_string()
}

fn default_jira_token_env() -> String {
    "JIRA_API_TOKEN".to_string()
}

fn default_issue_type() -> String {
    DEFAULT_ISSUE_TYPE.to_string()
}

impl Default for TicketingConfig {
    fn default() -> Self {
        TicketingConfig::DryRun {
            key_prefix: default_key_prefix(),
        }
    }
}

impl TicketingConfig {
    pub fn issue_type(&self) -> &str {
        match self {
            TicketingConfig::DryRun { .. } => DEFAULT_ISSUE_TYPE,
            TicketingConfig::Jira { issue_type, .. } => issue_type,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        match self {
            TicketingConfig::DryRun { .. } => default_labels(),
            TicketingConfig::Jira { labels, .. } => labels.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Environment variable holding the chat webhook URL. Unset means alerts
    /// are written to the log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_webhook_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Redb {
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub block: BlockConfig,
    #[serde(default)]
    pub enforcement: EnforcementConfig,
    #[serde(default)]
    pub ticketing: TicketingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Read a YAML config. A missing file yields the dry-run defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent; using defaults");
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.block.ttl_unit_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "block.ttl_unit_secs is 0: temporary blocks would lift immediately"
                    .to_string(),
            });
        } else if self.block.ttl_unit_secs > 7 * 24 * 3600 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "block.ttl_unit_secs={} is more than a week",
                    self.block.ttl_unit_secs
                ),
            });
        }

        match &self.enforcement {
            EnforcementConfig::DryRun => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "enforcement is dry_run: no rules reach a real backend".to_string(),
            }),
            EnforcementConfig::Cloudflare {
                zone_id,
                api_token_env,
                ..
            } => {
                if zone_id.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: "enforcement.zone_id is empty".to_string(),
                    });
                }
                check_env(&mut warnings, "enforcement.api_token_env", api_token_env);
            }
        }

        if let TicketingConfig::Jira {
            base_url,
            project_key,
            api_token_env,
            ..
        } = &self.ticketing
        {
            if base_url.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "ticketing.base_url is empty".to_string(),
                });
            }
            if project_key.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "ticketing.project_key is empty".to_string(),
                });
            }
            check_env(&mut warnings, "ticketing.api_token_env", api_token_env);
        }

        if let Some(var) = &self.notifications.slack_webhook_env {
            if std::env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "notifications.slack_webhook_env: ${var} is not set; notify requests will fail"
                    ),
                });
            }
        }

        if self.store == StoreConfig::Memory {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "store is memory: pending expiries are lost on restart".to_string(),
            });
        }

        warnings
    }
}

fn check_env(warnings: &mut Vec<ConfigWarning>, key: &str, var: &str) {
    if std::env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) {
        warnings.push(ConfigWarning {
            level: WarnLevel::Error,
            message: format!("{key}: ${var} is not set"),
        });
    }
}

/// Read a secret from the environment variable named in the config.
pub fn resolve_secret(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RemedyError::NotConfigured(format!(
            "environment variable {var} is not set"
        ))),
    }
}
