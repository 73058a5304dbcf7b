//! HTTP clients for the external collaborators, and their construction from
//! config. Secrets are read from the environment variables the config names.

pub mod cloudflare;
pub mod jira;
pub mod slack;

use std::sync::Arc;

use remedy_core::config::{resolve_secret, EnforcementConfig, NotificationConfig, TicketingConfig};
use remedy_core::enforcement::{DryRunEnforcement, EnforcementBackend};
use remedy_core::notify::{LogNotifier, Notifier};
use remedy_core::ticketing::{DryRunTicketing, TicketingClient};
use remedy_core::Result;

pub use cloudflare::CloudflareBackend;
pub use jira::JiraClient;
pub use slack::SlackNotifier;

pub fn enforcement(cfg: &EnforcementConfig) -> Result<Arc<dyn EnforcementBackend>> {
    match cfg {
        EnforcementConfig::DryRun => {
            tracing::warn!("enforcement backend is dry-run; blocks are not enforced");
            Ok(Arc::new(DryRunEnforcement::new()))
        }
        EnforcementConfig::Cloudflare {
            zone_id,
            api_token_env,
            base_url,
        } => {
            let token = resolve_secret(api_token_env)?;
            Ok(Arc::new(CloudflareBackend::new(
                base_url.as_str(),
                zone_id.as_str(),
                token,
            )))
        }
    }
}

pub fn ticketing(cfg: &TicketingConfig) -> Result<Arc<dyn TicketingClient>> {
    match cfg {
        TicketingConfig::DryRun { key_prefix } => {
            Ok(Arc::new(DryRunTicketing::new(key_prefix.as_str())))
        }
        TicketingConfig::Jira {
            base_url,
            project_key,
            email,
            api_token_env,
            ..
        } => {
            let token = resolve_secret(api_token_env)?;
            Ok(Arc::new(JiraClient::new(
                base_url.as_str(),
                project_key.as_str(),
                email.as_str(),
                token,
            )))
        }
    }
}

/// With no webhook variable configured, alerts go to the log. A configured
/// but unset variable yields a notifier that refuses to send.
pub fn notifier(cfg: &NotificationConfig) -> Arc<dyn Notifier> {
    match &cfg.slack_webhook_env {
        None => Arc::new(LogNotifier),
        Some(var) => {
            let url = resolve_secret(var).ok();
            if url.is_none() {
                tracing::warn!(var = %var, "slack webhook variable is not set; notify requests will fail");
            }
            Arc::new(SlackNotifier::new(url))
        }
    }
}
