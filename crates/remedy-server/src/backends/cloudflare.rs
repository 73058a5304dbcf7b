//! Zone-scoped IP access rules on the Cloudflare v4 API.
//!
//! Rules live under `/zones/{zone_id}/firewall/access_rules/rules` and are
//! authenticated with a bearer token.

use async_trait::async_trait;
use remedy_core::enforcement::{ActiveRule, EnforcementBackend, RuleMode};
use remedy_core::{RemedyError, Result};
use serde::Deserialize;

const PAGE_SIZE: u32 = 1000;

pub struct CloudflareBackend {
    client: reqwest::Client,
    base_url: String,
    zone_id: String,
    token: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: u32,
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct RuleId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AccessRule {
    id: String,
    mode: RuleMode,
    configuration: RuleConfiguration,
}

#[derive(Debug, Deserialize)]
struct RuleConfiguration {
    value: String,
}

fn enforcement_err(e: impl std::fmt::Display) -> RemedyError {
    RemedyError::Enforcement(e.to_string())
}

/// Access rules distinguish IPv4 from IPv6 targets.
fn target_kind(target: &str) -> &'static str {
    if target.contains(':') {
        "ip6"
    } else {
        "ip"
    }
}

// ---------------------------------------------------------------------------
// CloudflareBackend
// ---------------------------------------------------------------------------

impl CloudflareBackend {
    pub fn new(
        base_url: impl Into<String>,
        zone_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            zone_id: zone_id.into(),
            token: token.into(),
        }
    }

    fn rules_url(&self) -> String {
        format!(
            "{}/zones/{}/firewall/access_rules/rules",
            self.base_url, self.zone_id
        )
    }

    /// Turn a response into its `result`, failing on HTTP errors or an
    /// unsuccessful envelope.
    async fn read_envelope<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Envelope<T>> {
        let status = resp.status();
        let text = resp.text().await.map_err(enforcement_err)?;
        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            RemedyError::Enforcement(format!("{status}: unreadable response ({e}): {text}"))
        })?;
        if !status.is_success() || !envelope.success {
            let messages: Vec<String> = envelope
                .errors
                .iter()
                .map(|m| format!("{} ({})", m.message, m.code))
                .collect();
            return Err(RemedyError::Enforcement(format!(
                "{status}: {}",
                messages.join("; ")
            )));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl EnforcementBackend for CloudflareBackend {
    async fn install_block(&self, target: &str, note: &str) -> Result<String> {
        let body = serde_json::json!({
            "mode": "block",
            "configuration": { "target": target_kind(target), "value": target },
            "notes": note,
        });
        let resp = self
            .client
            .post(self.rules_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(enforcement_err)?;
        let envelope: Envelope<RuleId> = Self::read_envelope(resp).await?;
        envelope
            .result
            .map(|r| r.id)
            .ok_or_else(|| RemedyError::Enforcement("rule created without an id".to_string()))
    }

    async fn remove_block(&self, rule_id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/{rule_id}", self.rules_url()))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(enforcement_err)?;
        Self::read_envelope::<RuleId>(resp).await?;
        Ok(())
    }

    async fn list_rules(&self) -> Result<Vec<ActiveRule>> {
        let mut rules = Vec::new();
        let mut page = 1u32;
        loop {
            let resp = self
                .client
                .get(self.rules_url())
                .bearer_auth(&self.token)
                .query(&[
                    ("page", page.to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                ])
                .send()
                .await
                .map_err(enforcement_err)?;
            let envelope: Envelope<Vec<AccessRule>> = Self::read_envelope(resp).await?;
            rules.extend(envelope.result.unwrap_or_default().into_iter().map(|r| {
                ActiveRule {
                    id: r.id,
                    mode: r.mode,
                    target: r.configuration.value,
                }
            }));
            match envelope.result_info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => break,
            }
        }
        Ok(rules)
    }
}
