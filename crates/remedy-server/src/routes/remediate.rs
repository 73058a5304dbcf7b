use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use remedy_core::request::{RemediationRequest, ResultStatus, Target};
use remedy_core::severity::Severity;
use remedy_core::RemedyError;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RemediationBody {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub explicit_block: Option<bool>,
}

impl RemediationBody {
    fn into_request(self, action: String) -> Result<RemediationRequest, RemedyError> {
        let severity = match self.severity.as_deref() {
            Some(s) => s.parse()?,
            None => Severity::default(),
        };
        Ok(RemediationRequest {
            action,
            severity,
            target: self.target,
            issue: self.issue,
            description: self.description,
            explicit_block: self.explicit_block,
        })
    }
}

async fn run(app: &AppState, req: RemediationRequest) -> Result<Response, AppError> {
    let result = app.orchestrator.dispatch(&req).await?;
    let status = match result.status {
        ResultStatus::PendingApproval => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(result)).into_response())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST / and POST /api/remediate: action named in the body
pub async fn remediate(
    State(app): State<AppState>,
    body: Result<Json<RemediationBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(mut body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let action = body
        .action
        .take()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("request body must include 'action'"))?;
    run(&app, body.into_request(action)?).await
}

/// POST /api/actions/{action}: action named in the path, body optional
pub async fn remediate_action(
    State(app): State<AppState>,
    Path(action): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        RemediationBody::default()
    } else {
        serde_json::from_slice::<RemediationBody>(&body)
            .map_err(|e| AppError::bad_request(format!("invalid JSON body: {e}")))?
    };
    run(&app, body.into_request(action)?).await
}

/// GET /api/blocked: targets currently blocked on the enforcement backend
pub async fn list_blocked(State(app): State<AppState>) -> Result<Response, AppError> {
    run(&app, RemediationRequest::new("list_blocked")).await
}
