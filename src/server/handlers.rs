use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConvertError, HistoryError, StatsError, ValidateRequestError};
use crate::history::{HistoryEntry, NewHistoryEntry};
use crate::router::MetaSource;
use crate::service::{FormatBridge, HistoryOutcome};
use crate::settings::Engine;
use crate::stats::StatsSnapshot;
use crate::transform::ConversionMeta;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPayload {
    #[serde(default)]
    input_string: String,
    #[serde(default)]
    settings_string: String,
    user_id: Option<i64>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<ConversionMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine: Option<Engine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta_source: Option<MetaSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

pub async fn health_check() -> &'static str {
    "formatbridge API"
}

pub async fn health_handler(State(bridge): State<FormatBridge>) -> impl IntoResponse {
    let rpc = match bridge.backend_health().await {
        Ok(true) => "up".to_string(),
        Ok(false) => "degraded".to_string(),
        Err(e) => format!("down: {}", e),
    };

    Json(serde_json::json!({ "ok": true, "service": "formatbridge", "rpcBackend": rpc }))
}

pub async fn convert_handler(
    State(bridge): State<FormatBridge>,
    Json(payload): Json<ConvertPayload>,
) -> impl IntoResponse {
    match bridge
        .convert(payload.user_id, &payload.input_string, &payload.settings_string)
        .await
    {
        Ok(conversion) => {
            let (saved, history_id, history_error) = match conversion.history {
                HistoryOutcome::NotRequested => (None, None, None),
                HistoryOutcome::Saved(id) => (Some(true), Some(id), None),
                HistoryOutcome::Failed(e) => (Some(false), None, Some(e)),
            };
            let result = conversion.result;

            (
                StatusCode::OK,
                Json(ConvertResponse {
                    ok: true,
                    output: Some(result.output),
                    meta: Some(result.meta),
                    engine: Some(result.engine),
                    meta_source: Some(result.meta_source),
                    saved,
                    history_id,
                    history_error,
                    ..Default::default()
                }),
            )
        }
        Err(e) => {
            let (status, kind) = match &e {
                ConvertError::BackendUnavailable(_) => (StatusCode::BAD_GATEWAY, "backend_unavailable"),
                ConvertError::BackendProtocol(_) => (StatusCode::BAD_GATEWAY, "backend_protocol"),
                ConvertError::Transform(_) => (StatusCode::UNPROCESSABLE_ENTITY, "transform"),
            };
            warn!("[HTTP] convert failed ({}): {}", kind, e);

            (
                status,
                Json(ConvertResponse {
                    ok: false,
                    error: Some(e.to_string()),
                    kind: Some(kind),
                    ..Default::default()
                }),
            )
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePayload {
    #[serde(default)]
    text: String,
    format: Option<String>,
    #[serde(default)]
    settings_string: String,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    ok: bool,
    errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    unavailable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ValidateResponse {
    fn rejected(message: impl Into<String>) -> Self {
        ValidateResponse {
            ok: false,
            errors: vec![message.into()],
            format: None,
            unavailable: false,
            details: None,
        }
    }
}

pub async fn validate_handler(
    State(bridge): State<FormatBridge>,
    Json(payload): Json<ValidatePayload>,
) -> impl IntoResponse {
    if payload.text.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ValidateResponse::rejected("Input is empty.")));
    }

    match bridge
        .validate(payload.format.as_deref(), &payload.settings_string, &payload.text)
        .await
    {
        Ok(validation) => (
            StatusCode::OK,
            Json(ValidateResponse {
                ok: validation.verdict.ok,
                errors: validation.verdict.errors,
                format: Some(validation.format),
                unavailable: false,
                details: None,
            }),
        ),
        Err(e @ ValidateRequestError::FormatUnresolved) => {
            (StatusCode::BAD_REQUEST, Json(ValidateResponse::rejected(e.to_string())))
        }
        Err(ValidateRequestError::Gateway(e)) => {
            warn!("[HTTP] validate failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ValidateResponse {
                    ok: false,
                    errors: vec!["Validator service is not reachable.".to_string()],
                    format: None,
                    unavailable: true,
                    details: Some(e.to_string()),
                }),
            )
        }
    }
}

#[derive(Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    user_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    ok: bool,
    user_id: i64,
    #[serde(flatten)]
    snapshot: StatsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn stats_handler(
    State(bridge): State<FormatBridge>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let user_id = query.user_id.unwrap_or(0);

    let (status, snapshot, error) = match bridge.stats(user_id) {
        Ok(snapshot) => (StatusCode::OK, snapshot, None),
        Err(e @ StatsError::InvalidUser(_)) => (StatusCode::BAD_REQUEST, StatsSnapshot::default(), Some(e.to_string())),
        Err(e @ StatsError::Store(_)) => {
            warn!("[HTTP] stats failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, StatsSnapshot::default(), Some(e.to_string()))
        }
    };

    (
        status,
        Json(StatsResponse {
            ok: error.is_none(),
            user_id,
            snapshot,
            error,
        }),
    )
}

#[derive(Serialize)]
pub struct HistoryListResponse {
    ok: bool,
    entries: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn history_status(e: &HistoryError) -> StatusCode {
    match e {
        HistoryError::InvalidUser(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn history_list_handler(
    State(bridge): State<FormatBridge>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    match bridge.recorder().list(query.user_id.unwrap_or(0)) {
        Ok(entries) => (
            StatusCode::OK,
            Json(HistoryListResponse {
                ok: true,
                entries,
                error: None,
            }),
        ),
        Err(e) => (
            history_status(&e),
            Json(HistoryListResponse {
                ok: false,
                entries: Vec::new(),
                error: Some(e.to_string()),
            }),
        ),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveHistoryPayload {
    user_id: i64,
    input_format: Option<String>,
    output_format: Option<String>,
    #[serde(default)]
    settings: String,
    #[serde(default)]
    input: String,
    #[serde(default)]
    output: String,
}

#[derive(Serialize)]
pub struct SaveHistoryResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn history_save_handler(
    State(bridge): State<FormatBridge>,
    Json(payload): Json<SaveHistoryPayload>,
) -> impl IntoResponse {
    let entry = NewHistoryEntry {
        input_format: payload.input_format,
        output_format: payload.output_format,
        settings_text: payload.settings,
        input_text: payload.input,
        output_text: payload.output,
        created_at: chrono::Utc::now(),
    };

    match bridge.recorder().record_entry(payload.user_id, entry) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(SaveHistoryResponse {
                ok: true,
                id: Some(id),
                error: None,
            }),
        ),
        Err(e) => (
            history_status(&e),
            Json(SaveHistoryResponse {
                ok: false,
                id: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}
