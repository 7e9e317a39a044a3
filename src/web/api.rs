use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use super::AppState;
use crate::notifications::AlertType;
use crate::settings::{decode_tiers, AdminSettingsRequest, StoreError, ADMIN_KEY_HEADER};
use crate::tiers::{load_tiers_or_empty, resolve_rank, rank_index, sort_tiers, validate_table};
use crate::types::{AuthContext, Role, RANKS};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

// === Auth ===

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = match parts.headers.get(ADMIN_KEY_HEADER) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| api_error(StatusCode::UNAUTHORIZED, "malformed credential"))?,
            ),
            None => None,
        };

        state.auth.resolve(presented).ok_or_else(|| {
            warn!("Rejected request with unknown credential");
            api_error(StatusCode::UNAUTHORIZED, "invalid credential")
        })
    }
}

// === Settings Endpoints ===

#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    pub key: String,
}

pub async fn get_public_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> impl IntoResponse {
    match state.store.get(&query.key).await {
        Ok(entry) => {
            let etag = entry.etag();
            ([(header::ETAG, etag)], Json(entry)).into_response()
        }
        Err(e) => {
            error!("Failed to read setting '{}': {}", query.key, e);
            api_error(StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

pub async fn post_admin_settings(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(req): Json<AdminSettingsRequest>,
) -> impl IntoResponse {
    // Anonymous rejections are not recorded.
    if auth.role == Role::User {
        return api_error(StatusCode::UNAUTHORIZED, "admin credential required").into_response();
    }
    if !auth.is_admin() {
        state
            .notifications
            .notify(AlertType::UnauthorizedWrite {
                key: req.key.clone(),
                role: auth.role.to_string(),
            })
            .await;
        return api_error(StatusCode::FORBIDDEN, "admin credential required").into_response();
    }

    let mut value = req.value;
    if req.key == state.tier_key {
        let mut tiers = match decode_tiers(&value) {
            Ok(tiers) => tiers,
            Err(e) => return api_error(StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        if let Err(e) = validate_table(&tiers) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string(), "fields": e.errors() })),
            )
                .into_response();
        }
        sort_tiers(&mut tiers);
        value = match serde_json::to_value(&tiers) {
            Ok(v) => v,
            Err(e) => return api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        };
    }

    match state.store.put(&req.key, value, req.version).await {
        Ok(version) => {
            info!("Admin updated '{}' to version {}", req.key, version);
            state
                .notifications
                .notify(AlertType::SettingUpdated {
                    key: req.key.clone(),
                    version,
                })
                .await;
            (
                StatusCode::OK,
                Json(json!({ "status": "ok", "key": req.key, "version": version })),
            )
                .into_response()
        }
        Err(StoreError::Conflict { expected, current, .. }) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": format!("stale version {} (current {})", expected, current),
                "current_version": current,
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to write setting '{}': {}", req.key, e);
            api_error(StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

// === Rank / Tier Endpoints ===

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub balance: Decimal,
}

fn check_balance(balance: Decimal) -> Result<Decimal, ApiError> {
    if balance < Decimal::ZERO {
        Err(api_error(StatusCode::BAD_REQUEST, "balance must be >= 0"))
    } else {
        Ok(balance)
    }
}

pub async fn get_rank(Query(query): Query<BalanceQuery>) -> impl IntoResponse {
    let balance = match check_balance(query.balance) {
        Ok(b) => b,
        Err(e) => return e.into_response(),
    };
    Json(json!({
        "index": rank_index(balance),
        "rank": resolve_rank(balance),
    }))
    .into_response()
}

pub async fn get_ranks() -> impl IntoResponse {
    Json(&RANKS[..])
}

pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> impl IntoResponse {
    let balance = match check_balance(query.balance) {
        Ok(b) => b,
        Err(e) => return e.into_response(),
    };
    let tiers = load_tiers_or_empty(state.store.as_ref(), &state.tier_key).await;
    Json(state.badges.status(balance, &tiers)).into_response()
}

// === Notifications ===

pub async fn get_notifications(State(state): State<AppState>) -> impl IntoResponse {
    let recent = state.notifications.get_recent(50).await;
    Json(json!({ "notifications": recent }))
}

pub async fn get_pending_notifications(State(state): State<AppState>) -> impl IntoResponse {
    let pending = state.notifications.get_unacknowledged().await;
    Json(json!({ "notifications": pending }))
}

#[derive(Deserialize)]
pub struct AcknowledgeRequest {
    pub id: String,
}

pub async fn post_acknowledge_notification(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(req): Json<AcknowledgeRequest>,
) -> impl IntoResponse {
    if !auth.is_staff() {
        return api_error(StatusCode::FORBIDDEN, "staff credential required").into_response();
    }
    if state.notifications.acknowledge(&req.id).await {
        (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
    } else {
        api_error(StatusCode::NOT_FOUND, "notification not found").into_response()
    }
}

// === Health Check ===

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
