use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response, Result},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::database::DEFAULT_HISTORY_LIMIT;
use crate::model::{CoinSnapshot, Endpoints, HealthResponse, HistoryResponse, SnapshotSaved};

pub const MAX_HISTORY_LIMIT: u32 = 1000;

type ApiError = (StatusCode, Json<Value>);

/// Extractor failure, rendered with the same `{error, details}` envelope as handler errors.
#[derive(Debug)]
pub struct RequestRejection {
    status: StatusCode,
    error: &'static str,
    details: String,
}

impl From<QueryRejection> for RequestRejection {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            error: "Invalid query string",
            details: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for RequestRejection {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            error: "Invalid path parameter",
            details: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.error, "details": self.details })),
        )
            .into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(RequestRejection))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(RequestRejection))]
pub struct ApiPath<T>(pub T);

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.db.is_connected() {
        "Connected"
    } else {
        "Disconnected"
    };

    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        database,
        endpoints: Endpoints::ALL,
    })
}

pub async fn get_coins(
    State(state): State<AppState>,
) -> Result<Json<Vec<CoinSnapshot>>, ApiError> {
    match state.market.fetch_top_coins().await {
        Ok(coins) => Ok(Json(coins)),
        Err(err) => {
            tracing::error!("Failed to fetch coin data: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch coin data", "details": err.to_string() })),
            ))
        }
    }
}

pub async fn post_history(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SnapshotSaved>), ApiError> {
    let coins = state
        .market
        .fetch_top_coins()
        .await
        .map_err(|err| save_failed(&err))?;

    let timestamp = batch_timestamp();
    let records_count = state
        .db
        .append_snapshot(timestamp, &coins)
        .await
        .map_err(|err| save_failed(&err))?;

    tracing::info!(records_count, %timestamp, "stored market snapshot");

    Ok((
        StatusCode::CREATED,
        Json(SnapshotSaved {
            success: true,
            message: format!("Saved {} coin records", records_count),
            records_count,
            timestamp,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<String>,
}

pub async fn get_history(
    ApiPath(coin_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = parse_limit(params.limit.as_deref()).map_err(|details| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid limit parameter", "details": details })),
        )
    })?;

    let data = match state.db.query_history(&coin_id, limit).await {
        Ok(data) => data,
        Err(err) => {
            tracing::error!("Failed to get history for {}: {}", coin_id, err);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch historical data", "details": err.to_string() })),
            ));
        }
    };

    if data.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "No historical data found",
                "message": format!(
                    "No snapshots stored for {}. Run POST /api/history first to capture one.",
                    coin_id
                ),
                "coinId": coin_id,
            })),
        ));
    }

    Ok(Json(HistoryResponse {
        coin_id,
        records_count: data.len(),
        data,
    }))
}

pub async fn not_found(uri: Uri) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found", "path": uri.path() })),
    )
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "Method not allowed",
            "details": format!("{} is not supported on {}", method, uri.path()),
        })),
    )
}

fn save_failed(err: &dyn std::error::Error) -> ApiError {
    tracing::error!("Failed to save historical data: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Failed to save historical data",
            "details": err.to_string(),
        })),
    )
}

/// Missing or empty `limit` means the default; anything else must be a positive integer.
fn parse_limit(raw: Option<&str>) -> std::result::Result<u32, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_HISTORY_LIMIT),
        Some(raw) => raw,
    };

    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(u32::try_from(n).unwrap_or(u32::MAX).min(MAX_HISTORY_LIMIT)),
        Ok(n) => Err(format!("limit must be a positive integer, got {}", n)),
        Err(_) => Err(format!("limit must be a positive integer, got `{}`", raw)),
    }
}

// Millisecond precision so the reported timestamp matches what the store keeps.
fn batch_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
