//! Minimarket master data API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use minimart_types::{api::ErrorResponse, RecordKind};
use serde_json::Value;
use tracing::debug;

use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn parse_kind(kind: &str) -> Result<RecordKind, ApiError> {
    kind.parse::<RecordKind>()
        .map_err(|e| (StatusCode::NOT_FOUND, Json(ErrorResponse::new(e))))
}

/// List every record of a kind.
#[utoipa::path(
    get,
    path = "/minimarket/{kind}",
    tag = "minimarket",
    params(
        ("kind" = RecordKind, Path, description = "Record kind (companies, brands, categories, products, transactions)")
    ),
    responses(
        (status = 200, description = "All records of the kind", content_type = "application/json"),
        (status = 404, description = "Unknown record kind", body = ErrorResponse)
    )
)]
pub async fn list_records(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    debug!("Listing {}", kind);
    Ok(Json(state.catalog().list_all(kind)))
}

/// Get a single record by ID.
#[utoipa::path(
    get,
    path = "/minimarket/{kind}/{id}",
    tag = "minimarket",
    params(
        ("kind" = RecordKind, Path, description = "Record kind"),
        ("id" = String, Path, description = "Record ID, e.g. prd_1")
    ),
    responses(
        (status = 200, description = "Record found", content_type = "application/json"),
        (status = 404, description = "Record not found", body = ErrorResponse)
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    state.catalog().find_by_id(kind, &id).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("{} not found", kind.singular()))),
        )
    })
}
