use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::require_admin;
use crate::error::{AppError, AppResult};
use crate::repository::catalog::{self, BlockedDateRow};
use crate::schemas::{validate_input, BlockPath, CreateBlockInput, PropertyPath};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/properties/{property_id}/blocked-dates",
            axum::routing::get(list_blocks).post(create_block),
        )
        .route(
            "/blocked-dates/{block_id}",
            axum::routing::delete(delete_block),
        )
}

async fn list_blocks(
    State(state): State<AppState>,
    Path(path): Path<PropertyPath>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    require_admin(&state, &headers)?;
    let pool = super::db_pool(&state)?;
    let blocks = catalog::list_blocks(pool, path.property_id).await?;
    Ok(Json(json!({ "data": blocks })))
}

async fn create_block(
    State(state): State<AppState>,
    Path(path): Path<PropertyPath>,
    headers: HeaderMap,
    Json(payload): Json<CreateBlockInput>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers)?;
    validate_input(&payload)?;
    if payload.end_date < payload.start_date {
        return Err(AppError::BadRequest(
            "end_date must not precede start_date.".to_string(),
        ));
    }
    let pool = super::db_pool(&state)?;

    if catalog::get_property(pool, path.property_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Property {} not found.",
            path.property_id
        )));
    }

    let created: BlockedDateRow = catalog::insert_block(
        pool,
        path.property_id,
        payload.start_date,
        payload.end_date,
        &payload.block_type,
        payload.reason.as_deref(),
    )
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

async fn delete_block(
    State(state): State<AppState>,
    Path(path): Path<BlockPath>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers)?;
    let pool = super::db_pool(&state)?;
    let removed = catalog::delete_block(pool, path.block_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound(format!(
            "Blocked date {} not found.",
            path.block_id
        )));
    }
    Ok(axum::http::StatusCode::NO_CONTENT)
}
