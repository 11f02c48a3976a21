//! `/uiDevice/*` handlers
//!
//! Query-string rejections are turned into `ARGUMENT_INVALID` envelopes so
//! every failure reaches the client in the same shape.

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::dispatcher::FindObjectResult;
use crate::error::{AppError, Result};
use crate::models::{
    ClickQuery, DisplayRotation, DisplaySizeDp, DumpWindowHierarchyQuery, FindObjectQuery,
    PressKeyCodeQuery, ScreenshotQuery, StatusResponse, ValueResponse, WaitForIdleQuery,
    WaitForWindowUpdateQuery,
};

use super::super::state::AppState;

type QueryResult<T> = std::result::Result<Query<T>, QueryRejection>;

pub async fn dump_window_hierarchy(
    State(state): State<Arc<AppState>>,
    query: QueryResult<DumpWindowHierarchyQuery>,
) -> Result<Json<serde_json::Value>> {
    let Query(query) = query?;
    Ok(Json(state.commands.dump_window_hierarchy(&query.format).await?))
}

/// Screenshot as a PNG body. The file behind it is deleted shortly after.
pub async fn screenshot(
    State(state): State<Arc<AppState>>,
    query: QueryResult<ScreenshotQuery>,
) -> Result<Response> {
    let Query(query) = query?;
    let shot = state.commands.screenshot(query.scale, query.quality).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", shot.artifact.file_name()),
        )
        .header(header::CONTENT_LENGTH, shot.bytes.len().to_string())
        .body(Body::from(shot.bytes))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

pub async fn click(
    State(state): State<Arc<AppState>>,
    query: QueryResult<ClickQuery>,
) -> Result<Json<StatusResponse>> {
    let Query(query) = query?;
    Ok(Json(state.commands.click(query.x, query.y).await?))
}

pub async fn current_package_name(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ValueResponse<String>>> {
    Ok(Json(state.commands.current_package_name().await?))
}

pub async fn display_height(State(state): State<Arc<AppState>>) -> Result<Json<ValueResponse<i32>>> {
    Ok(Json(state.commands.display_height().await?))
}

pub async fn display_width(State(state): State<Arc<AppState>>) -> Result<Json<ValueResponse<i32>>> {
    Ok(Json(state.commands.display_width().await?))
}

pub async fn display_rotation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ValueResponse<DisplayRotation>>> {
    Ok(Json(state.commands.display_rotation().await?))
}

pub async fn display_size_dp(State(state): State<Arc<AppState>>) -> Result<Json<DisplaySizeDp>> {
    Ok(Json(state.commands.display_size_dp().await?))
}

pub async fn find_object(
    State(state): State<Arc<AppState>>,
    query: QueryResult<FindObjectQuery>,
) -> Result<Json<FindObjectResult>> {
    let Query(query) = query?;
    Ok(Json(state.commands.find_object(&query).await?))
}

pub async fn last_traversed_text(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ValueResponse<Option<String>>>> {
    Ok(Json(state.commands.last_traversed_text().await?))
}

pub async fn press_back(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    Ok(Json(state.commands.press_back().await?))
}

pub async fn press_delete(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    Ok(Json(state.commands.press_delete().await?))
}

pub async fn press_enter(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    Ok(Json(state.commands.press_enter().await?))
}

pub async fn press_home(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    Ok(Json(state.commands.press_home().await?))
}

pub async fn press_key_code(
    State(state): State<Arc<AppState>>,
    query: QueryResult<PressKeyCodeQuery>,
) -> Result<Json<StatusResponse>> {
    let Query(query) = query?;
    Ok(Json(
        state
            .commands
            .press_key_code(query.key_code, query.meta_state)
            .await?,
    ))
}

pub async fn product_name(State(state): State<Arc<AppState>>) -> Result<Json<ValueResponse<String>>> {
    Ok(Json(state.commands.product_name().await?))
}

pub async fn wait_for_idle(
    State(state): State<Arc<AppState>>,
    query: QueryResult<WaitForIdleQuery>,
) -> Result<Json<StatusResponse>> {
    let Query(query) = query?;
    Ok(Json(state.commands.wait_for_idle(query.timeout).await?))
}

pub async fn wait_for_window_update(
    State(state): State<Arc<AppState>>,
    query: QueryResult<WaitForWindowUpdateQuery>,
) -> Result<Json<StatusResponse>> {
    let Query(query) = query?;
    Ok(Json(
        state
            .commands
            .wait_for_window_update(query.timeout, query.package_name)
            .await?,
    ))
}
