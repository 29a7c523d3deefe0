//! REST API handlers for device management

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use habridge_core::{DescriptorPayload, DeviceDescriptor};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Decode a create/edit body
fn decode_payload(body: &[u8]) -> ApiResult<DescriptorPayload> {
    Ok(serde_json::from_slice(body)?)
}

/// Bare OPTIONS request; real preflights are answered by the CORS layer
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Register a new device
pub async fn create_device(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let payload = decode_payload(&body)?;
    payload.validate()?;

    let device = state
        .store
        .save(DeviceDescriptor::from_payload(payload))
        .await?;
    info!(device = %device.id, name = ?device.name, "Created device");

    Ok((StatusCode::CREATED, Json(device)))
}

/// List all registered devices
pub async fn list_devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let devices = state.store.find_all().await;
    debug!(count = devices.len(), "Get all devices");
    Json(devices)
}

/// Get a specific device by ID
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeviceDescriptor>> {
    debug!(device = %id, "Get a device");
    state
        .store
        .find_one(&id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// Merge an edit into an existing device
pub async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<DeviceDescriptor>> {
    let update = decode_payload(&body)?;

    let device = state
        .store
        .update(&id, update)
        .await?
        .ok_or(ApiError::UpdateTargetMissing(id))?;
    info!(device = %device.id, name = ?device.name, "Saved edited device");

    Ok(Json(device))
}

/// Remove a device
pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.store.find_one(&id).await.is_none() {
        return Err(ApiError::NotFound(id));
    }
    state.store.delete(&id).await?;
    info!(device = %id, "Deleted device");

    Ok(StatusCode::OK)
}

/// Report the bridge version
pub async fn get_version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!(version = %state.version, "Get HA Bridge version");
    (
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "version": state.version }).to_string(),
    )
}

pub async fn vera_devices(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let devices = state.hubs.vera_devices().ok_or(ApiError::Unavailable("vera"))?;
    Ok(Json(devices))
}

pub async fn vera_scenes(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let scenes = state.hubs.vera_scenes().ok_or(ApiError::Unavailable("vera"))?;
    Ok(Json(scenes))
}

pub async fn harmony_activities(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let activities = state
        .hubs
        .harmony_activities()
        .ok_or(ApiError::Unavailable("harmony"))?;
    Ok(Json(activities))
}

/// Activities currently running on each hub
pub async fn harmony_show(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let current = state
        .hubs
        .harmony_current_activities()
        .ok_or(ApiError::Unavailable("harmony"))?;
    Ok(Json(current))
}

pub async fn harmony_devices(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let devices = state
        .hubs
        .harmony_devices()
        .ok_or(ApiError::Unavailable("harmony"))?;
    Ok(Json(devices))
}
