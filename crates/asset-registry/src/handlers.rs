//! API request handlers for the Asset Registry

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use asset_common::Error;
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    models::{Asset, AssetFields, ListParams},
    service::AssetService,
};

/// Shared application state
pub struct AppState {
    pub service: AssetService,
}

impl AppState {
    pub fn new(service: AssetService) -> Self {
        Self { service }
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_infrastructure() {
            error!("Store failure: {}", err);
        }

        let status = match &err {
            Error::InvalidArgument(_)
            | Error::InvalidId(_)
            | Error::Conflict(_)
            | Error::DuplicateKey(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::JsonSerialization(_) | Error::Redis(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        // Undecodable query parameters are reported like undecodable bodies
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: rejection.body_text(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "asset-registry"
    }))
}

/// Create a new asset
pub async fn create_asset_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AssetFields>, JsonRejection>,
) -> Result<Json<Asset>, ApiError> {
    let Json(fields) = payload?;
    info!("Creating asset with tag: {}", fields.asset_tag);

    let asset = state.service.create(fields).await?;
    Ok(Json(asset))
}

/// Get an asset by ID
pub async fn get_asset_handler(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    info!("Getting asset: {}", asset_id);

    let asset = state.service.get(&asset_id).await?;
    Ok(Json(asset))
}

/// List assets, optionally filtered by `q`
pub async fn list_assets_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    let Query(params) = params?;
    info!(
        "Listing assets (q: {:?}, skip: {}, limit: {})",
        params.q, params.skip, params.limit
    );

    let assets = state.service.list(&params).await?;
    Ok(Json(assets))
}

/// Replace an existing asset
pub async fn update_asset_handler(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
    payload: Result<Json<AssetFields>, JsonRejection>,
) -> Result<Json<Asset>, ApiError> {
    info!("Updating asset: {}", asset_id);

    // A malformed ID is reported ahead of a malformed body
    if !state.service.store().id_codec().is_valid(&asset_id) {
        return Err(Error::InvalidArgument(crate::service::INVALID_ID.to_string()).into());
    }
    let Json(fields) = payload?;

    let asset = state.service.update(&asset_id, fields).await?;
    Ok(Json(asset))
}

/// Delete an asset
pub async fn delete_asset_handler(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Deleting asset: {}", asset_id);

    state.service.delete(&asset_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
