// src/handlers/items.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::inventory::{CreateItemPayload, UpdateItemPayload},
};

pub async fn create_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let item = app_state.inventory_service.create_item(&claims, &payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.get_item(&claims, id).await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListQuery {
    pub store_id: Option<i32>,
}

pub async fn get_all_items(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state
        .inventory_service
        .list_items(&claims, query.store_id)
        .await?;
    Ok(Json(items))
}

pub async fn get_items_by_store(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(store_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state
        .inventory_service
        .list_items_by_store(&claims, store_id)
        .await?;
    Ok(Json(items))
}

// Atualização guardada: valida a repartição por dia, registra histórico e
// enfileira a notificação em lote.
pub async fn update_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state
        .inventory_service
        .update_item(&claims, id, &payload)
        .await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.delete_item(&claims, id).await?;
    Ok(Json(item))
}
