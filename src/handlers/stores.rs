// src/handlers/stores.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Role,
    models::inventory::CreateStorePayload,
};

// Usuários com escopo de loja só enxergam as próprias lojas; escopo vazio
// devolve lista vazia, nunca erro.
pub async fn get_all_stores(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let store_scoped = claims.role == Role::Store || claims.store_role.is_some();

    let stores = if store_scoped {
        if claims.store_ids.is_empty() {
            Vec::new()
        } else {
            app_state
                .store_repo
                .list(claims.organization_id, Some(claims.store_ids.as_slice()))
                .await?
        }
    } else {
        app_state.store_repo.list(claims.organization_id, None).await?
    };

    Ok(Json(stores))
}

pub async fn create_store(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateStorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // A organização das claims sobrepõe a do payload
    let organization_id = claims
        .organization_id
        .or(payload.organization_id)
        .ok_or(AppError::MissingOrganization)?;

    let store = app_state
        .store_repo
        .create(
            app_state.db_pool(),
            &payload.name,
            payload.address.as_deref(),
            organization_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}
