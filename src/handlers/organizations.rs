// src/handlers/organizations.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Role,
    models::inventory::CreateItemPayload,
    models::tenancy::{CreateOrganizationPayload, OrganizationSetupPayload},
};

pub async fn create_organization(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateOrganizationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let industry = payload
        .industry
        .as_deref()
        .map(|s| s.to_uppercase())
        .unwrap_or_else(|| "OTHER".to_string());
    let timezone = payload.timezone.as_deref().unwrap_or("Australia/Canberra");

    let organization = app_state
        .org_repo
        .create(
            app_state.db_pool(),
            &payload.name,
            Some(&claims.email),
            &industry,
            payload.address.as_deref(),
            payload.phone.as_deref(),
            timezone,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn get_organization(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let organization = app_state
        .org_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::OrganizationNotFound)?;

    // Só membros da organização podem vê-la
    if claims.organization_id != Some(organization.id) {
        return Err(AppError::Forbidden("acesso negado".to_string()));
    }
    Ok(Json(organization))
}

pub async fn list_organizations(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != Role::Admin {
        return Err(AppError::Forbidden("requer papel ADMIN".to_string()));
    }
    let organizations = app_state.org_repo.list_all().await?;
    Ok(Json(organizations))
}

// Onboarding: configura a organização, cria a primeira loja e os itens
// iniciais, e marca o usuário como fora do fluxo de organização nova.
// Tudo na mesma transação.
pub async fn setup_organization(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<OrganizationSetupPayload>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = claims.organization_id.ok_or(AppError::MissingOrganization)?;

    let mut tx = app_state.db_pool().begin().await?;

    let organization = app_state
        .org_repo
        .update_settings(
            &mut *tx,
            organization_id,
            &payload.org_settings,
            payload.default_categories.as_deref(),
        )
        .await?;

    let store = app_state
        .store_repo
        .create(
            &mut *tx,
            payload.store.name.as_deref().unwrap_or("Main Store"),
            payload.store.address.as_deref(),
            organization_id,
        )
        .await?;

    for item in &payload.items {
        let create = CreateItemPayload {
            name: item.name.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            monday_required: item.monday_required,
            tuesday_required: item.tuesday_required,
            wednesday_required: item.wednesday_required,
            thursday_required: item.thursday_required,
            friday_required: item.friday_required,
            saturday_required: item.saturday_required,
            sunday_required: item.sunday_required,
            store_id: store.id,
        };
        app_state
            .item_repo
            .create(&mut *tx, &create, organization_id)
            .await?;
    }

    app_state.user_repo.mark_onboarded(&mut *tx, claims.user_id).await?;

    tx.commit().await?;

    tracing::info!(
        "✅ Onboarding concluído para a organização {} (loja {}).",
        organization_id,
        store.id
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Configuração da organização concluída com sucesso",
            "organization": organization,
            "stores": [store.clone()],
            "organizationId": organization_id,
            "storeId": store.id,
        })),
    ))
}
