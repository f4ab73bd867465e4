// src/handlers/categories.rs
//
// Categorias padrão da organização: uma lista ordenada e sem repetição
// guardada na própria linha da organização.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::tenancy::Organization,
};

async fn load_organization(
    app_state: &AppState,
    organization_id: Option<i32>,
) -> Result<Organization, AppError> {
    let organization_id = organization_id.ok_or(AppError::MissingOrganization)?;
    app_state
        .org_repo
        .find_by_id(organization_id)
        .await?
        .ok_or(AppError::OrganizationNotFound)
}

pub async fn get_categories(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let organization = load_organization(&app_state, claims.organization_id).await?;
    Ok(Json(json!({ "categories": organization.default_categories })))
}

#[derive(Debug, Deserialize)]
pub struct AddCategoryPayload {
    pub category: String,
}

pub async fn add_category(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<AddCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let category = payload.category.trim();
    if category.is_empty() {
        return Err(AppError::BadRequest(
            "um nome de categoria válido é obrigatório".to_string(),
        ));
    }

    let organization = load_organization(&app_state, claims.organization_id).await?;
    if organization.default_categories.iter().any(|c| c == category) {
        return Err(AppError::CategoryAlreadyExists(category.to_string()));
    }

    let mut categories = organization.default_categories;
    categories.push(category.to_string());
    let updated = app_state
        .org_repo
        .update_categories(organization.id, &categories)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Categoria adicionada com sucesso",
            "categories": updated.default_categories,
        })),
    ))
}

pub async fn delete_category(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(category_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let organization = load_organization(&app_state, claims.organization_id).await?;
    if !organization.default_categories.iter().any(|c| *c == category_name) {
        return Err(AppError::CategoryNotFound);
    }

    let categories: Vec<String> = organization
        .default_categories
        .into_iter()
        .filter(|c| *c != category_name)
        .collect();
    let updated = app_state
        .org_repo
        .update_categories(organization.id, &categories)
        .await?;

    Ok(Json(json!({
        "message": "Categoria removida com sucesso",
        "categories": updated.default_categories,
    })))
}
