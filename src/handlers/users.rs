// src/handlers/users.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
};

// Lista os usuários da organização do chamador (sem hash de senha)
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = claims.organization_id.ok_or(AppError::MissingOrganization)?;
    let users = app_state.user_repo.list_by_organization(organization_id).await?;
    Ok(Json(users))
}
