// src/handlers/auth.rs

use axum::{Json, extract::{Query, State}, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{AcceptInvitePayload, AuthResponse, LoginUserPayload, RegisterUserPayload},
};

// Handler de login
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;
    Ok(Json(response))
}

// Handler de registro (opcionalmente cria uma organização nova)
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state.auth_service.register_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyInviteQuery {
    pub token: String,
}

// Sem autenticação: devolve o payload do convite para pré-preencher o
// formulário de aceitação.
pub async fn verify_invite(
    State(app_state): State<AppState>,
    Query(query): Query<VerifyInviteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let invite = app_state
        .auth_service
        .tokens()
        .verify_invite_token(&query.token)?;
    Ok(Json(json!({ "valid": true, "invite": invite })))
}

// Aceita o convite: define a senha, cria o usuário se necessário e já
// devolve um token de sessão.
pub async fn accept_invite(
    State(app_state): State<AppState>,
    Json(payload): Json<AcceptInvitePayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state.auth_service.accept_invite(&payload).await?;
    Ok(Json(response))
}
