// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{common::error::AppError, config::AppState, models::auth::Claims};

// O middleware de autenticação. A assimetria de status é intencional:
// sem token -> 401 (Unauthorized); token presente mas inválido/expirado -> 403.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();
    let auth_header = headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok());

    let token = auth_header
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let claims = app_state.auth_service.tokens().verify_session_token(token)?;

    // Insere as claims nos "extensions" da requisição.
    // O escopo de organização vem DAQUI em todos os handlers: o
    // organizationId das claims sobrepõe qualquer valor vindo do cliente,
    // tanto em filtros de leitura quanto em payloads de escrita.
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// Extrator para obter as claims autenticadas diretamente nos handlers
pub struct AuthenticatedUser(pub Claims);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::Unauthorized)
    }
}

// Gate das rotas administrativas (config de permissões, convites)
pub fn require_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.role.is_privileged() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "requer papel ADMIN ou HEADOFFICE".to_string(),
        ))
    }
}
