// src/handlers/admin.rs
//
// Rotas administrativas (ADMIN/HEADOFFICE): edição do documento de
// permissões e convites de usuários.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, require_admin},
    models::auth::{Role, StoreRole},
};

// Documento de permissões atual
pub async fn get_permissions_config(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;
    Ok(Json(app_state.permissions.read().await))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreIdsPayload {
    pub store_ids: Vec<i32>,
}

// Sobrescreve a lista de lojas com acesso total
pub async fn set_full_access_stores(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<StoreIdsPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;

    let mut doc = app_state.permissions.read().await;
    doc.full_access_store_ids = payload.store_ids;
    app_state.permissions.write(&doc).await?;
    Ok(Json(json!({ "success": true, "fullAccessStoreIds": doc.full_access_store_ids })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignmentPayload {
    pub email: String,
    pub store_ids: Vec<i32>,
}

// Atribui lojas a um e-mail de staff (mescla por e-mail)
pub async fn set_staff(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<StaffAssignmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;

    let mut doc = app_state.permissions.read().await;
    doc.staff.insert(payload.email.clone(), payload.store_ids.clone());
    app_state.permissions.write(&doc).await?;
    Ok(Json(json!({ "success": true, "staff": payload.store_ids })))
}

// Atribui lojas a um e-mail de gerente (mescla por e-mail)
pub async fn set_managers(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<StaffAssignmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;

    let mut doc = app_state.permissions.read().await;
    doc.managers.insert(payload.email.clone(), payload.store_ids.clone());
    app_state.permissions.write(&doc).await?;
    Ok(Json(json!({ "success": true, "managers": payload.store_ids })))
}

#[derive(Debug, Deserialize)]
pub struct EmailsPayload {
    pub emails: Vec<String>,
}

// Sobrescreve os destinatários de notificação
pub async fn set_notify_emails(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<EmailsPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;

    let mut doc = app_state.permissions.read().await;
    doc.notify_emails = payload.emails;
    app_state.permissions.write(&doc).await?;
    Ok(Json(json!({ "success": true, "notifyEmails": doc.notify_emails })))
}

// Sobrescreve a lista de usuários com acesso total
pub async fn set_full_access_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<EmailsPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;

    let mut doc = app_state.permissions.read().await;
    doc.full_access_users = payload.emails;
    app_state.permissions.write(&doc).await?;
    Ok(Json(json!({ "success": true, "fullAccessUsers": doc.full_access_users })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitePayload {
    pub email: String,
    pub role: Option<Role>,
    pub store_role: Option<StoreRole>,
    #[serde(default)]
    pub store_ids: Vec<i32>,
    pub organization_id: Option<i32>,
    pub invite_url_base: Option<String>,
}

// Cria e envia um convite: valida as lojas, reflete a atribuição no
// documento de permissões e assina um token de convite de 7 dias.
pub async fn send_invite(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<InvitePayload>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&claims)?;

    if payload.email.is_empty() {
        return Err(AppError::BadRequest("email é obrigatório".to_string()));
    }
    let organization_id = payload
        .organization_id
        .or(claims.organization_id)
        .ok_or_else(|| AppError::BadRequest("organizationId é obrigatório".to_string()))?;

    let role = payload.role.unwrap_or(Role::Store);
    let mut store_role = payload.store_role;
    let mut store_ids = Vec::new();

    if role == Role::Store {
        if payload.store_ids.is_empty() {
            return Err(AppError::BadRequest(
                "storeIds deve ser uma lista não vazia para o papel STORE".to_string(),
            ));
        }
        store_role = Some(store_role.unwrap_or(StoreRole::Store));
        store_ids = payload.store_ids.clone();

        // Todas as lojas do convite precisam pertencer à organização
        let found = app_state
            .store_repo
            .ids_in_organization(&store_ids, organization_id)
            .await?;
        let missing: Vec<i32> = store_ids.iter().copied().filter(|id| !found.contains(id)).collect();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "storeIds inválidos para a organização: {missing:?}"
            )));
        }
    } else {
        store_role = None;
    }

    // Reflete o convite no documento de permissões
    let mut doc = app_state.permissions.read().await;
    match (role, store_role) {
        (Role::Store, Some(StoreRole::Store)) => {
            doc.staff.insert(payload.email.clone(), store_ids.clone());
        }
        (Role::Store, Some(StoreRole::Manager)) => {
            doc.managers.insert(payload.email.clone(), store_ids.clone());
        }
        _ => {
            if !doc.full_access_users.contains(&payload.email) {
                doc.full_access_users.push(payload.email.clone());
            }
        }
    }
    app_state.permissions.write(&doc).await?;

    let token = app_state.auth_service.tokens().issue_invite_token(
        &payload.email,
        role,
        store_role,
        store_ids.clone(),
        organization_id,
    )?;

    let base = payload
        .invite_url_base
        .unwrap_or_else(|| app_state.frontend_url.clone());
    let invite_link = format!("{base}/invite?token={token}");

    let html = render_invite_email(&invite_link, role, store_role, &store_ids);
    app_state
        .mailer
        .send(
            &[payload.email.clone()],
            "You're invited to StockIT",
            &html,
        )
        .await?;

    Ok(Json(json!({ "success": true, "inviteLink": invite_link, "token": token })))
}

fn render_invite_email(
    invite_link: &str,
    role: Role,
    store_role: Option<StoreRole>,
    store_ids: &[i32],
) -> String {
    let role_line = match store_role {
        Some(sr) => format!("{role:?} ({sr:?})").to_uppercase(),
        None => format!("{role:?}").to_uppercase(),
    };
    let stores_line = if store_ids.is_empty() {
        String::new()
    } else {
        let ids = store_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("<p>Stores: <strong>{ids}</strong></p>")
    };

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width:600px; margin:0 auto;">
      <h2>You're invited to StockIT</h2>
      <p>Role: <strong>{role_line}</strong></p>
      {stores_line}
      <p>
        <a href="{invite_link}" style="display:inline-block; background:#2563eb; color:#fff; padding:10px 16px; text-decoration:none; border-radius:6px;">Accept Invite</a>
      </p>
      <p>Or open this link: <br/><code>{invite_link}</code></p>
    </div>"#
    )
}
