// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::access::Permissions;

// Papel global do usuário (o papel de loja fica em StoreRole)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Headoffice,
    Store,
}

impl Role {
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Headoffice)
    }
}

// Papel por loja: STORE edita só quantidade; MANAGER edita tudo dentro das lojas atribuídas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "store_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StoreRole {
    Store,
    Manager,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: Role,
    pub organization_id: Option<i32>,
    pub is_new_organization: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub role: Option<Role>,
    pub organization_name: Option<String>,
    #[serde(default)]
    pub is_new_organization: bool,
    pub existing_organization_id: Option<i32>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Estrutura de dados ("claims") da sessão dentro do JWT.
// Tudo o que o AccessResolver decidiu no login viaja aqui.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i32,
    pub role: Role,
    pub email: String,
    pub organization_id: Option<i32>,
    pub organization_name: Option<String>,
    pub is_new_organization: bool,
    pub permissions: Permissions,
    pub store_ids: Vec<i32>,
    pub store_role: Option<StoreRole>,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

// Claims do token de convite: atribuição provisória, discriminada por `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteClaims {
    pub email: String,
    pub role: Role,
    pub store_role: Option<StoreRole>,
    pub store_ids: Vec<i32>,
    pub organization_id: i32,
    #[serde(rename = "type")]
    pub token_type: String,
    pub exp: usize,
    pub iat: usize,
}

// Visão do usuário devolvida no login (sem hash de senha)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<i32>,
    pub organization_name: Option<String>,
    pub is_new_organization: bool,
    pub permissions: Permissions,
    pub store_ids: Vec<i32>,
    pub store_role: Option<StoreRole>,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
    pub success: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitePayload {
    #[validate(length(min = 1, message = "O token é obrigatório."))]
    pub token: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}
