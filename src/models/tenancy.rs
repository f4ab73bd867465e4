// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::auth::StoreRole;

// A fronteira do tenant: dona de lojas, usuários e itens
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: i32,
    pub name: String,
    pub admin_email: Option<String>,
    pub industry: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub timezone: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub logo_url: Option<String>,
    pub default_categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha de atribuição usuário↔loja (fonte autoritativa de escopo de loja)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStoreAccess {
    pub id: i32,
    pub user_id: i32,
    pub store_id: i32,
    pub organization_id: Option<i32>,
    pub store_role: StoreRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub timezone: Option<String>,
}

// Configurações enviadas no onboarding
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSettingsPayload {
    pub industry: Option<String>,
    pub timezone: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStorePayload {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupItemPayload {
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub monday_required: i32,
    #[serde(default)]
    pub tuesday_required: i32,
    #[serde(default)]
    pub wednesday_required: i32,
    #[serde(default)]
    pub thursday_required: i32,
    #[serde(default)]
    pub friday_required: i32,
    #[serde(default)]
    pub saturday_required: i32,
    #[serde(default)]
    pub sunday_required: i32,
}

// Corpo do POST /organizations/setup
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSetupPayload {
    #[serde(default)]
    pub org_settings: OrgSettingsPayload,
    #[serde(default)]
    pub store: SetupStorePayload,
    #[serde(default)]
    pub items: Vec<SetupItemPayload>,
    pub default_categories: Option<Vec<String>>,
}

// Visão resumida de usuário para a listagem da organização
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationUser {
    pub id: i32,
    pub email: String,
    pub role: crate::models::auth::Role,
    pub organization_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
