// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use validator::Validate;

// --- Lojas ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub organization_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Itens ---
// Cada item guarda a quantidade atual e a quantidade requerida por dia da semana.
// organization_id é desnormalizado: deve ser sempre igual ao da loja dona.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub monday_required: i32,
    pub tuesday_required: i32,
    pub wednesday_required: i32,
    pub thursday_required: i32,
    pub friday_required: i32,
    pub saturday_required: i32,
    pub sunday_required: i32,
    pub store_id: i32,
    pub organization_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    // Teto requerido por dayIdx (0=Dom .. 6=Sáb)
    pub fn required_for_day(&self, day_idx: i32) -> i32 {
        match day_idx {
            0 => self.sunday_required,
            1 => self.monday_required,
            2 => self.tuesday_required,
            3 => self.wednesday_required,
            4 => self.thursday_required,
            5 => self.friday_required,
            6 => self.saturday_required,
            _ => 0,
        }
    }
}

// Uma entrada da repartição por dia: {dayIdx, qty}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub day_idx: i32,
    pub qty: i32,
}

// --- Histórico (append-only) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemHistory {
    pub id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub updated_by: String,
    pub day_breakdown: Option<Json<Vec<DayEntry>>>,
    pub updated_at: DateTime<Utc>,
}

// Histórico com o item embutido (para a listagem completa)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemHistoryWithItem {
    #[serde(flatten)]
    pub history: ItemHistory,
    pub item: Item,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
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
    pub store_id: i32,
}

// Payload de atualização: STORE só aproveita `quantity`; o resto é para
// MANAGER/acesso total. Campos ausentes mantêm o valor atual.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemPayload {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub monday_required: Option<i32>,
    pub tuesday_required: Option<i32>,
    pub wednesday_required: Option<i32>,
    pub thursday_required: Option<i32>,
    pub friday_required: Option<i32>,
    pub saturday_required: Option<i32>,
    pub sunday_required: Option<i32>,
    pub updated_by: Option<String>,
    pub day_breakdown: Option<Vec<DayEntry>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStorePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub address: Option<String>,
    pub organization_id: Option<i32>,
}
