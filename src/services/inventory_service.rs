// src/services/inventory_service.rs
//
// Regras de negócio dos itens: criação, listagem com escopo de loja,
// atualização guardada pelos tetos por dia da semana e remoção. Toda
// atualização bem-sucedida gera exatamente uma linha de histórico.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{HistoryRepository, ItemRepository, StoreRepository},
    models::auth::{Claims, StoreRole},
    models::inventory::{CreateItemPayload, DayEntry, Item, UpdateItemPayload},
    services::access,
    services::batcher::{ItemUpdateEvent, UpdateBatcher},
    services::mailer::EmailSender,
    services::permissions::{PermissionsDocument, PermissionsRepository},
};

// Valida a repartição por dia contra o item ANTES da atualização:
// os tetos vêm dos valores requeridos pré-edição.
pub fn validate_breakdown(
    current: &Item,
    quantity: i32,
    breakdown: &[DayEntry],
) -> Result<(), AppError> {
    let mut total: i64 = 0;
    for entry in breakdown {
        if !(0..=6).contains(&entry.day_idx) {
            return Err(AppError::InvalidBreakdown(
                "dayIdx deve estar entre 0 e 6".to_string(),
            ));
        }
        if entry.qty < 0 {
            return Err(AppError::InvalidBreakdown(
                "qty deve ser um número não negativo".to_string(),
            ));
        }
        let cap = current.required_for_day(entry.day_idx);
        if entry.qty > cap {
            return Err(AppError::BreakdownExceedsRequired {
                day_idx: entry.day_idx,
                qty: entry.qty,
                cap,
            });
        }
        total += entry.qty as i64;
    }
    if total != quantity as i64 {
        return Err(AppError::BreakdownMismatch);
    }
    Ok(())
}

// Caminho de escrita de uma atualização de item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    // Todos os campos mutáveis (acesso total ou MANAGER na loja)
    Full,
    // Papel STORE dentro das lojas atribuídas: só a quantidade muda;
    // nome/categoria/requeridos do payload são ignorados.
    QuantityOnly,
}

// Decide o caminho de escrita a partir das claims, do item pré-edição e do
// documento de permissões. Nenhum grant aplicável vira Forbidden.
pub fn resolve_update_mode(
    claims: &Claims,
    item: &Item,
    doc: &PermissionsDocument,
) -> Result<UpdateMode, AppError> {
    if access::can_edit_item(claims, item, doc) {
        return Ok(UpdateMode::Full);
    }
    if claims.store_role == Some(StoreRole::Store)
        && access::assigned_to_store(claims, item.store_id)
    {
        return Ok(UpdateMode::QuantityOnly);
    }

    let msg = if claims.store_role == Some(StoreRole::Store) {
        "usuário não atribuído a esta loja"
    } else {
        "permissões insuficientes para editar este item"
    };
    Err(AppError::Forbidden(msg.to_string()))
}

#[derive(Clone)]
pub struct InventoryService {
    item_repo: ItemRepository,
    store_repo: StoreRepository,
    history_repo: HistoryRepository,
    permissions: Arc<dyn PermissionsRepository>,
    batcher: UpdateBatcher,
    mailer: Arc<dyn EmailSender>,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(
        item_repo: ItemRepository,
        store_repo: StoreRepository,
        history_repo: HistoryRepository,
        permissions: Arc<dyn PermissionsRepository>,
        batcher: UpdateBatcher,
        mailer: Arc<dyn EmailSender>,
        pool: PgPool,
    ) -> Self {
        Self { item_repo, store_repo, history_repo, permissions, batcher, mailer, pool }
    }

    pub async fn create_item(
        &self,
        claims: &Claims,
        payload: &CreateItemPayload,
    ) -> Result<Item, AppError> {
        // O organizationId vem SEMPRE das claims, nunca do cliente
        let organization_id = claims.organization_id.ok_or(AppError::MissingOrganization)?;

        let doc = self.permissions.read().await;
        if !access::can_create_item(claims, payload.store_id, &doc) {
            return Err(AppError::Forbidden(
                "permissões insuficientes para criar itens".to_string(),
            ));
        }

        // O organizationId do item é desnormalizado e deve bater com o da loja
        let store = self
            .store_repo
            .find_by_id(payload.store_id)
            .await?
            .ok_or(AppError::StoreNotFound)?;
        if store.organization_id != organization_id {
            return Err(AppError::StoreNotFound);
        }

        let item = self.item_repo.create(&self.pool, payload, organization_id).await?;

        // Notificação de criação: melhor esforço, nunca derruba a operação
        if !doc.notify_emails.is_empty() {
            let subject = format!(
                "StockIT: New item created - {} (Store {})",
                item.name, item.store_id
            );
            let html = render_item_created(&item, &claims.email);
            if let Err(e) = self.mailer.send(&doc.notify_emails, &subject, &html).await {
                tracing::warn!("Falha no e-mail de criação de item: {}", e);
            }
        }

        Ok(item)
    }

    pub async fn get_item(&self, claims: &Claims, id: i32) -> Result<Item, AppError> {
        let item = self.item_repo.find_by_id(id).await?.ok_or(AppError::ItemNotFound)?;
        if claims.organization_id.is_some() && claims.organization_id != Some(item.organization_id) {
            return Err(AppError::ItemNotFound);
        }
        Ok(item)
    }

    // Listagem escopada: usuários com papel de loja só enxergam as lojas
    // atribuídas; lista vazia de atribuições devolve [] em vez de erro.
    pub async fn list_items(
        &self,
        claims: &Claims,
        requested_store_id: Option<i32>,
    ) -> Result<Vec<Item>, AppError> {
        if claims.store_role.is_some() {
            if let Some(store_id) = requested_store_id {
                if !access::assigned_to_store(claims, store_id) {
                    return Err(AppError::Forbidden(
                        "usuário não atribuído a esta loja".to_string(),
                    ));
                }
                return self
                    .item_repo
                    .list(claims.organization_id, None, Some(store_id))
                    .await;
            }
            if claims.store_ids.is_empty() {
                return Ok(Vec::new());
            }
            return self
                .item_repo
                .list(claims.organization_id, Some(claims.store_ids.as_slice()), None)
                .await;
        }

        self.item_repo.list(claims.organization_id, None, None).await
    }

    pub async fn list_items_by_store(
        &self,
        claims: &Claims,
        store_id: i32,
    ) -> Result<Vec<Item>, AppError> {
        if claims.store_role.is_some() && !access::assigned_to_store(claims, store_id) {
            return Err(AppError::Forbidden(
                "usuário não atribuído a esta loja".to_string(),
            ));
        }
        self.item_repo
            .list(claims.organization_id, None, Some(store_id))
            .await
    }

    // A atualização guardada: valida a repartição contra o item pré-edição,
    // aplica o caminho permitido pelo papel e grava item + histórico na
    // mesma transação (tudo-ou-nada).
    pub async fn update_item(
        &self,
        claims: &Claims,
        id: i32,
        payload: &UpdateItemPayload,
    ) -> Result<Item, AppError> {
        let current = self.item_repo.find_by_id(id).await?.ok_or(AppError::ItemNotFound)?;
        let doc = self.permissions.read().await;

        // Validação antes de qualquer escrita
        if let Some(breakdown) = &payload.day_breakdown {
            validate_breakdown(&current, payload.quantity, breakdown)?;
        }

        let mode = resolve_update_mode(claims, &current, &doc)?;

        let updated_by = payload
            .updated_by
            .clone()
            .unwrap_or_else(|| claims.email.clone());

        let mut tx = self.pool.begin().await?;
        let updated = match mode {
            UpdateMode::Full => self.item_repo.update_full(&mut *tx, id, payload).await?,
            UpdateMode::QuantityOnly => {
                self.item_repo.update_quantity(&mut *tx, id, payload.quantity).await?
            }
        };
        self.history_repo
            .insert(
                &mut *tx,
                id,
                payload.quantity,
                &updated_by,
                payload.day_breakdown.as_deref(),
            )
            .await?;
        tx.commit().await?;

        if current.quantity != updated.quantity {
            self.batcher.queue(
                claims.organization_id,
                updated.store_id,
                ItemUpdateEvent::from_item(
                    &updated,
                    Some(current.quantity),
                    payload.day_breakdown.clone(),
                ),
            );
        }

        Ok(updated)
    }

    pub async fn delete_item(&self, claims: &Claims, id: i32) -> Result<Item, AppError> {
        let current = self.item_repo.find_by_id(id).await?.ok_or(AppError::ItemNotFound)?;

        let doc = self.permissions.read().await;
        if !access::can_delete_item(claims, &current, &doc) {
            return Err(AppError::Forbidden(
                "permissões insuficientes para remover este item".to_string(),
            ));
        }

        self.item_repo.delete(id).await
    }
}

fn render_item_created(item: &Item, actor: &str) -> String {
    format!(
        r#"<div style="font-family:Arial,sans-serif;">
          <h3>New Item Created</h3>
          <ul>
            <li><strong>Name:</strong> {}</li>
            <li><strong>Category:</strong> {}</li>
            <li><strong>Quantity:</strong> {}</li>
            <li><strong>Store ID:</strong> {}</li>
            <li><strong>Organization ID:</strong> {}</li>
            <li><strong>By:</strong> {}</li>
          </ul>
        </div>"#,
        item.name, item.category, item.quantity, item.store_id, item.organization_id, actor
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use crate::services::access::Permissions;
    use chrono::Utc;

    fn item_with_monday(monday_required: i32) -> Item {
        Item {
            id: 1,
            name: "Croissant".to_string(),
            category: "Bakery".to_string(),
            quantity: 0,
            monday_required,
            tuesday_required: 0,
            wednesday_required: 0,
            thursday_required: 0,
            friday_required: 0,
            saturday_required: 3,
            sunday_required: 2,
            store_id: 4,
            organization_id: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn breakdown_within_cap_and_matching_total_passes() {
        let item = item_with_monday(5);
        let breakdown = vec![DayEntry { day_idx: 1, qty: 5 }];
        assert!(validate_breakdown(&item, 5, &breakdown).is_ok());
    }

    #[test]
    fn breakdown_above_cap_fails() {
        let item = item_with_monday(5);
        let breakdown = vec![DayEntry { day_idx: 1, qty: 6 }];
        assert!(matches!(
            validate_breakdown(&item, 6, &breakdown),
            Err(AppError::BreakdownExceedsRequired { day_idx: 1, qty: 6, cap: 5 })
        ));
    }

    #[test]
    fn breakdown_total_must_match_quantity() {
        let item = item_with_monday(5);
        let breakdown = vec![DayEntry { day_idx: 1, qty: 4 }];
        assert!(matches!(
            validate_breakdown(&item, 5, &breakdown),
            Err(AppError::BreakdownMismatch)
        ));
    }

    #[test]
    fn day_idx_out_of_range_fails() {
        let item = item_with_monday(5);
        for bad_idx in [-1, 7] {
            let breakdown = vec![DayEntry { day_idx: bad_idx, qty: 1 }];
            assert!(matches!(
                validate_breakdown(&item, 1, &breakdown),
                Err(AppError::InvalidBreakdown(_))
            ));
        }
    }

    #[test]
    fn negative_qty_fails_before_cap_check() {
        let item = item_with_monday(5);
        let breakdown = vec![DayEntry { day_idx: 1, qty: -2 }];
        assert!(matches!(
            validate_breakdown(&item, -2, &breakdown),
            Err(AppError::InvalidBreakdown(_))
        ));
    }

    #[test]
    fn multi_day_breakdown_sums_across_entries() {
        let item = item_with_monday(5);
        // Sáb requer 3, Dom requer 2
        let breakdown = vec![
            DayEntry { day_idx: 6, qty: 3 },
            DayEntry { day_idx: 0, qty: 2 },
            DayEntry { day_idx: 1, qty: 5 },
        ];
        assert!(validate_breakdown(&item, 10, &breakdown).is_ok());
    }

    #[test]
    fn empty_breakdown_requires_zero_quantity() {
        let item = item_with_monday(5);
        assert!(validate_breakdown(&item, 0, &[]).is_ok());
        assert!(matches!(
            validate_breakdown(&item, 5, &[]),
            Err(AppError::BreakdownMismatch)
        ));
    }

    fn scoped_claims(store_role: Option<StoreRole>, store_ids: Vec<i32>) -> Claims {
        Claims {
            user_id: 1,
            role: Role::Store,
            email: "staff@example.com".to_string(),
            organization_id: Some(10),
            organization_name: None,
            is_new_organization: false,
            permissions: Permissions {
                is_full_access: false,
                is_staff: store_role == Some(StoreRole::Store),
                full_access_store_ids: vec![],
                staff_store_ids: store_ids.clone(),
            },
            store_ids,
            store_role,
            exp: 0,
            iat: 0,
        }
    }

    fn item_in_store(store_id: i32) -> Item {
        let mut item = item_with_monday(5);
        item.store_id = store_id;
        item
    }

    #[test]
    fn store_role_outside_assigned_stores_is_forbidden() {
        let claims = scoped_claims(Some(StoreRole::Store), vec![4]);
        let doc = PermissionsDocument::default();

        assert!(matches!(
            resolve_update_mode(&claims, &item_in_store(5), &doc),
            Err(AppError::Forbidden(_))
        ));
    }

    // Dentro do escopo, o papel STORE só ganha o caminho quantity-only:
    // é o update_quantity que roda, e nome/categoria/requeridos do payload
    // nunca chegam ao banco.
    #[test]
    fn store_role_inside_assigned_stores_gets_quantity_only() {
        let claims = scoped_claims(Some(StoreRole::Store), vec![4]);
        let doc = PermissionsDocument::default();

        let mode = resolve_update_mode(&claims, &item_in_store(4), &doc).unwrap();
        assert_eq!(mode, UpdateMode::QuantityOnly);
    }

    #[test]
    fn manager_inside_assigned_stores_gets_full_edit() {
        let claims = scoped_claims(Some(StoreRole::Manager), vec![4]);
        let doc = PermissionsDocument::default();

        let mode = resolve_update_mode(&claims, &item_in_store(4), &doc).unwrap();
        assert_eq!(mode, UpdateMode::Full);
    }

    #[test]
    fn no_grant_at_all_is_forbidden() {
        let claims = scoped_claims(None, vec![]);
        let doc = PermissionsDocument::default();

        assert!(matches!(
            resolve_update_mode(&claims, &item_in_store(4), &doc),
            Err(AppError::Forbidden(_))
        ));
    }
}
