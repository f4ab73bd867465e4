// src/db/item_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::inventory::{CreateItemPayload, Item, UpdateItemPayload},
};

#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreateItemPayload,
        organization_id: i32,
    ) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (
                name, category, quantity,
                monday_required, tuesday_required, wednesday_required, thursday_required,
                friday_required, saturday_required, sunday_required,
                store_id, organization_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.category.as_deref().unwrap_or("Other"))
        .bind(payload.quantity)
        .bind(payload.monday_required)
        .bind(payload.tuesday_required)
        .bind(payload.wednesday_required)
        .bind(payload.thursday_required)
        .bind(payload.friday_required)
        .bind(payload.saturday_required)
        .bind(payload.sunday_required)
        .bind(payload.store_id)
        .bind(organization_id)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Item>, AppError> {
        let maybe_item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_item)
    }

    // Listagem com escopo de organização, de lojas atribuídas e,
    // opcionalmente, de uma loja específica pedida na query string.
    pub async fn list(
        &self,
        organization_id: Option<i32>,
        store_ids: Option<&[i32]>,
        store_id: Option<i32>,
    ) -> Result<Vec<Item>, AppError> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT * FROM items
            WHERE ($1::int IS NULL OR organization_id = $1)
              AND ($2::int[] IS NULL OR store_id = ANY($2))
              AND ($3::int IS NULL OR store_id = $3)
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .bind(store_ids)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    // Caminho do papel STORE: apenas a quantidade muda.
    pub async fn update_quantity<'e, E>(
        &self,
        executor: E,
        id: i32,
        quantity: i32,
    ) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET quantity = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    // Caminho privilegiado: todos os campos mutáveis. Campos ausentes no
    // payload preservam o valor atual.
    pub async fn update_full<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &UpdateItemPayload,
    ) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name               = COALESCE($2, name),
                category           = COALESCE($3, category),
                quantity           = $4,
                monday_required    = COALESCE($5, monday_required),
                tuesday_required   = COALESCE($6, tuesday_required),
                wednesday_required = COALESCE($7, wednesday_required),
                thursday_required  = COALESCE($8, thursday_required),
                friday_required    = COALESCE($9, friday_required),
                saturday_required  = COALESCE($10, saturday_required),
                sunday_required    = COALESCE($11, sunday_required),
                updated_at         = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.category.as_deref())
        .bind(payload.quantity)
        .bind(payload.monday_required)
        .bind(payload.tuesday_required)
        .bind(payload.wednesday_required)
        .bind(payload.thursday_required)
        .bind(payload.friday_required)
        .bind(payload.saturday_required)
        .bind(payload.sunday_required)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn delete(&self, id: i32) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>("DELETE FROM items WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }
}
