// src/db/history_repo.rs

use sqlx::types::Json;
use sqlx::{Executor, PgPool, Postgres, Row};

use crate::{
    common::error::AppError,
    models::inventory::{DayEntry, Item, ItemHistory, ItemHistoryWithItem},
};

#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Append-only: o histórico nunca é editado ou removido.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        item_id: i32,
        quantity: i32,
        updated_by: &str,
        day_breakdown: Option<&[DayEntry]>,
    ) -> Result<ItemHistory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let breakdown = day_breakdown.map(|b| Json(b.to_vec()));
        let row = sqlx::query_as::<_, ItemHistory>(
            r#"
            INSERT INTO item_history (item_id, quantity, updated_by, day_breakdown)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .bind(updated_by)
        .bind(breakdown)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    // Histórico completo (mais recente primeiro), com o item embutido.
    // `organization_id`/`store_ids = None` significam sem restrição.
    pub async fn list_full(
        &self,
        organization_id: Option<i32>,
        store_ids: Option<&[i32]>,
    ) -> Result<Vec<ItemHistoryWithItem>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT h.id, h.item_id, h.quantity, h.updated_by, h.day_breakdown, h.updated_at,
                   i.id AS i_id, i.name AS i_name, i.category AS i_category,
                   i.quantity AS i_quantity,
                   i.monday_required, i.tuesday_required, i.wednesday_required,
                   i.thursday_required, i.friday_required, i.saturday_required,
                   i.sunday_required,
                   i.store_id, i.organization_id,
                   i.created_at AS i_created_at, i.updated_at AS i_updated_at
            FROM item_history h
            JOIN items i ON i.id = h.item_id
            WHERE ($1::int IS NULL OR i.organization_id = $1)
              AND ($2::int[] IS NULL OR i.store_id = ANY($2))
            ORDER BY h.updated_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(store_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let history = ItemHistory {
                id: row.try_get("id")?,
                item_id: row.try_get("item_id")?,
                quantity: row.try_get("quantity")?,
                updated_by: row.try_get("updated_by")?,
                day_breakdown: row.try_get("day_breakdown")?,
                updated_at: row.try_get("updated_at")?,
            };
            let item = Item {
                id: row.try_get("i_id")?,
                name: row.try_get("i_name")?,
                category: row.try_get("i_category")?,
                quantity: row.try_get("i_quantity")?,
                monday_required: row.try_get("monday_required")?,
                tuesday_required: row.try_get("tuesday_required")?,
                wednesday_required: row.try_get("wednesday_required")?,
                thursday_required: row.try_get("thursday_required")?,
                friday_required: row.try_get("friday_required")?,
                saturday_required: row.try_get("saturday_required")?,
                sunday_required: row.try_get("sunday_required")?,
                store_id: row.try_get("store_id")?,
                organization_id: row.try_get("organization_id")?,
                created_at: row.try_get("i_created_at")?,
                updated_at: row.try_get("i_updated_at")?,
            };
            out.push(ItemHistoryWithItem { history, item });
        }
        Ok(out)
    }
}
