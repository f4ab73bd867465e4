// src/db/store_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::inventory::Store};

#[derive(Clone)]
pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        address: Option<&str>,
        organization_id: i32,
    ) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let store = sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (name, address, organization_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(organization_id)
        .fetch_one(executor)
        .await?;
        Ok(store)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Store>, AppError> {
        let maybe_store = sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_store)
    }

    // Listagem com escopo opcional de organização e de lojas atribuídas.
    // `store_ids = None` significa "sem restrição de loja".
    pub async fn list(
        &self,
        organization_id: Option<i32>,
        store_ids: Option<&[i32]>,
    ) -> Result<Vec<Store>, AppError> {
        let stores = sqlx::query_as::<_, Store>(
            r#"
            SELECT * FROM stores
            WHERE ($1::int IS NULL OR organization_id = $1)
              AND ($2::int[] IS NULL OR id = ANY($2))
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .bind(store_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(stores)
    }

    // Quais destes ids existem dentro da organização? (validação de convites)
    pub async fn ids_in_organization(
        &self,
        ids: &[i32],
        organization_id: i32,
    ) -> Result<Vec<i32>, AppError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            "SELECT id FROM stores WHERE id = ANY($1) AND organization_id = $2",
        )
        .bind(ids)
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
