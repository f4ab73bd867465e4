// src/db/store_access_repo.rs

use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    models::auth::StoreRole,
    models::tenancy::UserStoreAccess,
};

// Atribuições de loja por usuário. Esta tabela é a fonte autoritativa de
// escopo de loja; o arquivo de permissões só vale quando ela está vazia
// para o usuário.
#[derive(Clone)]
pub struct StoreAccessRepository {
    pool: PgPool,
}

impl StoreAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<UserStoreAccess>, AppError> {
        let rows = sqlx::query_as::<_, UserStoreAccess>(
            "SELECT * FROM user_store_access WHERE user_id = $1 ORDER BY store_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Reaceitar um convite para o mesmo conjunto de lojas é idempotente:
    // apaga as linhas daquelas lojas e recria com o papel do convite.
    pub async fn replace_for_stores(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        store_ids: &[i32],
        organization_id: Option<i32>,
        store_role: StoreRole,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_store_access WHERE user_id = $1 AND store_id = ANY($2)")
            .bind(user_id)
            .bind(store_ids)
            .execute(&mut **tx)
            .await?;

        for store_id in store_ids {
            sqlx::query(
                r#"
                INSERT INTO user_store_access (user_id, store_id, organization_id, store_role)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, store_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(store_id)
            .bind(organization_id)
            .bind(store_role)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}
