// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::tenancy::{OrgSettingsPayload, Organization},
};

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        admin_email: Option<&str>,
        industry: &str,
        address: Option<&str>,
        phone: Option<&str>,
        timezone: &str,
    ) -> Result<Organization, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, admin_email, industry, address, phone, timezone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(admin_email)
        .bind(industry)
        .bind(address)
        .bind(phone)
        .bind(timezone)
        .fetch_one(executor)
        .await?;
        Ok(org)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Organization>, AppError> {
        let maybe_org =
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(maybe_org)
    }

    pub async fn list_all(&self) -> Result<Vec<Organization>, AppError> {
        let orgs =
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(orgs)
    }

    // Atualiza as configurações do onboarding. Campos opcionais ausentes
    // preservam o valor atual (COALESCE).
    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        id: i32,
        settings: &OrgSettingsPayload,
        default_categories: Option<&[String]>,
    ) -> Result<Organization, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let industry = settings
            .industry
            .as_deref()
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| "OTHER".to_string());

        let org = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET industry           = $2,
                timezone           = COALESCE($3, timezone),
                address            = COALESCE($4, address),
                phone              = COALESCE($5, phone),
                contact_email      = COALESCE($6, contact_email),
                contact_phone      = COALESCE($7, contact_phone),
                logo_url           = COALESCE($8, logo_url),
                default_categories = COALESCE($9, default_categories),
                updated_at         = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(industry)
        .bind(settings.timezone.as_deref())
        .bind(settings.address.as_deref())
        .bind(settings.phone.as_deref())
        .bind(settings.contact_email.as_deref())
        .bind(settings.contact_phone.as_deref())
        .bind(settings.logo_url.as_deref())
        .bind(default_categories)
        .fetch_one(executor)
        .await?;
        Ok(org)
    }

    // Sobrescreve a lista de categorias padrão
    pub async fn update_categories(
        &self,
        id: i32,
        categories: &[String],
    ) -> Result<Organization, AppError> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET default_categories = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(categories)
        .fetch_one(&self.pool)
        .await?;
        Ok(org)
    }
}
