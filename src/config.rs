// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{
        HistoryRepository, ItemRepository, OrganizationRepository, StoreAccessRepository,
        StoreRepository, UserRepository,
    },
    services::{
        auth::{AuthService, TokenService},
        batcher::UpdateBatcher,
        inventory_service::InventoryService,
        mailer::{EmailSender, SmtpConfig, SmtpMailer},
        permissions::{FilePermissionsRepository, PermissionsRepository},
    },
};

// Janela padrão de agrupamento dos e-mails de atualização (2 minutos)
const DEFAULT_BATCH_WINDOW_MS: u64 = 120_000;

#[derive(Clone)]
pub struct AppState {
    db_pool: PgPool,
    pub frontend_url: String,

    pub permissions: Arc<dyn PermissionsRepository>,
    pub mailer: Arc<dyn EmailSender>,

    pub user_repo: UserRepository,
    pub org_repo: OrganizationRepository,
    pub store_repo: StoreRepository,
    pub item_repo: ItemRepository,
    pub history_repo: HistoryRepository,

    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Colaboradores externos: permissões em arquivo e SMTP ---
        let permissions_path =
            env::var("PERMISSIONS_PATH").unwrap_or_else(|_| "config/permissions.json".to_string());
        let permissions: Arc<dyn PermissionsRepository> =
            Arc::new(FilePermissionsRepository::new(&permissions_path));

        let smtp_config = SmtpConfig {
            host: env::var("EMAIL_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env_parse("EMAIL_PORT", 587u16),
            secure: env_parse("EMAIL_SECURE", true),
            username: env::var("EMAIL_USER").unwrap_or_default(),
            password: env::var("EMAIL_PASSWORD").unwrap_or_default(),
            from: env::var("EMAIL_FROM")
                .or_else(|_| env::var("EMAIL_USER"))
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
        };
        let mailer: Arc<dyn EmailSender> = Arc::new(SmtpMailer::new(&smtp_config)?);

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let org_repo = OrganizationRepository::new(db_pool.clone());
        let store_repo = StoreRepository::new(db_pool.clone());
        let item_repo = ItemRepository::new(db_pool.clone());
        let history_repo = HistoryRepository::new(db_pool.clone());
        let store_access_repo = StoreAccessRepository::new(db_pool.clone());

        let session_hours: i64 = env_parse("JWT_EXPIRY_HOURS", 24);
        let tokens = TokenService::new(jwt_secret, chrono::Duration::hours(session_hours));

        let auth_service = AuthService::new(
            user_repo.clone(),
            org_repo.clone(),
            store_access_repo,
            permissions.clone(),
            tokens,
            db_pool.clone(),
        );

        let batcher = UpdateBatcher::new(
            env_parse("EMAIL_BATCH_ENABLED", true),
            Duration::from_millis(env_parse("EMAIL_BATCH_WINDOW_MS", DEFAULT_BATCH_WINDOW_MS)),
            permissions.clone(),
            mailer.clone(),
            Some(store_repo.clone()),
        );

        let inventory_service = InventoryService::new(
            item_repo.clone(),
            store_repo.clone(),
            history_repo.clone(),
            permissions.clone(),
            batcher,
            mailer.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            frontend_url,
            permissions,
            mailer,
            user_repo,
            org_repo,
            store_repo,
            item_repo,
            history_repo,
            auth_service,
            inventory_service,
        })
    }

    pub fn db_pool(&self) -> &PgPool {
        &self.db_pool
    }
}

// Lê uma variável de ambiente tipada, caindo no padrão se ausente ou inválida
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
