//src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(app_state.db_pool())
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/verify-invite", get(handlers::auth::verify_invite))
        .route("/accept-invite", post(handlers::auth::accept_invite));

    let item_routes = Router::new()
        .route(
            "/",
            post(handlers::items::create_item).get(handlers::items::get_all_items),
        )
        .route(
            "/{id}",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route("/store/{store_id}", get(handlers::items::get_items_by_store));

    let store_routes = Router::new().route(
        "/",
        post(handlers::stores::create_store).get(handlers::stores::get_all_stores),
    );

    let history_routes = Router::new().route("/full", get(handlers::history::get_full_history));

    let category_routes = Router::new()
        .route(
            "/",
            post(handlers::categories::add_category).get(handlers::categories::get_categories),
        )
        .route(
            "/{category_name}",
            axum::routing::delete(handlers::categories::delete_category),
        );

    let organization_routes = Router::new()
        .route(
            "/",
            post(handlers::organizations::create_organization)
                .get(handlers::organizations::list_organizations),
        )
        .route("/{id}", get(handlers::organizations::get_organization))
        .route("/setup", post(handlers::organizations::setup_organization));

    let user_routes = Router::new().route("/", get(handlers::users::list_users));

    // Rotas administrativas: edição do documento de permissões e convites
    let admin_routes = Router::new()
        .route("/config/permissions", get(handlers::admin::get_permissions_config))
        .route("/config/full-feature-stores", put(handlers::admin::set_full_access_stores))
        .route("/config/staff", put(handlers::admin::set_staff))
        .route("/config/managers", put(handlers::admin::set_managers))
        .route("/config/notify", put(handlers::admin::set_notify_emails))
        .route("/config/full-feature-users", put(handlers::admin::set_full_access_users))
        .route("/org/invite", post(handlers::admin::send_invite));

    // Tudo abaixo exige token de sessão válido
    let protected_routes = Router::new()
        .nest("/items", item_routes)
        .nest("/stores", store_routes)
        .nest("/history", history_routes)
        .nest("/categories", category_routes)
        .nest("/organizations", organization_routes)
        .nest("/users", user_routes)
        .nest("/admin", admin_routes)
        .route("/invitations", post(handlers::admin::send_invite))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .route("/api/health", get(|| async { "OK" }))
        .with_state(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "4000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao vincular o endereço da aplicação.");

    tracing::info!("🚀 Servidor rodando em http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Falha ao iniciar o servidor.");
}
