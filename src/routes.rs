// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Tudo abaixo passa pelo auth_guard; loja e cargo são conferidos nos extratores
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/{id}/status", put(handlers::users::update_user_status))
        .route("/{id}/role", put(handlers::users::update_user_role));

    let catalog_routes = Router::new()
        .route(
            "/",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route("/{id}", get(handlers::catalog::get_category));

    let settings_routes = Router::new().route(
        "/",
        get(handlers::settings::get_settings).put(handlers::settings::update_settings),
    );

    let admin_routes = Router::new()
        .route("/tenants", get(handlers::admin::tenant_report))
        .route("/tenants/{id}/status", put(handlers::admin::update_tenant_status));

    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/categories", catalog_routes)
        .nest("/api/settings", settings_routes)
        .nest("/api/admin", admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state)
}
