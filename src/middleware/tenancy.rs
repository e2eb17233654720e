// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError, AuthError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{auth::Principal, tenancy::TenantScope},
};

/// O escopo de dados de um principal. Para cargos comuns é sempre a própria
/// loja; `AllTenants` só existe para super_admin.
pub fn scope_for(principal: &Principal) -> TenantScope {
    principal.scope()
}

// ---
// TenantContext: a loja de uma rota da loja
// ---
// Os repositórios só aceitam este tipo como filtro de loja, e ele só nasce de
// um Principal. Não existe caminho de header, query ou body até aqui.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: Uuid,
}

impl TenantContext {
    pub fn bind(principal: &Principal) -> Result<Self, AuthError> {
        match scope_for(principal) {
            TenantScope::Tenant(tenant_id) => Ok(Self { tenant_id }),
            // super_admin não opera dentro de uma loja por rotas da loja
            TenantScope::AllTenants => Err(AuthError::Forbidden),
        }
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

// ---
// GlobalScope: rotas declaradas globais (super_admin)
// ---
#[derive(Debug, Clone, Copy)]
pub struct GlobalScope;

impl GlobalScope {
    pub fn bind(principal: &Principal) -> Result<Self, AuthError> {
        match scope_for(principal) {
            TenantScope::AllTenants => Ok(GlobalScope),
            TenantScope::Tenant(_) => Err(AuthError::Forbidden),
        }
    }
}

fn reject(parts: &Parts, app_state: &AppState, err: AuthError) -> ApiError {
    AppError::Auth(err).to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store)
}

fn principal_from(parts: &Parts) -> Result<&Principal, AuthError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .map(|user| &user.0)
        .ok_or(AuthError::MissingToken)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        principal_from(parts)
            .and_then(TenantContext::bind)
            .map_err(|err| reject(parts, &app_state, err))
    }
}

impl<S> FromRequestParts<S> for GlobalScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        principal_from(parts)
            .and_then(GlobalScope::bind)
            .map_err(|err| reject(parts, &app_state, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        db::InMemoryCredentialStore,
        models::auth::{Role, UserStatus},
    };
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    fn principal(role: Role, scope: TenantScope) -> Principal {
        let now = Utc::now();
        Principal::new(
            Uuid::new_v4(),
            scope,
            role,
            UserStatus::Active,
            now,
            now + Duration::hours(1),
        )
    }

    #[test]
    fn ordinary_roles_are_scoped_to_their_own_tenant() {
        let tenant_id = Uuid::new_v4();
        for role in [Role::Cashier, Role::InventoryStaff, Role::Manager, Role::Admin] {
            let p = principal(role, TenantScope::Tenant(tenant_id));
            assert_eq!(scope_for(&p), TenantScope::Tenant(tenant_id));
            assert_eq!(TenantContext::bind(&p).unwrap().tenant_id(), tenant_id);
        }
    }

    #[test]
    fn super_admin_cannot_bind_a_tenant_context() {
        let p = principal(Role::SuperAdmin, TenantScope::AllTenants);
        assert_eq!(scope_for(&p), TenantScope::AllTenants);
        assert_eq!(TenantContext::bind(&p), Err(AuthError::Forbidden));
        assert!(GlobalScope::bind(&p).is_ok());
    }

    #[test]
    fn tenant_principals_cannot_use_global_routes() {
        let p = principal(Role::Admin, TenantScope::Tenant(Uuid::new_v4()));
        assert!(matches!(GlobalScope::bind(&p), Err(AuthError::Forbidden)));
    }

    fn app_state() -> AppState {
        let config = AppConfig::from_source(|key| match key {
            "DATABASE_URL" => Some("postgres://ardent@127.0.0.1:1/unreachable".to_string()),
            "JWT_SECRET" => Some("tenancy-test-secret".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        AppState::assemble(config, pool, Arc::new(InMemoryCredentialStore::new()))
    }

    fn parts_naming_another_tenant(other: Uuid) -> Parts {
        let request = Request::builder()
            .uri(format!("/api/categories?tenant_id={other}"))
            .header("x-tenant-id", other.to_string())
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[tokio::test]
    async fn request_supplied_tenant_ids_are_ignored() {
        let state = app_state();
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut parts = parts_naming_another_tenant(other);
        parts
            .extensions
            .insert(AuthenticatedUser(principal(Role::Admin, TenantScope::Tenant(own))));

        let tenant = TenantContext::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(tenant.tenant_id(), own);
    }

    #[tokio::test]
    async fn a_tenant_header_without_a_principal_binds_nothing() {
        let state = app_state();
        let mut parts = parts_naming_another_tenant(Uuid::new_v4());

        let rejection = TenantContext::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
    }
}
