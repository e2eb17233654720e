// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError, AuthError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::{Capability, Requirement},
    services::rbac_service,
};

/// 1. O Trait que define o que uma rota exige
pub trait PermissionDef: Send + Sync + 'static {
    fn requirement() -> Requirement;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
// Nada de consulta ao banco aqui: o Principal já vem relido pelo auth_guard.
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        let result = match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) => rbac_service::authorize(&user.0, &T::requirement()),
            None => Err(AuthError::MissingToken),
        };

        result
            .map(|_| RequirePermission(PhantomData))
            .map_err(|err| AppError::Auth(err).to_api_error(&locale, &app_state.i18n_store))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermViewCatalog;
impl PermissionDef for PermViewCatalog {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ViewCatalog) }
}

pub struct PermManageCatalog;
impl PermissionDef for PermManageCatalog {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ManageCatalog) }
}

pub struct PermViewUsers;
impl PermissionDef for PermViewUsers {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ViewUsers) }
}

pub struct PermManageUsers;
impl PermissionDef for PermManageUsers {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ManageUsers) }
}

pub struct PermViewStoreSettings;
impl PermissionDef for PermViewStoreSettings {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ViewStoreSettings) }
}

pub struct PermManageStoreSettings;
impl PermissionDef for PermManageStoreSettings {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ManageStoreSettings) }
}

pub struct PermViewTenantReport;
impl PermissionDef for PermViewTenantReport {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ViewTenantReport) }
}

pub struct PermManageTenants;
impl PermissionDef for PermManageTenants {
    fn requirement() -> Requirement { Requirement::Capability(Capability::ManageTenants) }
}

