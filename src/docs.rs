// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user_status,
        handlers::users::update_user_role,

        // --- Catalog ---
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::get_category,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Platform ---
        handlers::admin::tenant_report,
        handlers::admin::update_tenant_status,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::UserStatus,
            models::auth::User,
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserStatusPayload,
            models::auth::UpdateUserRolePayload,

            // --- Catalog ---
            models::catalog::Category,
            models::catalog::CreateCategoryPayload,

            // --- Settings ---
            models::settings::TenantSettings,
            models::settings::UpdateSettingsRequest,

            // --- Tenancy ---
            models::tenancy::TenantStatus,
            models::tenancy::Tenant,
            models::tenancy::TenantReportEntry,
            models::tenancy::UpdateTenantStatusPayload,

            // --- RBAC ---
            models::rbac::Capability,
            models::rbac::RuleScope,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários da Loja"),
        (name = "Catalog", description = "Catálogo de Produtos"),
        (name = "Settings", description = "Configurações da Loja"),
        (name = "Platform", description = "Administração Global (super_admin)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/{id}/role",
            "/api/categories/{id}",
            "/api/settings",
            "/api/admin/tenants/{id}/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
