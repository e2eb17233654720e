// src/handlers/admin.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermManageTenants, PermViewTenantReport, RequirePermission},
        tenancy::GlobalScope,
    },
    models::tenancy::{Tenant, TenantReportEntry, UpdateTenantStatusPayload},
};

// Rotas globais: o escopo é "todas as lojas" e só super_admin chega aqui
#[utoipa::path(
    get,
    path = "/api/admin/tenants",
    tag = "Platform",
    responses(
        (status = 200, description = "Relatório de lojas", body = Vec<TenantReportEntry>),
        (status = 403, description = "Somente super_admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn tenant_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermViewTenantReport>,
    scope: GlobalScope,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .tenant_service
        .tenant_report(scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

#[utoipa::path(
    put,
    path = "/api/admin/tenants/{id}/status",
    tag = "Platform",
    request_body = UpdateTenantStatusPayload,
    params(("id" = Uuid, Path, description = "ID da loja")),
    responses(
        (status = 200, description = "Status da loja atualizado", body = Tenant),
        (status = 403, description = "Somente super_admin"),
        (status = 404, description = "Loja não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tenant_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermManageTenants>,
    scope: GlobalScope,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<UpdateTenantStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .tenant_service
        .set_status(scope, tenant_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tenant))
}
