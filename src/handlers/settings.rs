// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_tenant_tx,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermManageStoreSettings, PermViewStoreSettings, RequirePermission},
        tenancy::TenantContext,
    },
    models::settings::{TenantSettings, UpdateSettingsRequest},
};

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Configurações da loja", body = TenantSettings),
        (status = 403, description = "Sem permissão (inclui super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermViewStoreSettings>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Result<TenantSettings, AppError> = async {
        // Conexão com RLS ativo para esta loja
        let mut tx = begin_tenant_tx(app_state.settings_repo.pool(), &tenant).await?;
        let settings = app_state.settings_repo.get_settings(&mut *tx, &tenant).await?;
        tx.commit().await?;
        Ok::<_, AppError>(settings)
    }
    .await;

    let settings = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/settings
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Configurações atualizadas", body = TenantSettings),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Somente admin da loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermManageStoreSettings>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result: Result<TenantSettings, AppError> = async {
        let mut tx = begin_tenant_tx(app_state.settings_repo.pool(), &tenant).await?;
        let updated = app_state
            .settings_repo
            .update_settings(&mut *tx, &tenant, payload)
            .await?;
        tx.commit().await?;
        Ok::<_, AppError>(updated)
    }
    .await;

    let updated = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(updated)))
}
