// src/handlers/catalog.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_tenant_tx,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermManageCatalog, PermViewCatalog, RequirePermission},
        tenancy::TenantContext,
    },
    models::catalog::{Category, CreateCategoryPayload},
};

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Catalog",
    responses(
        (status = 200, description = "Categorias da loja", body = Vec<Category>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermViewCatalog>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Result<Vec<Category>, AppError> = async {
        let mut tx = begin_tenant_tx(app_state.catalog_repo.pool(), &tenant).await?;
        let categories = app_state.catalog_repo.list_categories(&mut *tx, &tenant).await?;
        tx.commit().await?;
        Ok::<_, AppError>(categories)
    }
    .await;

    let categories = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Catalog",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 400, description = "Dados inválidos ou nome repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermManageCatalog>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result: Result<Category, AppError> = async {
        let mut tx = begin_tenant_tx(app_state.catalog_repo.pool(), &tenant).await?;
        let category = app_state
            .catalog_repo
            .create_category(&mut *tx, &tenant, payload.name.trim(), payload.description.as_deref())
            .await?;
        tx.commit().await?;
        Ok::<_, AppError>(category)
    }
    .await;

    let category = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria", body = Category),
        (status = 404, description = "Não existe nesta loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermViewCatalog>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Result<Category, AppError> = async {
        let mut tx = begin_tenant_tx(app_state.catalog_repo.pool(), &tenant).await?;
        let category = app_state
            .catalog_repo
            .find_category(&mut *tx, &tenant, category_id)
            .await?;
        tx.commit().await?;
        // Id de outra loja cai aqui também
        category.ok_or(AppError::NotFound("category"))
    }
    .await;

    let category = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(category))
}
