// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    middleware::tenancy::TenantContext,
    models::catalog::Category,
};

// Todas as consultas levam `tenant_id` no predicado, além da política RLS
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        tenant: &TenantContext,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (tenant_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, tenant_id, name, description, created_at, updated_at
            "#,
        )
        .bind(tenant.tenant_id())
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::ValidationError(duplicate_name_error());
                }
            }
            e.into()
        })
    }

    pub async fn list_categories<'e, E>(
        &self,
        executor: E,
        tenant: &TenantContext,
    ) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, description, created_at, updated_at
            FROM categories
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant.tenant_id())
        .fetch_all(executor)
        .await?;

        Ok(categories)
    }

    // Id de outra loja simplesmente não aparece (404, nunca 403)
    pub async fn find_category<'e, E>(
        &self,
        executor: E,
        tenant: &TenantContext,
        id: Uuid,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, description, created_at, updated_at
            FROM categories
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant.tenant_id())
        .fetch_optional(executor)
        .await?;

        Ok(category)
    }
}

fn duplicate_name_error() -> validator::ValidationErrors {
    let mut errors = validator::ValidationErrors::new();
    let mut err = validator::ValidationError::new("unique");
    err.message = Some("Já existe uma categoria com esse nome.".into());
    errors.add("name", err);
    errors
}
