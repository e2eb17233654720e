// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::tenancy::{Tenant, TenantReportEntry, TenantStatus};

const TENANT_COLUMNS: &str = "id, name, status, plan, created_at, updated_at";

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria uma nova loja, já ativa.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E, // Aceita um executor (pool ou transação)
        name: &str,
        plan: &str,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            r#"
            INSERT INTO tenants (name, plan, status)
            VALUES ($1, $2, 'active')
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(plan)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    /// Rota global (super_admin): não há filtro de loja aqui.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            r#"
            UPDATE tenants SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    /// Relatório global: lojas com contagem de usuários.
    pub async fn tenant_report(&self) -> Result<Vec<TenantReportEntry>, AppError> {
        let entries = sqlx::query_as::<_, TenantReportEntry>(
            r#"
            SELECT
                t.id, t.name, t.status, t.plan, t.created_at,
                COUNT(u.id) AS user_count,
                COUNT(u.id) FILTER (WHERE u.status = 'active') AS active_user_count
            FROM tenants t
            LEFT JOIN users u ON u.tenant_id = t.id
            GROUP BY t.id
            ORDER BY t.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
