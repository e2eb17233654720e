use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    middleware::tenancy::TenantContext,
    models::settings::{TenantSettings, UpdateSettingsRequest},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        tenant: &TenantContext,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Loja sem configuração ainda: devolvemos tudo vazio
        let settings = sqlx::query_as::<_, TenantSettings>(
            r#"
            SELECT tenant_id, store_name, address, phone, email, currency, receipt_footer, updated_at
            FROM tenant_settings
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant.tenant_id())
        .fetch_optional(executor)
        .await?;

        Ok(settings.unwrap_or_else(|| TenantSettings::empty(tenant.tenant_id())))
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        tenant: &TenantContext,
        input: UpdateSettingsRequest,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update)
        let settings = sqlx::query_as::<_, TenantSettings>(
            r#"
            INSERT INTO tenant_settings
                (tenant_id, store_name, address, phone, email, currency, receipt_footer)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                store_name = EXCLUDED.store_name,
                address = EXCLUDED.address,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                currency = EXCLUDED.currency,
                receipt_footer = EXCLUDED.receipt_footer,
                updated_at = NOW()
            RETURNING tenant_id, store_name, address, phone, email, currency, receipt_footer, updated_at
            "#,
        )
        .bind(tenant.tenant_id())
        .bind(input.store_name)
        .bind(input.address)
        .bind(input.phone)
        .bind(input.email)
        .bind(input.currency)
        .bind(input.receipt_footer)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
