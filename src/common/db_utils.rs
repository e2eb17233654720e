use sqlx::{PgPool, Postgres, Transaction};

use crate::common::error::AppError;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre uma transação com `app.tenant_id` definido localmente, para as
/// políticas de row-level security das tabelas da loja. A variável some no
/// commit/rollback, então a conexão volta limpa para a pool.
pub(crate) async fn begin_tenant_tx(
    pool: &PgPool,
    tenant: &TenantContext,
) -> Result<Transaction<'static, Postgres>, AppError> {
    // PoolTimedOut vira 503 em `to_api_error`
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant.tenant_id().to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
