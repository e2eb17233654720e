// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{AppError, AuthError},
    db::credentials::{CredentialRecord, CredentialStore},
    middleware::tenancy::TenantContext,
    models::auth::{Role, User, UserStatus},
};

const USER_COLUMNS: &str =
    "id, tenant_id, email, password_hash, full_name, role, status, last_login, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // O e-mail é único por loja, então o login pode encontrar mais de um
    pub async fn find_login_candidates(&self, email: &str) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1) ORDER BY created_at"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // Busca por id SEMPRE junto com a loja no predicado
    pub async fn find_in_tenant(
        &self,
        tenant: &TenantContext,
        id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant.tenant_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_in_tenant(&self, tenant: &TenantContext) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY created_at"
        ))
        .bind(tenant.tenant_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // Cria um novo usuário. Aceita um executor para participar de transações.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
        role: Role,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (tenant_id, email, password_hash, full_name, role, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            AppError::from(e)
        })?;

        Ok(user)
    }

    pub async fn touch_last_login(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_status(
        &self,
        tenant: &TenantContext,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET status = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant.tenant_id())
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_role(
        &self,
        tenant: &TenantContext,
        id: Uuid,
        role: Role,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET role = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant.tenant_id())
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

// ---
// Leitura de credenciais para o Authenticator
// ---
#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_credentials(&self, user_id: Uuid) -> Result<Option<CredentialRecord>, AuthError> {
        // Texto fora do domínio no banco também cai aqui: falha fechada
        sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT u.id AS user_id, u.tenant_id, u.role, u.status, t.status AS tenant_status
            FROM users u
            LEFT JOIN tenants t ON t.id = u.tenant_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "falha ao buscar credenciais");
            AuthError::StorageUnavailable
        })
    }
}
