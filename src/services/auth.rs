// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::{
    common::error::{AppError, AuthError},
    db::{TenantRepository, UserRepository},
    models::{
        auth::{AuthResponse, RegisterPayload, Role, User, UserStatus},
        tenancy::TenantStatus,
    },
    services::token::TokenCodec,
};

const STARTER_PLAN: &str = "starter";

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    token_codec: TokenCodec,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        token_codec: TokenCodec,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, tenant_repo, token_codec, pool }
    }

    /// Cria a loja e o seu primeiro admin numa única transação.
    pub async fn register(&self, payload: RegisterPayload) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&payload.email);

        // 1. Hashing fora da transação: não toca no banco
        let hashed_password = hash_password(payload.password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, payload.store_name.trim(), STARTER_PLAN)
            .await?;

        // Se falhar aqui, a loja criada acima é desfeita no drop do tx
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                tenant.id,
                &email,
                &hashed_password,
                payload.full_name.as_deref(),
                Role::Admin,
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(tenant_id = %tenant.id, user_id = %user.id, "nova loja registrada");

        self.respond_with_token(user, Utc::now())
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        tenant_id: Option<Uuid>,
    ) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);

        let candidates: Vec<User> = self
            .user_repo
            .find_login_candidates(&email)
            .await?
            .into_iter()
            .filter(|user| tenant_id.is_none_or(|id| user.tenant_id == Some(id)))
            .collect();

        let user = select_by_password(candidates, password).await?;

        if user.status != UserStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }

        if let Some(tenant_id) = user.tenant_id {
            let tenant_active = self
                .tenant_repo
                .find_by_id(tenant_id)
                .await?
                .is_some_and(|tenant| tenant.status == TenantStatus::Active);
            if !tenant_active {
                return Err(AuthError::TenantInactive.into());
            }
        }

        self.user_repo.touch_last_login(user.id).await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "login efetuado");

        self.respond_with_token(user, Utc::now())
    }

    fn respond_with_token(&self, user: User, now: DateTime<Utc>) -> Result<AuthResponse, AppError> {
        let issued = self.token_codec.issue(user.id, user.tenant_id, user.role, now)?;
        let expires_at = DateTime::from_timestamp(issued.claims.exp, 0)
            .unwrap_or(now + self.token_codec.lifetime_for(user.role));

        Ok(AuthResponse { token: issued.token, expires_at, user })
    }
}

// A senha é conferida antes de qualquer desambiguação: sem uma senha certa,
// "e-mail em várias lojas" responde igual a "e-mail desconhecido".
async fn select_by_password(candidates: Vec<User>, password: &str) -> Result<User, AppError> {
    if candidates.is_empty() {
        // Mesmo custo de um login real, para não revelar quais e-mails existem
        let _ = verify_password(password.to_owned(), None).await;
        return Err(AppError::InvalidCredentials);
    }

    let mut matching = Vec::new();
    for user in candidates {
        if verify_password(password.to_owned(), Some(user.password_hash.clone())).await? {
            matching.push(user);
        }
    }

    match matching.len() {
        0 => Err(AppError::InvalidCredentials),
        1 => matching.pop().ok_or(AppError::InvalidCredentials),
        _ => Err(AppError::TenantSelectionRequired),
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Executa o hashing em um thread separado
pub(crate) async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

// Sem hash (usuário inexistente) verificamos contra um hash descartável
async fn verify_password(password: String, password_hash: Option<String>) -> Result<bool, AppError> {
    let is_valid = tokio::task::spawn_blocking(move || match password_hash {
        Some(password_hash) => verify(&password, &password_hash),
        None => {
            static DUMMY_HASH: OnceLock<String> = OnceLock::new();
            let dummy = DUMMY_HASH.get_or_init(|| {
                hash("ardent-dummy-password", bcrypt::DEFAULT_COST).unwrap_or_default()
            });
            verify(&password, dummy).map(|_| false)
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

    Ok(is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Ana@Loja.COM "), "ana@loja.com");
    }

    #[tokio::test]
    async fn password_round_trip() {
        let hashed = hash_password("correct horse".to_string()).await.unwrap();
        assert!(verify_password("correct horse".to_string(), Some(hashed.clone())).await.unwrap());
        assert!(!verify_password("wrong".to_string(), Some(hashed)).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_never_verifies() {
        assert!(!verify_password("anything".to_string(), None).await.unwrap_or(false));
    }

    fn user_in_store(password: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            email: "ana@loja.com".to_string(),
            // Custo mínimo: só o resultado importa aqui
            password_hash: hash(password, 4).unwrap(),
            full_name: None,
            role: Role::Cashier,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn shared_email_with_a_wrong_password_is_just_invalid_credentials() {
        let candidates = vec![user_in_store("senha-loja-a"), user_in_store("senha-loja-b")];
        let result = select_by_password(candidates, "chute-errado").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn the_password_picks_the_store_when_only_one_matches() {
        let a = user_in_store("senha-loja-a");
        let b = user_in_store("senha-loja-b");
        let expected = b.id;

        let user = select_by_password(vec![a, b], "senha-loja-b").await.unwrap();
        assert_eq!(user.id, expected);
    }

    #[tokio::test]
    async fn same_password_in_two_stores_needs_a_tenant() {
        let candidates = vec![user_in_store("mesma-senha"), user_in_store("mesma-senha")];
        let result = select_by_password(candidates, "mesma-senha").await;
        assert!(matches!(result, Err(AppError::TenantSelectionRequired)));
    }

    #[tokio::test]
    async fn no_candidates_is_invalid_credentials() {
        let result = select_by_password(Vec::new(), "qualquer").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }
}
