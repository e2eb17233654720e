// src/services/authenticator.rs

use chrono::{DateTime, TimeZone, Utc};
use std::{sync::Arc, time::Duration};

use crate::{
    common::error::AuthError,
    db::credentials::CredentialStore,
    models::{
        auth::{Principal, UserStatus},
        tenancy::{TenantScope, TenantStatus},
    },
    services::token::TokenCodec,
};

/// Transforma o valor cru do header `Authorization` num [`Principal`].
///
/// A cada requisição: token → claims → releitura do usuário → principal.
/// Cargo, loja e status vêm sempre da releitura; o token só localiza a linha.
#[derive(Clone)]
pub struct Authenticator {
    codec: TokenCodec,
    store: Arc<dyn CredentialStore>,
    lookup_timeout: Duration,
}

impl Authenticator {
    pub fn new(codec: TokenCodec, store: Arc<dyn CredentialStore>, lookup_timeout: Duration) -> Self {
        Self { codec, store, lookup_timeout }
    }

    pub async fn authenticate(&self, header_value: Option<&str>) -> Result<Principal, AuthError> {
        self.authenticate_at(header_value, Utc::now()).await
    }

    pub async fn authenticate_at(
        &self,
        header_value: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let token = extract_bearer(header_value)?;
        let claims = self.codec.decode(token, now)?;
        tracing::debug!(user_id = %claims.user_id, "token decodificado");

        // A única suspensão da requisição: limitada, e cancelável ao ser dropada
        let record = tokio::time::timeout(self.lookup_timeout, self.store.find_credentials(claims.user_id))
            .await
            .map_err(|_| {
                tracing::warn!(user_id = %claims.user_id, "tempo esgotado ao buscar credenciais");
                AuthError::StorageUnavailable
            })??
            .ok_or(AuthError::UserNotFound)?;

        if record.status != UserStatus::Active {
            return Err(AuthError::AccountInactive);
        }

        let scope = if record.role.is_super_admin() {
            TenantScope::AllTenants
        } else {
            match (record.tenant_id, record.tenant_status) {
                (Some(tenant_id), Some(TenantStatus::Active)) => TenantScope::Tenant(tenant_id),
                _ => return Err(AuthError::TenantInactive),
            }
        };

        if claims.tenant() != record.tenant_id || claims.role != record.role {
            tracing::debug!(
                user_id = %record.user_id,
                token_role = ?claims.role,
                current_role = ?record.role,
                "claims do token divergem do cadastro atual; valendo o cadastro"
            );
        }

        Ok(Principal::new(
            record.user_id,
            scope,
            record.role,
            record.status,
            timestamp(claims.iat),
            timestamp(claims.exp),
        ))
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// `Bearer <token>`, com o esquema sem diferenciar maiúsculas.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, AuthError> {
    let value = header_value.map(str::trim).ok_or(AuthError::MissingToken)?;
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::JwtSecret,
        db::credentials::{CredentialRecord, InMemoryCredentialStore},
        models::auth::{Claims, Role},
    };
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    struct Fixture {
        store: Arc<InMemoryCredentialStore>,
        codec: TokenCodec,
        authenticator: Authenticator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryCredentialStore::new());
        let codec = TokenCodec::new(
            &JwtSecret::new("authenticator-test-secret").unwrap(),
            ChronoDuration::hours(24),
            ChronoDuration::hours(1),
        );
        let authenticator = Authenticator::new(codec.clone(), store.clone(), Duration::from_secs(1));
        Fixture { store, codec, authenticator }
    }

    fn member(role: Role) -> CredentialRecord {
        CredentialRecord {
            user_id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            role,
            status: UserStatus::Active,
            tenant_status: Some(TenantStatus::Active),
        }
    }

    fn bearer(f: &Fixture, record: &CredentialRecord, now: DateTime<Utc>) -> String {
        let issued = f.codec.issue(record.user_id, record.tenant_id, record.role, now).unwrap();
        format!("Bearer {}", issued.token)
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(Some("bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(Some("BEARER   abc  ")), Ok("abc"));
        assert_eq!(extract_bearer(None), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("")), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("Bearer")), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("Bearer   ")), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("Basic dXNlcjpwdw==")), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("abc")), Err(AuthError::MissingToken));
    }

    #[tokio::test]
    async fn active_member_gets_a_principal_scoped_to_its_tenant() {
        let f = fixture();
        let record = member(Role::Cashier);
        f.store.upsert(record.clone());
        let now = Utc::now();

        let principal = f
            .authenticator
            .authenticate_at(Some(&bearer(&f, &record, now)), now)
            .await
            .unwrap();

        assert_eq!(principal.user_id(), record.user_id);
        assert_eq!(principal.scope(), TenantScope::Tenant(record.tenant_id.unwrap()));
        assert_eq!(principal.role(), Role::Cashier);
        assert_eq!(principal.expires_at().timestamp(), (now + ChronoDuration::hours(24)).timestamp());
    }

    #[tokio::test]
    async fn suspension_takes_effect_before_the_token_expires() {
        let f = fixture();
        let record = member(Role::Manager);
        f.store.upsert(record.clone());
        let now = Utc::now();
        let header = bearer(&f, &record, now);

        assert!(f.authenticator.authenticate_at(Some(&header), now).await.is_ok());

        f.store.set_status(record.user_id, UserStatus::Suspended);
        let later = now + ChronoDuration::minutes(5);
        assert_eq!(
            f.authenticator.authenticate_at(Some(&header), later).await,
            Err(AuthError::AccountInactive)
        );
    }

    #[tokio::test]
    async fn pending_and_inactive_accounts_are_rejected() {
        let f = fixture();
        let now = Utc::now();
        for status in [UserStatus::Inactive, UserStatus::Pending] {
            let mut record = member(Role::Admin);
            record.status = status;
            f.store.upsert(record.clone());
            assert_eq!(
                f.authenticator.authenticate_at(Some(&bearer(&f, &record, now)), now).await,
                Err(AuthError::AccountInactive)
            );
        }
    }

    #[tokio::test]
    async fn role_changes_apply_to_outstanding_tokens() {
        let f = fixture();
        let record = member(Role::Admin);
        f.store.upsert(record.clone());
        let now = Utc::now();
        let header = bearer(&f, &record, now);

        f.store.set_role(record.user_id, Role::Cashier);
        let principal = f.authenticator.authenticate_at(Some(&header), now).await.unwrap();
        assert_eq!(principal.role(), Role::Cashier);
    }

    #[tokio::test]
    async fn suspended_tenant_blocks_its_members() {
        let f = fixture();
        let record = member(Role::Admin);
        f.store.upsert(record.clone());
        let now = Utc::now();

        f.store.set_tenant_status(record.tenant_id.unwrap(), TenantStatus::Suspended);
        assert_eq!(
            f.authenticator.authenticate_at(Some(&bearer(&f, &record, now)), now).await,
            Err(AuthError::TenantInactive)
        );
    }

    #[tokio::test]
    async fn member_without_a_tenant_row_is_tenant_inactive() {
        let f = fixture();
        let mut record = member(Role::Cashier);
        record.tenant_status = None;
        f.store.upsert(record.clone());
        let now = Utc::now();

        assert_eq!(
            f.authenticator.authenticate_at(Some(&bearer(&f, &record, now)), now).await,
            Err(AuthError::TenantInactive)
        );
    }

    #[tokio::test]
    async fn super_admin_has_no_tenant_and_skips_the_tenant_check() {
        let f = fixture();
        let record = CredentialRecord {
            user_id: Uuid::new_v4(),
            tenant_id: None,
            role: Role::SuperAdmin,
            status: UserStatus::Active,
            tenant_status: None,
        };
        f.store.upsert(record.clone());
        let now = Utc::now();

        let principal = f
            .authenticator
            .authenticate_at(Some(&bearer(&f, &record, now)), now)
            .await
            .unwrap();

        assert_eq!(principal.scope(), TenantScope::AllTenants);
        assert_eq!(principal.tenant_id(), None);
        // Sessão de 1h
        assert_eq!(principal.expires_at().timestamp(), (now + ChronoDuration::hours(1)).timestamp());
    }

    #[tokio::test]
    async fn tokens_for_deleted_users_are_rejected() {
        let f = fixture();
        let record = member(Role::Cashier);
        f.store.upsert(record.clone());
        let now = Utc::now();
        let header = bearer(&f, &record, now);

        f.store.remove(record.user_id);
        assert_eq!(
            f.authenticator.authenticate_at(Some(&header), now).await,
            Err(AuthError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn expiry_is_checked_against_the_request_time() {
        let f = fixture();
        let record = member(Role::Cashier);
        f.store.upsert(record.clone());
        let t0 = Utc::now();
        let header = bearer(&f, &record, t0);

        let after = t0 + ChronoDuration::hours(24) + ChronoDuration::seconds(1);
        assert_eq!(
            f.authenticator.authenticate_at(Some(&header), after).await,
            Err(AuthError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn codec_failures_propagate_unchanged() {
        let f = fixture();
        let now = Utc::now();

        assert_eq!(
            f.authenticator.authenticate_at(Some("Bearer"), now).await,
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            f.authenticator.authenticate_at(Some("Bearer a.b"), now).await,
            Err(AuthError::MalformedToken)
        );

        let forged = TokenCodec::new(
            &JwtSecret::new("someone-else").unwrap(),
            ChronoDuration::hours(24),
            ChronoDuration::hours(1),
        )
        .encode(&Claims {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::Admin,
            iat: now.timestamp(),
            exp: (now + ChronoDuration::hours(1)).timestamp(),
        })
        .unwrap();
        assert_eq!(
            f.authenticator.authenticate_at(Some(&format!("Bearer {forged}")), now).await,
            Err(AuthError::SignatureInvalid)
        );
        // Nem chegou a consultar o cadastro
        assert_eq!(f.store.reads(), 0);
    }

    struct StalledStore;

    #[async_trait]
    impl CredentialStore for StalledStore {
        async fn find_credentials(&self, _user_id: Uuid) -> Result<Option<CredentialRecord>, AuthError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn find_credentials(&self, _user_id: Uuid) -> Result<Option<CredentialRecord>, AuthError> {
            Err(AuthError::StorageUnavailable)
        }
    }

    #[tokio::test]
    async fn slow_storage_is_unavailable_not_unauthorized() {
        let f = fixture();
        let record = member(Role::Cashier);
        let now = Utc::now();
        let header = bearer(&f, &record, now);

        let authenticator =
            Authenticator::new(f.codec.clone(), Arc::new(StalledStore), Duration::from_millis(20));
        assert_eq!(
            authenticator.authenticate_at(Some(&header), now).await,
            Err(AuthError::StorageUnavailable)
        );

        let authenticator =
            Authenticator::new(f.codec.clone(), Arc::new(BrokenStore), Duration::from_secs(1));
        assert_eq!(
            authenticator.authenticate_at(Some(&header), now).await,
            Err(AuthError::StorageUnavailable)
        );
    }
}
